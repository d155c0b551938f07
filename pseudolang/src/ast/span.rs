//! Source location tracking
//!
//! Pseudocode is line oriented, so locations are inclusive 1-based line
//! ranges rather than byte offsets. A leaf instruction covers a single line;
//! a block covers its opener through its closer.

use serde::{Deserialize, Serialize};

/// An inclusive range of source lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Span covering exactly one line
    pub fn line(line: usize) -> Self {
        Self { start: line, end: line }
    }

    /// Number of source lines covered
    pub fn line_count(&self) -> usize {
        self.end + 1 - self.start
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start == self.end {
            write!(f, "line {}", self.start)
        } else {
            write!(f, "lines {}..={}", self.start, self.end)
        }
    }
}

/// A value with source location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_line() {
        let span = Span::line(7);
        assert_eq!(span.start, 7);
        assert_eq!(span.end, 7);
        assert_eq!(span.line_count(), 1);
    }

    #[test]
    fn test_block_span() {
        let span = Span::new(3, 9);
        assert_eq!(span.line_count(), 7);
    }

    #[test]
    fn test_span_display() {
        assert_eq!(Span::line(4).to_string(), "line 4");
        assert_eq!(Span::new(2, 6).to_string(), "lines 2..=6");
    }
}
