//! Error types and reporting

use crate::ast::BlockKind;
use crate::interp::TraceFrame;
use std::ops::Range;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ParseError>;

/// Error raised while building the instruction tree
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("{kind} block was not closed")]
    Unclosed { kind: BlockKind, line: usize },

    #[error("{message}")]
    Parse { message: String, line: usize },

    #[error("{message}")]
    Syntax { message: String, line: usize },

    #[error("{message}")]
    Block { message: String, line: usize },

    #[error("{message}")]
    Type { message: String, line: usize },
}

impl ParseError {
    pub fn parse(message: impl Into<String>, line: usize) -> Self {
        Self::Parse {
            message: message.into(),
            line,
        }
    }

    pub fn syntax(message: impl Into<String>, line: usize) -> Self {
        Self::Syntax {
            message: message.into(),
            line,
        }
    }

    pub fn block(message: impl Into<String>, line: usize) -> Self {
        Self::Block {
            message: message.into(),
            line,
        }
    }

    pub fn type_error(message: impl Into<String>, line: usize) -> Self {
        Self::Type {
            message: message.into(),
            line,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Self::Unclosed { line, .. }
            | Self::Parse { line, .. }
            | Self::Syntax { line, .. }
            | Self::Block { line, .. }
            | Self::Type { line, .. } => *line,
        }
    }
}

/// Failure to evaluate an expression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("Invalid identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("Variable '{0}' has not been assigned a value")]
    Unassigned(String),

    #[error("'{0}' cannot be used as a value")]
    NotAValue(String),

    #[error("Invalid Expression, {0}")]
    InvalidExpression(String),

    #[error("{0}")]
    TypeMismatch(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Integer overflow")]
    Overflow,
}

/// Anything that can be rendered as a fatal pseudocode error
pub trait Diagnostic {
    /// Error type label, e.g. "Type Error"
    fn label(&self) -> Option<&'static str>;

    /// Offending source line (1-based)
    fn line(&self) -> Option<usize>;

    fn message(&self) -> String;

    /// Active call chain at the time of the failure, frame 0 first
    fn trace(&self) -> &[TraceFrame] {
        &[]
    }
}

impl Diagnostic for ParseError {
    fn label(&self) -> Option<&'static str> {
        Some(match self {
            Self::Unclosed { .. } | Self::Parse { .. } => "Parse Error",
            Self::Syntax { .. } => "Syntax Error",
            Self::Block { .. } => "Block Error",
            Self::Type { .. } => "Type Error",
        })
    }

    fn line(&self) -> Option<usize> {
        Some(ParseError::line(self))
    }

    fn message(&self) -> String {
        self.to_string()
    }
}

/// Text of a 1-based source line, trimmed the way the parser sees it
pub fn source_line(source: &str, line: usize) -> Option<&str> {
    line.checked_sub(1)
        .and_then(|index| source.lines().nth(index))
        .map(str::trim)
}

/// Character range of a 1-based source line, excluding the line terminator
fn line_range(source: &str, line: usize) -> Option<Range<usize>> {
    let mut start = 0;
    for (index, text) in source.split_inclusive('\n').enumerate() {
        if index + 1 == line {
            let len = text.trim_end_matches(['\n', '\r']).chars().count();
            return Some(start..start + len);
        }
        start += text.chars().count();
    }
    None
}

/// Report a fatal error: the call chain first, then the failing line with ariadne
pub fn report_error(filename: &str, source: &str, error: &dyn Diagnostic) -> std::io::Result<()> {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    for frame in error.trace() {
        eprintln!("Line {} calls {}", frame.line, frame.name);
        eprintln!(
            "\tProgram Code:\t{}",
            source_line(source, frame.line).unwrap_or_default()
        );
    }

    let title = match (error.label(), error.line()) {
        (Some(label), Some(line)) => format!("{label} (Line {line})"),
        (Some(label), None) => label.to_string(),
        (None, Some(line)) => format!("Line {line}"),
        (None, None) => "Pseudolang error".to_string(),
    };

    match error.line().and_then(|line| line_range(source, line)) {
        Some(range) => Report::build(ReportKind::Error, (filename, range.clone()))
            .with_message(title)
            .with_label(
                Label::new((filename, range))
                    .with_message(error.message())
                    .with_color(Color::Red),
            )
            .finish()
            .eprint((filename, Source::from(source))),
        None => Report::build(ReportKind::Error, (filename, 0..0))
            .with_message(format!("{title}: {}", error.message()))
            .finish()
            .eprint((filename, Source::from(source))),
    }
}
