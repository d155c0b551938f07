//! PROCEDURE / FUNCTION header grammar
//!
//! Accepted forms:
//!
//! ```text
//! Name()
//! Name(a : INTEGER)
//! Name(a : INTEGER, b : STRING)
//! Name(a, b, c : REAL)
//! ```

use crate::ast::{DeclaredType, Param};
use crate::error::{ParseError, Result};

/// Parsed routine header
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub name: String,
    pub params: Vec<Param>,
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn invalid_header(line: usize) -> ParseError {
    ParseError::syntax("Invalid Header", line)
}

fn declared_type(name: &str, line: usize) -> Result<DeclaredType> {
    name.parse()
        .map_err(|_| ParseError::type_error("Invalid Data Type", line))
}

/// Parse `Name(params)`
pub fn parse_header(text: &str, line: usize) -> Result<Header> {
    let text = text.trim();
    let (name, rest) = text.split_once('(').ok_or_else(|| invalid_header(line))?;
    let name = name.trim();
    let inner = rest
        .trim_end()
        .strip_suffix(')')
        .ok_or_else(|| invalid_header(line))?;
    if !is_word(name) || inner.contains(['(', ')']) {
        return Err(invalid_header(line));
    }

    if inner.trim().is_empty() {
        return Ok(Header {
            name: name.to_string(),
            params: Vec::new(),
        });
    }

    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    let typed = parts.iter().filter(|part| part.contains(':')).count();

    let params = if typed == parts.len() {
        // Name(a : T, b : U)
        parts
            .iter()
            .map(|part| {
                let (param, ty) = part.split_once(':').ok_or_else(|| invalid_header(line))?;
                let (param, ty) = (param.trim(), ty.trim());
                if !is_word(param) || !is_word(ty) {
                    return Err(invalid_header(line));
                }
                Ok(Param {
                    name: param.to_string(),
                    ty: declared_type(ty, line)?,
                })
            })
            .collect::<Result<Vec<_>>>()?
    } else if typed == 1 && parts.last().is_some_and(|last| last.contains(':')) {
        // Name(a, b : T)
        let (names, last) = parts.split_at(parts.len() - 1);
        let (last_name, ty) = last[0].split_once(':').ok_or_else(|| invalid_header(line))?;
        let (last_name, ty) = (last_name.trim(), ty.trim());
        if !is_word(ty) {
            return Err(invalid_header(line));
        }
        let ty = declared_type(ty, line)?;
        names
            .iter()
            .copied()
            .chain(std::iter::once(last_name))
            .map(|param| {
                if is_word(param) {
                    Ok(Param {
                        name: param.to_string(),
                        ty,
                    })
                } else {
                    Err(invalid_header(line))
                }
            })
            .collect::<Result<Vec<_>>>()?
    } else {
        return Err(invalid_header(line));
    };

    Ok(Header {
        name: name.to_string(),
        params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, ty: DeclaredType) -> Param {
        Param {
            name: name.to_string(),
            ty,
        }
    }

    #[test]
    fn test_no_params() {
        let header = parse_header("Greet()", 1).unwrap();
        assert_eq!(header.name, "Greet");
        assert!(header.params.is_empty());

        let header = parse_header("Greet ( )", 1).unwrap();
        assert!(header.params.is_empty());
    }

    #[test]
    fn test_typed_pairs() {
        let header = parse_header("Show(Name : STRING, Count:INTEGER)", 1).unwrap();
        assert_eq!(
            header.params,
            vec![
                param("Name", DeclaredType::String),
                param("Count", DeclaredType::Integer)
            ]
        );
    }

    #[test]
    fn test_shared_type() {
        let header = parse_header("Swap(A, B : REAL)", 1).unwrap();
        assert_eq!(header.name, "Swap");
        assert_eq!(
            header.params,
            vec![param("A", DeclaredType::Real), param("B", DeclaredType::Real)]
        );
    }

    #[test]
    fn test_mixed_forms_rejected() {
        let err = parse_header("Bad(A, B : INTEGER, C : STRING)", 4).unwrap_err();
        assert_eq!(err, ParseError::syntax("Invalid Header", 4));
    }

    #[test]
    fn test_malformed_headers() {
        for text in ["Greet", "Greet(", "(A : INTEGER)", "Greet(A)", "Greet(A : )", "Gr eet()"] {
            assert!(
                matches!(parse_header(text, 1), Err(ParseError::Syntax { .. })),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_unknown_type() {
        let err = parse_header("Greet(A : DATE)", 2).unwrap_err();
        assert_eq!(err, ParseError::type_error("Invalid Data Type", 2));
    }
}
