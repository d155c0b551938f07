//! Expression lexer implementation using logos
//!
//! Statement lines are split on whitespace by the block parser; only the
//! expression text inside a statement goes through this lexer.

mod token;

pub use token::Token;

use crate::error::EvalError;
use logos::Logos;

/// Words reserved by the statement grammar
pub const KEYWORDS: [&str; 21] = [
    "DECLARE",
    "CONSTANT",
    "INPUT",
    "OUTPUT",
    "IF",
    "FOR",
    "TO",
    "STEP",
    "NEXT",
    "WHILE",
    "ENDWHILE",
    "REPEAT",
    "UNTIL",
    "PROCEDURE",
    "ENDPROCEDURE",
    "CALL",
    "FUNCTION",
    "ENDFUNCTION",
    "RETURN",
    "ELSE",
    "ENDIF",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// Identifiers start with a letter and continue with letters, digits or `_`
pub fn is_valid_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Tokenize an expression
pub fn tokenize(source: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push(token),
            Err(_) => return Err(EvalError::InvalidExpression(source.to_string())),
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("   ").unwrap().is_empty());
    }

    #[test]
    fn test_tokenize_numbers() {
        assert_eq!(tokenize("42").unwrap(), vec![Token::IntLit(42)]);
        assert_eq!(tokenize("2.5").unwrap(), vec![Token::RealLit(2.5)]);
    }

    #[test]
    fn test_tokenize_text_literals() {
        assert_eq!(
            tokenize(r#""Hello  World""#).unwrap(),
            vec![Token::StringLit("Hello  World".to_string())]
        );
        assert_eq!(tokenize("'x'").unwrap(), vec![Token::CharLit('x')]);
        assert_eq!(tokenize(r#""""#).unwrap(), vec![Token::StringLit(String::new())]);
    }

    #[test]
    fn test_tokenize_keywords_and_identifiers() {
        let tokens = tokenize("TRUE AND NOT Flag OR FALSE").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::True,
                Token::And,
                Token::Not,
                Token::Ident("Flag".to_string()),
                Token::Or,
                Token::False,
            ]
        );
        // Keyword prefixes are still identifiers
        assert_eq!(
            tokenize("ORDER").unwrap(),
            vec![Token::Ident("ORDER".to_string())]
        );
    }

    #[test]
    fn test_tokenize_unicode_identifiers() {
        for name in ["Café", "Größe_2", "Ωmega"] {
            assert!(is_valid_identifier(name));
            assert_eq!(tokenize(name).unwrap(), vec![Token::Ident(name.to_string())]);
        }
    }

    #[test]
    fn test_tokenize_operators() {
        let tokens = tokenize("+ - * / = <> < > <= >= ( )").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
                Token::Eq,
                Token::NotEq,
                Token::Lt,
                Token::Gt,
                Token::LtEq,
                Token::GtEq,
                Token::LParen,
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_tokenize_rejects_unknown_characters() {
        assert_eq!(
            tokenize("X % 2"),
            Err(EvalError::InvalidExpression("X % 2".to_string()))
        );
        // unterminated string
        assert!(tokenize("\"abc").is_err());
        // multi-character char literal
        assert!(tokenize("'ab'").is_err());
    }

    #[test]
    fn test_keywords() {
        assert!(is_keyword("DECLARE"));
        assert!(is_keyword("ENDIF"));
        assert!(!is_keyword("Total"));
    }

    #[test]
    fn test_valid_identifier() {
        assert!(is_valid_identifier("Total"));
        assert!(is_valid_identifier("x_1"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("1x"));
        assert!(!is_valid_identifier("_x"));
        assert!(!is_valid_identifier("a-b"));
    }
}
