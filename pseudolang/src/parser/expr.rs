//! Expression parser
//!
//! Recursive descent over the logos token stream. Precedence, loosest first:
//! `OR`, `AND`, `NOT`, comparison, `+ -`, `* /`, unary `- +`.

use crate::ast::{BinOp, Expr, UnOp};
use crate::error::EvalError;
use crate::lexer::{Token, tokenize};

/// Parse expression text into an expression tree
pub fn parse_expr(source: &str) -> Result<Expr, EvalError> {
    let tokens = tokenize(source)?;
    let mut parser = ExprParser {
        source,
        tokens,
        pos: 0,
    };
    let expr = parser.or_expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(parser.invalid());
    }
    Ok(expr)
}

struct ExprParser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl ExprParser<'_> {
    fn invalid(&self) -> EvalError {
        EvalError::InvalidExpression(self.source.to_string())
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or_expr(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.and_expr()?;
        while self.eat(&Token::Or) {
            let right = self.and_expr()?;
            left = binary(left, BinOp::Or, right);
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.not_expr()?;
        while self.eat(&Token::And) {
            let right = self.not_expr()?;
            left = binary(left, BinOp::And, right);
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> Result<Expr, EvalError> {
        if self.eat(&Token::Not) {
            let expr = self.not_expr()?;
            return Ok(Expr::Unary {
                op: UnOp::Not,
                expr: Box::new(expr),
            });
        }
        self.comparison()
    }

    /// Comparisons do not chain: `a < b < c` is rejected
    fn comparison(&mut self) -> Result<Expr, EvalError> {
        let left = self.additive()?;
        let Some(op) = self.peek().and_then(comparison_op) else {
            return Ok(left);
        };
        self.pos += 1;
        let right = self.additive()?;
        if self.peek().and_then(comparison_op).is_some() {
            return Err(self.invalid());
        }
        Ok(binary(left, op, right))
    }

    fn additive(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.multiplicative()?;
            left = binary(left, op, right);
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.unary()?;
            left = binary(left, op, right);
        }
    }

    fn unary(&mut self) -> Result<Expr, EvalError> {
        let op = match self.peek() {
            Some(Token::Minus) => UnOp::Neg,
            Some(Token::Plus) => UnOp::Plus,
            _ => return self.primary(),
        };
        self.pos += 1;
        let expr = self.unary()?;
        Ok(Expr::Unary {
            op,
            expr: Box::new(expr),
        })
    }

    fn primary(&mut self) -> Result<Expr, EvalError> {
        match self.advance() {
            Some(Token::IntLit(n)) => Ok(Expr::IntLit(n)),
            Some(Token::RealLit(x)) => Ok(Expr::RealLit(x)),
            Some(Token::StringLit(s)) => Ok(Expr::StringLit(s)),
            Some(Token::CharLit(c)) => Ok(Expr::CharLit(c)),
            Some(Token::True) => Ok(Expr::BoolLit(true)),
            Some(Token::False) => Ok(Expr::BoolLit(false)),
            Some(Token::Ident(name)) => Ok(Expr::Var(name)),
            Some(Token::LParen) => {
                let expr = self.or_expr()?;
                if self.eat(&Token::RParen) {
                    Ok(expr)
                } else {
                    Err(self.invalid())
                }
            }
            _ => Err(self.invalid()),
        }
    }
}

fn comparison_op(token: &Token) -> Option<BinOp> {
    match token {
        Token::Eq => Some(BinOp::Eq),
        Token::NotEq => Some(BinOp::Ne),
        Token::Lt => Some(BinOp::Lt),
        Token::Gt => Some(BinOp::Gt),
        Token::LtEq => Some(BinOp::Le),
        Token::GtEq => Some(BinOp::Ge),
        _ => None,
    }
}

fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Expr {
        Expr::IntLit(n)
    }

    fn var(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        assert_eq!(
            parse_expr("3 + 4 * 2").unwrap(),
            binary(int(3), BinOp::Add, binary(int(4), BinOp::Mul, int(2)))
        );
    }

    #[test]
    fn test_left_associative() {
        assert_eq!(
            parse_expr("10 - 4 - 3").unwrap(),
            binary(binary(int(10), BinOp::Sub, int(4)), BinOp::Sub, int(3))
        );
    }

    #[test]
    fn test_parentheses() {
        assert_eq!(
            parse_expr("(3 + 4) * 2").unwrap(),
            binary(binary(int(3), BinOp::Add, int(4)), BinOp::Mul, int(2))
        );
    }

    #[test]
    fn test_comparison_looser_than_arithmetic() {
        assert_eq!(
            parse_expr("X + 1 >= 10").unwrap(),
            binary(binary(var("X"), BinOp::Add, int(1)), BinOp::Ge, int(10))
        );
    }

    #[test]
    fn test_boolean_connectives_loosest() {
        // NOT applies to the whole comparison, AND binds tighter than OR
        let expr = parse_expr("NOT X = 1 OR Y < 2 AND Z").unwrap();
        let not_eq = Expr::Unary {
            op: UnOp::Not,
            expr: Box::new(binary(var("X"), BinOp::Eq, int(1))),
        };
        let and = binary(binary(var("Y"), BinOp::Lt, int(2)), BinOp::And, var("Z"));
        assert_eq!(expr, binary(not_eq, BinOp::Or, and));
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(
            parse_expr("-X * 2").unwrap(),
            binary(
                Expr::Unary {
                    op: UnOp::Neg,
                    expr: Box::new(var("X")),
                },
                BinOp::Mul,
                int(2)
            )
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse_expr("\"hi\"").unwrap(), Expr::StringLit("hi".into()));
        assert_eq!(parse_expr("'c'").unwrap(), Expr::CharLit('c'));
        assert_eq!(parse_expr("TRUE").unwrap(), Expr::BoolLit(true));
        assert_eq!(parse_expr("1.25").unwrap(), Expr::RealLit(1.25));
    }

    #[test]
    fn test_invalid_expressions() {
        for source in ["", "1 +", "(1 + 2", "1 2", "1 < 2 < 3", ")", "X Y"] {
            assert_eq!(
                parse_expr(source),
                Err(EvalError::InvalidExpression(source.to_string())),
                "{source:?} should be rejected"
            );
        }
    }
}
