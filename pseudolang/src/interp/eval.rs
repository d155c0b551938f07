//! Expression evaluation
//!
//! Expression text is parsed on every evaluation and walked directly.
//! Typing is strict: there are no implicit conversions besides INTEGER to
//! REAL inside arithmetic and comparisons.

use super::env::Binding;
use super::scope::ScopeView;
use super::value::Value;
use crate::ast::{BinOp, Expr, UnOp};
use crate::error::EvalError;
use crate::parser::parse_expr;
use std::cmp::Ordering;

/// Stack growth parameters for deeply nested expressions
const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW_SIZE: usize = 1024 * 1024;

/// Source of identifier values
pub trait Resolve {
    fn resolve(&self, name: &str) -> Result<Value, EvalError>;
}

impl<F> Resolve for F
where
    F: Fn(&str) -> Option<Value>,
{
    fn resolve(&self, name: &str) -> Result<Value, EvalError> {
        self(name).ok_or_else(|| EvalError::UnknownIdentifier(name.to_string()))
    }
}

impl Resolve for ScopeView<'_> {
    fn resolve(&self, name: &str) -> Result<Value, EvalError> {
        match self.get(name) {
            None => Err(EvalError::UnknownIdentifier(name.to_string())),
            Some(Binding::Callable(_)) => Err(EvalError::NotAValue(name.to_string())),
            Some(binding) => binding
                .value()
                .cloned()
                .ok_or_else(|| EvalError::Unassigned(name.to_string())),
        }
    }
}

/// Parse and evaluate expression text
pub fn evaluate(source: &str, resolver: &impl Resolve) -> Result<Value, EvalError> {
    let expr = parse_expr(source)?;
    eval_expr(&expr, resolver)
}

/// Evaluate a parsed expression
pub fn eval_expr(expr: &Expr, resolver: &impl Resolve) -> Result<Value, EvalError> {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || eval_inner(expr, resolver))
}

fn eval_inner(expr: &Expr, resolver: &impl Resolve) -> Result<Value, EvalError> {
    match expr {
        Expr::IntLit(n) => Ok(Value::Integer(*n)),
        Expr::RealLit(x) => Ok(Value::Real(*x)),
        Expr::StringLit(s) => Ok(Value::Text(s.clone())),
        Expr::CharLit(c) => Ok(Value::Char(*c)),
        Expr::BoolLit(b) => Ok(Value::Boolean(*b)),
        Expr::Var(name) => resolver.resolve(name),

        // AND/OR short-circuit
        Expr::Binary {
            left,
            op: op @ (BinOp::And | BinOp::Or),
            right,
        } => {
            let lhs = boolean_operand(*op, eval_expr(left, resolver)?)?;
            if (*op == BinOp::And && !lhs) || (*op == BinOp::Or && lhs) {
                return Ok(Value::Boolean(lhs));
            }
            let rhs = boolean_operand(*op, eval_expr(right, resolver)?)?;
            Ok(Value::Boolean(rhs))
        }

        Expr::Binary { left, op, right } => {
            let lhs = eval_expr(left, resolver)?;
            let rhs = eval_expr(right, resolver)?;
            eval_binary(*op, lhs, rhs)
        }

        Expr::Unary { op, expr } => {
            let value = eval_expr(expr, resolver)?;
            eval_unary(*op, value)
        }
    }
}

fn boolean_operand(op: BinOp, value: Value) -> Result<bool, EvalError> {
    value.as_bool().ok_or_else(|| {
        EvalError::TypeMismatch(format!("{op} requires BOOLEAN, got {}", value.type_name()))
    })
}

fn mismatch(op: BinOp, left: &Value, right: &Value) -> EvalError {
    EvalError::TypeMismatch(format!(
        "Cannot apply {op} to {} and {}",
        left.type_name(),
        right.type_name()
    ))
}

fn numeric_pair(op: BinOp, left: &Value, right: &Value) -> Result<(f64, f64), EvalError> {
    match (left.as_real(), right.as_real()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(mismatch(op, left, right)),
    }
}

/// INTEGER op INTEGER stays INTEGER, anything involving REAL becomes REAL
fn arithmetic(
    op: BinOp,
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    real_op: fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => int_op(*a, *b)
            .map(Value::Integer)
            .ok_or(EvalError::Overflow),
        _ => {
            let (a, b) = numeric_pair(op, left, right)?;
            Ok(Value::Real(real_op(a, b)))
        }
    }
}

fn eval_binary(op: BinOp, left: Value, right: Value) -> Result<Value, EvalError> {
    match op {
        BinOp::Add => match (&left, &right) {
            (Value::Text(_) | Value::Char(_), Value::Text(_) | Value::Char(_)) => {
                Ok(Value::Text(format!("{left}{right}")))
            }
            _ => arithmetic(op, &left, &right, i64::checked_add, |a, b| a + b),
        },
        BinOp::Sub => arithmetic(op, &left, &right, i64::checked_sub, |a, b| a - b),
        BinOp::Mul => arithmetic(op, &left, &right, i64::checked_mul, |a, b| a * b),
        // True division, always REAL
        BinOp::Div => {
            let (a, b) = numeric_pair(op, &left, &right)?;
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Ok(Value::Real(a / b))
        }
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
            compare_values(op, &left, &right)
        }
        BinOp::And | BinOp::Or => {
            let lhs = boolean_operand(op, left)?;
            let rhs = boolean_operand(op, right)?;
            Ok(Value::Boolean(if op == BinOp::And {
                lhs && rhs
            } else {
                lhs || rhs
            }))
        }
    }
}

fn compare_values(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let ordering: Option<Ordering> = match (left, right) {
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Char(a), Value::Char(b)) => Some(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) if matches!(op, BinOp::Eq | BinOp::Ne) => {
            Some(a.cmp(b))
        }
        _ => {
            let (a, b) = numeric_pair(op, left, right)?;
            a.partial_cmp(&b)
        }
    };

    let result = match op {
        BinOp::Eq => ordering == Some(Ordering::Equal),
        BinOp::Ne => ordering != Some(Ordering::Equal),
        BinOp::Lt => ordering == Some(Ordering::Less),
        BinOp::Gt => ordering == Some(Ordering::Greater),
        BinOp::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        BinOp::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        _ => return Err(mismatch(op, left, right)),
    };
    Ok(Value::Boolean(result))
}

fn eval_unary(op: UnOp, value: Value) -> Result<Value, EvalError> {
    match (op, value) {
        (UnOp::Neg, Value::Integer(n)) => {
            n.checked_neg().map(Value::Integer).ok_or(EvalError::Overflow)
        }
        (UnOp::Neg, Value::Real(x)) => Ok(Value::Real(-x)),
        (UnOp::Plus, value @ (Value::Integer(_) | Value::Real(_))) => Ok(value),
        (UnOp::Not, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
        (op, value) => Err(EvalError::TypeMismatch(format!(
            "Cannot apply {op} to {}",
            value.type_name()
        ))),
    }
}
