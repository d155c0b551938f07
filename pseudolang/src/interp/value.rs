//! Runtime values for the interpreter

use crate::ast::DeclaredType;
use std::fmt;

/// Runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Text(String),
    Char(char),
    Boolean(bool),
}

impl Value {
    /// Declared type this value satisfies
    pub fn declared_type(&self) -> DeclaredType {
        match self {
            Value::Integer(_) => DeclaredType::Integer,
            Value::Real(_) => DeclaredType::Real,
            Value::Text(_) => DeclaredType::String,
            Value::Char(_) => DeclaredType::Char,
            Value::Boolean(_) => DeclaredType::Boolean,
        }
    }

    /// Get type name for error messages
    pub fn type_name(&self) -> &'static str {
        self.declared_type().name()
    }

    /// Try to convert to f64
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(x) => Some(*x),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Convert one line of user input to a value of type `ty`
    pub fn from_input(ty: DeclaredType, line: &str) -> Option<Value> {
        match ty {
            DeclaredType::Integer => line.trim().parse().ok().map(Value::Integer),
            DeclaredType::Real => line.trim().parse().ok().map(Value::Real),
            DeclaredType::String => Some(Value::Text(line.to_string())),
            DeclaredType::Char => {
                let mut chars = line.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Value::Char(c)),
                    _ => None,
                }
            }
            DeclaredType::Boolean => match line.trim() {
                "TRUE" => Some(Value::Boolean(true)),
                "FALSE" => Some(Value::Boolean(false)),
                _ => None,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            // Reals always show a fractional part
            Value::Real(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 => {
                write!(f, "{x:.1}")
            }
            Value::Real(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
            Value::Char(c) => write!(f, "{c}"),
            Value::Boolean(true) => f.write_str("TRUE"),
            Value::Boolean(false) => f.write_str("FALSE"),
        }
    }
}
