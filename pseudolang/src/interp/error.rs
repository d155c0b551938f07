//! Runtime errors for the interpreter

use super::TraceFrame;
use crate::ast::DeclaredType;
use crate::error::{Diagnostic, EvalError};
use std::fmt;

/// Runtime error during interpretation
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    /// Line of the failing statement, filled in by the engine
    pub line: Option<usize>,
    /// Call chain at the failing statement, frame 0 first
    pub trace: Vec<TraceFrame>,
}

/// Kinds of runtime errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Identifier used without a declaration
    NoDeclaration,
    /// Identifier declared twice in one frame
    ReDeclaration,
    /// Keyword or malformed identifier
    Name,
    Type,
    Syntax,
    StackOverflow,
    /// Reading standard input failed
    Io,
    General,
}

impl ErrorKind {
    pub fn label(self) -> Option<&'static str> {
        match self {
            ErrorKind::NoDeclaration | ErrorKind::ReDeclaration => Some("Declaration Error"),
            ErrorKind::Name => Some("Name Error"),
            ErrorKind::Type => Some("Type Error"),
            ErrorKind::Syntax => Some("Syntax Error"),
            ErrorKind::StackOverflow => Some("Stack Overflow Error"),
            ErrorKind::Io => Some("IO Error"),
            ErrorKind::General => None,
        }
    }
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        RuntimeError {
            kind,
            message: message.into(),
            line: None,
            trace: Vec::new(),
        }
    }

    pub fn undeclared(name: &str) -> Self {
        Self::new(
            ErrorKind::NoDeclaration,
            format!("You did not declare the variable {name}"),
        )
    }

    pub fn redeclared(name: &str) -> Self {
        Self::new(
            ErrorKind::ReDeclaration,
            format!("You have already declared {name}"),
        )
    }

    pub fn keyword(name: &str) -> Self {
        Self::new(ErrorKind::Name, format!("{name} is a keyword"))
    }

    pub fn invalid_identifier() -> Self {
        Self::new(ErrorKind::Name, "Invalid Identifier")
    }

    pub fn already_used(name: &str) -> Self {
        Self::new(
            ErrorKind::Name,
            format!("Identifier '{name}' is already used"),
        )
    }

    pub fn type_mismatch(expected: DeclaredType, got: DeclaredType) -> Self {
        Self::new(
            ErrorKind::Type,
            format!("Data Type Mismatch: {expected} <- {got}"),
        )
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }

    pub fn constant_reassigned(name: &str) -> Self {
        Self::general(format!("Value cannot be reassigned to constant '{name}'"))
    }

    pub fn stack_overflow() -> Self {
        Self::new(
            ErrorKind::StackOverflow,
            "Call stack has reached maximum capacity",
        )
    }

    pub fn io_error(message: impl fmt::Display) -> Self {
        Self::new(ErrorKind::Io, message.to_string())
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::General, message)
    }

    /// Attach the failing line and call chain unless already located
    pub fn located(mut self, line: usize, trace: impl FnOnce() -> Vec<TraceFrame>) -> Self {
        if self.line.is_none() {
            self.line = Some(line);
            self.trace = trace();
        }
        self
    }
}

impl From<EvalError> for RuntimeError {
    fn from(err: EvalError) -> Self {
        match err {
            EvalError::UnknownIdentifier(_) => RuntimeError::new(ErrorKind::Name, err.to_string()),
            EvalError::Unassigned(_) | EvalError::NotAValue(_) | EvalError::TypeMismatch(_) => {
                RuntimeError::type_error(err.to_string())
            }
            EvalError::InvalidExpression(_) => RuntimeError::syntax(err.to_string()),
            EvalError::DivisionByZero | EvalError::Overflow => {
                RuntimeError::general(err.to_string())
            }
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind.label(), self.line) {
            (Some(label), Some(line)) => write!(f, "{label} (Line {line}): {}", self.message),
            (Some(label), None) => write!(f, "{label}: {}", self.message),
            (None, Some(line)) => write!(f, "Line {line}: {}", self.message),
            (None, None) => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl Diagnostic for RuntimeError {
    fn label(&self) -> Option<&'static str> {
        self.kind.label()
    }

    fn line(&self) -> Option<usize> {
        self.line
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn trace(&self) -> &[TraceFrame] {
        &self.trace
    }
}

/// Result type for interpreter operations
pub type InterpResult<T> = Result<T, RuntimeError>;
