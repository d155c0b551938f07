//! Pseudolang interpreter library
//!
//! Runs programs written in a line-oriented teaching pseudocode: source lines
//! are parsed into an instruction tree by a block stack parser, then executed
//! by a tree-walking interpreter with a bounded call stack.

pub mod ast;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod parser;

pub use ast::Span;
pub use error::{Diagnostic, EvalError, ParseError, Result};
pub use interp::{Config, RuntimeError};

use std::io::{BufRead, Write};
use thiserror::Error;

/// Any failure of a pseudocode run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PseudoError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl Diagnostic for PseudoError {
    fn label(&self) -> Option<&'static str> {
        match self {
            PseudoError::Parse(err) => err.label(),
            PseudoError::Runtime(err) => err.label(),
        }
    }

    fn line(&self) -> Option<usize> {
        match self {
            PseudoError::Parse(err) => Diagnostic::line(err),
            PseudoError::Runtime(err) => err.line,
        }
    }

    fn message(&self) -> String {
        match self {
            PseudoError::Parse(err) => err.message(),
            PseudoError::Runtime(err) => err.message.clone(),
        }
    }

    fn trace(&self) -> &[interp::TraceFrame] {
        match self {
            PseudoError::Parse(_) => &[],
            PseudoError::Runtime(err) => &err.trace,
        }
    }
}

/// Parse and execute a program, reading INPUT from `input` and writing
/// OUTPUT to `output`
pub fn run(
    source: &str,
    config: &Config,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> std::result::Result<(), PseudoError> {
    let program = parser::parse(source)?;
    let mut interpreter = interp::Interpreter::new(*config, input, output);
    interpreter.run(&program)?;
    Ok(())
}
