//! Tree-walking interpreter for pseudocode programs

mod env;
mod error;
mod eval;
mod exec;
mod scope;
mod value;

pub use env::{Binding, Callable, Scope};
pub use error::{ErrorKind, InterpResult, RuntimeError};
pub use eval::{Resolve, eval_expr, evaluate};
pub use exec::Interpreter;
pub use scope::{CallStack, Frame, MAIN, ScopeView, TraceFrame};
pub use value::Value;

/// Default maximum number of simultaneously active frames, MAIN included
pub const DEFAULT_STACK_CAPACITY: usize = 256;

/// Interpreter settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub stack_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            stack_capacity: DEFAULT_STACK_CAPACITY,
        }
    }
}
