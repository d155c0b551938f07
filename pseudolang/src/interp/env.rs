//! Binding tables

use super::Value;
use crate::ast::{DeclaredType, FunctionDef, ProcedureDef};
use std::collections::HashMap;
use std::rc::Rc;

/// Routine bound to an identifier
#[derive(Debug, Clone)]
pub enum Callable {
    Procedure { def: Rc<ProcedureDef> },
    Function { def: Rc<FunctionDef> },
}

impl Callable {
    pub fn name(&self) -> &str {
        match self {
            Callable::Procedure { def } => &def.name,
            Callable::Function { def } => &def.name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Callable::Procedure { .. } => "PROCEDURE",
            Callable::Function { .. } => "FUNCTION",
        }
    }
}

/// What an identifier is bound to
#[derive(Debug, Clone)]
pub enum Binding {
    /// Mutable; unset until first assignment
    Variable {
        ty: DeclaredType,
        value: Option<Value>,
    },
    Constant {
        ty: DeclaredType,
        value: Value,
    },
    Callable(Callable),
}

impl Binding {
    /// Readable value, if this binding holds one
    pub fn value(&self) -> Option<&Value> {
        match self {
            Binding::Variable { value, .. } => value.as_ref(),
            Binding::Constant { value, .. } => Some(value),
            Binding::Callable(_) => None,
        }
    }

    /// Word describing the binding in error messages
    pub fn describe(&self) -> &'static str {
        match self {
            Binding::Variable { ty, .. } | Binding::Constant { ty, .. } => ty.name(),
            Binding::Callable(callable) => callable.kind(),
        }
    }
}

/// Binding table of one frame
#[derive(Debug, Clone, Default)]
pub struct Scope {
    bindings: HashMap<String, Binding>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a new identifier. Returns false if it was already bound.
    pub fn define(&mut self, name: impl Into<String>, binding: Binding) -> bool {
        match self.bindings.entry(name.into()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(binding);
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Binding> {
        self.bindings.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }
}
