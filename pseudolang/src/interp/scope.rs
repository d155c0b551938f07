//! Call stack and scope resolution
//!
//! Each procedure invocation gets a frame with its own binding table. Names
//! are resolved in two different ways:
//!
//! - expression evaluation sees every frame of the active call chain, later
//!   frames shadowing earlier ones (dynamic scoping, not lexical);
//! - assignment targets are looked up in the local frame, then in the global
//!   frame only.

use super::env::{Binding, Scope};
use super::error::{InterpResult, RuntimeError};

/// Name of the implicit outermost procedure
pub const MAIN: &str = "MAIN";

/// One entry of an error's call-chain trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceFrame {
    /// Line of the call site
    pub line: usize,
    pub name: String,
}

/// Activation record
#[derive(Debug, Clone)]
pub struct Frame {
    pub name: String,
    pub bindings: Scope,
    pub call_line: usize,
    /// Set by RETURN, consumed by the innermost running statement list
    pub pending_return: bool,
}

impl Frame {
    pub fn new(name: impl Into<String>, call_line: usize) -> Self {
        Frame {
            name: name.into(),
            bindings: Scope::new(),
            call_line,
            pending_return: false,
        }
    }
}

/// Bounded stack of frames, index 0 is MAIN
#[derive(Debug)]
pub struct CallStack {
    frames: Vec<Frame>,
    capacity: usize,
}

impl CallStack {
    pub fn new(capacity: usize) -> Self {
        CallStack {
            frames: Vec::new(),
            capacity,
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Push a frame; fails once the stack is full
    pub fn push(&mut self, frame: Frame) -> InterpResult<()> {
        if self.frames.len() >= self.capacity {
            return Err(RuntimeError::stack_overflow());
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    /// Bindings of frame 0
    pub fn global(&self) -> Option<&Scope> {
        self.frames.first().map(|frame| &frame.bindings)
    }

    /// Bindings of the top frame
    pub fn local(&self) -> Option<&Scope> {
        self.top().map(|frame| &frame.bindings)
    }

    pub fn local_mut(&mut self) -> Option<&mut Scope> {
        self.top_mut().map(|frame| &mut frame.bindings)
    }

    /// Every frame of the active chain, used for expression evaluation
    pub fn scope_view(&self) -> ScopeView<'_> {
        ScopeView {
            frames: &self.frames,
        }
    }

    /// Scope view without the top frame
    pub fn caller_view(&self) -> ScopeView<'_> {
        let end = self.frames.len().saturating_sub(1);
        ScopeView {
            frames: &self.frames[..end],
        }
    }

    /// Assignment target lookup: local frame, then global frame
    pub fn lookup_assignable(&self, name: &str) -> Option<&Binding> {
        self.local()
            .and_then(|scope| scope.get(name))
            .or_else(|| self.global().and_then(|scope| scope.get(name)))
    }

    pub fn lookup_assignable_mut(&mut self, name: &str) -> Option<&mut Binding> {
        let top = self.frames.len().checked_sub(1)?;
        if self.frames[top].bindings.contains(name) {
            return self.frames[top].bindings.get_mut(name);
        }
        self.frames.first_mut()?.bindings.get_mut(name)
    }

    /// Call chain from MAIN to the top frame
    pub fn trace(&self) -> Vec<TraceFrame> {
        self.frames
            .iter()
            .map(|frame| TraceFrame {
                line: frame.call_line,
                name: frame.name.clone(),
            })
            .collect()
    }
}

/// Read-only view over a run of frames, innermost last
#[derive(Debug, Clone, Copy)]
pub struct ScopeView<'a> {
    frames: &'a [Frame],
}

impl<'a> ScopeView<'a> {
    /// Innermost binding of `name`
    pub fn get(&self, name: &str) -> Option<&'a Binding> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.bindings.get(name))
    }
}
