//! Statement execution
//!
//! Walks the instruction tree produced by the block parser. Nested statement
//! lists (IF branches, loop bodies and routine bodies) go through
//! [`Interpreter::execute_block`], which is also where a pending RETURN is
//! observed. The program body never checks the flag, so a top-level RETURN
//! only marks MAIN's frame.

use super::env::{Binding, Callable, Scope};
use super::error::{ErrorKind, InterpResult, RuntimeError};
use super::eval::evaluate;
use super::scope::{CallStack, Frame, MAIN};
use super::value::Value;
use super::Config;
use crate::ast::{Condition, DeclaredType, Instruction, Program, Span, Spanned};
use crate::error::EvalError;
use crate::lexer::{is_keyword, is_valid_identifier};
use std::io::{BufRead, Write};
use std::rc::Rc;

/// Stack growth parameters for deeply nested blocks and calls
const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// The interpreter
pub struct Interpreter<'io> {
    config: Config,
    stack: CallStack,
    /// Line of the statement being executed
    line: usize,
    input: &'io mut dyn BufRead,
    output: &'io mut dyn Write,
}

impl<'io> Interpreter<'io> {
    pub fn new(config: Config, input: &'io mut dyn BufRead, output: &'io mut dyn Write) -> Self {
        Interpreter {
            config,
            stack: CallStack::new(config.stack_capacity),
            line: 1,
            input,
            output,
        }
    }

    /// Run a program as the body of MAIN
    pub fn run(&mut self, program: &Program) -> InterpResult<()> {
        self.stack = CallStack::new(self.config.stack_capacity);
        self.line = 1;
        self.stack
            .push(Frame::new(MAIN, 1))
            .map_err(|err| err.located(1, Vec::new))?;
        tracing::debug!(statements = program.body.len(), "run");
        for statement in &program.body {
            self.execute(statement)?;
        }
        Ok(())
    }

    pub fn call_stack(&self) -> &CallStack {
        &self.stack
    }

    /// Value of a global variable or constant
    pub fn global_value(&self, name: &str) -> Option<&Value> {
        self.stack
            .global()
            .and_then(|scope| scope.get(name))
            .and_then(Binding::value)
    }

    /// Execute a statement list, stopping at a pending RETURN
    fn execute_block(&mut self, block: &[Spanned<Instruction>]) -> InterpResult<()> {
        for statement in block {
            if self.take_pending_return() {
                tracing::debug!(line = self.line, "returned to previous scope");
                break;
            }
            self.execute(statement)?;
        }
        Ok(())
    }

    fn take_pending_return(&mut self) -> bool {
        match self.stack.top_mut() {
            Some(frame) if frame.pending_return => {
                frame.pending_return = false;
                true
            }
            _ => false,
        }
    }

    /// Execute a statement with automatic stack growth for deep nesting
    fn execute(&mut self, statement: &Spanned<Instruction>) -> InterpResult<()> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.line = statement.span.start;
            tracing::debug!(
                line = self.line,
                frame = self.stack.top().map(|frame| frame.name.as_str()),
                depth = self.stack.depth(),
                "execute"
            );
            tracing::trace!(instruction = ?statement.node);
            self.execute_inner(&statement.node, statement.span)
                .map_err(|err| err.located(self.line, || self.stack.trace()))
        })
    }

    fn execute_inner(&mut self, node: &Instruction, span: Span) -> InterpResult<()> {
        match node {
            Instruction::Blank | Instruction::Comment(_) | Instruction::Unknown(_) => Ok(()),

            Instruction::Declare { identifiers, ty } => {
                for identifier in identifiers {
                    self.declare(identifier, Binding::Variable { ty: *ty, value: None })?;
                }
                Ok(())
            }

            Instruction::Constant { identifier, expr } => {
                let value = self.eval_in_scope(expr)?;
                let binding = Binding::Constant {
                    ty: value.declared_type(),
                    value,
                };
                self.declare(identifier, binding)
            }

            Instruction::Assignment { identifier, expr } => {
                let ty = self.assignable_type(identifier)?;
                let value = self.eval_in_scope(expr)?;
                self.store(identifier, ty, value)
            }

            Instruction::Input { identifier } => self.input(identifier),

            Instruction::Output { exprs } => self.output(exprs),

            Instruction::If {
                conditions,
                branches,
            } => {
                let mut taken = false;
                for (condition, branch) in conditions.iter().zip(branches) {
                    self.line = span.start;
                    let result = match condition {
                        Condition::Else => true,
                        Condition::Expr(expr) => self.condition(expr)?,
                    };
                    if branch.is_empty() {
                        return Err(RuntimeError::general("No Statements Inside Block"));
                    }
                    if result && !taken {
                        taken = true;
                        self.execute_block(branch)?;
                    } else if self.take_pending_return() {
                        // A skipped branch still consumes a pending RETURN
                        tracing::debug!(line = self.line, "returned to previous scope");
                    }
                }
                Ok(())
            }

            Instruction::For {
                identifier,
                lower,
                upper,
                step,
                body,
            } => {
                let lower = self.integer(lower, "lower bound")?;
                let upper = self.integer(upper, "upper bound")?;
                let step = self.integer(step, "step")?;
                if step == 0 {
                    return Err(RuntimeError::general("FOR step cannot be zero"));
                }

                // Bounds are inclusive
                let end = if upper >= lower {
                    upper.checked_add(1)
                } else {
                    upper.checked_sub(1)
                }
                .ok_or_else(|| RuntimeError::from(EvalError::Overflow))?;

                let mut index = lower;
                while (step > 0 && index < end) || (step < 0 && index > end) {
                    self.line = span.start;
                    let ty = self.assignable_type(identifier)?;
                    self.store(identifier, ty, Value::Integer(index))?;
                    self.execute_block(body)?;
                    match index.checked_add(step) {
                        Some(next) => index = next,
                        None => break,
                    }
                }
                Ok(())
            }

            Instruction::While { condition, body } => {
                while self.condition(condition)? {
                    self.execute_block(body)?;
                    self.line = span.start;
                }
                Ok(())
            }

            Instruction::Repeat { body, condition } => loop {
                self.execute_block(body)?;
                self.line = span.end;
                if self.condition(condition)? {
                    return Ok(());
                }
            },

            Instruction::Procedure(def) => {
                self.define_routine(Callable::Procedure { def: Rc::clone(def) }, span)
            }

            Instruction::Function(def) => {
                self.define_routine(Callable::Function { def: Rc::clone(def) }, span)
            }

            Instruction::Call { identifier, args } => self.call(identifier, args, span.start),

            Instruction::Return { .. } => {
                if let Some(frame) = self.stack.top_mut() {
                    frame.pending_return = true;
                }
                Ok(())
            }
        }
    }

    fn local_scope(&mut self) -> InterpResult<&mut Scope> {
        self.stack
            .local_mut()
            .ok_or_else(|| RuntimeError::general("No active procedure"))
    }

    /// Bind a new identifier in the top frame
    fn declare(&mut self, name: &str, binding: Binding) -> InterpResult<()> {
        if is_keyword(name) {
            return Err(RuntimeError::keyword(name));
        }
        let scope = self.local_scope()?;
        if scope.contains(name) {
            return Err(RuntimeError::redeclared(name));
        }
        if !is_valid_identifier(name) {
            return Err(RuntimeError::invalid_identifier());
        }
        tracing::debug!(name, kind = binding.describe(), "declared");
        scope.define(name, binding);
        Ok(())
    }

    fn define_routine(&mut self, callable: Callable, span: Span) -> InterpResult<()> {
        let name = callable.name().to_string();
        let scope = self.local_scope()?;
        if scope.contains(&name) {
            return Err(RuntimeError::already_used(&name));
        }
        tracing::debug!(
            name = %name,
            kind = callable.kind(),
            lines = span.line_count(),
            "routine created"
        );
        scope.define(name, Binding::Callable(callable));
        Ok(())
    }

    /// Declared type of an assignment target
    fn assignable_type(&self, name: &str) -> InterpResult<DeclaredType> {
        writable_type(name, self.stack.lookup_assignable(name))
    }

    /// Overwrite a variable after checking the value's type
    fn store(&mut self, name: &str, ty: DeclaredType, value: Value) -> InterpResult<()> {
        if value.declared_type() != ty {
            return Err(RuntimeError::type_mismatch(ty, value.declared_type()));
        }
        tracing::debug!(name, %value, "assigned");
        if let Some(Binding::Variable { value: slot, .. }) = self.stack.lookup_assignable_mut(name)
        {
            *slot = Some(value);
        }
        Ok(())
    }

    fn eval_in_scope(&self, expr: &str) -> InterpResult<Value> {
        evaluate(expr, &self.stack.scope_view()).map_err(RuntimeError::from)
    }

    fn condition(&self, expr: &str) -> InterpResult<bool> {
        let value = self.eval_in_scope(expr)?;
        value.as_bool().ok_or_else(|| {
            RuntimeError::type_error(format!(
                "Condition must be BOOLEAN, got {}",
                value.type_name()
            ))
        })
    }

    fn integer(&self, expr: &str, what: &str) -> InterpResult<i64> {
        match self.eval_in_scope(expr)? {
            Value::Integer(n) => Ok(n),
            other => Err(RuntimeError::type_error(format!(
                "FOR {what} must be INTEGER, got {}",
                other.type_name()
            ))),
        }
    }

    /// INPUT only reaches variables of the running frame
    fn input(&mut self, identifier: &str) -> InterpResult<()> {
        let local = self.stack.local().and_then(|scope| scope.get(identifier));
        let ty = writable_type(identifier, local)?;
        loop {
            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .map_err(RuntimeError::io_error)?;
            if read == 0 {
                return Err(RuntimeError::io_error("Unexpected end of input"));
            }
            let text = line.trim_end_matches(['\n', '\r']);
            match Value::from_input(ty, text) {
                Some(value) => return self.store(identifier, ty, value),
                None => tracing::debug!(input = text, expected = %ty, "input rejected"),
            }
        }
    }

    /// Values are written as they are evaluated, so a failing expression
    /// leaves the earlier ones on the line
    fn output(&mut self, exprs: &[String]) -> InterpResult<()> {
        for expr in exprs {
            if expr.is_empty() {
                return Err(RuntimeError::general("Output expression is missing"));
            }
            let value = evaluate(expr, &self.stack.scope_view()).map_err(|err| match err {
                EvalError::UnknownIdentifier(_) => RuntimeError::from(err),
                _ => {
                    tracing::debug!(error = %err, "output expression failed");
                    RuntimeError::general(format!("Cannot evaluate the expression, {expr}"))
                }
            })?;
            write!(self.output, "{value}").map_err(RuntimeError::io_error)?;
        }
        writeln!(self.output).map_err(RuntimeError::io_error)?;
        self.output.flush().map_err(RuntimeError::io_error)
    }

    fn call(&mut self, identifier: &str, args: &[String], call_line: usize) -> InterpResult<()> {
        let def = match self.stack.lookup_assignable(identifier) {
            None => {
                return Err(RuntimeError::new(
                    ErrorKind::NoDeclaration,
                    format!("Unknown identifier '{identifier}'"),
                ));
            }
            Some(Binding::Callable(Callable::Procedure { def })) => Rc::clone(def),
            Some(other) => {
                return Err(RuntimeError::syntax(format!(
                    "CALL cannot be used with {} '{identifier}'",
                    other.describe()
                )));
            }
        };

        if def.params.len() != args.len() {
            return Err(RuntimeError::general(
                "Number of arguments must match number of parameters",
            ));
        }

        self.stack.push(Frame::new(def.name.as_str(), call_line))?;
        tracing::debug!(
            procedure = %def.name,
            depth = self.stack.depth(),
            "call"
        );

        for (param, arg) in def.params.iter().zip(args) {
            self.declare(
                &param.name,
                Binding::Variable {
                    ty: param.ty,
                    value: None,
                },
            )?;
            let value = evaluate(arg, &self.stack.caller_view()).map_err(RuntimeError::from)?;
            self.store(&param.name, param.ty, value)?;
        }

        self.execute_block(&def.body)?;
        self.stack.pop();
        self.line = call_line;
        Ok(())
    }
}

/// Declared type of a binding that may be overwritten
fn writable_type(name: &str, binding: Option<&Binding>) -> InterpResult<DeclaredType> {
    match binding {
        None => Err(RuntimeError::undeclared(name)),
        Some(Binding::Constant { .. }) => Err(RuntimeError::constant_reassigned(name)),
        Some(Binding::Callable(callable)) => Err(RuntimeError::type_error(format!(
            "Cannot assign a value to {} '{name}'",
            callable.kind()
        ))),
        Some(Binding::Variable { ty, .. }) => Ok(*ty),
    }
}
