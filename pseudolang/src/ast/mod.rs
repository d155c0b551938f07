//! Instruction tree definitions

mod expr;
mod span;
mod types;

pub use expr::*;
pub use span::*;
pub use types::*;

use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// A sequence of instructions executed in order
pub type Block = Vec<Spanned<Instruction>>;

/// A parsed program: the body of the implicit MAIN procedure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub body: Block,
}

/// One node of the instruction tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// Empty source line
    Blank,

    /// DECLARE a, b : TYPE
    Declare {
        identifiers: Vec<String>,
        ty: DeclaredType,
    },

    /// CONSTANT X = expr
    Constant { identifier: String, expr: String },

    /// // text
    Comment(String),

    /// X <- expr
    Assignment { identifier: String, expr: String },

    /// INPUT X
    Input { identifier: String },

    /// OUTPUT e1, e2, ...
    Output { exprs: Vec<String> },

    /// IF / ELSE IF / ELSE / ENDIF chain.
    /// `conditions` and `branches` always have the same length.
    If {
        conditions: Vec<Condition>,
        branches: Vec<Block>,
    },

    /// FOR id <- lower TO upper [STEP step] ... NEXT id
    For {
        identifier: String,
        lower: String,
        upper: String,
        step: String,
        body: Block,
    },

    /// WHILE cond ... ENDWHILE
    While { condition: String, body: Block },

    /// REPEAT ... UNTIL cond
    Repeat { body: Block, condition: String },

    /// PROCEDURE Name(params) ... ENDPROCEDURE
    Procedure(Rc<ProcedureDef>),

    /// FUNCTION Name(params) RETURNS TYPE ... ENDFUNCTION
    Function(Rc<FunctionDef>),

    /// CALL Name(args)
    Call { identifier: String, args: Vec<String> },

    /// RETURN expr
    Return { expr: String },

    /// Line with an unrecognised opcode; inert at execution
    Unknown(String),
}

/// Guard of one IF branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    Expr(String),
    /// ELSE: always taken if reached
    Else,
}

/// Routine parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: DeclaredType,
}

/// Procedure definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureDef {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Block,
}

/// Function definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: DeclaredType,
    pub body: Block,
}

/// Kind of a block-structured construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    If,
    For,
    While,
    Repeat,
    Procedure,
    Function,
}

impl BlockKind {
    /// Keyword that opens the block
    pub fn opener(self) -> &'static str {
        match self {
            BlockKind::If => "IF",
            BlockKind::For => "FOR",
            BlockKind::While => "WHILE",
            BlockKind::Repeat => "REPEAT",
            BlockKind::Procedure => "PROCEDURE",
            BlockKind::Function => "FUNCTION",
        }
    }

    /// Keyword that closes the block
    pub fn closer(self) -> &'static str {
        match self {
            BlockKind::If => "ENDIF",
            BlockKind::For => "NEXT",
            BlockKind::While => "ENDWHILE",
            BlockKind::Repeat => "UNTIL",
            BlockKind::Procedure => "ENDPROCEDURE",
            BlockKind::Function => "ENDFUNCTION",
        }
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.opener())
    }
}

impl Instruction {
    /// Block kind for block-structured instructions
    pub fn block_kind(&self) -> Option<BlockKind> {
        match self {
            Instruction::If { .. } => Some(BlockKind::If),
            Instruction::For { .. } => Some(BlockKind::For),
            Instruction::While { .. } => Some(BlockKind::While),
            Instruction::Repeat { .. } => Some(BlockKind::Repeat),
            Instruction::Procedure(_) => Some(BlockKind::Procedure),
            Instruction::Function(_) => Some(BlockKind::Function),
            _ => None,
        }
    }
}
