//! Block stack parser
//!
//! Turns flat, indentation-free source lines into a nested instruction tree.
//! Every opener (IF, FOR, WHILE, REPEAT, PROCEDURE, FUNCTION) pushes an open
//! block that collects the following lines until its matching closer pops it
//! and appends the finished node to the enclosing block.

mod expr;
mod header;

#[cfg(test)]
mod tests;

pub use expr::parse_expr;
pub use header::{Header, parse_header};

use crate::ast::{
    Block, BlockKind, Condition, DeclaredType, FunctionDef, Instruction, ProcedureDef, Program,
    Span, Spanned,
};
use crate::error::{ParseError, Result};
use std::rc::Rc;

/// Maximum number of simultaneously open blocks
pub const MAX_NESTING: usize = 256;

/// Parse program source text
pub fn parse(source: &str) -> Result<Program> {
    let lines: Vec<&str> = source.lines().collect();
    parse_lines(&lines)
}

/// Parse program lines; line numbers are 1-based positions in `lines`
pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> Result<Program> {
    let mut parser = BlockParser::default();
    for (index, text) in lines.iter().enumerate() {
        parser.parse_line(text.as_ref().trim(), index + 1)?;
    }
    parser.finish()
}

/// Node under construction, waiting for its closer
#[derive(Debug)]
enum Opener {
    If {
        /// Includes the condition of the branch currently being collected
        conditions: Vec<Condition>,
        /// Completed branches
        branches: Vec<Block>,
    },
    For {
        identifier: String,
        lower: String,
        upper: String,
        step: String,
    },
    While {
        condition: String,
    },
    Repeat,
    Procedure(Header),
    Function(Header, DeclaredType),
}

impl Opener {
    fn kind(&self) -> BlockKind {
        match self {
            Opener::If { .. } => BlockKind::If,
            Opener::For { .. } => BlockKind::For,
            Opener::While { .. } => BlockKind::While,
            Opener::Repeat => BlockKind::Repeat,
            Opener::Procedure(_) => BlockKind::Procedure,
            Opener::Function(..) => BlockKind::Function,
        }
    }
}

#[derive(Debug)]
struct OpenBlock {
    line: usize,
    opener: Opener,
    body: Block,
}

#[derive(Debug, Default)]
struct BlockParser {
    root: Block,
    open: Vec<OpenBlock>,
}

impl BlockParser {
    /// Block currently being appended to
    fn current(&mut self) -> &mut Block {
        match self.open.last_mut() {
            Some(block) => &mut block.body,
            None => &mut self.root,
        }
    }

    fn push(&mut self, node: Instruction, span: Span) {
        tracing::debug!(%span, instruction = ?node, "parsed");
        self.current().push(Spanned::new(node, span));
    }

    fn open(&mut self, opener: Opener, line: usize) -> Result<()> {
        if self.open.len() >= MAX_NESTING {
            return Err(ParseError::block("Blocks are nested too deeply", line));
        }
        tracing::trace!(line, kind = %opener.kind(), "open block");
        self.open.push(OpenBlock {
            line,
            opener,
            body: Vec::new(),
        });
        Ok(())
    }

    /// Pop the innermost open block, which must be of `kind`
    fn close(&mut self, kind: BlockKind, line: usize) -> Result<OpenBlock> {
        match self.open.pop() {
            Some(block) if block.opener.kind() == kind => Ok(block),
            _ => Err(ParseError::block(closer_misuse(kind), line)),
        }
    }

    fn parse_line(&mut self, text: &str, line: usize) -> Result<()> {
        let parts: Vec<&str> = text.split_whitespace().collect();
        let Some(&opcode) = parts.first() else {
            self.push(Instruction::Blank, Span::line(line));
            return Ok(());
        };

        if parts.get(1) == Some(&"<-") {
            let node = Instruction::Assignment {
                identifier: opcode.to_string(),
                expr: rest_after(text, 2).to_string(),
            };
            self.push(node, Span::line(line));
            return Ok(());
        }

        if let Some(comment) = text.strip_prefix("//") {
            self.push(Instruction::Comment(comment.trim().to_string()), Span::line(line));
            return Ok(());
        }

        match opcode {
            "DECLARE" => {
                let node = parse_declare(rest_after(text, 1), line)?;
                self.push(node, Span::line(line));
            }
            "CONSTANT" => {
                let (identifier, expr) = rest_after(text, 1)
                    .split_once('=')
                    .ok_or_else(|| ParseError::syntax("CONSTANT requires '='", line))?;
                let node = Instruction::Constant {
                    identifier: identifier.trim().to_string(),
                    expr: expr.trim().to_string(),
                };
                self.push(node, Span::line(line));
            }
            "INPUT" => {
                let identifier = parts
                    .get(1)
                    .ok_or_else(|| ParseError::parse("Input identifier is missing", line))?;
                let node = Instruction::Input {
                    identifier: identifier.to_string(),
                };
                self.push(node, Span::line(line));
            }
            "OUTPUT" => {
                let exprs = split_top_level(rest_after(text, 1));
                self.push(Instruction::Output { exprs }, Span::line(line));
            }
            "IF" => {
                let condition = then_condition(text, &parts, 1, line)?;
                self.open(
                    Opener::If {
                        conditions: vec![Condition::Expr(condition)],
                        branches: Vec::new(),
                    },
                    line,
                )?;
            }
            "ELSE" => {
                let condition = match parts.get(1) {
                    None => Condition::Else,
                    Some(&"IF") => Condition::Expr(then_condition(text, &parts, 2, line)?),
                    Some(_) => return Err(ParseError::syntax("Invalid ELSE Syntax", line)),
                };
                self.else_branch(condition, line)?;
            }
            "ENDIF" => {
                let block = self.close(BlockKind::If, line)?;
                let Opener::If {
                    conditions,
                    mut branches,
                } = block.opener
                else {
                    return Err(ParseError::block(closer_misuse(BlockKind::If), line));
                };
                branches.push(block.body);
                self.push(
                    Instruction::If {
                        conditions,
                        branches,
                    },
                    Span::new(block.line, line),
                );
            }
            "FOR" => {
                let opener = parse_for(&parts, line)?;
                self.open(opener, line)?;
            }
            "NEXT" => {
                let block = self.close(BlockKind::For, line)?;
                let Opener::For {
                    identifier,
                    lower,
                    upper,
                    step,
                } = block.opener
                else {
                    return Err(ParseError::block(closer_misuse(BlockKind::For), line));
                };
                let next = parts
                    .get(1)
                    .ok_or_else(|| ParseError::syntax("Identifier missing after NEXT", line))?;
                if *next != identifier {
                    return Err(ParseError::block(
                        format!("Identifier Mismatch: {identifier} vs {next}"),
                        line,
                    ));
                }
                self.push(
                    Instruction::For {
                        identifier,
                        lower,
                        upper,
                        step,
                        body: block.body,
                    },
                    Span::new(block.line, line),
                );
            }
            "WHILE" => {
                let condition = rest_after(text, 1).to_string();
                self.open(Opener::While { condition }, line)?;
            }
            "ENDWHILE" => {
                let block = self.close(BlockKind::While, line)?;
                let Opener::While { condition } = block.opener else {
                    return Err(ParseError::block(closer_misuse(BlockKind::While), line));
                };
                self.push(
                    Instruction::While {
                        condition,
                        body: block.body,
                    },
                    Span::new(block.line, line),
                );
            }
            "REPEAT" => self.open(Opener::Repeat, line)?,
            "UNTIL" => {
                let block = self.close(BlockKind::Repeat, line)?;
                self.push(
                    Instruction::Repeat {
                        body: block.body,
                        condition: rest_after(text, 1).to_string(),
                    },
                    Span::new(block.line, line),
                );
            }
            "PROCEDURE" => {
                let header = parse_header(rest_after(text, 1), line)?;
                self.open(Opener::Procedure(header), line)?;
            }
            "ENDPROCEDURE" => {
                let block = self.close(BlockKind::Procedure, line)?;
                let Opener::Procedure(header) = block.opener else {
                    return Err(ParseError::block(closer_misuse(BlockKind::Procedure), line));
                };
                let def = ProcedureDef {
                    name: header.name,
                    params: header.params,
                    body: block.body,
                };
                self.push(
                    Instruction::Procedure(Rc::new(def)),
                    Span::new(block.line, line),
                );
            }
            "FUNCTION" => {
                let opener = parse_function(&parts, line)?;
                self.open(opener, line)?;
            }
            "ENDFUNCTION" => {
                let block = self.close(BlockKind::Function, line)?;
                let Opener::Function(header, return_type) = block.opener else {
                    return Err(ParseError::block(closer_misuse(BlockKind::Function), line));
                };
                let def = FunctionDef {
                    name: header.name,
                    params: header.params,
                    return_type,
                    body: block.body,
                };
                self.push(
                    Instruction::Function(Rc::new(def)),
                    Span::new(block.line, line),
                );
            }
            "CALL" => {
                let node = parse_call(rest_after(text, 1), line)?;
                self.push(node, Span::line(line));
            }
            "RETURN" => {
                let node = Instruction::Return {
                    expr: rest_after(text, 1).to_string(),
                };
                self.push(node, Span::line(line));
            }
            _ => self.push(Instruction::Unknown(text.to_string()), Span::line(line)),
        }

        Ok(())
    }

    /// Close the current IF branch and start a new one on the same node
    fn else_branch(&mut self, condition: Condition, line: usize) -> Result<()> {
        match self.open.last_mut() {
            Some(OpenBlock {
                opener:
                    Opener::If {
                        conditions,
                        branches,
                    },
                body,
                ..
            }) => {
                branches.push(std::mem::take(body));
                conditions.push(condition);
                Ok(())
            }
            _ => Err(ParseError::block("ELSE must be used inside IF", line)),
        }
    }

    fn finish(self) -> Result<Program> {
        if let Some(block) = self.open.last() {
            return Err(ParseError::Unclosed {
                kind: block.opener.kind(),
                line: block.line,
            });
        }
        Ok(Program { body: self.root })
    }
}

fn closer_misuse(kind: BlockKind) -> String {
    match kind {
        BlockKind::If => "ENDIF must be used after IF".to_string(),
        BlockKind::For => "NEXT Must Be Used After FOR".to_string(),
        BlockKind::While => "ENDWHILE must be used after WHILE".to_string(),
        BlockKind::Repeat => "UNTIL must be used after REPEAT".to_string(),
        BlockKind::Procedure | BlockKind::Function => {
            format!("{} cannot be used without {}", kind.closer(), kind.opener())
        }
    }
}

/// Text after the first `n` whitespace-separated tokens, trimmed
fn rest_after(text: &str, n: usize) -> &str {
    let mut rest = text.trim_start();
    for _ in 0..n {
        rest = rest
            .find(char::is_whitespace)
            .map_or("", |i| &rest[i..])
            .trim_start();
    }
    rest.trim_end()
}

/// Condition of `IF cond THEN` / `ELSE IF cond THEN`
fn then_condition(text: &str, parts: &[&str], skip: usize, line: usize) -> Result<String> {
    if parts.len() <= skip || parts.last() != Some(&"THEN") {
        return Err(ParseError::syntax("THEN missing after IF", line));
    }
    let rest = rest_after(text, skip);
    let condition = rest.strip_suffix("THEN").unwrap_or(rest);
    Ok(condition.trim_end().to_string())
}

/// Split on commas that are outside quotes and parentheses
fn split_top_level(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut depth = 0usize;

    for c in text.chars() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    parts.push(current.trim().to_string());
    parts
}

fn parse_declare(text: &str, line: usize) -> Result<Instruction> {
    let split: Vec<&str> = text.split(':').map(str::trim).collect();
    let [identifiers, ty] = split.as_slice() else {
        return Err(ParseError::syntax("Invalid Syntax: Must Use One Colon", line));
    };
    let ty = ty
        .parse::<DeclaredType>()
        .map_err(|_| ParseError::type_error("Invalid Data Type", line))?;
    Ok(Instruction::Declare {
        identifiers: identifiers.split(',').map(|s| s.trim().to_string()).collect(),
        ty,
    })
}

/// `FOR id <- lower TO upper [STEP step]`
fn parse_for(parts: &[&str], line: usize) -> Result<Opener> {
    let well_formed = parts.len() >= 6
        && parts[2] == "<-"
        && parts[4] == "TO"
        && (parts.len() == 6 || (parts.len() == 8 && parts[6] == "STEP"));
    if !well_formed {
        return Err(ParseError::syntax("Invalid FOR Syntax", line));
    }

    let (lower, upper) = (parts[3], parts[5]);
    // The default direction compares the bound tokens as text, not as numbers
    let step = match parts.get(7) {
        Some(step) => step.to_string(),
        None if upper >= lower => "1".to_string(),
        None => "-1".to_string(),
    };

    Ok(Opener::For {
        identifier: parts[1].to_string(),
        lower: lower.to_string(),
        upper: upper.to_string(),
        step,
    })
}

/// `FUNCTION Name(params) RETURNS TYPE`
fn parse_function(parts: &[&str], line: usize) -> Result<Opener> {
    let return_type = parts
        .last()
        .and_then(|ty| ty.parse::<DeclaredType>().ok())
        .ok_or_else(|| ParseError::type_error("Invalid Data Type", line))?;
    if parts.len() < 3 || parts[parts.len() - 2] != "RETURNS" {
        return Err(ParseError::syntax("RETURNS is missing", line));
    }
    let header = parse_header(&parts[1..parts.len() - 2].join(" "), line)?;
    Ok(Opener::Function(header, return_type))
}

/// `CALL Name(args)`
fn parse_call(text: &str, line: usize) -> Result<Instruction> {
    let invalid = || ParseError::syntax("Invalid CALL Syntax", line);
    let (name, rest) = text.split_once('(').ok_or_else(invalid)?;
    let name = name.trim();
    let inner = rest.trim_end().strip_suffix(')').ok_or_else(invalid)?;
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(invalid());
    }
    let args = if inner.trim().is_empty() {
        Vec::new()
    } else {
        split_top_level(inner)
    };
    Ok(Instruction::Call {
        identifier: name.to_string(),
        args,
    })
}
