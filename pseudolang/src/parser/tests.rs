//! Block stack parser tests

use crate::ast::{BlockKind, Condition, DeclaredType, Instruction, Param, Program, Span};
use crate::error::ParseError;
use crate::parser::{MAX_NESTING, parse, parse_lines};
use pretty_assertions::assert_eq;

/// Helper to parse and expect success
fn parse_ok(source: &str) -> Program {
    parse(source).expect("Parse should succeed")
}

/// Helper to parse and expect failure
fn parse_err(source: &str) -> ParseError {
    parse(source).expect_err("Parse should fail")
}

/// Helper returning the single top-level instruction
fn single(source: &str) -> Instruction {
    let program = parse_ok(source);
    assert_eq!(program.body.len(), 1, "expected one instruction");
    program.body[0].node.clone()
}

// ============================================
// Leaves
// ============================================

#[test]
fn test_parse_declare() {
    assert_eq!(
        single("DECLARE A, B , C : INTEGER"),
        Instruction::Declare {
            identifiers: vec!["A".into(), "B".into(), "C".into()],
            ty: DeclaredType::Integer,
        }
    );
}

#[test]
fn test_parse_declare_errors() {
    assert_eq!(
        parse_err("DECLARE X INTEGER"),
        ParseError::syntax("Invalid Syntax: Must Use One Colon", 1)
    );
    assert_eq!(
        parse_err("DECLARE X : Y : INTEGER"),
        ParseError::syntax("Invalid Syntax: Must Use One Colon", 1)
    );
    assert_eq!(
        parse_err("\nDECLARE X : NUMBER"),
        ParseError::type_error("Invalid Data Type", 2)
    );
}

#[test]
fn test_parse_constant() {
    assert_eq!(
        single("CONSTANT Limit = 10 = 10"),
        Instruction::Constant {
            identifier: "Limit".into(),
            expr: "10 = 10".into(),
        }
    );
    assert!(matches!(
        parse_err("CONSTANT Limit 10"),
        ParseError::Syntax { line: 1, .. }
    ));
}

#[test]
fn test_parse_assignment_keeps_raw_text() {
    assert_eq!(
        single("   Msg <- \"a  b\" + Name   "),
        Instruction::Assignment {
            identifier: "Msg".into(),
            expr: "\"a  b\" + Name".into(),
        }
    );
}

#[test]
fn test_parse_input() {
    assert_eq!(
        single("INPUT Age"),
        Instruction::Input {
            identifier: "Age".into()
        }
    );
    assert_eq!(
        parse_err("INPUT"),
        ParseError::parse("Input identifier is missing", 1)
    );
}

#[test]
fn test_parse_output_splits_top_level_commas() {
    assert_eq!(
        single(r#"OUTPUT "a, b", X, ',', (1 + 2) * 3"#),
        Instruction::Output {
            exprs: vec![
                "\"a, b\"".into(),
                "X".into(),
                "','".into(),
                "(1 + 2) * 3".into(),
            ],
        }
    );
}

#[test]
fn test_parse_comment_and_blank() {
    let program = parse_ok("// first\n\n//second");
    let nodes: Vec<_> = program.body.into_iter().map(|s| s.node).collect();
    assert_eq!(
        nodes,
        vec![
            Instruction::Comment("first".into()),
            Instruction::Blank,
            Instruction::Comment("second".into()),
        ]
    );
}

#[test]
fn test_parse_unknown_opcode() {
    let program = parse_ok("PRINT X\nOUTPUT 1");
    assert_eq!(program.body[0].node, Instruction::Unknown("PRINT X".into()));
    assert_eq!(program.body[1].span, Span::line(2));
}

#[test]
fn test_parse_call() {
    assert_eq!(
        single("CALL Greet(\"World\", 1 + 2)"),
        Instruction::Call {
            identifier: "Greet".into(),
            args: vec!["\"World\"".into(), "1 + 2".into()],
        }
    );
    assert_eq!(
        single("CALL Tick()"),
        Instruction::Call {
            identifier: "Tick".into(),
            args: Vec::new(),
        }
    );
    assert_eq!(
        parse_err("CALL Tick"),
        ParseError::syntax("Invalid CALL Syntax", 1)
    );
}

#[test]
fn test_parse_return() {
    assert_eq!(
        single("RETURN X * 2"),
        Instruction::Return {
            expr: "X * 2".into()
        }
    );
}

// ============================================
// Blocks
// ============================================

#[test]
fn test_parse_if_else_chain() {
    let source = "\
IF X > 1 THEN
OUTPUT 1
ELSE IF X = 1 THEN
OUTPUT 2
OUTPUT 3
ELSE
OUTPUT 4
ENDIF";
    let program = parse_ok(source);
    assert_eq!(program.body.len(), 1);
    assert_eq!(program.body[0].span, Span::new(1, 8));

    let Instruction::If {
        conditions,
        branches,
    } = &program.body[0].node
    else {
        panic!("Expected If");
    };
    assert_eq!(
        conditions,
        &vec![
            Condition::Expr("X > 1".into()),
            Condition::Expr("X = 1".into()),
            Condition::Else,
        ]
    );
    let sizes: Vec<usize> = branches.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![1, 2, 1]);
    assert_eq!(branches[1][1].span, Span::line(5));
}

#[test]
fn test_parse_if_requires_then() {
    assert_eq!(
        parse_err("IF X > 1\nENDIF"),
        ParseError::syntax("THEN missing after IF", 1)
    );
    assert_eq!(
        parse_err("IF X THEN\nOUTPUT 1\nELSE IF Y\nENDIF"),
        ParseError::syntax("THEN missing after IF", 3)
    );
    assert!(matches!(
        parse_err("IF X THEN\nOUTPUT 1\nELSE OUTPUT 2\nENDIF"),
        ParseError::Syntax { line: 3, .. }
    ));
}

#[test]
fn test_parse_else_outside_if() {
    assert!(matches!(
        parse_err("WHILE TRUE\nELSE\nENDWHILE"),
        ParseError::Block { line: 2, .. }
    ));
}

#[test]
fn test_parse_for_default_step() {
    let Instruction::For {
        identifier,
        lower,
        upper,
        step,
        body,
    } = single("FOR I <- 1 TO 5\nOUTPUT I\nNEXT I")
    else {
        panic!("Expected For");
    };
    assert_eq!(identifier, "I");
    assert_eq!((lower.as_str(), upper.as_str()), ("1", "5"));
    assert_eq!(step, "1");
    assert_eq!(body.len(), 1);

    let Instruction::For { step, .. } = single("FOR I <- 5 TO 1\nNEXT I") else {
        panic!("Expected For");
    };
    assert_eq!(step, "-1");
}

#[test]
fn test_parse_for_default_step_compares_text() {
    // "10" sorts before "9" as text, so the step is counted downwards
    let Instruction::For { step, .. } = single("FOR I <- 9 TO 10\nNEXT I") else {
        panic!("Expected For");
    };
    assert_eq!(step, "-1");
}

#[test]
fn test_parse_for_explicit_step() {
    let Instruction::For { step, .. } = single("FOR I <- 10 TO 0 STEP -2\nNEXT I") else {
        panic!("Expected For");
    };
    assert_eq!(step, "-2");
}

#[test]
fn test_parse_for_errors() {
    for source in [
        "FOR I <- 1 TO\nNEXT I",
        "FOR I = 1 TO 5\nNEXT I",
        "FOR I <- 1 UNTIL 5\nNEXT I",
        "FOR I <- 1 TO 5 BY 2\nNEXT I",
        "FOR I <- 1 TO 5 STEP\nNEXT I",
    ] {
        assert_eq!(
            parse_err(source),
            ParseError::syntax("Invalid FOR Syntax", 1),
            "{source:?}"
        );
    }
}

#[test]
fn test_parse_next_mismatch() {
    assert_eq!(
        parse_err("FOR I <- 1 TO 2\nNEXT J"),
        ParseError::block("Identifier Mismatch: I vs J", 2)
    );
    assert!(matches!(
        parse_err("FOR I <- 1 TO 2\nNEXT"),
        ParseError::Syntax { line: 2, .. }
    ));
}

#[test]
fn test_parse_while_and_repeat() {
    let program = parse_ok("WHILE X < 3\nX <- X + 1\nENDWHILE\nREPEAT\nX <- X - 1\nUNTIL X = 0");
    assert_eq!(program.body.len(), 2);
    assert_eq!(program.body[0].span, Span::new(1, 3));
    assert_eq!(program.body[1].span, Span::new(4, 6));
    assert!(matches!(
        &program.body[0].node,
        Instruction::While { condition, body } if condition == "X < 3" && body.len() == 1
    ));
    assert!(matches!(
        &program.body[1].node,
        Instruction::Repeat { condition, body } if condition == "X = 0" && body.len() == 1
    ));
}

#[test]
fn test_parse_procedure() {
    let program = parse_ok("PROCEDURE Greet(Name : STRING)\nOUTPUT \"Hello \", Name\nENDPROCEDURE");
    let Instruction::Procedure(def) = &program.body[0].node else {
        panic!("Expected Procedure");
    };
    assert_eq!(def.name, "Greet");
    assert_eq!(
        def.params,
        vec![Param {
            name: "Name".into(),
            ty: DeclaredType::String,
        }]
    );
    assert_eq!(def.body.len(), 1);
    assert_eq!(program.body[0].span, Span::new(1, 3));
}

#[test]
fn test_parse_function() {
    let Instruction::Function(def) =
        single("FUNCTION Square(N : INTEGER) RETURNS INTEGER\nRETURN N * N\nENDFUNCTION")
    else {
        panic!("Expected Function");
    };
    assert_eq!(def.name, "Square");
    assert_eq!(def.return_type, DeclaredType::Integer);
    assert_eq!(def.params.len(), 1);
}

#[test]
fn test_parse_function_header_errors() {
    assert_eq!(
        parse_err("FUNCTION F() RETURNS NUMBER\nENDFUNCTION"),
        ParseError::type_error("Invalid Data Type", 1)
    );
    assert_eq!(
        parse_err("FUNCTION F() INTEGER\nENDFUNCTION"),
        ParseError::syntax("RETURNS is missing", 1)
    );
    assert_eq!(
        parse_err("PROCEDURE P(A)\nENDPROCEDURE"),
        ParseError::syntax("Invalid Header", 1)
    );
}

#[test]
fn test_parse_nested_blocks() {
    let source = "\
PROCEDURE P()
FOR I <- 1 TO 3
IF I = 2 THEN
OUTPUT I
ENDIF
NEXT I
ENDPROCEDURE";
    let program = parse_ok(source);
    let Instruction::Procedure(def) = &program.body[0].node else {
        panic!("Expected Procedure");
    };
    let Instruction::For { body, .. } = &def.body[0].node else {
        panic!("Expected For");
    };
    assert_eq!(def.body[0].span, Span::new(2, 6));
    assert_eq!(body[0].span, Span::new(3, 5));
    assert_eq!(body[0].node.block_kind(), Some(BlockKind::If));
}

// ============================================
// Block pairing errors
// ============================================

#[test]
fn test_parse_closer_without_opener() {
    let cases = [
        ("ENDIF", "ENDIF must be used after IF"),
        ("NEXT I", "NEXT Must Be Used After FOR"),
        ("ENDWHILE", "ENDWHILE must be used after WHILE"),
        ("UNTIL TRUE", "UNTIL must be used after REPEAT"),
        ("ENDPROCEDURE", "ENDPROCEDURE cannot be used without PROCEDURE"),
        ("ENDFUNCTION", "ENDFUNCTION cannot be used without FUNCTION"),
    ];
    for (source, message) in cases {
        assert_eq!(parse_err(source), ParseError::block(message, 1));
    }
}

#[test]
fn test_parse_mismatched_closer() {
    assert_eq!(
        parse_err("WHILE TRUE\nENDIF"),
        ParseError::block("ENDIF must be used after IF", 2)
    );
}

#[test]
fn test_parse_unclosed_block_reports_innermost_opener() {
    let err = parse_err("WHILE TRUE\nOUTPUT 1\nIF X THEN\nOUTPUT 2");
    assert_eq!(
        err,
        ParseError::Unclosed {
            kind: BlockKind::If,
            line: 3,
        }
    );
    assert_eq!(err.to_string(), "IF block was not closed");
}

#[test]
fn test_parse_nesting_limit() {
    let mut lines = vec!["REPEAT"; MAX_NESTING + 1];
    lines.extend(vec!["UNTIL TRUE"; MAX_NESTING + 1]);
    assert_eq!(
        parse_lines(&lines),
        Err(ParseError::block(
            "Blocks are nested too deeply",
            MAX_NESTING + 1
        ))
    );

    let mut lines = vec!["REPEAT"; MAX_NESTING];
    lines.extend(vec!["UNTIL TRUE"; MAX_NESTING]);
    assert!(parse_lines(&lines).is_ok());
}

// ============================================
// Properties
// ============================================

#[test]
fn test_parse_is_deterministic() {
    let source = "\
DECLARE X : INTEGER
X <- 3 + 4 * 2
IF X > 10 THEN
OUTPUT \"big\"
ELSE
OUTPUT \"small\"
ENDIF
FOR I <- 1 TO X
OUTPUT I
NEXT I";
    assert_eq!(parse_ok(source), parse_ok(source));
}

#[test]
fn test_parse_lines_matches_parse() {
    let lines = ["DECLARE X : INTEGER", "X <- 1", "OUTPUT X"];
    assert_eq!(parse_lines(&lines).unwrap(), parse_ok(&lines.join("\n")));
}

#[test]
fn test_parse_crlf_lines() {
    let program = parse_ok("DECLARE X : INTEGER\r\nX <- 1\r\n");
    assert_eq!(program.body.len(), 2);
}
