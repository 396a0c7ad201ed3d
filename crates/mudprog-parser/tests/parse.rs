//! Parser tests over real source text.

use logos::Logos;
use mudprog_ast::{BinaryOp, ExprKind, StmtKind, UnaryOp};
use mudprog_foundation::{ProgType, Span};
use mudprog_parser::{
    MAX_NESTING, ParseErrorKind, Token, parse_expr, parse_program, parse_tokens,
};

fn lex(source: &str) -> Vec<(Token, Span)> {
    Token::lexer(source)
        .spanned()
        .map(|(tok, range)| {
            (
                tok.expect("lexing failed"),
                Span::new(range.start as u32, range.end as u32),
            )
        })
        .collect()
}

fn parse(source: &str) -> Vec<mudprog_ast::Stmt> {
    parse_tokens(&lex(source)).expect("parse failed")
}

#[test]
fn test_return_arithmetic_precedence() {
    let stmts = parse("return 2 + 3 * 4;");
    let StmtKind::Return(Some(expr)) = &stmts[0].kind else {
        panic!("expected return");
    };
    let ExprKind::Binary { op, right, .. } = &expr.kind else {
        panic!("expected binary");
    };
    assert_eq!(*op, BinaryOp::Add);
    assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
}

#[test]
fn test_left_associative_subtraction() {
    let expr = parse_expr("10 - 4 - 3").unwrap();
    let ExprKind::Binary { left, .. } = &expr.kind else {
        panic!("expected binary");
    };
    assert!(matches!(left.kind, ExprKind::Binary { op: BinaryOp::Sub, .. }));
}

#[test]
fn test_logic_binds_looser_than_comparison() {
    let expr = parse_expr("a < 1 or not b").unwrap();
    let ExprKind::Binary { op, left, right } = &expr.kind else {
        panic!("expected binary");
    };
    assert_eq!(*op, BinaryOp::Or);
    assert!(matches!(left.kind, ExprKind::Binary { op: BinaryOp::Lt, .. }));
    assert!(matches!(right.kind, ExprKind::Unary { op: UnaryOp::Not, .. }));
}

#[test]
fn test_var_forms() {
    let stmts = parse("var a: Number = 1; var b = \"x\"; var c: Character Collection;");
    assert!(matches!(
        &stmts[0].kind,
        StmtKind::Var { ty: Some(ProgType::NUMBER), init: Some(_), .. }
    ));
    assert!(matches!(&stmts[1].kind, StmtKind::Var { ty: None, init: Some(_), .. }));
    match &stmts[2].kind {
        StmtKind::Var { ty, init, .. } => {
            assert_eq!(*ty, Some(ProgType::CHARACTER.collection()));
            assert!(init.is_none());
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_var_needs_type_or_value() {
    let errors = parse_program("var x;").unwrap_err();
    assert_eq!(errors[0].kind, ParseErrorKind::InvalidSyntax);
}

#[test]
fn test_unknown_type_is_reported() {
    let errors = parse_program("var x: Dragon = 1;").unwrap_err();
    assert!(errors[0].message.contains("Dragon"));
}

#[test]
fn test_method_syntax_rewrites_to_call() {
    let expr = parse_expr("who.name").unwrap();
    let ExprKind::Call { name, args, method, .. } = &expr.kind else {
        panic!("expected call");
    };
    assert_eq!(name, "name");
    assert_eq!(args.len(), 1);
    assert!(*method);

    let expr = parse_expr("text.substring(0, 2)").unwrap();
    let ExprKind::Call { args, .. } = &expr.kind else {
        panic!("expected call");
    };
    assert_eq!(args.len(), 3);
}

#[test]
fn test_extension_lambda() {
    let expr = parse_expr("people.where(|p| p.name == \"Bob\")").unwrap();
    let ExprKind::Call { name, args, .. } = &expr.kind else {
        panic!("expected call");
    };
    assert_eq!(name, "where");
    assert!(args[1].is_lambda());
}

#[test]
fn test_bare_lambda_rejected() {
    assert!(parse_expr("|x| x").is_err());
}

#[test]
fn test_literals() {
    let expr = parse_expr("[1, 2, 3]").unwrap();
    assert!(matches!(&expr.kind, ExprKind::Collection(items) if items.len() == 3));
    let expr = parse_expr("{\"a\": 1, \"b\": 2}").unwrap();
    assert!(matches!(&expr.kind, ExprKind::Dictionary(entries) if entries.len() == 2));
    assert!(parse_expr("{\"a\": 1, \"a\": 2}").is_err());
}

#[test]
fn test_if_else_chain() {
    let stmts = parse("if a { return 1; } else if b { return 2; } else { return 3; }");
    let StmtKind::If { branches, otherwise } = &stmts[0].kind else {
        panic!("expected if");
    };
    assert_eq!(branches.len(), 2);
    assert!(otherwise.is_some());
}

#[test]
fn test_loops() {
    let stmts = parse("for x in xs { if x > 2 { break; } continue; } while true { break; }");
    assert!(matches!(&stmts[0].kind, StmtKind::ForEach { variable, .. } if variable == "x"));
    assert!(matches!(&stmts[1].kind, StmtKind::While { .. }));
}

#[test]
fn test_assignment_forms() {
    let stmts = parse("x = 1; d[\"k\"] = 2; send(who, \"hi\");");
    assert!(matches!(&stmts[0].kind, StmtKind::Assign { name, .. } if name == "x"));
    assert!(matches!(&stmts[1].kind, StmtKind::IndexAssign { name, .. } if name == "d"));
    assert!(matches!(&stmts[2].kind, StmtKind::Expr(_)));
}

#[test]
fn test_non_call_statement_rejected() {
    let errors = parse_program("1 + 2;").unwrap_err();
    assert!(errors[0].message.contains("only calls"));
}

#[test]
fn test_recovers_and_reports_several_errors() {
    let errors = parse_program("var = 1;\nreturn 2 +;\nreturn 3;").unwrap_err();
    assert_eq!(errors.len(), 2);
}

#[test]
fn test_missing_semicolon_at_eof() {
    let errors = parse_program("return 1").unwrap_err();
    assert_eq!(errors[0].kind, ParseErrorKind::UnexpectedEof);
}

#[test]
fn test_spans_cover_statement() {
    let source = "var total = 1 + 2;";
    let stmts = parse(source);
    assert_eq!(stmts[0].span, Span::new(0, source.len() as u32));
}

#[test]
fn test_lex_error_surfaces() {
    let errors = parse_program("return 1 @ 2;").unwrap_err();
    assert!(errors[0].message.contains('@'));
}

#[test]
fn test_empty_program() {
    assert!(parse_program("// nothing here\n").unwrap().is_empty());
}

#[test]
fn test_deep_nesting_is_an_error_not_a_crash() {
    let deep = 10_000;
    let parens = format!("return {}1{};", "(".repeat(deep), ")".repeat(deep));
    let errors = parse_program(&parens).unwrap_err();
    assert_eq!(errors[0].kind, ParseErrorKind::InvalidSyntax);
    assert!(errors[0].message.contains("nesting"));

    let negations = format!("return {}1;", "-".repeat(deep));
    assert!(parse_program(&negations).is_err());

    let blocks = format!("{}{}", "if true { ".repeat(deep), "}".repeat(deep));
    assert!(parse_program(&blocks).is_err());
}

#[test]
fn test_moderate_nesting_parses() {
    let depth = MAX_NESTING / 2;
    let parens = format!("return {}1{};", "(".repeat(depth), ")".repeat(depth));
    assert!(parse_program(&parens).is_ok());

    let blocks = format!("{}{}", "if true { ".repeat(depth), "}".repeat(depth));
    assert!(parse_program(&blocks).is_ok());
}
