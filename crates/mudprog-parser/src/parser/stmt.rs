//! Statement and block parsers.

use super::{ParseError, TokenStream, expr, types};
use mudprog_ast::{Block, ExprKind, Stmt, StmtKind};
use mudprog_lexer::Token;

/// Parse statements until end of input, recovering at statement
/// boundaries so several errors can be reported at once.
pub fn parse_statements(stream: &mut TokenStream) -> Result<Block, Vec<ParseError>> {
    let mut statements = Vec::new();
    let mut errors = Vec::new();

    while !stream.at_end() {
        if stream.check(&Token::RBrace) {
            errors.push(ParseError::unexpected_token(
                stream.peek(),
                "outside of a block",
                stream.current_span(),
            ));
            stream.advance();
            continue;
        }
        let before = stream.current_pos();
        match parse_statement(stream) {
            Ok(stmt) => statements.push(stmt),
            Err(e) => {
                errors.push(e);
                stream.synchronize();
                if stream.current_pos() == before {
                    stream.advance();
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(statements)
    } else {
        Err(errors)
    }
}

/// Parse `{ statement* }`.
fn parse_block(stream: &mut TokenStream) -> Result<Block, ParseError> {
    stream.nested(parse_block_body)
}

fn parse_block_body(stream: &mut TokenStream) -> Result<Block, ParseError> {
    stream.expect(Token::LBrace)?;
    let mut statements = Vec::new();
    while !stream.check(&Token::RBrace) {
        if stream.at_end() {
            return Err(ParseError::expected_token(
                Token::RBrace,
                None,
                stream.current_span(),
            ));
        }
        statements.push(parse_statement(stream)?);
    }
    stream.expect(Token::RBrace)?;
    Ok(statements)
}

fn parse_statement(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let start = stream.current_pos();
    let kind = match stream.peek() {
        Some(Token::Var) => parse_var(stream)?,
        Some(Token::If) => parse_if(stream)?,
        Some(Token::While) => {
            stream.advance();
            let condition = expr::parse_expr(stream)?;
            let body = parse_block(stream)?;
            StmtKind::While { condition, body }
        }
        Some(Token::For) => {
            stream.advance();
            let (variable, _) = stream.expect_ident("as loop variable")?;
            stream.expect(Token::In)?;
            let collection = expr::parse_expr(stream)?;
            let body = parse_block(stream)?;
            StmtKind::ForEach {
                variable,
                collection,
                body,
            }
        }
        Some(Token::Break) => {
            stream.advance();
            stream.expect(Token::Semicolon)?;
            StmtKind::Break
        }
        Some(Token::Continue) => {
            stream.advance();
            stream.expect(Token::Semicolon)?;
            StmtKind::Continue
        }
        Some(Token::Return) => {
            stream.advance();
            let value = if stream.check(&Token::Semicolon) {
                None
            } else {
                Some(expr::parse_expr(stream)?)
            };
            stream.expect(Token::Semicolon)?;
            StmtKind::Return(value)
        }
        _ => parse_expression_statement(stream)?,
    };
    Ok(Stmt::new(kind, stream.span_from(start)))
}

/// `var name: Type = init;`
fn parse_var(stream: &mut TokenStream) -> Result<StmtKind, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Var)?;
    let (name, _) = stream.expect_ident("as variable name")?;
    let ty = if stream.eat(&Token::Colon) {
        Some(types::parse_type(stream)?)
    } else {
        None
    };
    let init = if stream.eat(&Token::Eq) {
        Some(expr::parse_expr(stream)?)
    } else {
        None
    };
    if ty.is_none() && init.is_none() {
        return Err(ParseError::invalid_syntax(
            format!("variable '{}' needs a type or an initial value", name),
            stream.span_from(start),
        ));
    }
    stream.expect(Token::Semicolon)?;
    Ok(StmtKind::Var { name, ty, init })
}

/// `if c { } else if c { } else { }`
fn parse_if(stream: &mut TokenStream) -> Result<StmtKind, ParseError> {
    let mut branches = Vec::new();
    let mut otherwise = None;

    stream.expect(Token::If)?;
    loop {
        let condition = expr::parse_expr(stream)?;
        let body = parse_block(stream)?;
        branches.push((condition, body));

        if !stream.eat(&Token::Else) {
            break;
        }
        if !stream.eat(&Token::If) {
            otherwise = Some(parse_block(stream)?);
            break;
        }
    }

    Ok(StmtKind::If {
        branches,
        otherwise,
    })
}

/// Assignment, index assignment, or a call evaluated for effect.
fn parse_expression_statement(stream: &mut TokenStream) -> Result<StmtKind, ParseError> {
    let target = expr::parse_expr(stream)?;

    if stream.eat(&Token::Eq) {
        let value = expr::parse_expr(stream)?;
        stream.expect(Token::Semicolon)?;
        return match target.kind {
            ExprKind::Identifier(name) => Ok(StmtKind::Assign { name, value }),
            ExprKind::Index {
                target: container,
                index,
            } => match container.kind {
                ExprKind::Identifier(name) => Ok(StmtKind::IndexAssign {
                    name,
                    index: *index,
                    value,
                }),
                _ => Err(ParseError::invalid_syntax(
                    "only a variable can be indexed on the left of '='",
                    container.span,
                )),
            },
            _ => Err(ParseError::invalid_syntax(
                "left side of '=' must be a variable or an indexed variable",
                target.span,
            )),
        };
    }

    stream.expect(Token::Semicolon)?;
    match target.kind {
        ExprKind::Call { .. } => Ok(StmtKind::Expr(target)),
        _ => Err(ParseError::invalid_syntax(
            "only calls can be used as statements",
            target.span,
        )),
    }
}
