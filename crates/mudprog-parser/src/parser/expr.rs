//! Expression parser using Pratt parsing (precedence climbing).
//!
//! ## Precedence Levels (lowest to highest)
//!
//! 1. `or`
//! 2. `and`
//! 3. `==`, `!=`, `<`, `<=`, `>`, `>=`
//! 4. `+`, `-`
//! 5. `*`, `/`, `%`
//! 6. Unary `-`, `not`
//! 7. Postfix: `.name`, `.name(args)`, `(args)`, `[index]`
//!
//! All binary operators are left associative.

use super::{ParseError, TokenStream};
use mudprog_ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use mudprog_lexer::Token;

/// Get binary operator metadata: (precedence, operator).
///
/// Higher precedence binds tighter.
fn binary_op_info(token: &Token) -> Option<(u8, BinaryOp)> {
    match token {
        Token::Or => Some((10, BinaryOp::Or)),
        Token::And => Some((20, BinaryOp::And)),
        Token::EqEq => Some((30, BinaryOp::Eq)),
        Token::BangEq => Some((30, BinaryOp::Ne)),
        Token::Lt => Some((30, BinaryOp::Lt)),
        Token::LtEq => Some((30, BinaryOp::Le)),
        Token::Gt => Some((30, BinaryOp::Gt)),
        Token::GtEq => Some((30, BinaryOp::Ge)),
        Token::Plus => Some((40, BinaryOp::Add)),
        Token::Minus => Some((40, BinaryOp::Sub)),
        Token::Star => Some((50, BinaryOp::Mul)),
        Token::Slash => Some((50, BinaryOp::Div)),
        Token::Percent => Some((50, BinaryOp::Mod)),
        _ => None,
    }
}

/// Parse an expression.
pub fn parse_expr(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    stream.nested(|stream| parse_pratt(stream, 0))
}

fn parse_pratt(stream: &mut TokenStream, min_prec: u8) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let mut left = parse_prefix(stream)?;

    while let Some(token) = stream.peek() {
        let Some((prec, op)) = binary_op_info(token) else {
            break;
        };
        if prec < min_prec {
            break;
        }
        stream.advance();
        let right = parse_pratt(stream, prec + 1)?;
        left = Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            stream.span_from(start),
        );
    }

    Ok(left)
}

fn parse_prefix(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let op = match stream.peek() {
        Some(Token::Minus) => UnaryOp::Neg,
        Some(Token::Not) => UnaryOp::Not,
        _ => return parse_postfix(stream),
    };
    let start = stream.current_pos();
    stream.advance();
    let operand = stream.nested(parse_prefix)?;
    Ok(Expr::new(
        ExprKind::Unary {
            op,
            operand: Box::new(operand),
        },
        stream.span_from(start),
    ))
}

fn parse_postfix(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let mut expr = parse_atom(stream)?;

    loop {
        match stream.peek() {
            Some(Token::Dot) => {
                stream.advance();
                let (name, name_span) = stream.expect_ident("after '.'")?;
                let mut args = vec![expr];
                if stream.check(&Token::LParen) {
                    args.extend(parse_call_args(stream)?);
                }
                expr = Expr::new(
                    ExprKind::Call {
                        name,
                        name_span,
                        args,
                        method: true,
                    },
                    stream.span_from(start),
                );
            }
            Some(Token::LParen) => {
                let ExprKind::Identifier(name) = &expr.kind else {
                    return Err(ParseError::invalid_syntax(
                        "only named functions can be called",
                        stream.current_span(),
                    ));
                };
                let name = name.clone();
                let name_span = expr.span;
                let args = parse_call_args(stream)?;
                expr = Expr::new(
                    ExprKind::Call {
                        name,
                        name_span,
                        args,
                        method: false,
                    },
                    stream.span_from(start),
                );
            }
            Some(Token::LBracket) => {
                stream.advance();
                let index = parse_expr(stream)?;
                stream.expect(Token::RBracket)?;
                expr = Expr::new(
                    ExprKind::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                    },
                    stream.span_from(start),
                );
            }
            _ => break,
        }
    }

    Ok(expr)
}

/// Parse `(a, b, ...)`; a lambda is allowed in any position.
fn parse_call_args(stream: &mut TokenStream) -> Result<Vec<Expr>, ParseError> {
    stream.expect(Token::LParen)?;
    let mut args = Vec::new();
    while !stream.check(&Token::RParen) {
        if stream.at_end() {
            return Err(ParseError::unexpected_token(
                None,
                "in argument list",
                stream.current_span(),
            ));
        }
        if stream.check(&Token::Pipe) {
            args.push(parse_lambda(stream)?);
        } else {
            args.push(parse_expr(stream)?);
        }
        if !stream.check(&Token::RParen) {
            stream.expect(Token::Comma)?;
        }
    }
    stream.expect(Token::RParen)?;
    Ok(args)
}

/// Parse `|x| body`.
fn parse_lambda(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Pipe)?;
    let (param, _) = stream.expect_ident("as lambda parameter")?;
    stream.expect(Token::Pipe)?;
    let body = parse_expr(stream)?;
    Ok(Expr::new(
        ExprKind::Lambda {
            param,
            body: Box::new(body),
        },
        stream.span_from(start),
    ))
}

fn parse_atom(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let span = stream.current_span();

    let kind = match stream.peek() {
        Some(Token::Number(n)) => {
            stream.advance();
            ExprKind::Number(*n)
        }
        Some(Token::String(s)) => {
            stream.advance();
            ExprKind::Text(s.to_string())
        }
        Some(Token::True) => {
            stream.advance();
            ExprKind::Boolean(true)
        }
        Some(Token::False) => {
            stream.advance();
            ExprKind::Boolean(false)
        }
        Some(Token::Null) => {
            stream.advance();
            ExprKind::Null
        }
        Some(Token::Ident(name)) => {
            stream.advance();
            ExprKind::Identifier(name.to_string())
        }
        Some(Token::LParen) => {
            stream.advance();
            let inner = parse_expr(stream)?;
            stream.expect(Token::RParen)?;
            return Ok(inner);
        }
        Some(Token::LBracket) => return parse_collection_literal(stream),
        Some(Token::LBrace) => return parse_dictionary_literal(stream),
        Some(Token::Pipe) => {
            return Err(ParseError::invalid_syntax(
                "a lambda can only appear as a function argument",
                span,
            ));
        }
        other => return Err(ParseError::unexpected_token(other, "in expression", span)),
    };

    Ok(Expr::new(kind, stream.span_from(start)))
}

/// Parse `[expr, expr, ...]`.
fn parse_collection_literal(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::LBracket)?;

    let mut elements = Vec::new();
    while !stream.check(&Token::RBracket) {
        elements.push(parse_expr(stream)?);
        if !stream.check(&Token::RBracket) {
            stream.expect(Token::Comma)?;
        }
    }
    stream.expect(Token::RBracket)?;

    Ok(Expr::new(
        ExprKind::Collection(elements),
        stream.span_from(start),
    ))
}

/// Parse `{"key": expr, ...}`.
fn parse_dictionary_literal(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::LBrace)?;

    let mut entries: Vec<(String, Expr)> = Vec::new();
    while !stream.check(&Token::RBrace) {
        let key_span = stream.current_span();
        let key = match stream.advance() {
            Some(Token::String(s)) => s.to_string(),
            other => {
                return Err(ParseError::unexpected_token(
                    other,
                    "where a text dictionary key was expected",
                    key_span,
                ));
            }
        };
        if entries.iter().any(|(k, _)| *k == key) {
            return Err(ParseError::invalid_syntax(
                format!("duplicate dictionary key \"{}\"", key),
                key_span,
            ));
        }
        stream.expect(Token::Colon)?;
        entries.push((key, parse_expr(stream)?));
        if !stream.check(&Token::RBrace) {
            stream.expect(Token::Comma)?;
        }
    }
    stream.expect(Token::RBrace)?;

    Ok(Expr::new(
        ExprKind::Dictionary(entries),
        stream.span_from(start),
    ))
}
