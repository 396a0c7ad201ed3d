//! Recursive descent parser.
//!
//! ## Architecture
//!
//! - `stream`: TokenStream wrapper with lookahead
//! - `error`: ParseError and its constructors
//! - `expr`: Expression parser using Pratt parsing
//! - `stmt`: Statement and block parsers
//! - `types`: Type annotation parser

mod error;
mod expr;
mod stmt;
mod stream;
mod types;

pub use error::{ParseError, ParseErrorKind};
pub use stream::MAX_NESTING;
use stream::TokenStream;

use mudprog_ast::{Block, Expr};
use mudprog_foundation::Span;
use mudprog_lexer::{Token, tokenize};

fn lex(source: &str) -> Result<Vec<(Token, Span)>, Vec<ParseError>> {
    tokenize(source).map_err(|errors| {
        errors
            .into_iter()
            .map(|e| ParseError::invalid_syntax(e.to_string(), e.span))
            .collect()
    })
}

/// Parse a whole prog body.
///
/// Reports every statement-level error it can recover from, not just the
/// first.
pub fn parse_program(source: &str) -> Result<Block, Vec<ParseError>> {
    let tokens = lex(source)?;
    parse_tokens(&tokens)
}

/// Parse pre-lexed tokens with their spans into a statement block.
pub fn parse_tokens(tokens: &[(Token, Span)]) -> Result<Block, Vec<ParseError>> {
    let mut stream = TokenStream::new(tokens);
    stmt::parse_statements(&mut stream)
}

/// Parse a single expression (used by tooling and tests).
pub fn parse_expr(source: &str) -> Result<Expr, Vec<ParseError>> {
    let tokens = lex(source)?;
    let mut stream = TokenStream::new(&tokens);
    let expr = expr::parse_expr(&mut stream).map_err(|e| vec![e])?;
    if let Some(token) = stream.peek() {
        return Err(vec![ParseError::unexpected_token(
            Some(token),
            "after expression",
            stream.current_span(),
        )]);
    }
    Ok(expr)
}
