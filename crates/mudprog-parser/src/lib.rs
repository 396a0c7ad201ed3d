//! Hand-written recursive descent parser for prog source text.
//!
//! Statements are keyword-dispatched; expressions use Pratt parsing.

pub mod parser;

pub use parser::{
    MAX_NESTING, ParseError, ParseErrorKind, parse_expr, parse_program, parse_tokens,
};

// Re-export lexer
pub use mudprog_lexer::Token;
