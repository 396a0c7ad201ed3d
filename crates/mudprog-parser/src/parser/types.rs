//! Type annotation parser.
//!
//! A type is written as its display name: a kind or union name, optionally
//! followed by a structural modifier (`Character Collection`,
//! `Text Dictionary`, `Item CollectionDictionary`).

use super::{ParseError, TokenStream};
use mudprog_foundation::ProgType;
use mudprog_lexer::Token;

const STRUCTURE_WORDS: &[&str] = &["collection", "dictionary", "collectiondictionary"];

/// Parse a type annotation.
pub fn parse_type(stream: &mut TokenStream) -> Result<ProgType, ParseError> {
    let start = stream.current_pos();
    let (tag, _) = stream.expect_ident("where a type name was expected")?;
    let mut text = tag;
    if let Some(Token::Ident(word)) = stream.peek()
        && STRUCTURE_WORDS.iter().any(|w| word.eq_ignore_ascii_case(w))
    {
        text.push(' ');
        text.push_str(word);
        stream.advance();
    }
    text.parse::<ProgType>()
        .map_err(|e| ParseError::invalid_syntax(e.to_string(), stream.span_from(start)))
}
