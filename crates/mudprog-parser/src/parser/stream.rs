//! Token stream wrapper for the hand-written parser.

use mudprog_foundation::Span;
use mudprog_lexer::Token;

/// Deepest nesting of expressions and blocks the parser accepts.
pub const MAX_NESTING: usize = 100;

/// Token stream with lookahead and position tracking.
///
/// Each token is paired with its byte span so errors and nodes carry
/// accurate source locations.
pub struct TokenStream<'src> {
    tokens: &'src [(Token, Span)],
    pos: usize,
    depth: usize,
}

impl<'src> TokenStream<'src> {
    /// Create a new token stream.
    pub fn new(tokens: &'src [(Token, Span)]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Run `parse` one nesting level deeper, failing past [`MAX_NESTING`].
    pub fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, super::ParseError>,
    ) -> Result<T, super::ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(super::ParseError::invalid_syntax(
                format!("nesting deeper than {} levels", MAX_NESTING),
                self.current_span(),
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> Option<&'src Token> {
        self.tokens.get(self.pos).map(|(tok, _)| tok)
    }

    /// Peek at the nth token ahead without consuming.
    pub fn peek_nth(&self, n: usize) -> Option<&'src Token> {
        self.tokens.get(self.pos + n).map(|(tok, _)| tok)
    }

    /// Advance to the next token and return the current one.
    pub fn advance(&mut self) -> Option<&'src Token> {
        let token = self.tokens.get(self.pos).map(|(tok, _)| tok);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Check if the current token matches the expected token kind.
    pub fn check(&self, expected: &Token) -> bool {
        matches!(self.peek(), Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Expect a specific token and advance if it matches.
    pub fn expect(&mut self, expected: Token) -> Result<Span, super::ParseError> {
        if self.check(&expected) {
            let span = self.current_span();
            self.advance();
            Ok(span)
        } else {
            Err(super::ParseError::expected_token(
                expected,
                self.peek().cloned(),
                self.current_span(),
            ))
        }
    }

    /// Expect an identifier and return its name and span.
    pub fn expect_ident(&mut self, context: &str) -> Result<(String, Span), super::ParseError> {
        let span = self.current_span();
        match self.peek() {
            Some(Token::Ident(name)) => {
                self.advance();
                Ok((name.to_string(), span))
            }
            other => Err(super::ParseError::unexpected_token(other, context, span)),
        }
    }

    /// Check if we've reached the end of the token stream.
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Current position in the token stream.
    pub fn current_pos(&self) -> usize {
        self.pos
    }

    /// Span from the token at `start` to the last consumed token.
    pub fn span_from(&self, start: usize) -> Span {
        let Some((_, first)) = self.tokens.get(start) else {
            return self.current_span();
        };
        let end = match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some((_, last)) if self.pos > start => last.end,
            _ => first.end,
        };
        Span::new(first.start, end)
    }

    /// Span of the current token, or an empty span at end of input.
    pub fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some((_, span)) => *span,
            None => self
                .tokens
                .last()
                .map(|(_, span)| Span::new(span.end, span.end))
                .unwrap_or_else(Span::zero),
        }
    }

    /// Skip to a point where statement parsing can resume.
    ///
    /// Stops after a `;`, or before a `}` or statement keyword.
    pub fn synchronize(&mut self) {
        while let Some(token) = self.peek() {
            if token.starts_statement() || matches!(token, Token::RBrace) {
                break;
            }
            self.advance();
            if matches!(token, Token::Semicolon) {
                break;
            }
        }
    }
}
