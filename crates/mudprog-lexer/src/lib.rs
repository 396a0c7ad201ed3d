// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Lexical analysis for prog source text.
//!
//! Tokenization is done with logos. Comments (`//`, `#`, `/* */`) and
//! whitespace are skipped and never become tokens. Keyword and operator
//! display strings live in one table, indexed by discriminant.
//!
//! ```
//! # use mudprog_lexer::*;
//! # use logos::Logos;
//! let tokens: Vec<Result<Token, ()>> = Token::lexer("return 2 + 2;").collect();
//! assert_eq!(tokens.len(), 5);
//! ```

use logos::Logos;
use mudprog_foundation::Span;
use std::rc::Rc;

/// Prog language token.
///
/// # Layout
///
/// `#[repr(u16)]` keeps discriminants stable so simple tokens can index
/// `TOKEN_STRINGS` for display.
#[derive(Logos, Debug, Clone, PartialEq)]
#[repr(u16)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"#[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum Token {
    // === Keywords ===
    /// Keyword `var`
    #[token("var")]
    Var,
    /// Keyword `if`
    #[token("if")]
    If,
    /// Keyword `else`
    #[token("else")]
    Else,
    /// Keyword `while`
    #[token("while")]
    While,
    /// Keyword `for`
    #[token("for")]
    For,
    /// Keyword `in`
    #[token("in")]
    In,
    /// Keyword `break`
    #[token("break")]
    Break,
    /// Keyword `continue`
    #[token("continue")]
    Continue,
    /// Keyword `return`
    #[token("return")]
    Return,
    /// Boolean literal `true`
    #[token("true")]
    True,
    /// Boolean literal `false`
    #[token("false")]
    False,
    /// Keyword `null`
    #[token("null")]
    Null,

    // === Operators ===
    /// Operator `+`
    #[token("+")]
    Plus,
    /// Operator `-`
    #[token("-")]
    Minus,
    /// Operator `*`
    #[token("*")]
    Star,
    /// Operator `/`
    #[token("/")]
    Slash,
    /// Operator `%`
    #[token("%")]
    Percent,
    /// Operator `==`
    #[token("==")]
    EqEq,
    /// Operator `!=`
    #[token("!=")]
    BangEq,
    /// Operator `<`
    #[token("<")]
    Lt,
    /// Operator `<=`
    #[token("<=")]
    LtEq,
    /// Operator `>`
    #[token(">")]
    Gt,
    /// Operator `>=`
    #[token(">=")]
    GtEq,
    /// Keyword `and`
    #[token("and")]
    And,
    /// Keyword `or`
    #[token("or")]
    Or,
    /// Keyword `not`
    #[token("not")]
    Not,
    /// Operator `=`
    #[token("=")]
    Eq,
    /// Operator `:`
    #[token(":")]
    Colon,
    /// Operator `.`
    #[token(".")]
    Dot,
    /// Operator `,`
    #[token(",")]
    Comma,
    /// Operator `;`
    #[token(";")]
    Semicolon,
    /// Operator `|` (lambda parameter delimiter)
    #[token("|")]
    Pipe,

    // === Delimiters ===
    /// Delimiter `(`
    #[token("(")]
    LParen,
    /// Delimiter `)`
    #[token(")")]
    RParen,
    /// Delimiter `{`
    #[token("{")]
    LBrace,
    /// Delimiter `}`
    #[token("}")]
    RBrace,
    /// Delimiter `[`
    #[token("[")]
    LBracket,
    /// Delimiter `]`
    #[token("]")]
    RBracket,

    // === Literals ===
    /// Number literal (e.g. `42`, `3.5`, `1e3`)
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    /// String literal, unescaped
    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape_string(&s[1..s.len() - 1]).map(|s| Rc::from(s.as_str()))
    })]
    String(Rc<str>),

    /// Identifier
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| Rc::from(lex.slice()))]
    Ident(Rc<str>),
}

/// Unescape string literal content.
fn unescape_string(s: &str) -> Option<String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next()? {
                'n' => result.push('\n'),
                'r' => result.push('\r'),
                't' => result.push('\t'),
                '\\' => result.push('\\'),
                '"' => result.push('"'),
                '\'' => result.push('\''),
                _ => return None,
            }
        } else {
            result.push(c);
        }
    }
    Some(result)
}

/// Display strings for simple tokens, in discriminant order.
///
/// Must stay in step with the `#[token]` attributes above.
const TOKEN_STRINGS: &[&str] = &[
    "var", "if", "else", "while", "for", "in", "break", "continue", "return", "true", "false",
    "null", // keywords
    "+", "-", "*", "/", "%", // arithmetic
    "==", "!=", "<", "<=", ">", ">=", // comparison
    "and", "or", "not", // logic
    "=", ":", ".", ",", ";", "|", // punctuation
    "(", ")", "{", "}", "[", "]", // delimiters
];

impl Token {
    /// Index into `TOKEN_STRINGS` for simple tokens.
    fn token_string_index(&self) -> usize {
        // Safe: Token is #[repr(u16)], so the discriminant is the leading u16
        let discriminant = unsafe { *(self as *const Token as *const u16) };
        discriminant as usize
    }

    /// True for tokens that can begin a statement after an error.
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            Token::Var
                | Token::If
                | Token::While
                | Token::For
                | Token::Break
                | Token::Continue
                | Token::Return
        )
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::String(s) => write!(f, "\"{}\"", s),
            Token::Ident(id) => write!(f, "{}", id),
            _ => match TOKEN_STRINGS.get(self.token_string_index()) {
                Some(s) => f.write_str(s),
                None => write!(f, "{:?}", self),
            },
        }
    }
}

/// A character sequence that is not a valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// Offending source range
    pub span: Span,
    /// The unrecognised text
    pub text: String,
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unrecognised input '{}'", self.text)
    }
}

impl std::error::Error for LexError {}

/// Tokenize a whole source text, pairing each token with its byte span.
///
/// Collects every invalid sequence rather than stopping at the first.
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>, Vec<LexError>> {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let mut lexer = Token::lexer(source);
    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = Span::new(range.start as u32, range.end as u32);
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => errors.push(LexError {
                span,
                text: lexer.slice().to_string(),
            }),
        }
    }
    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Token::lexer(source)
            .filter_map(|result| result.ok())
            .collect()
    }

    fn ident(s: &str) -> Token {
        Token::Ident(Rc::from(s))
    }

    fn string(s: &str) -> Token {
        Token::String(Rc::from(s))
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            lex("var if else while for in break continue return"),
            vec![
                Token::Var,
                Token::If,
                Token::Else,
                Token::While,
                Token::For,
                Token::In,
                Token::Break,
                Token::Continue,
                Token::Return,
            ]
        );
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        assert_eq!(lex("variable iffy"), vec![ident("variable"), ident("iffy")]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            lex("42 3.5 1e3"),
            vec![Token::Number(42.0), Token::Number(3.5), Token::Number(1000.0)]
        );
    }

    #[test]
    fn test_strings_unescape() {
        assert_eq!(
            lex(r#""hello" "a\"b" "line\n""#),
            vec![string("hello"), string("a\"b"), string("line\n")]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            lex("+ - * / % == != < <= > >= = and or not"),
            vec![
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
                Token::Percent,
                Token::EqEq,
                Token::BangEq,
                Token::Lt,
                Token::LtEq,
                Token::Gt,
                Token::GtEq,
                Token::Eq,
                Token::And,
                Token::Or,
                Token::Not,
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        let source = "var x = 1; // trailing\n# hash comment\n/* block\n * comment */ return x;";
        assert_eq!(
            lex(source),
            vec![
                Token::Var,
                ident("x"),
                Token::Eq,
                Token::Number(1.0),
                Token::Semicolon,
                Token::Return,
                ident("x"),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_display_uses_table() {
        assert_eq!(Token::Var.to_string(), "var");
        assert_eq!(Token::Null.to_string(), "null");
        assert_eq!(Token::GtEq.to_string(), ">=");
        assert_eq!(Token::Pipe.to_string(), "|");
        assert_eq!(Token::RBracket.to_string(), "]");
        assert_eq!(ident("who").to_string(), "who");
    }

    #[test]
    fn test_tokenize_spans() {
        let tokens = tokenize("return 2;").unwrap();
        assert_eq!(tokens[0].1, Span::new(0, 6));
        assert_eq!(tokens[1].1, Span::new(7, 8));
    }

    #[test]
    fn test_tokenize_reports_bad_input() {
        let errors = tokenize("var x = 1 @ 2;").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].text, "@");
    }
}
