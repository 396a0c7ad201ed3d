//! Compile-time diagnostics.
//!
//! - `CompileError`: one diagnostic with a primary span, optional labels
//!   and notes
//! - `ErrorKind`: what went wrong, grouped by checking phase
//! - `DiagnosticFormatter`: renders a diagnostic against the prog source
//!
//! ```
//! # use mudprog_compiler::error::*;
//! # use mudprog_foundation::Span;
//! let error = CompileError::new(
//!     ErrorKind::UndefinedName,
//!     Span::new(7, 10),
//!     "unknown name 'foo'".to_string(),
//! );
//! let text = DiagnosticFormatter::new("greet", "return foo;").format(&error);
//! assert!(text.contains("--> greet:1:8"));
//! ```

use mudprog_foundation::Span;
use mudprog_parser::ParseError;
use std::fmt;

/// Compilation diagnostic with source location and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    /// Category of this error
    pub kind: ErrorKind,
    /// Severity level
    pub severity: Severity,
    /// Primary source location
    pub span: Span,
    /// Primary error message
    pub message: String,
    /// Additional labeled spans
    pub labels: Vec<Label>,
    /// Additional notes or hints
    pub notes: Vec<String>,
}

/// Category of compilation error.
///
/// # Invariant
///
/// The discriminant values must match the `ERROR_KIND_NAMES` indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorKind {
    // Parse phase
    /// Invalid token or grammar
    Syntax = 0,

    // Binding phase
    /// Identifier does not name a parameter or local
    UndefinedName = 1,
    /// Name declared twice in the same scope
    DuplicateName = 2,
    /// Call does not name a built-in, extension, prog or register
    UnknownFunction = 3,

    // Type phase
    /// Expression type is not assignable where it is used
    TypeMismatch = 4,
    /// Wrong number of arguments
    WrongArgCount = 5,
    /// Several overloads fit equally well
    AmbiguousCall = 6,
    /// A value was needed but the call returns nothing
    VoidValue = 7,
    /// Type could not be inferred (bare `null`, empty literal)
    CannotInfer = 8,

    // Special forms
    /// Collection extension misuse
    InvalidExtension = 9,
    /// Register variable misuse
    InvalidRegister = 10,
    /// Event firing misuse
    InvalidEvent = 11,

    // Structure phase
    /// Statement used where it is not allowed (`break` outside a loop, ...)
    InvalidStatement = 12,
    /// A normally completing path does not return a value
    MissingReturn = 13,

    // Generic
    /// Bug in the compiler
    Internal = 14,
}

/// Human-readable names for error kinds, indexed by discriminant.
const ERROR_KIND_NAMES: &[&str] = &[
    "syntax error",         // 0: Syntax
    "undefined name",       // 1: UndefinedName
    "duplicate name",       // 2: DuplicateName
    "unknown function",     // 3: UnknownFunction
    "type mismatch",        // 4: TypeMismatch
    "wrong argument count", // 5: WrongArgCount
    "ambiguous call",       // 6: AmbiguousCall
    "void value",           // 7: VoidValue
    "cannot infer type",    // 8: CannotInfer
    "invalid extension",    // 9: InvalidExtension
    "invalid register",     // 10: InvalidRegister
    "invalid event",        // 11: InvalidEvent
    "invalid statement",    // 12: InvalidStatement
    "missing return",       // 13: MissingReturn
    "internal compiler error", // 14: Internal
];

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Suspicious but valid
    Warning,
    /// Compilation cannot proceed
    Error,
}

/// Secondary labeled span in a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    /// Source location
    pub span: Span,
    /// Label text
    pub message: String,
}

impl CompileError {
    /// Creates a new error diagnostic.
    pub fn new(kind: ErrorKind, span: Span, message: String) -> Self {
        Self::with_severity(kind, Severity::Error, span, message)
    }

    /// Creates a new warning diagnostic.
    pub fn warning(kind: ErrorKind, span: Span, message: String) -> Self {
        Self::with_severity(kind, Severity::Warning, span, message)
    }

    fn with_severity(kind: ErrorKind, severity: Severity, span: Span, message: String) -> Self {
        Self {
            kind,
            severity,
            span,
            message,
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Adds a secondary labeled span.
    pub fn with_label(mut self, span: Span, message: String) -> Self {
        self.labels.push(Label { span, message });
        self
    }

    /// Adds a note or hint.
    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    /// True for `Severity::Error`.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl From<ParseError> for CompileError {
    fn from(error: ParseError) -> Self {
        CompileError::new(ErrorKind::Syntax, error.span, error.message)
    }
}

impl ErrorKind {
    /// Human-readable name for this error kind.
    pub fn name(self) -> &'static str {
        ERROR_KIND_NAMES
            .get(self as usize)
            .copied()
            .unwrap_or("error")
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.kind.name(), self.message)
    }
}

impl std::error::Error for CompileError {}

/// Formats diagnostics with source code context.
///
/// Produces the location, the offending source line, a caret underline,
/// secondary labels and notes.
pub struct DiagnosticFormatter<'a> {
    name: &'a str,
    source: &'a str,
}

impl<'a> DiagnosticFormatter<'a> {
    /// Formatter for one prog's source text.
    pub fn new(name: &'a str, source: &'a str) -> Self {
        Self { name, source }
    }

    /// Formats a diagnostic as a string with source context.
    pub fn format(&self, error: &CompileError) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}: {}: {}\n",
            error.severity,
            error.kind.name(),
            error.message
        ));

        let (line, col) = error.span.line_col(self.source);
        output.push_str(&format!("  --> {}:{}:{}\n", self.name, line, col));

        if let Some(source_line) = self.source.lines().nth(line - 1) {
            output.push_str("   |\n");
            output.push_str(&format!("{:3} | {}\n", line, source_line));

            let width = source_line.chars().count() + 1;
            let end_col = (col + error.span.len() as usize).min(width);
            let underline = " ".repeat(col.saturating_sub(1))
                + &"^".repeat(end_col.saturating_sub(col).max(1));
            output.push_str(&format!("   | {}\n", underline));
        }

        for label in &error.labels {
            let (label_line, label_col) = label.span.line_col(self.source);
            output.push_str(&format!("   = note: {}\n", label.message));
            output.push_str(&format!("     at {}:{}:{}\n", self.name, label_line, label_col));
        }

        for note in &error.notes {
            output.push_str(&format!("   = help: {}\n", note));
        }

        output
    }

    /// Formats multiple diagnostics separated by blank lines.
    pub fn format_all(&self, errors: &[CompileError]) -> String {
        errors
            .iter()
            .map(|e| self.format(e))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_names_align() {
        assert_eq!(ErrorKind::Syntax.name(), "syntax error");
        assert_eq!(ErrorKind::MissingReturn.name(), "missing return");
        assert_eq!(ErrorKind::Internal.name(), "internal compiler error");
    }

    #[test]
    fn test_display() {
        let error = CompileError::new(
            ErrorKind::TypeMismatch,
            Span::zero(),
            "expected Number, found Text".to_string(),
        );
        assert_eq!(
            error.to_string(),
            "error: type mismatch: expected Number, found Text"
        );
    }

    #[test]
    fn test_formatter_underlines_span() {
        let source = "var x = 1;\nreturn yy;";
        let error = CompileError::new(
            ErrorKind::UndefinedName,
            Span::new(18, 20),
            "unknown name 'yy'".to_string(),
        )
        .with_note("declare it with 'var'".to_string());
        let text = DiagnosticFormatter::new("test", source).format(&error);
        assert!(text.contains("  --> test:2:8"));
        assert!(text.contains("  2 | return yy;"));
        assert!(text.contains("   |        ^^\n"));
        assert!(text.contains("= help: declare it with 'var'"));
    }
}
