//! Untyped syntax tree produced by the parser.
//!
//! Nothing here is resolved: identifiers are plain names, calls are plain
//! names with arguments, and `x.f(a)` is already rewritten to `f(x, a)`
//! with `method` set so diagnostics can say how it was written.

use mudprog_foundation::{ProgType, Span};

use crate::ops::{BinaryOp, UnaryOp};

/// A sequence of statements.
pub type Block = Vec<Stmt>;

/// Untyped expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// Expression kind
    pub kind: ExprKind,
    /// Source location
    pub span: Span,
}

impl Expr {
    /// Create a new expression.
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// True if this is a lambda (only valid as an extension argument).
    pub fn is_lambda(&self) -> bool {
        matches!(self.kind, ExprKind::Lambda { .. })
    }

    /// The literal text, if this is a text literal.
    pub fn as_text_literal(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Untyped expression kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Number literal
    Number(f64),
    /// Text literal
    Text(String),
    /// Boolean literal
    Boolean(bool),
    /// `null`
    Null,
    /// Bare name
    Identifier(String),
    /// `[a, b, c]`
    Collection(Vec<Expr>),
    /// `{"key": value, ...}`
    Dictionary(Vec<(String, Expr)>),
    /// Prefix operator
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expr>,
    },
    /// Infix operator
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },
    /// `f(a, b)`, or `a.f(b)` / `a.f` with `method` set
    Call {
        /// Called name
        name: String,
        /// Span of the name alone
        name_span: Span,
        /// Arguments (receiver first for method syntax)
        args: Vec<Expr>,
        /// Written with method syntax
        method: bool,
    },
    /// `target[index]`
    Index {
        /// Indexed container
        target: Box<Expr>,
        /// Index or key
        index: Box<Expr>,
    },
    /// `|x| body`
    Lambda {
        /// Bound element name
        param: String,
        /// Inner expression
        body: Box<Expr>,
    },
}

/// Untyped statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    /// Statement kind
    pub kind: StmtKind,
    /// Source location
    pub span: Span,
}

impl Stmt {
    /// Create a new statement.
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Untyped statement kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `var name: Type = init;` with either part optional (not both)
    Var {
        /// Declared name
        name: String,
        /// Declared type
        ty: Option<ProgType>,
        /// Initializer
        init: Option<Expr>,
    },
    /// `name = value;`
    Assign {
        /// Assigned name
        name: String,
        /// New value
        value: Expr,
    },
    /// `name[index] = value;`
    IndexAssign {
        /// Container variable
        name: String,
        /// Index or key
        index: Expr,
        /// New element
        value: Expr,
    },
    /// `if c { } else if c { } else { }`
    If {
        /// Condition/body pairs, in order
        branches: Vec<(Expr, Block)>,
        /// Trailing `else`
        otherwise: Option<Block>,
    },
    /// `while c { }`
    While {
        /// Loop condition
        condition: Expr,
        /// Loop body
        body: Block,
    },
    /// `for x in coll { }`
    ForEach {
        /// Element name
        variable: String,
        /// Iterated collection
        collection: Expr,
        /// Loop body
        body: Block,
    },
    /// `break;`
    Break,
    /// `continue;`
    Continue,
    /// `return;` or `return expr;`
    Return(Option<Expr>),
    /// Expression evaluated for its effect
    Expr(Expr),
}
