//! Compiled tree produced by the compiler and run by the interpreter.
//!
//! Every expression carries its checked type. Locals are numbered slots in
//! a flat frame: parameters occupy the first slots, declarations and loop
//! variables follow. Calls are bound to a built-in descriptor, a register
//! entry or a prog id; nothing is looked up by name at run time.

use mudprog_foundation::{EventType, ProgId, ProgType, ReturnType, Span, Value};
use mudprog_functions::{BuiltinDescriptor, ExtensionOp};

use crate::ops::{BinaryOp, UnaryOp};
use crate::walk::walk_stmts;

/// Frame slot index.
pub type Slot = usize;

/// Typed expression.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedExpr {
    /// Expression kind
    pub kind: TypedExprKind,
    /// Checked type; `Void` only for calls used as statements
    pub ty: ReturnType,
    /// Source location
    pub span: Span,
}

impl TypedExpr {
    /// Create a typed expression of a value type.
    pub fn new(kind: TypedExprKind, ty: ProgType, span: Span) -> Self {
        Self {
            kind,
            ty: ReturnType::Value(ty),
            span,
        }
    }

    /// Create a typed expression producing nothing.
    pub fn void(kind: TypedExprKind, span: Span) -> Self {
        Self {
            kind,
            ty: ReturnType::Void,
            span,
        }
    }

    /// The value type, if not void.
    pub fn value_type(&self) -> Option<ProgType> {
        self.ty.value_type()
    }
}

/// Typed expression kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedExprKind {
    /// Constant
    Literal(Value),
    /// Read a frame slot
    Local(Slot),
    /// Collection literal
    Collection {
        /// Element type of the resulting collection
        element: ProgType,
        /// Elements
        items: Vec<TypedExpr>,
    },
    /// Dictionary literal
    Dictionary {
        /// Element type of the resulting dictionary
        element: ProgType,
        /// Entries, in source order
        entries: Vec<(String, TypedExpr)>,
    },
    /// Prefix operator
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<TypedExpr>,
    },
    /// Infix operator
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<TypedExpr>,
        /// Right operand
        right: Box<TypedExpr>,
    },
    /// Built-in call
    Builtin {
        /// Chosen overload
        function: &'static BuiltinDescriptor,
        /// Arguments
        args: Vec<TypedExpr>,
    },
    /// `receiver.op(|x| body)`
    Extension {
        /// Operation
        op: ExtensionOp,
        /// Collection being iterated
        receiver: Box<TypedExpr>,
        /// Slot the element is bound to
        slot: Slot,
        /// Inner expression
        body: Box<TypedExpr>,
    },
    /// `target[index]`
    Index {
        /// Container
        target: Box<TypedExpr>,
        /// Index or key
        index: Box<TypedExpr>,
    },
    /// Read a register variable
    GetRegister {
        /// Host entity
        target: Box<TypedExpr>,
        /// Register name (lowercase)
        name: String,
    },
    /// Write a register variable override
    SetRegister {
        /// Host entity
        target: Box<TypedExpr>,
        /// Register name (lowercase)
        name: String,
        /// New value
        value: Box<TypedExpr>,
    },
    /// Delete a register variable override
    ResetRegister {
        /// Host entity
        target: Box<TypedExpr>,
        /// Register name (lowercase)
        name: String,
    },
    /// Raise an event on a target
    Fire {
        /// Event raised
        event: EventType,
        /// Entity whose hooks fire
        target: Box<TypedExpr>,
        /// Event arguments, matching the event's parameter tuple
        args: Vec<TypedExpr>,
    },
    /// Call another prog
    ProgCall {
        /// Callee
        prog: ProgId,
        /// Callee name as written
        name: String,
        /// Arguments
        args: Vec<TypedExpr>,
    },
}

/// Typed statement.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedStmt {
    /// Statement kind
    pub kind: TypedStmtKind,
    /// Source location
    pub span: Span,
}

impl TypedStmt {
    /// Create a typed statement.
    pub fn new(kind: TypedStmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Typed statement kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedStmtKind {
    /// Initialize a fresh slot
    Declare {
        /// Target slot
        slot: Slot,
        /// Initial value (the type default when none was written)
        value: TypedExpr,
    },
    /// Overwrite a slot
    Assign {
        /// Target slot
        slot: Slot,
        /// New value
        value: TypedExpr,
    },
    /// Overwrite one element of a container slot
    IndexAssign {
        /// Container slot
        slot: Slot,
        /// Index or key
        index: TypedExpr,
        /// New element
        value: TypedExpr,
    },
    /// Conditional chain
    If {
        /// Condition/body pairs
        branches: Vec<(TypedExpr, Vec<TypedStmt>)>,
        /// Trailing `else`
        otherwise: Option<Vec<TypedStmt>>,
    },
    /// Loop while the condition holds
    While {
        /// Condition
        condition: TypedExpr,
        /// Body
        body: Vec<TypedStmt>,
    },
    /// Loop over a collection snapshot
    ForEach {
        /// Element slot
        slot: Slot,
        /// Collection
        collection: TypedExpr,
        /// Body
        body: Vec<TypedStmt>,
    },
    /// Leave the innermost loop
    Break,
    /// Next iteration of the innermost loop
    Continue,
    /// Leave the prog
    Return(Option<TypedExpr>),
    /// Evaluate for effect
    Expr(TypedExpr),
}

/// The executable form of a prog.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProg {
    /// Statements
    pub body: Vec<TypedStmt>,
    /// Frame size
    pub slot_count: usize,
    /// Slots bound from arguments (zero for any-params progs)
    pub parameter_count: usize,
    /// Declared return type
    pub return_type: ReturnType,
}

impl CompiledProg {
    /// Progs this prog calls directly, in first-call order.
    pub fn called_progs(&self) -> Vec<ProgId> {
        let mut progs = Vec::new();
        walk_stmts(&self.body, &mut |expr| {
            if let TypedExprKind::ProgCall { prog, .. } = &expr.kind
                && !progs.contains(prog)
            {
                progs.push(*prog);
            }
        });
        progs
    }
}
