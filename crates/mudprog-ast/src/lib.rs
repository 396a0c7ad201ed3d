// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Prog syntax trees.
//!
//! ```text
//! Parser   → Block of Stmt (untyped)
//!    ↓
//! Compiler → CompiledProg of TypedStmt (every expression typed, every
//!            identifier bound to a slot, built-in, register or prog)
//!    ↓
//! Interpreter
//! ```

pub mod compiled;
pub mod ops;
pub mod syntax;
pub mod walk;

pub use compiled::{CompiledProg, Slot, TypedExpr, TypedExprKind, TypedStmt, TypedStmtKind};
pub use ops::{BinaryOp, UnaryOp};
pub use syntax::{Block, Expr, ExprKind, Stmt, StmtKind};
