//! Return-path analysis over the compiled tree.
//!
//! A block "diverges" when control can never fall off its end: it returns
//! on every path, or loops forever without a `break`.

use mudprog_ast::{TypedExpr, TypedExprKind, TypedStmt, TypedStmtKind};
use mudprog_foundation::Data;

/// True if no path through `stmts` completes normally.
pub fn block_diverges(stmts: &[TypedStmt]) -> bool {
    stmts.iter().any(stmt_diverges)
}

fn stmt_diverges(stmt: &TypedStmt) -> bool {
    match &stmt.kind {
        TypedStmtKind::Return(_) => true,
        TypedStmtKind::If {
            branches,
            otherwise: Some(otherwise),
        } => branches.iter().all(|(_, body)| block_diverges(body)) && block_diverges(otherwise),
        TypedStmtKind::While { condition, body } => is_true(condition) && !breaks_out(body),
        _ => false,
    }
}

fn is_true(expr: &TypedExpr) -> bool {
    matches!(&expr.kind, TypedExprKind::Literal(value) if matches!(value.data(), Data::Boolean(true)))
}

/// True if `stmts` contain a `break` that leaves the enclosing loop.
fn breaks_out(stmts: &[TypedStmt]) -> bool {
    stmts.iter().any(|stmt| match &stmt.kind {
        TypedStmtKind::Break => true,
        TypedStmtKind::If {
            branches,
            otherwise,
        } => {
            branches.iter().any(|(_, body)| breaks_out(body))
                || otherwise.as_deref().is_some_and(breaks_out)
        }
        // A nested loop owns its own breaks
        _ => false,
    })
}
