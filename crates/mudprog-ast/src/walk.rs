//! Compiled tree walking.
//!
//! Pre-order traversal with a caller-supplied closure, so analysis passes
//! share one recursion instead of each re-implementing it.
//!
//! ```rust,ignore
//! let mut calls = 0;
//! walk_stmts(&prog.body, &mut |expr| {
//!     if matches!(expr.kind, TypedExprKind::Builtin { .. }) {
//!         calls += 1;
//!     }
//! });
//! ```

use crate::compiled::{TypedExpr, TypedExprKind, TypedStmt, TypedStmtKind};

/// Walk an expression tree in pre-order, calling `visitor` for each node.
pub fn walk_expr<V>(expr: &TypedExpr, visitor: &mut V)
where
    V: FnMut(&TypedExpr),
{
    visitor(expr);

    match &expr.kind {
        TypedExprKind::Literal(_) | TypedExprKind::Local(_) => {}
        TypedExprKind::Collection { items, .. } => {
            for item in items {
                walk_expr(item, visitor);
            }
        }
        TypedExprKind::Dictionary { entries, .. } => {
            for (_, value) in entries {
                walk_expr(value, visitor);
            }
        }
        TypedExprKind::Unary { operand, .. } => walk_expr(operand, visitor),
        TypedExprKind::Binary { left, right, .. } => {
            walk_expr(left, visitor);
            walk_expr(right, visitor);
        }
        TypedExprKind::Builtin { args, .. } | TypedExprKind::ProgCall { args, .. } => {
            for arg in args {
                walk_expr(arg, visitor);
            }
        }
        TypedExprKind::Extension { receiver, body, .. } => {
            walk_expr(receiver, visitor);
            walk_expr(body, visitor);
        }
        TypedExprKind::Index { target, index } => {
            walk_expr(target, visitor);
            walk_expr(index, visitor);
        }
        TypedExprKind::GetRegister { target, .. } | TypedExprKind::ResetRegister { target, .. } => {
            walk_expr(target, visitor)
        }
        TypedExprKind::SetRegister { target, value, .. } => {
            walk_expr(target, visitor);
            walk_expr(value, visitor);
        }
        TypedExprKind::Fire { target, args, .. } => {
            walk_expr(target, visitor);
            for arg in args {
                walk_expr(arg, visitor);
            }
        }
    }
}

/// Walk every expression reachable from a statement list.
pub fn walk_stmts<V>(stmts: &[TypedStmt], visitor: &mut V)
where
    V: FnMut(&TypedExpr),
{
    for stmt in stmts {
        match &stmt.kind {
            TypedStmtKind::Declare { value, .. }
            | TypedStmtKind::Assign { value, .. }
            | TypedStmtKind::Expr(value)
            | TypedStmtKind::Return(Some(value)) => walk_expr(value, visitor),
            TypedStmtKind::IndexAssign { index, value, .. } => {
                walk_expr(index, visitor);
                walk_expr(value, visitor);
            }
            TypedStmtKind::If {
                branches,
                otherwise,
            } => {
                for (condition, body) in branches {
                    walk_expr(condition, visitor);
                    walk_stmts(body, visitor);
                }
                if let Some(body) = otherwise {
                    walk_stmts(body, visitor);
                }
            }
            TypedStmtKind::While { condition, body } => {
                walk_expr(condition, visitor);
                walk_stmts(body, visitor);
            }
            TypedStmtKind::ForEach {
                collection, body, ..
            } => {
                walk_expr(collection, visitor);
                walk_stmts(body, visitor);
            }
            TypedStmtKind::Break | TypedStmtKind::Continue | TypedStmtKind::Return(None) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::BinaryOp;
    use mudprog_foundation::{ProgId, ProgType, ReturnType, Span, Value};

    fn lit(n: f64) -> TypedExpr {
        TypedExpr::new(TypedExprKind::Literal(Value::number(n)), ProgType::NUMBER, Span::zero())
    }

    #[test]
    fn test_walk_visits_nested_nodes() {
        let sum = TypedExpr::new(
            TypedExprKind::Binary {
                op: BinaryOp::Add,
                left: Box::new(lit(1.0)),
                right: Box::new(lit(2.0)),
            },
            ProgType::NUMBER,
            Span::zero(),
        );
        let body = vec![TypedStmt::new(TypedStmtKind::Return(Some(sum)), Span::zero())];
        let mut count = 0;
        walk_stmts(&body, &mut |_| count += 1);
        assert_eq!(count, 3);
    }

    #[test]
    fn test_called_progs_deduplicates() {
        let call = |id: u64| {
            TypedStmt::new(
                TypedStmtKind::Expr(TypedExpr::void(
                    TypedExprKind::ProgCall {
                        prog: ProgId(id),
                        name: "helper".to_string(),
                        args: vec![],
                    },
                    Span::zero(),
                )),
                Span::zero(),
            )
        };
        let prog = crate::CompiledProg {
            body: vec![call(3), call(3), call(4)],
            slot_count: 0,
            parameter_count: 0,
            return_type: ReturnType::Void,
        };
        assert_eq!(prog.called_progs(), vec![ProgId(3), ProgId(4)]);
    }
}
