//! Statement checking.

use mudprog_ast::{
    Block, Expr, Stmt, StmtKind, TypedExpr, TypedExprKind, TypedStmt, TypedStmtKind,
};
use mudprog_foundation::{ProgType, ReturnType, Span, Structure, Value};

use super::{Checked, Checker};
use crate::error::{CompileError, ErrorKind};

impl Checker<'_> {
    /// Check a block in a fresh scope.
    pub(super) fn block(&mut self, block: &Block) -> Vec<TypedStmt> {
        self.scopes.push();
        let mut out = Vec::with_capacity(block.len());
        for stmt in block {
            match self.stmt(stmt) {
                Ok(typed) => out.push(typed),
                Err(error) => self.errors.push(error),
            }
        }
        self.scopes.pop();
        out
    }

    fn stmt(&mut self, stmt: &Stmt) -> Checked<TypedStmt> {
        let kind = match &stmt.kind {
            StmtKind::Var { name, ty, init } => self.var(name, *ty, init.as_ref(), stmt.span)?,
            StmtKind::Assign { name, value } => {
                let local = self.local(name, stmt.span)?;
                let value = self.expect(value, local.ty)?;
                TypedStmtKind::Assign {
                    slot: local.slot,
                    value,
                }
            }
            StmtKind::IndexAssign { name, index, value } => {
                self.index_assign(name, index, value, stmt.span)?
            }
            StmtKind::If {
                branches,
                otherwise,
            } => {
                let mut typed = Vec::with_capacity(branches.len());
                for (condition, body) in branches {
                    let condition = self.condition(condition);
                    let body = self.block(body);
                    if let Some(condition) = condition {
                        typed.push((condition, body));
                    }
                }
                let otherwise = otherwise.as_ref().map(|body| self.block(body));
                TypedStmtKind::If {
                    branches: typed,
                    otherwise,
                }
            }
            StmtKind::While { condition, body } => {
                let condition = self.condition(condition);
                let body = self.loop_body(body);
                TypedStmtKind::While {
                    condition: condition.unwrap_or_else(|| false_literal(stmt.span)),
                    body,
                }
            }
            StmtKind::ForEach {
                variable,
                collection,
                body,
            } => self.for_each(variable, collection, body)?,
            StmtKind::Break | StmtKind::Continue if self.loop_depth == 0 => {
                let word = if matches!(stmt.kind, StmtKind::Break) {
                    "break"
                } else {
                    "continue"
                };
                return Err(CompileError::new(
                    ErrorKind::InvalidStatement,
                    stmt.span,
                    format!("'{}' outside of a loop", word),
                ));
            }
            StmtKind::Break => TypedStmtKind::Break,
            StmtKind::Continue => TypedStmtKind::Continue,
            StmtKind::Return(value) => self.ret(value.as_ref(), stmt.span)?,
            StmtKind::Expr(expr) => TypedStmtKind::Expr(self.expr(expr, None)?),
        };
        Ok(TypedStmt::new(kind, stmt.span))
    }

    fn var(
        &mut self,
        name: &str,
        declared: Option<ProgType>,
        init: Option<&Expr>,
        span: Span,
    ) -> Checked<TypedStmtKind> {
        let value = match (declared, init) {
            (Some(ty), Some(init)) => self.expect(init, ty),
            (None, Some(init)) => self.value(init),
            (Some(ty), None) => Ok(TypedExpr::new(
                TypedExprKind::Literal(Value::default_for(ty)),
                ty,
                span,
            )),
            (None, None) => Err(CompileError::new(
                ErrorKind::CannotInfer,
                span,
                format!("variable '{}' needs a type or an initial value", name),
            )),
        };

        // Bind the name even when the initializer is broken
        let ty = match (&value, declared) {
            (_, Some(ty)) => ty,
            (Ok(value), None) => value.value_type().unwrap_or(ProgType::ANYTHING),
            (Err(_), None) => ProgType::ANYTHING,
        };
        let local = self.scopes.declare(name, ty).ok_or_else(|| {
            CompileError::new(
                ErrorKind::DuplicateName,
                span,
                format!("'{}' is already declared in this scope", name),
            )
        });

        let value = value?;
        let local = local?;
        Ok(TypedStmtKind::Declare {
            slot: local.slot,
            value,
        })
    }

    fn index_assign(
        &mut self,
        name: &str,
        index: &Expr,
        value: &Expr,
        span: Span,
    ) -> Checked<TypedStmtKind> {
        let local = self.local(name, span)?;
        let (key_type, element_type) = match local.ty.structure {
            Structure::Collection => (ProgType::NUMBER, local.ty.element()),
            Structure::Dictionary => (ProgType::TEXT, local.ty.element()),
            Structure::CollectionDictionary => (ProgType::TEXT, local.ty.element().collection()),
            Structure::Single => {
                return Err(CompileError::new(
                    ErrorKind::TypeMismatch,
                    span,
                    format!("'{}' is a {} and cannot be indexed", name, local.ty),
                ));
            }
        };
        let index = self.expect(index, key_type)?;
        let value = self.expect(value, element_type)?;
        Ok(TypedStmtKind::IndexAssign {
            slot: local.slot,
            index,
            value,
        })
    }

    fn for_each(&mut self, variable: &str, collection: &Expr, body: &Block) -> Checked<TypedStmtKind> {
        let collection = self.value(collection)?;
        let ty = collection.value_type().unwrap_or(ProgType::ANYTHING);
        if !ty.is_collection() {
            return Err(CompileError::new(
                ErrorKind::TypeMismatch,
                collection.span,
                format!("'for' needs a collection, found {}", ty),
            )
            .with_note("iterate 'keys(d)' or 'values(d)' to walk a dictionary".to_string()));
        }

        self.scopes.push();
        let slot = self
            .scopes
            .declare(variable, ty.element())
            .map(|local| local.slot);
        let body = self.loop_body(body);
        self.scopes.pop();

        let slot = slot.ok_or_else(|| {
            CompileError::new(
                ErrorKind::Internal,
                collection.span,
                format!("loop variable '{}' could not be bound", variable),
            )
        })?;
        Ok(TypedStmtKind::ForEach {
            slot,
            collection,
            body,
        })
    }

    fn loop_body(&mut self, body: &Block) -> Vec<TypedStmt> {
        self.loop_depth += 1;
        let body = self.block(body);
        self.loop_depth -= 1;
        body
    }

    fn ret(&mut self, value: Option<&Expr>, span: Span) -> Checked<TypedStmtKind> {
        match (self.return_type, value) {
            (ReturnType::Void, None) => Ok(TypedStmtKind::Return(None)),
            (ReturnType::Void, Some(value)) => Err(CompileError::new(
                ErrorKind::TypeMismatch,
                value.span,
                "this prog returns nothing, but a value is returned".to_string(),
            )),
            (ReturnType::Value(ty), None) => Err(CompileError::new(
                ErrorKind::TypeMismatch,
                span,
                format!("this prog must return a {}", ty),
            )),
            (ReturnType::Value(ty), Some(value)) => {
                Ok(TypedStmtKind::Return(Some(self.expect(value, ty)?)))
            }
        }
    }

    /// Check a Boolean condition, recording the error and returning `None`
    /// on failure so the branch body is still checked.
    fn condition(&mut self, condition: &Expr) -> Option<TypedExpr> {
        match self.expect(condition, ProgType::BOOLEAN) {
            Ok(typed) => Some(typed),
            Err(error) => {
                self.errors.push(error);
                None
            }
        }
    }
}

fn false_literal(span: Span) -> TypedExpr {
    TypedExpr::new(
        TypedExprKind::Literal(Value::boolean(false)),
        ProgType::BOOLEAN,
        span,
    )
}
