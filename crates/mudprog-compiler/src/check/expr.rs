//! Expression typing.
//!
//! `expr` takes an optional hint: the type the surrounding context expects.
//! Only `null` and empty or literal containers use it, since those cannot
//! infer a type on their own. Assignability is always checked separately in
//! `expect`.

use mudprog_ast::{BinaryOp, Expr, ExprKind, TypedExpr, TypedExprKind, UnaryOp};
use mudprog_foundation::{ConcreteKind, ProgType, Span, Structure, Value};

use super::{Checked, Checker};
use crate::error::{CompileError, ErrorKind};
use crate::scope::Local;
use crate::unify::common_type;

impl Checker<'_> {
    /// Type `expr` and require it to produce a value.
    pub(super) fn value(&mut self, expr: &Expr) -> Checked<TypedExpr> {
        let typed = self.expr(expr, None)?;
        require_value(typed)
    }

    /// Type `expr` against `expected` and require assignability.
    pub(super) fn expect(&mut self, expr: &Expr, expected: ProgType) -> Checked<TypedExpr> {
        let typed = require_value(self.expr(expr, Some(expected))?)?;
        let actual = typed.value_type().unwrap_or(ProgType::ANYTHING);
        if actual.is_assignable_to(expected) {
            Ok(typed)
        } else {
            Err(mismatch(expr.span, expected, actual))
        }
    }

    /// Type an expression, allowing Void calls.
    pub(super) fn expr(&mut self, expr: &Expr, hint: Option<ProgType>) -> Checked<TypedExpr> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Number(n) => Ok(literal(Value::number(*n), span)),
            ExprKind::Text(s) => Ok(literal(Value::text(s.as_str()), span)),
            ExprKind::Boolean(b) => Ok(literal(Value::boolean(*b), span)),
            ExprKind::Null => match hint {
                Some(ty) if ty.is_single() => Ok(null(ty, span)),
                Some(ty) => Err(CompileError::new(
                    ErrorKind::TypeMismatch,
                    span,
                    format!("a {} cannot be null", ty),
                )
                .with_note("use an empty literal instead".to_string())),
                None => Err(cannot_infer(span, "null")),
            },
            ExprKind::Identifier(name) => {
                let local = self.local(name, span)?;
                Ok(TypedExpr::new(TypedExprKind::Local(local.slot), local.ty, span))
            }
            ExprKind::Collection(items) => self.collection(items, hint, span),
            ExprKind::Dictionary(entries) => self.dictionary(entries, hint, span),
            ExprKind::Unary { op, operand } => self.unary(*op, operand, span),
            ExprKind::Binary { op, left, right } => self.binary(*op, left, right, span),
            ExprKind::Index { target, index } => self.index(target, index, span),
            ExprKind::Call {
                name,
                name_span,
                args,
                method,
            } => self.call(name, *name_span, args, *method, span),
            ExprKind::Lambda { .. } => Err(CompileError::new(
                ErrorKind::InvalidExtension,
                span,
                "a lambda can only be passed to a collection extension".to_string(),
            )
            .with_note("write e.g. 'items.where(|x| x > 1)'".to_string())),
        }
    }

    /// Resolve `name` to a parameter or local.
    pub(super) fn local(&self, name: &str, span: Span) -> Checked<Local> {
        if let Some(local) = self.scopes.lookup(name) {
            return Ok(local);
        }
        let mut error = CompileError::new(
            ErrorKind::UndefinedName,
            span,
            format!("unknown name '{}'", name),
        );
        if let Some(similar) = self
            .scopes
            .visible_names()
            .find(|visible| visible.eq_ignore_ascii_case(name))
        {
            error = error.with_note(format!("did you mean '{}'?", similar));
        } else if mudprog_functions::is_known(&name.to_lowercase())
            || self.env.prog(name).is_some()
        {
            error = error.with_note(format!("to call '{}', write '{}()'", name, name));
        }
        Err(error)
    }

    fn collection(&mut self, items: &[Expr], hint: Option<ProgType>, span: Span) -> Checked<TypedExpr> {
        let element = match hint {
            Some(ty) if ty.structure == Structure::Collection => Some(ty.element()),
            _ => None,
        };
        let (element, items) = self.elements(items.iter(), element, span)?;
        if !element.is_single() {
            return Err(CompileError::new(
                ErrorKind::TypeMismatch,
                span,
                format!("collections cannot contain {} values", element),
            ));
        }
        Ok(TypedExpr::new(
            TypedExprKind::Collection { element, items },
            element.collection(),
            span,
        ))
    }

    fn dictionary(
        &mut self,
        entries: &[(String, Expr)],
        hint: Option<ProgType>,
        span: Span,
    ) -> Checked<TypedExpr> {
        let expected = hint.and_then(|ty| match ty.structure {
            Structure::Dictionary => Some(ty.element()),
            Structure::CollectionDictionary => Some(ty.element().collection()),
            _ => None,
        });
        let (value_type, values) = self.elements(entries.iter().map(|(_, v)| v), expected, span)?;
        let ty = match value_type.structure {
            Structure::Single => value_type.dictionary(),
            Structure::Collection => value_type.element().collection_dictionary(),
            _ => {
                return Err(CompileError::new(
                    ErrorKind::TypeMismatch,
                    span,
                    format!("dictionary values cannot be of type {}", value_type),
                ));
            }
        };
        let entries = entries
            .iter()
            .map(|(key, _)| key.clone())
            .zip(values)
            .collect();
        Ok(TypedExpr::new(
            TypedExprKind::Dictionary {
                element: ty.element(),
                entries,
            },
            ty,
            span,
        ))
    }

    /// Type literal elements against an expected element type, or infer the
    /// common type of the non-null elements.
    fn elements<'e>(
        &mut self,
        items: impl Iterator<Item = &'e Expr> + Clone,
        expected: Option<ProgType>,
        span: Span,
    ) -> Checked<(ProgType, Vec<TypedExpr>)> {
        if let Some(element) = expected {
            let typed = items
                .map(|item| self.expect(item, element))
                .collect::<Checked<Vec<_>>>()?;
            return Ok((element, typed));
        }

        let mut inferred = Vec::new();
        for item in items.clone().filter(|item| !matches!(item.kind, ExprKind::Null)) {
            inferred.push(self.value(item)?);
        }
        let types: Vec<ProgType> = inferred.iter().filter_map(TypedExpr::value_type).collect();
        let element = common_type(&types).ok_or_else(|| {
            if types.is_empty() {
                cannot_infer(span, "this literal").with_note(
                    "declare the variable with a type, e.g. 'var xs: Number Collection = [];'"
                        .to_string(),
                )
            } else {
                let names: Vec<String> = types.iter().map(ToString::to_string).collect();
                CompileError::new(
                    ErrorKind::TypeMismatch,
                    span,
                    format!("literal mixes incompatible types: {}", names.join(", ")),
                )
            }
        })?;
        if !element.is_single() && element.structure != Structure::Collection {
            return Err(CompileError::new(
                ErrorKind::TypeMismatch,
                span,
                format!("literal elements cannot be of type {}", element),
            ));
        }

        // Re-assemble in source order, typing nulls with the common type
        let mut inferred = inferred.into_iter();
        let mut typed = Vec::new();
        for item in items {
            if matches!(item.kind, ExprKind::Null) {
                typed.push(self.expr(item, Some(element))?);
            } else if let Some(next) = inferred.next() {
                typed.push(next);
            }
        }
        Ok((element, typed))
    }

    fn unary(&mut self, op: UnaryOp, operand: &Expr, span: Span) -> Checked<TypedExpr> {
        let operand = self.value(operand)?;
        let ty = operand.value_type().unwrap_or(ProgType::ANYTHING);
        let result = match op {
            UnaryOp::Neg if ty == ProgType::NUMBER || ty == ProgType::TIMESPAN => ty,
            UnaryOp::Not if ty == ProgType::BOOLEAN => ty,
            UnaryOp::Neg => {
                return Err(operator_error(span, "-", &[ty]));
            }
            UnaryOp::Not => return Err(mismatch(operand.span, ProgType::BOOLEAN, ty)),
        };
        Ok(TypedExpr::new(
            TypedExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            result,
            span,
        ))
    }

    fn binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr, span: Span) -> Checked<TypedExpr> {
        let (left, right) = if op.is_logical() {
            (
                self.expect(left, ProgType::BOOLEAN)?,
                self.expect(right, ProgType::BOOLEAN)?,
            )
        } else if op.is_equality() {
            self.equality_operands(left, right)?
        } else {
            (self.value(left)?, self.value(right)?)
        };

        let lt = left.value_type().unwrap_or(ProgType::ANYTHING);
        let rt = right.value_type().unwrap_or(ProgType::ANYTHING);
        let result = if op.is_logical() {
            Some(ProgType::BOOLEAN)
        } else if op.is_equality() {
            comparable(lt, rt).then_some(ProgType::BOOLEAN)
        } else if op.is_ordering() {
            (lt == rt && is_ordered(lt)).then_some(ProgType::BOOLEAN)
        } else {
            arithmetic(op, lt, rt)
        };
        let result = result.ok_or_else(|| operator_error(span, op.symbol(), &[lt, rt]))?;

        Ok(TypedExpr::new(
            TypedExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            result,
            span,
        ))
    }

    /// `x == null` types the null as `x`'s type.
    fn equality_operands(&mut self, left: &Expr, right: &Expr) -> Checked<(TypedExpr, TypedExpr)> {
        let is_null = |e: &Expr| matches!(e.kind, ExprKind::Null);
        match (is_null(left), is_null(right)) {
            (true, true) => Ok((null(ProgType::ANYTHING, left.span), null(ProgType::ANYTHING, right.span))),
            (false, true) => {
                let left = self.value(left)?;
                let ty = left.value_type().unwrap_or(ProgType::ANYTHING);
                let right = self.expr(right, Some(ty))?;
                Ok((left, right))
            }
            (true, false) => {
                let right = self.value(right)?;
                let ty = right.value_type().unwrap_or(ProgType::ANYTHING);
                let left = self.expr(left, Some(ty))?;
                Ok((left, right))
            }
            (false, false) => Ok((self.value(left)?, self.value(right)?)),
        }
    }

    fn index(&mut self, target: &Expr, index: &Expr, span: Span) -> Checked<TypedExpr> {
        let target = self.value(target)?;
        let ty = target.value_type().unwrap_or(ProgType::ANYTHING);
        let (key, result) = match ty.structure {
            Structure::Collection => (ProgType::NUMBER, ty.element()),
            Structure::Dictionary => (ProgType::TEXT, ty.element()),
            Structure::CollectionDictionary => (ProgType::TEXT, ty.element().collection()),
            Structure::Single => {
                return Err(CompileError::new(
                    ErrorKind::TypeMismatch,
                    target.span,
                    format!("a {} cannot be indexed", ty),
                ));
            }
        };
        let index = self.expect(index, key)?;
        Ok(TypedExpr::new(
            TypedExprKind::Index {
                target: Box::new(target),
                index: Box::new(index),
            },
            result,
            span,
        ))
    }
}

/// Result type of an arithmetic operator, if the operands support it.
fn arithmetic(op: BinaryOp, left: ProgType, right: ProgType) -> Option<ProgType> {
    use ConcreteKind::{DateTime, Number, Text, TimeSpan};

    if !left.is_single() || !right.is_single() {
        return None;
    }
    let kinds = (left.concrete_kind(), right.concrete_kind());
    match (op, kinds) {
        (_, (Some(Number), Some(Number))) => Some(ProgType::NUMBER),
        (BinaryOp::Add, (Some(Text), _) | (_, Some(Text))) => Some(ProgType::TEXT),
        (BinaryOp::Add, (Some(DateTime), Some(TimeSpan)) | (Some(TimeSpan), Some(DateTime))) => {
            Some(ProgType::DATETIME)
        }
        (BinaryOp::Sub, (Some(DateTime), Some(TimeSpan))) => Some(ProgType::DATETIME),
        (BinaryOp::Sub, (Some(DateTime), Some(DateTime))) => Some(ProgType::TIMESPAN),
        (BinaryOp::Add | BinaryOp::Sub, (Some(TimeSpan), Some(TimeSpan))) => Some(ProgType::TIMESPAN),
        (BinaryOp::Mul, (Some(TimeSpan), Some(Number)) | (Some(Number), Some(TimeSpan))) => {
            Some(ProgType::TIMESPAN)
        }
        (BinaryOp::Div, (Some(TimeSpan), Some(Number))) => Some(ProgType::TIMESPAN),
        _ => None,
    }
}

/// Equality needs one side assignable to the other.
fn comparable(left: ProgType, right: ProgType) -> bool {
    left.is_assignable_to(right) || right.is_assignable_to(left)
}

fn is_ordered(ty: ProgType) -> bool {
    matches!(
        ty.concrete_kind(),
        Some(ConcreteKind::Number | ConcreteKind::Text | ConcreteKind::DateTime | ConcreteKind::TimeSpan)
    ) && ty.is_single()
}

fn require_value(typed: TypedExpr) -> Checked<TypedExpr> {
    if typed.value_type().is_some() {
        Ok(typed)
    } else {
        Err(CompileError::new(
            ErrorKind::VoidValue,
            typed.span,
            "this call returns nothing and cannot be used as a value".to_string(),
        ))
    }
}

fn literal(value: Value, span: Span) -> TypedExpr {
    let ty = value.ty();
    TypedExpr::new(TypedExprKind::Literal(value), ty, span)
}

pub(super) fn null(ty: ProgType, span: Span) -> TypedExpr {
    TypedExpr::new(TypedExprKind::Literal(Value::null(ty)), ty, span)
}

fn mismatch(span: Span, expected: ProgType, actual: ProgType) -> CompileError {
    CompileError::new(
        ErrorKind::TypeMismatch,
        span,
        format!("expected {}, found {}", expected, actual),
    )
}

fn cannot_infer(span: Span, what: &str) -> CompileError {
    CompileError::new(
        ErrorKind::CannotInfer,
        span,
        format!("cannot infer the type of {}", what),
    )
}

fn operator_error(span: Span, symbol: &str, operands: &[ProgType]) -> CompileError {
    let names: Vec<String> = operands.iter().map(ToString::to_string).collect();
    CompileError::new(
        ErrorKind::TypeMismatch,
        span,
        format!("operator '{}' cannot be applied to {}", symbol, names.join(" and ")),
    )
}
