//! Tree-walking interpreter over compiled progs.
//!
//! Every nested execution (prog calls, hook payloads fired from a prog)
//! shares one [`Guard`]: the depth counter bounds recursion and the step
//! counter bounds the total work of the outermost call.

use chrono::TimeDelta;
use mudprog_ast::{
    BinaryOp, CompiledProg, Slot, TypedExpr, TypedExprKind, TypedStmt, TypedStmtKind, UnaryOp,
};
use mudprog_foundation::{
    Data, EntityRef, ProgId, ProgSignature, ProgType, Structure, Value,
};
use mudprog_functions::args::finite;
use mudprog_functions::builtins::element_at;
use mudprog_functions::extensions::{order_by, reduce_numbers};
use mudprog_functions::ordering::{compare, values_equal};
use mudprog_functions::{ExtensionOp, FunctionError};
use std::cmp::Ordering;
use std::rc::Rc;
use tracing::{debug, instrument, trace, warn};

use crate::engine::Engine;
use crate::error::{BindError, RuntimeError};
use crate::prog::{CompileStatus, Staticness};

/// Per-execution counters.
#[derive(Debug, Default)]
pub(crate) struct Guard {
    depth: usize,
    steps: u64,
}

/// How a statement completed.
enum Flow {
    Next,
    Break,
    Continue,
    Return(Value),
}

type Frame = Vec<Value>;

/// Result of a Void prog or built-in.
pub(crate) fn nothing() -> Value {
    Value::null(ProgType::ANYTHING)
}

/// Check arguments against a signature and produce the values to bind.
///
/// A null argument binds to any single-valued parameter and takes the
/// parameter's type. `AnyParams` binds nothing.
pub fn bind_arguments(signature: &ProgSignature, args: &[Value]) -> Result<Vec<Value>, BindError> {
    let Some(params) = signature.parameters() else {
        return Ok(Vec::new());
    };
    if params.len() != args.len() {
        return Err(BindError::ArgumentCount {
            expected: params.len(),
            found: args.len(),
        });
    }
    params
        .iter()
        .zip(args)
        .enumerate()
        .map(|(i, (param, arg))| {
            if arg.is_null() && param.ty.is_single() {
                Ok(Value::null(param.ty))
            } else if arg.ty().is_assignable_to(param.ty) {
                Ok(arg.clone())
            } else {
                Err(BindError::ArgumentType {
                    position: i + 1,
                    parameter: param.name.clone(),
                    expected: param.ty,
                    found: arg.ty(),
                })
            }
        })
        .collect()
}

impl Engine {
    /// Execute a prog with arguments.
    ///
    /// Every failure, including guard trips deep inside nested calls, is
    /// returned as a [`RuntimeError`].
    #[instrument(skip(self, args), fields(prog = %id))]
    pub fn execute(&mut self, id: ProgId, args: &[Value]) -> Result<Value, RuntimeError> {
        let mut guard = Guard::default();
        let result = self.execute_guarded(id, args, &mut guard);
        match &result {
            Ok(_) => trace!(steps = guard.steps, "execution finished"),
            Err(e) if e.is_guard() => warn!(error = %e, "execution aborted by guard"),
            Err(e) => debug!(error = %e, "execution failed"),
        }
        result
    }

    pub(crate) fn execute_guarded(
        &mut self,
        id: ProgId,
        args: &[Value],
        guard: &mut Guard,
    ) -> Result<Value, RuntimeError> {
        let prog = self.progs.get(&id).ok_or(RuntimeError::UnknownProg(id))?;
        let compiled = match &prog.status {
            CompileStatus::Compiled(compiled) => Rc::clone(compiled),
            CompileStatus::Failed(_) => return Err(RuntimeError::NotExecutable(prog.name.clone())),
        };
        let bound = bind_arguments(&prog.signature, args)?;
        let fully_static = prog.staticness == Staticness::FullyStatic;
        if fully_static && let Some(cached) = self.static_cache.get(&id) {
            return Ok(cached.clone());
        }

        if guard.depth >= self.config.max_call_depth {
            return Err(RuntimeError::DepthExceeded {
                limit: self.config.max_call_depth,
            });
        }
        guard.depth += 1;
        let result = self.run(&compiled, bound, guard);
        guard.depth -= 1;

        let value = result?;
        if fully_static {
            self.static_cache.insert(id, value.clone());
        }
        Ok(value)
    }

    fn run(&mut self, prog: &CompiledProg, bound: Vec<Value>, guard: &mut Guard) -> Result<Value, RuntimeError> {
        let mut frame: Frame = bound;
        frame.resize(prog.slot_count.max(frame.len()), nothing());
        match self.block(&prog.body, &mut frame, guard)? {
            Flow::Return(value) => Ok(value),
            Flow::Next if prog.return_type.is_void() => Ok(nothing()),
            Flow::Next => Err(RuntimeError::Internal(
                "prog finished without returning a value".to_string(),
            )),
            Flow::Break | Flow::Continue => {
                Err(RuntimeError::Internal("loop control outside a loop".to_string()))
            }
        }
    }

    fn step(&self, guard: &mut Guard) -> Result<(), RuntimeError> {
        guard.steps += 1;
        if guard.steps > self.config.step_budget {
            return Err(RuntimeError::BudgetExceeded {
                limit: self.config.step_budget,
            });
        }
        Ok(())
    }

    fn block(&mut self, stmts: &[TypedStmt], frame: &mut Frame, guard: &mut Guard) -> Result<Flow, RuntimeError> {
        for stmt in stmts {
            match self.stmt(stmt, frame, guard)? {
                Flow::Next => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Next)
    }

    fn stmt(&mut self, stmt: &TypedStmt, frame: &mut Frame, guard: &mut Guard) -> Result<Flow, RuntimeError> {
        self.step(guard)?;
        match &stmt.kind {
            TypedStmtKind::Declare { slot, value } | TypedStmtKind::Assign { slot, value } => {
                let value = self.eval(value, frame, guard)?;
                *slot_mut(frame, *slot)? = value;
            }
            TypedStmtKind::IndexAssign { slot, index, value } => {
                let index = self.eval(index, frame, guard)?;
                let value = self.eval(value, frame, guard)?;
                let limit = self.config.max_collection_size;
                assign_element(slot_mut(frame, *slot)?, &index, value, limit)?;
            }
            TypedStmtKind::If {
                branches,
                otherwise,
            } => {
                for (condition, body) in branches {
                    if self.condition(condition, frame, guard)? {
                        return self.block(body, frame, guard);
                    }
                }
                if let Some(body) = otherwise {
                    return self.block(body, frame, guard);
                }
            }
            TypedStmtKind::While { condition, body } => {
                while self.condition(condition, frame, guard)? {
                    self.step(guard)?;
                    match self.block(body, frame, guard)? {
                        Flow::Break => break,
                        Flow::Next | Flow::Continue => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
            }
            TypedStmtKind::ForEach {
                slot,
                collection,
                body,
            } => {
                let items = match self.eval(collection, frame, guard)?.into_data() {
                    Data::Collection(items) => items,
                    Data::Null => return Err(null_value("for")),
                    _ => return Err(shape("for needs a collection")),
                };
                for item in items {
                    self.step(guard)?;
                    *slot_mut(frame, *slot)? = item;
                    match self.block(body, frame, guard)? {
                        Flow::Break => break,
                        Flow::Next | Flow::Continue => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
            }
            TypedStmtKind::Break => return Ok(Flow::Break),
            TypedStmtKind::Continue => return Ok(Flow::Continue),
            TypedStmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr, frame, guard)?,
                    None => nothing(),
                };
                return Ok(Flow::Return(value));
            }
            TypedStmtKind::Expr(expr) => {
                self.eval(expr, frame, guard)?;
            }
        }
        Ok(Flow::Next)
    }

    fn condition(&mut self, expr: &TypedExpr, frame: &mut Frame, guard: &mut Guard) -> Result<bool, RuntimeError> {
        self.eval(expr, frame, guard)?
            .as_bool()
            .ok_or_else(|| null_value("condition"))
    }

    fn eval(&mut self, expr: &TypedExpr, frame: &mut Frame, guard: &mut Guard) -> Result<Value, RuntimeError> {
        match &expr.kind {
            TypedExprKind::Literal(value) => Ok(value.clone()),
            TypedExprKind::Local(slot) => frame
                .get(*slot)
                .cloned()
                .ok_or_else(|| RuntimeError::Internal(format!("slot {} out of range", slot))),
            TypedExprKind::Collection { element, items } => {
                let values = self.eval_all(items, frame, guard)?;
                self.check_size(values.len())?;
                Ok(Value::collection(*element, values))
            }
            TypedExprKind::Dictionary { element, entries } => {
                self.check_size(entries.len())?;
                let nested = expr
                    .value_type()
                    .is_some_and(|ty| ty.structure == Structure::CollectionDictionary);
                if nested {
                    let mut map = indexmap::IndexMap::new();
                    for (key, value) in entries {
                        let items = match self.eval(value, frame, guard)?.into_data() {
                            Data::Collection(items) => items,
                            Data::Null => Vec::new(),
                            _ => return Err(shape("dictionary value is not a collection")),
                        };
                        map.insert(key.clone(), items);
                    }
                    Ok(Value::collection_dictionary(*element, map))
                } else {
                    let mut map = indexmap::IndexMap::new();
                    for (key, value) in entries {
                        map.insert(key.clone(), self.eval(value, frame, guard)?);
                    }
                    Ok(Value::dictionary(*element, map))
                }
            }
            TypedExprKind::Unary { op, operand } => {
                let value = self.eval(operand, frame, guard)?;
                unary(*op, &value)
            }
            TypedExprKind::Binary { op, left, right } => match op {
                BinaryOp::And => {
                    if !self.condition(left, frame, guard)? {
                        return Ok(Value::boolean(false));
                    }
                    Ok(Value::boolean(self.condition(right, frame, guard)?))
                }
                BinaryOp::Or => {
                    if self.condition(left, frame, guard)? {
                        return Ok(Value::boolean(true));
                    }
                    Ok(Value::boolean(self.condition(right, frame, guard)?))
                }
                _ => {
                    let left = self.eval(left, frame, guard)?;
                    let right = self.eval(right, frame, guard)?;
                    binary(*op, &left, &right)
                }
            },
            TypedExprKind::Builtin { function, args } => {
                let values = self.eval_all(args, frame, guard)?;
                Ok(function.call(&values, self)?)
            }
            TypedExprKind::Extension {
                op,
                receiver,
                slot,
                body,
            } => self.extension(*op, receiver, *slot, body, frame, guard),
            TypedExprKind::Index { target, index } => {
                let target = self.eval(target, frame, guard)?;
                let index = self.eval(index, frame, guard)?;
                index_value(&target, &index)
            }
            TypedExprKind::GetRegister { target, name } => {
                let entity = self.entity(target, frame, guard, "getregister")?;
                Ok(self.register.get(entity, name)?)
            }
            TypedExprKind::SetRegister {
                target,
                name,
                value,
            } => {
                let entity = self.entity(target, frame, guard, "setregister")?;
                let value = self.eval(value, frame, guard)?;
                self.set_register_value(entity, name, value)?;
                Ok(nothing())
            }
            TypedExprKind::ResetRegister { target, name } => {
                let entity = self.entity(target, frame, guard, "resetregister")?;
                self.reset_register_value(entity, name)?;
                Ok(nothing())
            }
            TypedExprKind::Fire {
                event,
                target,
                args,
            } => {
                let entity = self.entity(target, frame, guard, "fire")?;
                let values = self.eval_all(args, frame, guard)?;
                self.fire_guarded(*event, entity, &values, guard)?;
                Ok(nothing())
            }
            TypedExprKind::ProgCall { prog, args, .. } => {
                self.step(guard)?;
                let values = self.eval_all(args, frame, guard)?;
                self.execute_guarded(*prog, &values, guard)
            }
        }
    }

    fn eval_all(&mut self, exprs: &[TypedExpr], frame: &mut Frame, guard: &mut Guard) -> Result<Vec<Value>, RuntimeError> {
        exprs.iter().map(|e| self.eval(e, frame, guard)).collect()
    }

    fn entity(
        &mut self,
        expr: &TypedExpr,
        frame: &mut Frame,
        guard: &mut Guard,
        operation: &str,
    ) -> Result<EntityRef, RuntimeError> {
        self.eval(expr, frame, guard)?
            .as_entity()
            .ok_or_else(|| null_value(operation))
    }

    fn check_size(&self, len: usize) -> Result<(), RuntimeError> {
        let limit = self.config.max_collection_size;
        if len > limit {
            return Err(FunctionError::CollectionTooLarge { len, limit }.into());
        }
        Ok(())
    }

    fn extension(
        &mut self,
        op: ExtensionOp,
        receiver: &TypedExpr,
        slot: Slot,
        body: &TypedExpr,
        frame: &mut Frame,
        guard: &mut Guard,
    ) -> Result<Value, RuntimeError> {
        let collection = self.eval(receiver, frame, guard)?;
        let element = collection.ty().element();
        let items = match collection.into_data() {
            Data::Collection(items) => items,
            Data::Null => return Err(null_value(op.name())),
            _ => return Err(shape("extension receiver is not a collection")),
        };

        match op {
            ExtensionOp::Any | ExtensionOp::All | ExtensionOp::None => {
                for item in items {
                    let hit = self.predicate(item, slot, body, frame, guard)?;
                    match op {
                        ExtensionOp::Any if hit => return Ok(Value::boolean(true)),
                        ExtensionOp::All if !hit => return Ok(Value::boolean(false)),
                        ExtensionOp::None if hit => return Ok(Value::boolean(false)),
                        _ => {}
                    }
                }
                Ok(Value::boolean(op != ExtensionOp::Any))
            }
            ExtensionOp::Count => {
                let mut count = 0usize;
                for item in items {
                    if self.predicate(item, slot, body, frame, guard)? {
                        count += 1;
                    }
                }
                Ok(Value::number(count as f64))
            }
            ExtensionOp::Where => {
                let mut kept = Vec::new();
                for item in items {
                    if self.predicate(item.clone(), slot, body, frame, guard)? {
                        kept.push(item);
                    }
                }
                Ok(Value::collection(element, kept))
            }
            ExtensionOp::First => {
                for item in items {
                    if self.predicate(item.clone(), slot, body, frame, guard)? {
                        return Ok(item);
                    }
                }
                Ok(Value::null(element))
            }
            ExtensionOp::Last => {
                let mut last = None;
                for item in items {
                    if self.predicate(item.clone(), slot, body, frame, guard)? {
                        last = Some(item);
                    }
                }
                Ok(last.unwrap_or_else(|| Value::null(element)))
            }
            ExtensionOp::Sum | ExtensionOp::Average | ExtensionOp::Max | ExtensionOp::Min => {
                let mut numbers = Vec::with_capacity(items.len());
                for item in items {
                    let projected = self.project(item, slot, body, frame, guard)?;
                    numbers.push(projected.as_number().ok_or_else(|| null_value(op.name()))?);
                }
                Ok(Value::number(reduce_numbers(op, &numbers)?))
            }
            ExtensionOp::Select => {
                let inner = body.value_type().unwrap_or(ProgType::ANYTHING);
                let mut projected = Vec::with_capacity(items.len());
                for item in items {
                    projected.push(self.project(item, slot, body, frame, guard)?);
                }
                Ok(Value::collection(inner, projected))
            }
            ExtensionOp::OrderBy | ExtensionOp::OrderByDescending => {
                let mut keyed = Vec::with_capacity(items.len());
                for item in items {
                    let key = self.project(item.clone(), slot, body, frame, guard)?;
                    keyed.push((item, key));
                }
                let sorted = order_by(keyed, op == ExtensionOp::OrderByDescending);
                Ok(Value::collection(element, sorted))
            }
        }
    }

    fn project(
        &mut self,
        item: Value,
        slot: Slot,
        body: &TypedExpr,
        frame: &mut Frame,
        guard: &mut Guard,
    ) -> Result<Value, RuntimeError> {
        self.step(guard)?;
        *slot_mut(frame, slot)? = item;
        self.eval(body, frame, guard)
    }

    fn predicate(
        &mut self,
        item: Value,
        slot: Slot,
        body: &TypedExpr,
        frame: &mut Frame,
        guard: &mut Guard,
    ) -> Result<bool, RuntimeError> {
        self.project(item, slot, body, frame, guard)?
            .as_bool()
            .ok_or_else(|| null_value("predicate"))
    }
}

fn slot_mut(frame: &mut Frame, slot: Slot) -> Result<&mut Value, RuntimeError> {
    frame
        .get_mut(slot)
        .ok_or_else(|| RuntimeError::Internal(format!("slot {} out of range", slot)))
}

fn null_value(operation: &str) -> RuntimeError {
    RuntimeError::NullValue {
        operation: operation.to_string(),
    }
}

fn shape(message: &str) -> RuntimeError {
    RuntimeError::Internal(message.to_string())
}

fn unary(op: UnaryOp, value: &Value) -> Result<Value, RuntimeError> {
    match (op, value.data()) {
        (_, Data::Null) => Err(null_value(&op.to_string())),
        (UnaryOp::Neg, Data::Number(n)) => Ok(Value::number(-n)),
        (UnaryOp::Neg, Data::TimeSpan(ts)) => Ok(Value::timespan(-*ts)),
        (UnaryOp::Not, Data::Boolean(b)) => Ok(Value::boolean(!b)),
        _ => Err(shape("operand does not match its checked type")),
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Eq => return Ok(Value::boolean(values_equal(left, right))),
        BinaryOp::Ne => return Ok(Value::boolean(!values_equal(left, right))),
        _ => {}
    }

    if op == BinaryOp::Add && (left.ty() == ProgType::TEXT || right.ty() == ProgType::TEXT) {
        return Ok(Value::text(format!("{}{}", concat_part(left), concat_part(right))));
    }
    if left.is_null() || right.is_null() {
        return Err(null_value(op.symbol()));
    }

    if op.is_ordering() {
        let ordering = compare(left, right).ok_or_else(|| shape("operands are not ordered"))?;
        let result = match op {
            BinaryOp::Lt => ordering == Ordering::Less,
            BinaryOp::Le => ordering != Ordering::Greater,
            BinaryOp::Gt => ordering == Ordering::Greater,
            _ => ordering != Ordering::Less,
        };
        return Ok(Value::boolean(result));
    }

    Ok(arithmetic(op, left.data(), right.data())?)
}

/// Null concatenates as empty text.
fn concat_part(value: &Value) -> String {
    if value.is_null() {
        String::new()
    } else {
        value.to_string()
    }
}

fn arithmetic(op: BinaryOp, left: &Data, right: &Data) -> Result<Value, FunctionError> {
    let function = op.symbol();
    let numeric = |message: &str| FunctionError::Numeric {
        function,
        message: message.to_string(),
    };
    match (op, left, right) {
        (BinaryOp::Div | BinaryOp::Mod, Data::Number(_), Data::Number(d)) if *d == 0.0 => {
            Err(numeric("division by zero"))
        }
        (BinaryOp::Add, Data::Number(a), Data::Number(b)) => finite(a + b, function),
        (BinaryOp::Sub, Data::Number(a), Data::Number(b)) => finite(a - b, function),
        (BinaryOp::Mul, Data::Number(a), Data::Number(b)) => finite(a * b, function),
        (BinaryOp::Div, Data::Number(a), Data::Number(b)) => finite(a / b, function),
        (BinaryOp::Mod, Data::Number(a), Data::Number(b)) => finite(a % b, function),

        (BinaryOp::Add, Data::DateTime(t), Data::TimeSpan(d))
        | (BinaryOp::Add, Data::TimeSpan(d), Data::DateTime(t)) => t
            .checked_add_signed(*d)
            .map(Value::datetime)
            .ok_or_else(|| numeric("date out of range")),
        (BinaryOp::Sub, Data::DateTime(t), Data::TimeSpan(d)) => t
            .checked_sub_signed(*d)
            .map(Value::datetime)
            .ok_or_else(|| numeric("date out of range")),
        (BinaryOp::Sub, Data::DateTime(a), Data::DateTime(b)) => {
            Ok(Value::timespan(a.signed_duration_since(*b)))
        }
        (BinaryOp::Add, Data::TimeSpan(a), Data::TimeSpan(b)) => a
            .checked_add(b)
            .map(Value::timespan)
            .ok_or_else(|| numeric("duration out of range")),
        (BinaryOp::Sub, Data::TimeSpan(a), Data::TimeSpan(b)) => a
            .checked_sub(b)
            .map(Value::timespan)
            .ok_or_else(|| numeric("duration out of range")),
        (BinaryOp::Mul, Data::TimeSpan(d), Data::Number(n))
        | (BinaryOp::Mul, Data::Number(n), Data::TimeSpan(d)) => scale(*d, *n, function),
        (BinaryOp::Div, Data::TimeSpan(_), Data::Number(n)) if *n == 0.0 => {
            Err(numeric("division by zero"))
        }
        (BinaryOp::Div, Data::TimeSpan(d), Data::Number(n)) => scale(*d, 1.0 / n, function),
        _ => Err(FunctionError::InvalidArgument {
            function,
            message: "operands do not support this operator".to_string(),
        }),
    }
}

/// Scale a duration through milliseconds.
fn scale(span: TimeDelta, factor: f64, function: &'static str) -> Result<Value, FunctionError> {
    let millis = span.num_milliseconds() as f64 * factor;
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return Err(FunctionError::Numeric {
            function,
            message: "duration out of range".to_string(),
        });
    }
    TimeDelta::try_milliseconds(millis.round() as i64)
        .map(Value::timespan)
        .ok_or_else(|| FunctionError::Numeric {
            function,
            message: "duration out of range".to_string(),
        })
}

fn index_value(target: &Value, index: &Value) -> Result<Value, RuntimeError> {
    match target.data() {
        Data::Null => Err(null_value("index")),
        Data::Collection(items) => {
            let position = index.as_number().ok_or_else(|| null_value("index"))?;
            Ok(element_at(items, position)?)
        }
        Data::Dictionary(entries) => {
            let key = index.as_text().ok_or_else(|| null_value("index"))?;
            entries
                .get(key)
                .cloned()
                .ok_or_else(|| RuntimeError::MissingKey(key.to_string()))
        }
        Data::CollectionDictionary(entries) => {
            let key = index.as_text().ok_or_else(|| null_value("index"))?;
            let items = entries.get(key).cloned().unwrap_or_default();
            Ok(Value::collection(target.ty().element(), items))
        }
        _ => Err(shape("indexed value is not a container")),
    }
}

/// Store into a collection slot or dictionary key. New keys count against
/// `limit`.
fn assign_element(
    container: &mut Value,
    index: &Value,
    value: Value,
    limit: usize,
) -> Result<(), RuntimeError> {
    let grow = |len: usize, has_key: bool| -> Result<(), RuntimeError> {
        if !has_key && len >= limit {
            return Err(FunctionError::CollectionTooLarge { len: len + 1, limit }.into());
        }
        Ok(())
    };
    match container.data_mut() {
        Data::Null => Err(null_value("indexed assignment")),
        Data::Collection(items) => {
            let position = index.as_number().ok_or_else(|| null_value("index"))?;
            if position.fract() != 0.0 || position < 0.0 || position as usize >= items.len() {
                return Err(FunctionError::IndexOutOfRange {
                    index: position as i64,
                    len: items.len(),
                }
                .into());
            }
            items[position as usize] = value;
            Ok(())
        }
        Data::Dictionary(entries) => {
            let key = index.as_text().ok_or_else(|| null_value("index"))?;
            grow(entries.len(), entries.contains_key(key))?;
            entries.insert(key.to_string(), value);
            Ok(())
        }
        Data::CollectionDictionary(entries) => {
            let key = index.as_text().ok_or_else(|| null_value("index"))?;
            let items = match value.into_data() {
                Data::Collection(items) => items,
                Data::Null => Vec::new(),
                _ => return Err(shape("collection dictionary value is not a collection")),
            };
            grow(entries.len(), entries.contains_key(key))?;
            entries.insert(key.to_string(), items);
            Ok(())
        }
        _ => Err(shape("indexed slot is not a container")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mudprog_foundation::{ConcreteKind, Parameter, ReturnType};

    #[test]
    fn test_bind_counts_arguments() {
        let sig = ProgSignature::typed(ReturnType::Void, vec![Parameter::new("n", ProgType::NUMBER)]);
        assert_eq!(
            bind_arguments(&sig, &[]),
            Err(BindError::ArgumentCount {
                expected: 1,
                found: 0
            })
        );
    }

    #[test]
    fn test_bind_reports_position() {
        let sig = ProgSignature::typed(
            ReturnType::Void,
            vec![
                Parameter::new("who", ProgType::PERCEIVABLE),
                Parameter::new("n", ProgType::NUMBER),
            ],
        );
        let who = Value::entity(EntityRef::new(ConcreteKind::Item, 3));
        let err = bind_arguments(&sig, &[who, Value::text("x")]).unwrap_err();
        assert!(matches!(err, BindError::ArgumentType { position: 2, .. }));
    }

    #[test]
    fn test_bind_retypes_null() {
        let sig = ProgSignature::typed(ReturnType::Void, vec![Parameter::new("c", ProgType::CHARACTER)]);
        let bound = bind_arguments(&sig, &[Value::null(ProgType::ANYTHING)]).unwrap();
        assert_eq!(bound[0].ty(), ProgType::CHARACTER);
    }

    #[test]
    fn test_any_params_binds_nothing() {
        let sig = ProgSignature::any_params(ProgType::NUMBER);
        assert!(bind_arguments(&sig, &[Value::number(1.0)]).unwrap().is_empty());
    }

    #[test]
    fn test_division_by_zero() {
        let err = binary(BinaryOp::Div, &Value::number(1.0), &Value::number(0.0)).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::Function(FunctionError::Numeric {
                function: "/",
                message: "division by zero".to_string()
            })
        );
    }

    #[test]
    fn test_timespan_scaling() {
        let span = Value::timespan(TimeDelta::minutes(90));
        let doubled = binary(BinaryOp::Mul, &span, &Value::number(2.0)).unwrap();
        assert_eq!(doubled.as_timespan(), Some(TimeDelta::hours(3)));
        let halved = binary(BinaryOp::Div, &span, &Value::number(2.0)).unwrap();
        assert_eq!(halved.as_timespan(), Some(TimeDelta::minutes(45)));
    }

    #[test]
    fn test_text_concatenation() {
        let joined = binary(BinaryOp::Add, &Value::text("hp: "), &Value::number(12.0)).unwrap();
        assert_eq!(joined.as_text(), Some("hp: 12"));
        let with_null = binary(BinaryOp::Add, &Value::text("a"), &Value::null(ProgType::TEXT)).unwrap();
        assert_eq!(with_null.as_text(), Some("a"));
    }

    #[test]
    fn test_null_in_arithmetic() {
        let err = binary(BinaryOp::Add, &Value::number(1.0), &Value::null(ProgType::NUMBER)).unwrap_err();
        assert!(matches!(err, RuntimeError::NullValue { .. }));
    }

    #[test]
    fn test_collection_dictionary_miss_is_empty() {
        let dict = Value::collection_dictionary(ProgType::NUMBER, indexmap::IndexMap::new());
        let found = index_value(&dict, &Value::text("x")).unwrap();
        assert_eq!(found.as_collection().map(<[Value]>::len), Some(0));
        let plain = Value::dictionary(ProgType::NUMBER, indexmap::IndexMap::new());
        assert_eq!(
            index_value(&plain, &Value::text("x")),
            Err(RuntimeError::MissingKey("x".to_string()))
        );
    }
}
