//! Call binding.
//!
//! A call name is tried, in order, as:
//! 1. a special form (`getregister`, `setregister`, `resetregister`, `fire`)
//! 2. a collection extension, when an argument is a lambda
//! 3. a register variable accessor, for `target.name` with no arguments
//!    when the target's kind has a register variable of that name
//! 4. a built-in, by best-match overload
//! 5. another prog, through the compile environment
//!
//! Function names are case-insensitive; everything is bound here so the
//! interpreter never looks a name up.

use mudprog_ast::{Expr, ExprKind, TypedExpr, TypedExprKind};
use mudprog_foundation::{ConcreteKind, EventType, ProgSignature, ProgType, ReturnType, Span};
use mudprog_functions::{ExtensionOp, ResolveError};

use super::expr::null;
use super::{Checked, Checker};
use crate::env::ProgHandle;
use crate::error::{CompileError, ErrorKind};

impl Checker<'_> {
    pub(super) fn call(
        &mut self,
        name: &str,
        name_span: Span,
        args: &[Expr],
        method: bool,
        span: Span,
    ) -> Checked<TypedExpr> {
        let lower = name.to_lowercase();
        match lower.as_str() {
            "getregister" => return self.get_register(args, span),
            "setregister" => return self.set_register(args, span),
            "resetregister" => return self.reset_register(args, span),
            "fire" => return self.fire(args, span),
            _ => {}
        }

        if args.iter().any(Expr::is_lambda) {
            return self.extension(&lower, name_span, args, span);
        }
        if method && let [target] = args {
            let target = self.value(target)?;
            if let Some(ty) = self.register_type_of(&target, &lower) {
                return Ok(register_read(target, &lower, ty, span));
            }
        }
        if mudprog_functions::is_known(&lower) {
            return self.builtin(&lower, name_span, args, span);
        }
        if let Some(handle) = self.env.prog(name) {
            return self.prog_call(name, handle, args, span);
        }
        Err(CompileError::new(
            ErrorKind::UnknownFunction,
            name_span,
            format!("'{}' is not a function, prog or register variable", name),
        ))
    }

    fn builtin(&mut self, name: &str, name_span: Span, args: &[Expr], span: Span) -> Checked<TypedExpr> {
        let mut typed: Vec<Option<TypedExpr>> = Vec::with_capacity(args.len());
        for arg in args {
            typed.push(match arg.kind {
                ExprKind::Null => None,
                _ => Some(self.value(arg)?),
            });
        }
        let types: Vec<Option<ProgType>> = typed
            .iter()
            .map(|arg| arg.as_ref().and_then(TypedExpr::value_type))
            .collect();

        let resolved = mudprog_functions::resolve(name, &types).map_err(|error| {
            let shown: Vec<String> = types
                .iter()
                .map(|ty| ty.map_or_else(|| "null".to_string(), |ty| ty.to_string()))
                .collect();
            match error {
                ResolveError::Unknown => CompileError::new(
                    ErrorKind::UnknownFunction,
                    name_span,
                    format!("unknown function '{}'", name),
                ),
                ResolveError::NoMatch { candidates } => {
                    let kind = if candidates_with_arity(name, args.len()) {
                        ErrorKind::TypeMismatch
                    } else {
                        ErrorKind::WrongArgCount
                    };
                    candidates.into_iter().fold(
                        CompileError::new(
                            kind,
                            span,
                            format!("no overload of '{}' accepts ({})", name, shown.join(", ")),
                        ),
                        |error, candidate| error.with_note(format!("candidate: {}", candidate)),
                    )
                }
                ResolveError::Ambiguous { candidates } => candidates.into_iter().fold(
                    CompileError::new(
                        ErrorKind::AmbiguousCall,
                        span,
                        format!("call to '{}' with ({}) is ambiguous", name, shown.join(", ")),
                    ),
                    |error, candidate| error.with_note(format!("could be: {}", candidate)),
                ),
            }
        })?;

        let descriptor = resolved.descriptor;
        let args = typed
            .into_iter()
            .zip(args)
            .zip(descriptor.parameters)
            .map(|((typed, arg), param)| typed.unwrap_or_else(|| null(*param, arg.span)))
            .collect();
        let kind = TypedExprKind::Builtin {
            function: descriptor,
            args,
        };
        Ok(match resolved.return_type {
            ReturnType::Void => TypedExpr::void(kind, span),
            ReturnType::Value(ty) => TypedExpr::new(kind, ty, span),
        })
    }

    fn extension(&mut self, name: &str, name_span: Span, args: &[Expr], span: Span) -> Checked<TypedExpr> {
        let Some(op) = ExtensionOp::from_name(name) else {
            return Err(CompileError::new(
                ErrorKind::InvalidExtension,
                name_span,
                format!("'{}' is not a collection extension", name),
            )
            .with_note(format!(
                "extensions are: {}",
                ExtensionOp::ALL.map(ExtensionOp::name).join(", ")
            )));
        };
        let [receiver, lambda] = args else {
            return Err(CompileError::new(
                ErrorKind::InvalidExtension,
                span,
                format!("'{}' takes a collection and one lambda", op),
            ));
        };
        let ExprKind::Lambda { param, body } = &lambda.kind else {
            return Err(CompileError::new(
                ErrorKind::InvalidExtension,
                receiver.span,
                format!("the collection must come before the lambda in '{}'", op),
            ));
        };

        let receiver = self.value(receiver)?;
        let receiver_type = receiver.value_type().unwrap_or(ProgType::ANYTHING);
        if !receiver_type.is_collection() {
            return Err(CompileError::new(
                ErrorKind::InvalidExtension,
                receiver.span,
                format!("'{}' needs a collection, found {}", op, receiver_type),
            ));
        }

        self.scopes.push();
        let slot = self
            .scopes
            .declare(param, receiver_type.element())
            .map(|local| local.slot);
        let body = self.value(body);
        self.scopes.pop();
        let body = body?;

        let slot = slot.ok_or_else(|| {
            CompileError::new(
                ErrorKind::Internal,
                lambda.span,
                format!("lambda parameter '{}' could not be bound", param),
            )
        })?;
        let inner = body.value_type().unwrap_or(ProgType::ANYTHING);
        let requirement = op.requirement();
        if !requirement.accepts(inner) {
            return Err(CompileError::new(
                ErrorKind::InvalidExtension,
                body.span,
                format!("the lambda for '{}' must return {}, found {}", op, requirement, inner),
            ));
        }

        Ok(TypedExpr::new(
            TypedExprKind::Extension {
                op,
                receiver: Box::new(receiver),
                slot,
                body: Box::new(body),
            },
            op.result_type(receiver_type, inner),
            span,
        ))
    }

    fn prog_call(&mut self, name: &str, handle: ProgHandle, args: &[Expr], span: Span) -> Checked<TypedExpr> {
        let typed = match &handle.signature {
            ProgSignature::Typed { parameters, .. } => {
                if parameters.len() != args.len() {
                    return Err(CompileError::new(
                        ErrorKind::WrongArgCount,
                        span,
                        format!(
                            "prog '{}' takes {} argument(s), {} given",
                            name,
                            parameters.len(),
                            args.len()
                        ),
                    )
                    .with_note(format!("signature: {}", handle.signature)));
                }
                args.iter()
                    .zip(parameters)
                    .map(|(arg, param)| self.expect(arg, param.ty))
                    .collect::<Checked<Vec<_>>>()?
            }
            ProgSignature::AnyParams { .. } => args
                .iter()
                .map(|arg| match arg.kind {
                    ExprKind::Null => Ok(null(ProgType::ANYTHING, arg.span)),
                    _ => self.value(arg),
                })
                .collect::<Checked<Vec<_>>>()?,
        };
        let kind = TypedExprKind::ProgCall {
            prog: handle.id,
            name: name.to_string(),
            args: typed,
        };
        Ok(match handle.signature.return_type() {
            ReturnType::Void => TypedExpr::void(kind, span),
            ReturnType::Value(ty) => TypedExpr::new(kind, ty, span),
        })
    }

    /// Type of register `name` on the target's entity kind, if registered.
    fn register_type_of(&self, target: &TypedExpr, name: &str) -> Option<ProgType> {
        target
            .value_type()
            .filter(|ty| ty.is_reference())
            .and_then(ProgType::concrete_kind)
            .and_then(|host| self.env.register_type(host, name))
    }

    fn get_register(&mut self, args: &[Expr], span: Span) -> Checked<TypedExpr> {
        let [target, name] = args else {
            return Err(arg_count("getregister", 2, args.len(), span));
        };
        let (target, name, ty) = self.register_target(target, name)?;
        Ok(register_read(target, &name, ty, span))
    }

    fn set_register(&mut self, args: &[Expr], span: Span) -> Checked<TypedExpr> {
        let [target, name, value] = args else {
            return Err(arg_count("setregister", 3, args.len(), span));
        };
        let (target, name, ty) = self.register_target(target, name)?;
        let value = self.expect(value, ty)?;
        Ok(TypedExpr::void(
            TypedExprKind::SetRegister {
                target: Box::new(target),
                name,
                value: Box::new(value),
            },
            span,
        ))
    }

    fn reset_register(&mut self, args: &[Expr], span: Span) -> Checked<TypedExpr> {
        let [target, name] = args else {
            return Err(arg_count("resetregister", 2, args.len(), span));
        };
        let (target, name, _) = self.register_target(target, name)?;
        Ok(TypedExpr::void(
            TypedExprKind::ResetRegister {
                target: Box::new(target),
                name,
            },
            span,
        ))
    }

    /// Check a register host and name, returning the register's type.
    fn register_target(&mut self, target: &Expr, name: &Expr) -> Checked<(TypedExpr, String, ProgType)> {
        let register = name.as_text_literal().map(str::to_lowercase).ok_or_else(|| {
            CompileError::new(
                ErrorKind::InvalidRegister,
                name.span,
                "the register name must be a text literal".to_string(),
            )
        })?;
        let target = self.value(target)?;
        let ty = target.value_type().unwrap_or(ProgType::ANYTHING);
        let host: ConcreteKind = ty
            .concrete_kind()
            .filter(|kind| ty.is_single() && kind.is_entity())
            .ok_or_else(|| {
                CompileError::new(
                    ErrorKind::InvalidRegister,
                    target.span,
                    format!("register variables live on a single entity kind, found {}", ty),
                )
            })?;
        let register_type = self.env.register_type(host, &register).ok_or_else(|| {
            CompileError::new(
                ErrorKind::InvalidRegister,
                name.span,
                format!("{} has no register variable '{}'", host, register),
            )
        })?;
        Ok((target, register, register_type))
    }

    fn fire(&mut self, args: &[Expr], span: Span) -> Checked<TypedExpr> {
        let [event, target, rest @ ..] = args else {
            return Err(CompileError::new(
                ErrorKind::WrongArgCount,
                span,
                "'fire' takes an event name, a target and the event's arguments".to_string(),
            ));
        };
        let event: EventType = event
            .as_text_literal()
            .ok_or_else(|| "the event name must be a text literal".to_string())
            .and_then(str::parse)
            .map_err(|message| CompileError::new(ErrorKind::InvalidEvent, event.span, message))?;

        let target = self.value(target)?;
        let target_type = target.value_type().unwrap_or(ProgType::ANYTHING);
        if !target_type.is_reference() {
            return Err(CompileError::new(
                ErrorKind::InvalidEvent,
                target.span,
                format!("events fire on world entities, found {}", target_type),
            ));
        }

        let params = event.parameters();
        if params.len() != rest.len() {
            let expected: Vec<String> = params
                .iter()
                .map(|p| format!("{}: {}", p.name, p.ty))
                .collect();
            return Err(CompileError::new(
                ErrorKind::WrongArgCount,
                span,
                format!(
                    "event {} takes {} argument(s), {} given",
                    event,
                    params.len(),
                    rest.len()
                ),
            )
            .with_note(format!("{}({})", event, expected.join(", "))));
        }
        let args = rest
            .iter()
            .zip(params)
            .map(|(arg, param)| self.expect(arg, param.ty))
            .collect::<Checked<Vec<_>>>()?;

        Ok(TypedExpr::void(
            TypedExprKind::Fire {
                event,
                target: Box::new(target),
                args,
            },
            span,
        ))
    }
}

fn candidates_with_arity(name: &str, arity: usize) -> bool {
    mudprog_functions::overloads(name).any(|b| b.arity() == arity)
}

fn arg_count(name: &str, expected: usize, given: usize, span: Span) -> CompileError {
    CompileError::new(
        ErrorKind::WrongArgCount,
        span,
        format!("'{}' takes {} arguments, {} given", name, expected, given),
    )
}

fn register_read(target: TypedExpr, name: &str, ty: ProgType, span: Span) -> TypedExpr {
    TypedExpr::new(
        TypedExprKind::GetRegister {
            target: Box::new(target),
            name: name.to_string(),
        },
        ty,
        span,
    )
}
