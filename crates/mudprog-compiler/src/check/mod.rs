//! The checking pass: untyped syntax tree → compiled tree.
//!
//! One [`Checker`] walks the statements of a prog once. Each statement is
//! checked independently: an error is recorded and checking moves on to the
//! next statement, so a prog with several mistakes reports all of them.
//! Names that failed to declare are still bound so later statements do not
//! report spurious "undefined name" errors.

mod call;
mod expr;
mod stmt;

use mudprog_ast::{Block, CompiledProg};
use mudprog_foundation::{ProgSignature, ReturnType, Span};

use crate::env::CompileEnvironment;
use crate::error::{CompileError, ErrorKind};
use crate::returns::block_diverges;
use crate::scope::Scopes;

/// Result of checking one node.
pub(crate) type Checked<T> = Result<T, CompileError>;

/// Checking state for one prog.
pub(crate) struct Checker<'env> {
    env: &'env dyn CompileEnvironment,
    return_type: ReturnType,
    scopes: Scopes,
    loop_depth: usize,
    errors: Vec<CompileError>,
}

impl<'env> Checker<'env> {
    pub(crate) fn new(env: &'env dyn CompileEnvironment, signature: &ProgSignature) -> Self {
        let mut checker = Self {
            env,
            return_type: signature.return_type(),
            scopes: Scopes::new(),
            loop_depth: 0,
            errors: Vec::new(),
        };
        for param in signature.parameters().unwrap_or_default() {
            if checker.scopes.declare(&param.name, param.ty).is_none() {
                checker.errors.push(CompileError::new(
                    ErrorKind::DuplicateName,
                    Span::zero(),
                    format!("parameter '{}' is declared twice", param.name),
                ));
            }
        }
        checker
    }

    /// Check a whole prog body.
    pub(crate) fn finish(
        mut self,
        block: &Block,
        parameter_count: usize,
    ) -> Result<CompiledProg, Vec<CompileError>> {
        let body = self.block(block);

        if let ReturnType::Value(ty) = self.return_type
            && !block_diverges(&body)
        {
            let end = block.last().map_or(0, |stmt| stmt.span.end);
            self.errors.push(
                CompileError::new(
                    ErrorKind::MissingReturn,
                    Span::new(end, end),
                    "not every path through the prog returns a value".to_string(),
                )
                .with_note(format!("end every path with 'return' and a {}", ty)),
            );
        }

        if self.errors.is_empty() {
            Ok(CompiledProg {
                body,
                slot_count: self.scopes.slot_count(),
                parameter_count,
                return_type: self.return_type,
            })
        } else {
            Err(self.errors)
        }
    }
}
