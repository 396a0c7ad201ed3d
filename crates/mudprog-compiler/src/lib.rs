// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Prog compiler.
//!
//! ```text
//! source ──parse──▶ Block ──check──▶ CompiledProg
//!                               ╰──▶ Vec<CompileError>
//! ```
//!
//! Checking binds every identifier to a parameter, a local, a built-in, a
//! collection extension, another prog or a register variable; types every
//! expression against the single assignability relation; validates
//! statement structure; and verifies every normally-completing path
//! returns a value of the declared return type.
//!
//! Compilation is pure: the same source, signature and environment always
//! produce the same result, and nothing is executed.
//!
//! ```
//! use mudprog_compiler::{compile, EmptyEnvironment};
//! use mudprog_foundation::{ProgSignature, ProgType};
//!
//! let sig = ProgSignature::typed(ProgType::NUMBER, vec![]);
//! let prog = compile("return 2 + 2;", &sig, &EmptyEnvironment).unwrap();
//! assert_eq!(prog.slot_count, 0);
//! ```

mod check;
pub mod env;
pub mod error;
pub mod returns;
pub mod scope;
pub mod unify;

pub use env::{CompileEnvironment, EmptyEnvironment, ProgHandle, StaticEnvironment};
pub use error::{CompileError, DiagnosticFormatter, ErrorKind, Label, Severity};

use mudprog_ast::{Block, CompiledProg};
use mudprog_foundation::ProgSignature;
use tracing::debug;

use crate::check::Checker;

/// Compile prog source against a signature.
pub fn compile(
    source: &str,
    signature: &ProgSignature,
    env: &dyn CompileEnvironment,
) -> Result<CompiledProg, Vec<CompileError>> {
    let block = mudprog_parser::parse_program(source)
        .map_err(|errors| errors.into_iter().map(CompileError::from).collect::<Vec<_>>())?;
    compile_block(&block, signature, env)
}

/// Check an already parsed prog body.
pub fn compile_block(
    block: &Block,
    signature: &ProgSignature,
    env: &dyn CompileEnvironment,
) -> Result<CompiledProg, Vec<CompileError>> {
    let parameter_count = signature.parameters().map_or(0, <[_]>::len);
    let result = Checker::new(env, signature).finish(block, parameter_count);
    match &result {
        Ok(prog) => debug!(
            statements = prog.body.len(),
            slots = prog.slot_count,
            "prog compiled"
        ),
        Err(errors) => debug!(errors = errors.len(), "prog failed to compile"),
    }
    result
}
