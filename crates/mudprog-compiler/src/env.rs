//! What a prog can see besides its own parameters and locals.
//!
//! The compiler never reaches into the engine directly. The engine hands it
//! a [`CompileEnvironment`] describing the register schema and the callable
//! progs at the moment of compilation, which is what makes a recompilation
//! sweep after a schema change meaningful.

use indexmap::IndexMap;
use mudprog_foundation::{ConcreteKind, ProgId, ProgSignature, ProgType};

/// A callable prog as seen by the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgHandle {
    /// Stable id used for dispatch
    pub id: ProgId,
    /// Callee signature
    pub signature: ProgSignature,
}

/// Compile-time view of the register schema and prog table.
pub trait CompileEnvironment {
    /// Declared type of register variable `name` on `host`, if registered.
    ///
    /// `name` is already lowercased.
    fn register_type(&self, host: ConcreteKind, name: &str) -> Option<ProgType>;

    /// The prog called `name` (case-insensitive), if any.
    fn prog(&self, name: &str) -> Option<ProgHandle>;
}

/// An environment with no registers and no other progs.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyEnvironment;

impl CompileEnvironment for EmptyEnvironment {
    fn register_type(&self, _host: ConcreteKind, _name: &str) -> Option<ProgType> {
        None
    }

    fn prog(&self, _name: &str) -> Option<ProgHandle> {
        None
    }
}

/// A self-contained environment built up front.
///
/// Useful for tests and for tools that compile outside an engine.
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    registers: IndexMap<(ConcreteKind, String), ProgType>,
    progs: IndexMap<String, ProgHandle>,
}

impl StaticEnvironment {
    /// Empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a register variable.
    pub fn with_register(mut self, host: ConcreteKind, name: &str, ty: ProgType) -> Self {
        self.registers.insert((host, name.to_lowercase()), ty);
        self
    }

    /// Declare a callable prog.
    pub fn with_prog(mut self, name: &str, id: ProgId, signature: ProgSignature) -> Self {
        self.progs
            .insert(name.to_lowercase(), ProgHandle { id, signature });
        self
    }
}

impl CompileEnvironment for StaticEnvironment {
    fn register_type(&self, host: ConcreteKind, name: &str) -> Option<ProgType> {
        self.registers.get(&(host, name.to_string())).copied()
    }

    fn prog(&self, name: &str) -> Option<ProgHandle> {
        self.progs.get(&name.to_lowercase()).cloned()
    }
}
