//! Engine errors, one enum per concern.
//!
//! Compile errors are not here: they are stored on the prog
//! (`CompileStatus::Failed`) and never returned from an edit.

use mudprog_foundation::{
    ConcreteKind, DefaultHookId, EntityRef, EventType, HookId, ProgId, ProgType, ScheduleId,
};
use mudprog_functions::FunctionError;
use thiserror::Error;

/// Arguments or a signature that do not fit.
///
/// Raised before any evaluation or mutation happens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    /// Wrong number of arguments.
    #[error("expected {expected} argument(s), found {found}")]
    ArgumentCount {
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        found: usize,
    },

    /// Argument not assignable to its parameter.
    #[error("argument {position} ('{parameter}'): expected {expected}, found {found}")]
    ArgumentType {
        /// One-based argument position
        position: usize,
        /// Parameter name
        parameter: String,
        /// Declared parameter type
        expected: ProgType,
        /// Runtime type of the argument
        found: ProgType,
    },

    /// A prog cannot be attached where its signature is required to accept
    /// a fixed argument tuple.
    #[error("prog '{prog}' with signature {signature} cannot accept {required}")]
    IncompatibleSignature {
        /// Prog name
        prog: String,
        /// Prog signature
        signature: String,
        /// What the attachment point passes
        required: String,
    },
}

/// Failure during execution, caught at the `execute` boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// The prog has no compiled form.
    #[error("prog '{0}' is not executable: it does not compile")]
    NotExecutable(String),

    /// No prog with this id.
    #[error("no such prog: {0}")]
    UnknownProg(ProgId),

    /// Arguments did not bind.
    #[error("cannot bind arguments: {0}")]
    Bind(#[from] BindError),

    /// Too many nested executions.
    #[error("execution depth exceeded (limit {limit})")]
    DepthExceeded {
        /// Configured limit
        limit: usize,
    },

    /// Too many statements or iterations in one execution.
    #[error("execution budget exceeded ({limit} steps)")]
    BudgetExceeded {
        /// Configured limit
        limit: u64,
    },

    /// A built-in or operator failed.
    #[error(transparent)]
    Function(#[from] FunctionError),

    /// A null value reached an operation that needs a payload.
    #[error("null value used in {operation}")]
    NullValue {
        /// Operator or construct
        operation: String,
    },

    /// A dictionary lookup missed.
    #[error("dictionary has no key '{0}'")]
    MissingKey(String),

    /// Register access failed.
    #[error(transparent)]
    Register(#[from] RegisterError),

    /// A value did not have the shape its checked type promised.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RuntimeError {
    /// True for the depth and budget guards.
    pub fn is_guard(&self) -> bool {
        matches!(
            self,
            RuntimeError::DepthExceeded { .. } | RuntimeError::BudgetExceeded { .. }
        )
    }
}

/// Hook management failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HookError {
    /// No hook with this id.
    #[error("no such hook: {0}")]
    UnknownHook(HookId),

    /// No default hook with this id.
    #[error("no such default hook: {0}")]
    UnknownDefaultHook(DefaultHookId),

    /// No prog with this id.
    #[error("no such prog: {0}")]
    UnknownProg(ProgId),

    /// Hook names are unique.
    #[error("a hook named '{0}' already exists")]
    DuplicateName(String),

    /// Command hooks need an event carrying a command.
    #[error("event {0} carries no command, so it cannot drive a command hook")]
    NotCommandEvent(EventType),

    /// The prog is not attached to the hook.
    #[error("prog {prog} is not attached to hook {hook}")]
    NotAttached {
        /// Hook
        hook: HookId,
        /// Prog
        prog: ProgId,
    },

    /// A hook's payload needs at least one prog.
    #[error("a hook needs at least one prog")]
    EmptyPayload,

    /// The resulting payload set would not accept the event's arguments.
    #[error(transparent)]
    Bind(#[from] BindError),

    /// Default hooks apply to world entity kinds only.
    #[error("default hooks need an entity kind, found {0}")]
    InvalidKind(ConcreteKind),

    /// The eligibility prog must return Boolean.
    #[error("eligibility prog '{0}' must return Boolean")]
    EligibilityReturnType(String),
}

/// Register schema or value failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegisterError {
    /// Only a single concrete entity kind can host register variables.
    #[error("{0} cannot host register variables")]
    InvalidHost(ProgType),

    /// The variable's own type cannot be stored.
    #[error("register variables cannot hold {0}")]
    InvalidType(ProgType),

    /// Names are identifiers.
    #[error("'{0}' is not a valid register variable name")]
    InvalidName(String),

    /// Already registered.
    #[error("{host} already has a register variable '{name}'")]
    AlreadyRegistered {
        /// Host kind
        host: ConcreteKind,
        /// Variable name
        name: String,
    },

    /// Not registered.
    #[error("{host} has no register variable '{name}'")]
    UnknownVariable {
        /// Host kind
        host: ConcreteKind,
        /// Variable name
        name: String,
    },

    /// Value not assignable to the variable's type.
    #[error("register variable '{name}' holds {expected}, found {found}")]
    TypeMismatch {
        /// Variable name
        name: String,
        /// Declared type
        expected: ProgType,
        /// Supplied type
        found: ProgType,
    },

    /// Values can only be stored on live entities.
    #[error("{0} does not exist")]
    MissingEntity(EntityRef),
}

/// Schedule management failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    /// No schedule with this id.
    #[error("no such schedule: {0}")]
    UnknownSchedule(ScheduleId),

    /// No prog with this id.
    #[error("no such prog: {0}")]
    UnknownProg(ProgId),

    /// Scheduled progs run with no arguments.
    #[error(transparent)]
    Bind(#[from] BindError),

    /// The interval could not be applied to the start time.
    #[error("'{0}' cannot be applied from {1}")]
    OutOfRange(String, chrono::NaiveDateTime),
}

/// Prog table failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// No prog with this id.
    #[error("no such prog: {0}")]
    UnknownProg(ProgId),

    /// Prog names are unique, ignoring case.
    #[error("a prog named '{0}' already exists")]
    DuplicateName(String),

    /// Prog names are identifiers.
    #[error("'{0}' is not a valid prog name")]
    InvalidName(String),

    /// The new signature breaks a hook, default hook or schedule.
    #[error(transparent)]
    Bind(#[from] BindError),

    /// The prog is still referenced.
    #[error("prog '{prog}' is still used by {}", .uses.join(", "))]
    ProgInUse {
        /// Prog name
        prog: String,
        /// Human-readable list of referencing records
        uses: Vec<String>,
    },
}
