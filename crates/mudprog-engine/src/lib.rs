// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Prog engine.
//!
//! Owns the prog table and everything built on it:
//!
//! - **Execution**: [`Engine::execute`] binds arguments, consults the static
//!   cache and interprets the compiled form under a call-depth limit and a
//!   step budget.
//! - **Hooks**: event → payload bindings installed on entities, fired with
//!   per-prog failure isolation; default-hook rules applied at
//!   materialization.
//! - **Register**: typed per-kind variables with sparse per-entity values;
//!   schema changes recompile every prog.
//! - **Scheduler**: recurring executions driven by the in-world calendar.
//!
//! ```
//! use mudprog_engine::{Engine, EngineConfig, GameCalendar, MemoryWorld, ProgDefinition};
//! use mudprog_foundation::{ProgSignature, ProgType, Value};
//!
//! let mut engine = Engine::new(
//!     EngineConfig::default(),
//!     Box::new(MemoryWorld::new()),
//!     Box::new(GameCalendar::default()),
//! );
//! let sig = ProgSignature::typed(ProgType::NUMBER, vec![]);
//! let id = engine
//!     .create_prog(ProgDefinition::new("four", sig, "return 2 + 2;"))
//!     .unwrap();
//! assert_eq!(engine.execute(id, &[]).unwrap(), Value::number(4.0));
//! ```

pub mod calendar;
pub mod coerce;
pub mod config;
pub mod engine;
pub mod error;
pub mod hooks;
mod interp;
pub mod interval;
pub mod persist;
pub mod prog;
pub mod register;
pub mod schedule;
pub mod world;

pub use calendar::{Calendar, GameCalendar};
pub use coerce::{CoercionError, coerce};
pub use config::{ConfigError, EngineConfig};
pub use engine::{Delivery, Engine};
pub use error::{BindError, EngineError, HookError, RegisterError, RuntimeError, ScheduleError};
pub use hooks::{DefaultHook, FireReport, Hook, HookKind};
pub use interp::bind_arguments;
pub use interval::{IntervalParseError, IntervalUnit, RecurringInterval};
pub use persist::{
    DefaultHookRecord, HookRecord, LoadError, ProgRecord, RegisterEntryRecord,
    RegisterValueRecord, ScheduleRecord, Snapshot,
};
pub use prog::{CompileStatus, Prog, ProgDefinition, Staticness, SweepReport};
pub use register::{Register, RegisterEntry};
pub use schedule::{ProgSchedule, TickReport};
pub use world::MemoryWorld;
