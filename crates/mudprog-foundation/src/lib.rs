// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Prog Foundation
//!
//! Core types shared by every stage of the prog engine: the type algebra
//! used for compatibility checks, runtime values, source spans, stable
//! identifiers, prog signatures, the static event table and the world
//! registry seam.

pub mod events;
pub mod ids;
pub mod signature;
pub mod span;
pub mod types;
pub mod value;
pub mod world;

pub use events::{EventParameter, EventType};
pub use ids::{DefaultHookId, HookId, ProgId, ScheduleId};
pub use signature::{Parameter, ProgSignature, ReturnType};
pub use span::Span;
pub use types::{Capability, ConcreteKind, ProgType, Structure, TypeParseError, TypeTag, is_assignable};
pub use value::{Data, EntityRef, Gender, Value};
pub use world::WorldRegistry;
