//! The services built-ins may call back into.

use chrono::NaiveDateTime;
use mudprog_foundation::{EntityRef, WorldRegistry};

/// Execution-side services available to built-in functions.
///
/// The interpreter implements this over the engine's world, calendar and
/// output buffer. Built-ins never reach world state any other way.
pub trait FunctionHost {
    /// World lookups.
    fn world(&self) -> &dyn WorldRegistry;

    /// Current in-world time.
    fn now(&self) -> NaiveDateTime;

    /// Deliver a line of text to an entity.
    fn send(&mut self, target: EntityRef, message: &str);

    /// Largest collection a built-in may produce.
    fn max_collection_size(&self) -> usize {
        usize::MAX
    }
}
