//! Built-in registrations, one module per category.

mod collection;
pub use collection::element_at;
mod datetime;
mod gender;
mod logic;
mod math;
mod output;
mod text;
mod world;

use mudprog_foundation::{ProgType, Value};

/// Placeholder result for Void built-ins.
pub(crate) fn nothing() -> Value {
    Value::null(ProgType::ANYTHING)
}
