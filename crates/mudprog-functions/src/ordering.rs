//! Equality and ordering over runtime values.
//!
//! Shared by comparison operators, `contains`/`remove` and the ordering
//! extensions so every construct agrees on what "equal" means.

use mudprog_foundation::{Data, Value};
use std::cmp::Ordering;

/// Structural equality.
///
/// Entities compare by kind and id, numbers by value, containers
/// element-wise. A null only equals another null.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.data(), b.data()) {
        (Data::Null, Data::Null) => true,
        (Data::Entity(x), Data::Entity(y)) => {
            x == y && a.ty().concrete_kind() == b.ty().concrete_kind()
        }
        (Data::Collection(xs), Data::Collection(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Data::Dictionary(xs), Data::Dictionary(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        (x, y) => x == y,
    }
}

/// Ordering for values that have one.
///
/// Numbers, text, calendar times and durations are ordered; everything
/// else returns `None`.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a.data(), b.data()) {
        (Data::Number(x), Data::Number(y)) => x.partial_cmp(y),
        (Data::Text(x), Data::Text(y)) => Some(x.cmp(y)),
        (Data::DateTime(x), Data::DateTime(y)) => Some(x.cmp(y)),
        (Data::TimeSpan(x), Data::TimeSpan(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
