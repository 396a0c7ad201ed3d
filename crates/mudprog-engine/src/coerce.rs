//! Turning operator text into typed values.
//!
//! Used wherever a human supplies arguments: executing a prog from the
//! command line, setting register defaults, firing test events.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use mudprog_foundation::{ConcreteKind, Gender, ProgType, Structure, Value, WorldRegistry};
use thiserror::Error;

/// Why text could not be coerced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    /// Not a number.
    #[error("'{0}' is not a number")]
    Number(String),
    /// Not true/false/yes/no.
    #[error("'{0}' is not a boolean (use true, false, yes or no)")]
    Boolean(String),
    /// Not a gender name.
    #[error("'{0}' is not a gender")]
    Gender(String),
    /// Not `YYYY-MM-DD [HH:MM[:SS]]`.
    #[error("'{0}' is not a date and time (use YYYY-MM-DD HH:MM:SS)")]
    DateTime(String),
    /// Not `1d2h30m5s` notation.
    #[error("'{0}' is not a time span (use e.g. 1d2h30m)")]
    TimeSpan(String),
    /// The world registry has no match.
    #[error("no {kind} matches '{key}'")]
    NotFound {
        /// Kind searched
        kind: ConcreteKind,
        /// Key supplied
        key: String,
    },
    /// No member of a union type accepted the text.
    #[error("'{text}' is not a valid {ty}")]
    NoMatch {
        /// Target type
        ty: ProgType,
        /// Text supplied
        text: String,
    },
    /// Dictionaries cannot be written as text.
    #[error("{0} values cannot be entered as text")]
    Unsupported(ProgType),
}

/// Coerce `text` into a value of type `ty`.
///
/// Collections are comma-separated. `null` is accepted for entity types.
/// Union types try each member kind in catalogue order.
pub fn coerce(text: &str, ty: ProgType, world: &dyn WorldRegistry) -> Result<Value, CoercionError> {
    match ty.structure {
        Structure::Single => coerce_single(text, ty, world),
        Structure::Collection => {
            let element = ty.element();
            let items = text
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| coerce_single(part, element, world))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::collection(element, items))
        }
        Structure::Dictionary | Structure::CollectionDictionary => Err(CoercionError::Unsupported(ty)),
    }
}

fn coerce_single(text: &str, ty: ProgType, world: &dyn WorldRegistry) -> Result<Value, CoercionError> {
    let trimmed = text.trim();
    if ty.is_reference() && trimmed.eq_ignore_ascii_case("null") {
        return Ok(Value::null(ty));
    }
    if let Some(kind) = ty.concrete_kind() {
        return coerce_kind(text, kind, world);
    }
    ty.tag
        .members()
        .iter()
        .find_map(|kind| coerce_kind(text, *kind, world).ok())
        .ok_or_else(|| CoercionError::NoMatch {
            ty,
            text: trimmed.to_string(),
        })
}

fn coerce_kind(text: &str, kind: ConcreteKind, world: &dyn WorldRegistry) -> Result<Value, CoercionError> {
    let trimmed = text.trim();
    match kind {
        ConcreteKind::Boolean => match trimmed.to_lowercase().as_str() {
            "true" | "yes" => Ok(Value::boolean(true)),
            "false" | "no" => Ok(Value::boolean(false)),
            _ => Err(CoercionError::Boolean(trimmed.to_string())),
        },
        ConcreteKind::Number => trimmed
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::number)
            .ok_or_else(|| CoercionError::Number(trimmed.to_string())),
        ConcreteKind::Text => Ok(Value::text(text)),
        ConcreteKind::Gender => Gender::from_name(trimmed)
            .map(Value::gender)
            .ok_or_else(|| CoercionError::Gender(trimmed.to_string())),
        ConcreteKind::DateTime => parse_datetime(trimmed)
            .map(Value::datetime)
            .ok_or_else(|| CoercionError::DateTime(trimmed.to_string())),
        ConcreteKind::TimeSpan => parse_timespan(trimmed)
            .map(Value::timespan)
            .ok_or_else(|| CoercionError::TimeSpan(trimmed.to_string())),
        entity => world
            .lookup(entity, trimmed)
            .map(Value::entity)
            .ok_or_else(|| CoercionError::NotFound {
                kind: entity,
                key: trimmed.to_string(),
            }),
    }
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Parse `1d2h30m5s` notation, with an optional leading `-`.
///
/// ```
/// # use mudprog_engine::coerce::parse_timespan;
/// # use chrono::TimeDelta;
/// assert_eq!(parse_timespan("1h30m"), Some(TimeDelta::minutes(90)));
/// assert_eq!(parse_timespan("-2d"), Some(TimeDelta::days(-2)));
/// assert_eq!(parse_timespan("90"), None);
/// ```
pub fn parse_timespan(text: &str) -> Option<TimeDelta> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    if body.is_empty() {
        return None;
    }

    let mut total = TimeDelta::zero();
    let mut digits = String::new();
    for c in body.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let count: i64 = digits.parse().ok()?;
        digits.clear();
        let part = match c.to_ascii_lowercase() {
            'd' => TimeDelta::try_days(count)?,
            'h' => TimeDelta::try_hours(count)?,
            'm' => TimeDelta::try_minutes(count)?,
            's' => TimeDelta::try_seconds(count)?,
            _ => return None,
        };
        total = total.checked_add(&part)?;
    }
    if !digits.is_empty() {
        return None;
    }
    Some(if negative { -total } else { total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::MemoryWorld;

    #[test]
    fn test_value_kinds() {
        let world = MemoryWorld::new();
        assert_eq!(coerce("12.5", ProgType::NUMBER, &world).unwrap(), Value::number(12.5));
        assert_eq!(coerce("Yes", ProgType::BOOLEAN, &world).unwrap(), Value::boolean(true));
        assert_eq!(
            coerce("female", ProgType::GENDER, &world).unwrap(),
            Value::gender(Gender::Female)
        );
        assert_eq!(
            coerce("1d2h", ProgType::TIMESPAN, &world).unwrap(),
            Value::timespan(TimeDelta::hours(26))
        );
        assert!(matches!(
            coerce("abc", ProgType::NUMBER, &world),
            Err(CoercionError::Number(_))
        ));
    }

    #[test]
    fn test_datetime_formats() {
        let world = MemoryWorld::new();
        let full = coerce("2024-05-01 10:30:15", ProgType::DATETIME, &world).unwrap();
        let short = coerce("2024-05-01 10:30", ProgType::DATETIME, &world).unwrap();
        let day = coerce("2024-05-01", ProgType::DATETIME, &world).unwrap();
        assert_eq!(full.to_string(), "2024-05-01 10:30:15");
        assert_eq!(short.to_string(), "2024-05-01 10:30:00");
        assert_eq!(day.to_string(), "2024-05-01 00:00:00");
    }

    #[test]
    fn test_entities_and_null() {
        let world = MemoryWorld::new();
        let bob = world.add(ConcreteKind::Character, "Bob");
        assert_eq!(
            coerce("bob", ProgType::CHARACTER, &world).unwrap(),
            Value::entity(bob)
        );
        assert!(coerce("null", ProgType::CHARACTER, &world).unwrap().is_null());
        assert!(matches!(
            coerce("alice", ProgType::CHARACTER, &world),
            Err(CoercionError::NotFound { .. })
        ));
    }

    #[test]
    fn test_union_tries_members() {
        let world = MemoryWorld::new();
        let sword = world.add(ConcreteKind::Item, "sword");
        assert_eq!(
            coerce("sword", ProgType::PERCEIVABLE, &world).unwrap(),
            Value::entity(sword)
        );
        assert_eq!(coerce("true", ProgType::VALUE, &world).unwrap(), Value::boolean(true));
        assert!(matches!(
            coerce("nobody", ProgType::PERCEIVABLE, &world),
            Err(CoercionError::NoMatch { .. })
        ));
    }

    #[test]
    fn test_collections() {
        let world = MemoryWorld::new();
        let numbers = coerce("1, 2,3", ProgType::NUMBER.collection(), &world).unwrap();
        assert_eq!(numbers.to_string(), "[1, 2, 3]");
        assert!(matches!(
            coerce("a", ProgType::TEXT.dictionary(), &world),
            Err(CoercionError::Unsupported(_))
        ));
    }
}
