//! Argument extraction for built-in implementations.
//!
//! The compiler has already checked argument types, so a shape mismatch
//! here means a caller bypassed the compiler. It still surfaces as an error
//! rather than a panic.

use chrono::{NaiveDateTime, TimeDelta};
use indexmap::IndexMap;
use mudprog_foundation::{Data, EntityRef, Gender, Value};

use crate::FunctionError;

fn arg<'a>(args: &'a [Value], position: usize, function: &'static str) -> Result<&'a Value, FunctionError> {
    let value = args
        .get(position)
        .ok_or(FunctionError::ArgumentShape { function, position })?;
    if value.is_null() {
        return Err(FunctionError::NullArgument { function, position });
    }
    Ok(value)
}

fn shape(function: &'static str, position: usize) -> FunctionError {
    FunctionError::ArgumentShape { function, position }
}

/// Numeric argument.
pub fn number(args: &[Value], position: usize, function: &'static str) -> Result<f64, FunctionError> {
    arg(args, position, function)?
        .as_number()
        .ok_or_else(|| shape(function, position))
}

/// Boolean argument.
pub fn boolean(args: &[Value], position: usize, function: &'static str) -> Result<bool, FunctionError> {
    arg(args, position, function)?
        .as_bool()
        .ok_or_else(|| shape(function, position))
}

/// Text argument.
pub fn text<'a>(args: &'a [Value], position: usize, function: &'static str) -> Result<&'a str, FunctionError> {
    arg(args, position, function)?
        .as_text()
        .ok_or_else(|| shape(function, position))
}

/// Gender argument.
pub fn gender(args: &[Value], position: usize, function: &'static str) -> Result<Gender, FunctionError> {
    arg(args, position, function)?
        .as_gender()
        .ok_or_else(|| shape(function, position))
}

/// Calendar time argument.
pub fn datetime(args: &[Value], position: usize, function: &'static str) -> Result<NaiveDateTime, FunctionError> {
    arg(args, position, function)?
        .as_datetime()
        .ok_or_else(|| shape(function, position))
}

/// Duration argument.
pub fn timespan(args: &[Value], position: usize, function: &'static str) -> Result<TimeDelta, FunctionError> {
    arg(args, position, function)?
        .as_timespan()
        .ok_or_else(|| shape(function, position))
}

/// Entity argument.
pub fn entity(args: &[Value], position: usize, function: &'static str) -> Result<EntityRef, FunctionError> {
    arg(args, position, function)?
        .as_entity()
        .ok_or_else(|| shape(function, position))
}

/// Collection argument, with the collection's declared type.
pub fn collection<'a>(args: &'a [Value], position: usize, function: &'static str) -> Result<(&'a Value, &'a [Value]), FunctionError> {
    let value = arg(args, position, function)?;
    let items = value.as_collection().ok_or_else(|| shape(function, position))?;
    Ok((value, items))
}

/// Dictionary argument.
pub fn dictionary<'a>(
    args: &'a [Value],
    position: usize,
    function: &'static str,
) -> Result<&'a IndexMap<String, Value>, FunctionError> {
    arg(args, position, function)?
        .as_dictionary()
        .ok_or_else(|| shape(function, position))
}

/// Keys of a dictionary or dictionary-of-collections argument.
pub fn keys<'a>(args: &'a [Value], position: usize, function: &'static str) -> Result<Vec<&'a str>, FunctionError> {
    match arg(args, position, function)?.data() {
        Data::Dictionary(entries) => Ok(entries.keys().map(String::as_str).collect()),
        Data::CollectionDictionary(entries) => Ok(entries.keys().map(String::as_str).collect()),
        _ => Err(shape(function, position)),
    }
}

/// Check a finite numeric result.
pub fn finite(value: f64, function: &'static str) -> Result<Value, FunctionError> {
    if value.is_finite() {
        Ok(Value::number(value))
    } else {
        Err(FunctionError::Numeric {
            function,
            message: format!("result {} is not a finite number", value),
        })
    }
}
