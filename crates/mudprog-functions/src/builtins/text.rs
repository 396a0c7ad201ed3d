use mudprog_foundation::{ProgType, ReturnType, Value};

use crate::args::{collection, number, text};
use crate::{FunctionError, ReturnSpec};

const TEXT: ProgType = ProgType::TEXT;
const RET_TEXT: ReturnSpec = ReturnSpec::Fixed(ReturnType::Value(ProgType::TEXT));
const RET_NUM: ReturnSpec = ReturnSpec::Fixed(ReturnType::Value(ProgType::NUMBER));
const RET_BOOL: ReturnSpec = ReturnSpec::Fixed(ReturnType::Value(ProgType::BOOLEAN));

crate::builtin!(LENGTH, "length", "text", "Number of characters", [TEXT] => RET_NUM,
    |args, _| Ok(Value::number(text(args, 0, "length")?.chars().count() as f64)));

crate::builtin!(UPPER, "upper", "text", "Upper-case copy", [TEXT] => RET_TEXT,
    |args, _| Ok(Value::text(text(args, 0, "upper")?.to_uppercase())));

crate::builtin!(LOWER, "lower", "text", "Lower-case copy", [TEXT] => RET_TEXT,
    |args, _| Ok(Value::text(text(args, 0, "lower")?.to_lowercase())));

crate::builtin!(CONTAINS_TEXT, "contains", "text", "True if the text contains the fragment",
    [TEXT, TEXT] => RET_BOOL,
    |args, _| Ok(Value::boolean(text(args, 0, "contains")?.contains(text(args, 1, "contains")?))));

crate::builtin!(STARTSWITH, "startswith", "text", "True if the text starts with the prefix",
    [TEXT, TEXT] => RET_BOOL,
    |args, _| Ok(Value::boolean(
        text(args, 0, "startswith")?.starts_with(text(args, 1, "startswith")?),
    )));

crate::builtin!(SUBSTRING, "substring", "text", "Characters from start, up to length",
    [TEXT, ProgType::NUMBER, ProgType::NUMBER] => RET_TEXT,
    |args, _| {
        let source = text(args, 0, "substring")?;
        let start = number(args, 1, "substring")?;
        let length = number(args, 2, "substring")?;
        if start < 0.0 || length < 0.0 {
            return Err(FunctionError::InvalidArgument {
                function: "substring",
                message: "start and length must not be negative".to_string(),
            });
        }
        Ok(Value::text(
            source
                .chars()
                .skip(start as usize)
                .take(length as usize)
                .collect::<String>(),
        ))
    });

crate::builtin!(TRIM, "trim", "text", "Strip surrounding whitespace", [TEXT] => RET_TEXT,
    |args, _| Ok(Value::text(text(args, 0, "trim")?.trim())));

crate::builtin!(TOTEXT, "totext", "text", "Display form of any value", [ProgType::ANYTHING] => RET_TEXT,
    |args, _| Ok(Value::text(args.first().map(ToString::to_string).unwrap_or_default())));

crate::builtin!(TONUMBER, "tonumber", "text", "Parse a number", [TEXT] => RET_NUM,
    |args, _| {
        let raw = text(args, 0, "tonumber")?;
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::number)
            .ok_or_else(|| FunctionError::InvalidArgument {
                function: "tonumber",
                message: format!("'{}' is not a number", raw),
            })
    });

crate::builtin!(CONCAT, "concat", "text", "Join two texts", [TEXT, TEXT] => RET_TEXT,
    |args, _| Ok(Value::text(format!("{}{}", text(args, 0, "concat")?, text(args, 1, "concat")?))));

crate::builtin!(CONCAT_ALL, "concat", "text", "Join every text in a collection",
    [TEXT.collection()] => RET_TEXT,
    |args, _| {
        let (_, items) = collection(args, 0, "concat")?;
        Ok(Value::text(items.iter().map(ToString::to_string).collect::<String>()))
    });
