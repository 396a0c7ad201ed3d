use mudprog_foundation::{ProgType, ReturnType, Value};

use crate::ReturnSpec;
use crate::args::boolean;

crate::builtin!(ISNULL, "isnull", "logic", "True if the value is null",
    [ProgType::ANYTHING] => ReturnSpec::Fixed(ReturnType::Value(ProgType::BOOLEAN)),
    |args, _| Ok(Value::boolean(args.first().is_none_or(Value::is_null))));

crate::builtin!(CHOOSE_NUMBER, "choose", "logic", "Pick the second or third argument",
    [ProgType::BOOLEAN, ProgType::NUMBER, ProgType::NUMBER]
        => ReturnSpec::Fixed(ReturnType::Value(ProgType::NUMBER)),
    |args, _| choose(args));

crate::builtin!(CHOOSE_TEXT, "choose", "logic", "Pick the second or third argument",
    [ProgType::BOOLEAN, ProgType::TEXT, ProgType::TEXT]
        => ReturnSpec::Fixed(ReturnType::Value(ProgType::TEXT)),
    |args, _| choose(args));

fn choose(args: &[Value]) -> Result<Value, crate::FunctionError> {
    let index = if boolean(args, 0, "choose")? { 1 } else { 2 };
    args.get(index)
        .cloned()
        .ok_or(crate::FunctionError::ArgumentShape {
            function: "choose",
            position: index,
        })
}
