use mudprog_foundation::{ProgType, ReturnType, Value};

use crate::args::{finite, number};
use crate::{FunctionError, ReturnSpec};

const NUM: ProgType = ProgType::NUMBER;
const RET_NUM: ReturnSpec = ReturnSpec::Fixed(ReturnType::Value(ProgType::NUMBER));

crate::builtin!(ABS, "abs", "math", "Absolute value", [NUM] => RET_NUM,
    |args, _| Ok(Value::number(number(args, 0, "abs")?.abs())));

crate::builtin!(FLOOR, "floor", "math", "Round down", [NUM] => RET_NUM,
    |args, _| Ok(Value::number(number(args, 0, "floor")?.floor())));

crate::builtin!(CEILING, "ceiling", "math", "Round up", [NUM] => RET_NUM,
    |args, _| Ok(Value::number(number(args, 0, "ceiling")?.ceil())));

crate::builtin!(ROUND, "round", "math", "Round to the nearest integer", [NUM] => RET_NUM,
    |args, _| Ok(Value::number(number(args, 0, "round")?.round())));

crate::builtin!(ROUND_PLACES, "round", "math", "Round to a number of decimal places",
    [NUM, NUM] => RET_NUM,
    |args, _| {
        let value = number(args, 0, "round")?;
        let places = number(args, 1, "round")?;
        if !(0.0..=15.0).contains(&places) {
            return Err(FunctionError::InvalidArgument {
                function: "round",
                message: format!("cannot round to {} places", places),
            });
        }
        let scale = 10f64.powi(places as i32);
        finite((value * scale).round() / scale, "round")
    });

crate::builtin!(MIN, "min", "math", "Smaller of two numbers", [NUM, NUM] => RET_NUM,
    |args, _| Ok(Value::number(number(args, 0, "min")?.min(number(args, 1, "min")?))));

crate::builtin!(MAX, "max", "math", "Larger of two numbers", [NUM, NUM] => RET_NUM,
    |args, _| Ok(Value::number(number(args, 0, "max")?.max(number(args, 1, "max")?))));

crate::builtin!(SQRT, "sqrt", "math", "Square root", [NUM] => RET_NUM,
    |args, _| {
        let value = number(args, 0, "sqrt")?;
        if value < 0.0 {
            return Err(FunctionError::Numeric {
                function: "sqrt",
                message: format!("square root of negative number {}", value),
            });
        }
        Ok(Value::number(value.sqrt()))
    });

crate::builtin!(POW, "pow", "math", "Raise to a power", [NUM, NUM] => RET_NUM,
    |args, _| finite(number(args, 0, "pow")?.powf(number(args, 1, "pow")?), "pow"));

crate::builtin!(CLAMP, "clamp", "math", "Constrain a number to a range", [NUM, NUM, NUM] => RET_NUM,
    |args, _| {
        let value = number(args, 0, "clamp")?;
        let low = number(args, 1, "clamp")?;
        let high = number(args, 2, "clamp")?;
        if low > high {
            return Err(FunctionError::InvalidArgument {
                function: "clamp",
                message: format!("lower bound {} exceeds upper bound {}", low, high),
            });
        }
        Ok(Value::number(value.clamp(low, high)))
    });
