use chrono::{Datelike, TimeDelta};
use mudprog_foundation::{ProgType, ReturnType, Value};

use crate::ReturnSpec;
use crate::args::{datetime, number, timespan};
use crate::FunctionError;

const NUM: ProgType = ProgType::NUMBER;
const DT: ProgType = ProgType::DATETIME;
const SPAN: ProgType = ProgType::TIMESPAN;
const RET_NUM: ReturnSpec = ReturnSpec::Fixed(ReturnType::Value(ProgType::NUMBER));
const RET_SPAN: ReturnSpec = ReturnSpec::Fixed(ReturnType::Value(ProgType::TIMESPAN));
const RET_DT: ReturnSpec = ReturnSpec::Fixed(ReturnType::Value(ProgType::DATETIME));

fn span_of(amount: f64, unit_millis: f64, function: &'static str) -> Result<Value, FunctionError> {
    let millis = amount * unit_millis;
    if !millis.is_finite() || millis.abs() > i64::MAX as f64 / 2.0 {
        return Err(FunctionError::Numeric {
            function,
            message: format!("{} is out of range for a time span", amount),
        });
    }
    Ok(Value::timespan(TimeDelta::milliseconds(millis as i64)))
}

crate::builtin!(NOW, "now", "datetime", "Current in-world time", [] => RET_DT,
    |_, host| Ok(Value::datetime(host.now())));

crate::builtin!(DAYS, "days", "datetime", "Time span of a number of days", [NUM] => RET_SPAN,
    |args, _| span_of(number(args, 0, "days")?, 86_400_000.0, "days"));

crate::builtin!(HOURS, "hours", "datetime", "Time span of a number of hours", [NUM] => RET_SPAN,
    |args, _| span_of(number(args, 0, "hours")?, 3_600_000.0, "hours"));

crate::builtin!(MINUTES, "minutes", "datetime", "Time span of a number of minutes", [NUM] => RET_SPAN,
    |args, _| span_of(number(args, 0, "minutes")?, 60_000.0, "minutes"));

crate::builtin!(SECONDS, "seconds", "datetime", "Time span of a number of seconds", [NUM] => RET_SPAN,
    |args, _| span_of(number(args, 0, "seconds")?, 1_000.0, "seconds"));

crate::builtin!(TOTALDAYS, "totaldays", "datetime", "Length of a time span in days", [SPAN] => RET_NUM,
    |args, _| Ok(Value::number(
        timespan(args, 0, "totaldays")?.num_milliseconds() as f64 / 86_400_000.0,
    )));

crate::builtin!(ADDTIME, "addtime", "datetime", "Shift a time by a span", [DT, SPAN] => RET_DT,
    |args, _| {
        let when = datetime(args, 0, "addtime")?;
        let span = timespan(args, 1, "addtime")?;
        when.checked_add_signed(span)
            .map(Value::datetime)
            .ok_or_else(|| FunctionError::Numeric {
                function: "addtime",
                message: "date out of range".to_string(),
            })
    });

crate::builtin!(BETWEEN, "between", "datetime", "Span from the first time to the second",
    [DT, DT] => RET_SPAN,
    |args, _| Ok(Value::timespan(
        datetime(args, 1, "between")? - datetime(args, 0, "between")?,
    )));

crate::builtin!(YEAR, "year", "datetime", "Calendar year", [DT] => RET_NUM,
    |args, _| Ok(Value::number(datetime(args, 0, "year")?.year() as f64)));

crate::builtin!(MONTH, "month", "datetime", "Calendar month, 1 to 12", [DT] => RET_NUM,
    |args, _| Ok(Value::number(datetime(args, 0, "month")?.month() as f64)));

crate::builtin!(DAY, "day", "datetime", "Day of the month", [DT] => RET_NUM,
    |args, _| Ok(Value::number(datetime(args, 0, "day")?.day() as f64)));
