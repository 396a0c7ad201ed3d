//! Recurring intervals for prog schedules.
//!
//! Grammar: `every <N> <unit> [<offset>]`, where unit is one of minutes,
//! hours, days, weekdays, weeks, months or years (singular accepted) and
//! the optional signed offset shifts only the first due time.
//!
//! ```
//! # use mudprog_engine::interval::*;
//! let interval: RecurringInterval = "every 2 weekdays +1".parse().unwrap();
//! assert_eq!(interval.count, 2);
//! assert_eq!(interval.unit, IntervalUnit::Weekdays);
//! assert_eq!(interval.offset, 1);
//! assert_eq!(interval.to_string(), "every 2 weekdays +1");
//! ```

use chrono::{Datelike, Months, NaiveDateTime, TimeDelta, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when interval text cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntervalParseError {
    /// Text does not start with `every`.
    #[error("an interval starts with 'every'")]
    MissingEvery,
    /// No repetition count.
    #[error("missing repetition count after 'every'")]
    MissingCount,
    /// Count is not a positive integer.
    #[error("'{0}' is not a positive whole number")]
    InvalidCount(String),
    /// No unit.
    #[error("missing interval unit")]
    MissingUnit,
    /// Unknown unit.
    #[error("unknown interval unit '{0}'")]
    UnknownUnit(String),
    /// Offset is not a signed integer.
    #[error("'{0}' is not a valid offset")]
    InvalidOffset(String),
    /// Extra words after the offset.
    #[error("unexpected '{0}' after the interval")]
    TrailingInput(String),
}

/// Period unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalUnit {
    /// 60 seconds
    Minutes,
    /// 60 minutes
    Hours,
    /// 24 hours
    Days,
    /// Days other than Saturday and Sunday
    Weekdays,
    /// 7 days
    Weeks,
    /// Calendar months, clamped to the month's last day
    Months,
    /// Calendar years
    Years,
}

impl IntervalUnit {
    const ALL: [IntervalUnit; 7] = [
        IntervalUnit::Minutes,
        IntervalUnit::Hours,
        IntervalUnit::Days,
        IntervalUnit::Weekdays,
        IntervalUnit::Weeks,
        IntervalUnit::Months,
        IntervalUnit::Years,
    ];

    /// Plural name used in interval text.
    pub fn name(self) -> &'static str {
        match self {
            IntervalUnit::Minutes => "minutes",
            IntervalUnit::Hours => "hours",
            IntervalUnit::Days => "days",
            IntervalUnit::Weekdays => "weekdays",
            IntervalUnit::Weeks => "weeks",
            IntervalUnit::Months => "months",
            IntervalUnit::Years => "years",
        }
    }

    fn from_name(text: &str) -> Option<IntervalUnit> {
        let lower = text.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|unit| lower == unit.name() || lower == unit.name().trim_end_matches('s'))
    }
}

/// A parsed `every N unit [offset]` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecurringInterval {
    /// Units per period
    pub count: u32,
    /// Period unit
    pub unit: IntervalUnit,
    /// Shift applied to the first due time, in units
    pub offset: i32,
}

impl RecurringInterval {
    /// Interval with no offset.
    pub fn new(count: u32, unit: IntervalUnit) -> Self {
        Self {
            count,
            unit,
            offset: 0,
        }
    }

    /// `time` plus one period.
    pub fn advance(&self, time: NaiveDateTime) -> Option<NaiveDateTime> {
        shift(time, self.unit, i64::from(self.count))
    }

    /// First due time for a schedule starting at `start`: one period later,
    /// shifted by the offset.
    pub fn first_due(&self, start: NaiveDateTime) -> Option<NaiveDateTime> {
        shift(self.advance(start)?, self.unit, i64::from(self.offset))
    }
}

fn shift(time: NaiveDateTime, unit: IntervalUnit, n: i64) -> Option<NaiveDateTime> {
    match unit {
        IntervalUnit::Minutes => time.checked_add_signed(TimeDelta::try_minutes(n)?),
        IntervalUnit::Hours => time.checked_add_signed(TimeDelta::try_hours(n)?),
        IntervalUnit::Days => time.checked_add_signed(TimeDelta::try_days(n)?),
        IntervalUnit::Weeks => time.checked_add_signed(TimeDelta::try_weeks(n)?),
        IntervalUnit::Weekdays => shift_weekdays(time, n),
        IntervalUnit::Months => shift_months(time, n),
        IntervalUnit::Years => shift_months(time, n.checked_mul(12)?),
    }
}

fn shift_months(time: NaiveDateTime, n: i64) -> Option<NaiveDateTime> {
    let months = Months::new(u32::try_from(n.unsigned_abs()).ok()?);
    if n >= 0 {
        time.checked_add_months(months)
    } else {
        time.checked_sub_months(months)
    }
}

fn shift_weekdays(mut time: NaiveDateTime, n: i64) -> Option<NaiveDateTime> {
    let step = if n >= 0 {
        TimeDelta::days(1)
    } else {
        TimeDelta::days(-1)
    };
    let mut remaining = n.unsigned_abs();
    while remaining > 0 {
        time = time.checked_add_signed(step)?;
        if !matches!(time.weekday(), Weekday::Sat | Weekday::Sun) {
            remaining -= 1;
        }
    }
    Some(time)
}

impl fmt::Display for RecurringInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "every {} {}", self.count, self.unit.name())?;
        if self.offset != 0 {
            write!(f, " {:+}", self.offset)?;
        }
        Ok(())
    }
}

impl FromStr for RecurringInterval {
    type Err = IntervalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        match words.next() {
            Some(word) if word.eq_ignore_ascii_case("every") => {}
            _ => return Err(IntervalParseError::MissingEvery),
        }

        let count_text = words.next().ok_or(IntervalParseError::MissingCount)?;
        let count = count_text
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| IntervalParseError::InvalidCount(count_text.to_string()))?;

        let unit_text = words.next().ok_or(IntervalParseError::MissingUnit)?;
        let unit = IntervalUnit::from_name(unit_text)
            .ok_or_else(|| IntervalParseError::UnknownUnit(unit_text.to_string()))?;

        let offset = match words.next() {
            None => 0,
            Some(text) => text
                .parse::<i32>()
                .map_err(|_| IntervalParseError::InvalidOffset(text.to_string()))?,
        };

        if let Some(extra) = words.next() {
            return Err(IntervalParseError::TrailingInput(extra.to_string()));
        }

        Ok(Self {
            count,
            unit,
            offset,
        })
    }
}

impl TryFrom<String> for RecurringInterval {
    type Error = IntervalParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecurringInterval> for String {
    fn from(value: RecurringInterval) -> Self {
        value.to_string()
    }
}
