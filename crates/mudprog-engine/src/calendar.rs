//! In-world time.
//!
//! The scheduler and the `now()` built-in read the time from a
//! [`Calendar`], never from the wall clock, so schedules stay correct when
//! the simulation is paused or runs at a different speed.

use chrono::{NaiveDateTime, TimeDelta};
use std::cell::Cell;
use std::rc::Rc;

use crate::interval::RecurringInterval;

/// Source of in-world time and interval arithmetic.
pub trait Calendar {
    /// Current in-world time.
    fn now(&self) -> NaiveDateTime;

    /// `time` advanced by one period of `interval`.
    fn add(&self, time: NaiveDateTime, interval: &RecurringInterval) -> Option<NaiveDateTime> {
        interval.advance(time)
    }
}

/// Settable game clock.
///
/// Clones share the same clock, so a test or host loop can keep a handle
/// and move time forward while the engine owns another.
#[derive(Debug, Clone)]
pub struct GameCalendar {
    now: Rc<Cell<NaiveDateTime>>,
}

impl GameCalendar {
    /// A clock starting at `start`.
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    /// Jump to `time`.
    pub fn set(&self, time: NaiveDateTime) {
        self.now.set(time);
    }

    /// Move forward (or back, for a negative span).
    pub fn advance(&self, by: TimeDelta) {
        if let Some(next) = self.now.get().checked_add_signed(by) {
            self.now.set(next);
        }
    }
}

impl Default for GameCalendar {
    fn default() -> Self {
        Self::new(NaiveDateTime::default())
    }
}

impl Calendar for GameCalendar {
    fn now(&self) -> NaiveDateTime {
        self.now.get()
    }
}
