//! Calendar-driven prog schedules.
//!
//! A schedule fires its prog with no arguments whenever its next reference
//! time is due, then moves the reference time forward by exactly one
//! interval whether or not the prog succeeded.

use chrono::NaiveDateTime;
use mudprog_foundation::{ProgId, ScheduleId};
use tracing::{debug, info, instrument, warn};

use crate::engine::{Engine, check_accepts};
use crate::error::{RuntimeError, ScheduleError};
use crate::interval::RecurringInterval;

/// A recurring execution of a prog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgSchedule {
    /// Stable id
    pub id: ScheduleId,
    /// Prog run with no arguments
    pub prog: ProgId,
    /// Period
    pub interval: RecurringInterval,
    /// Next due time
    pub next_reference: NaiveDateTime,
}

/// Outcome of one scheduler tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickReport {
    /// Schedules that were due and fired
    pub fired: usize,
    /// Schedules whose prog failed, with the error
    pub failures: Vec<(ScheduleId, RuntimeError)>,
    /// Schedules removed because their interval ran off the calendar
    pub dropped: Vec<ScheduleId>,
}

impl Engine {
    /// Schedule by id.
    pub fn schedule(&self, id: ScheduleId) -> Option<&ProgSchedule> {
        self.schedules.get(&id)
    }

    /// Every schedule, in creation order.
    pub fn schedules(&self) -> impl Iterator<Item = &ProgSchedule> {
        self.schedules.values()
    }

    /// Schedule a prog starting from the current calendar time. The first
    /// due time is one interval later, shifted by the interval's offset.
    pub fn add_schedule(
        &mut self,
        prog: ProgId,
        interval: RecurringInterval,
    ) -> Result<ScheduleId, ScheduleError> {
        let start = self.calendar.now();
        let first = interval
            .first_due(start)
            .ok_or_else(|| ScheduleError::OutOfRange(interval.to_string(), start))?;
        self.add_schedule_at(prog, interval, first)
    }

    /// Schedule a prog with an explicit first due time.
    pub fn add_schedule_at(
        &mut self,
        prog: ProgId,
        interval: RecurringInterval,
        next_reference: NaiveDateTime,
    ) -> Result<ScheduleId, ScheduleError> {
        let target = self.progs.get(&prog).ok_or(ScheduleError::UnknownProg(prog))?;
        check_accepts(&target.name, &target.signature, &[])?;
        self.next_schedule += 1;
        let id = ScheduleId(self.next_schedule);
        self.schedules.insert(
            id,
            ProgSchedule {
                id,
                prog,
                interval,
                next_reference,
            },
        );
        info!(%id, %prog, %interval, %next_reference, "schedule added");
        Ok(id)
    }

    /// Remove a schedule.
    pub fn remove_schedule(&mut self, id: ScheduleId) -> Result<ProgSchedule, ScheduleError> {
        self.schedules
            .shift_remove(&id)
            .ok_or(ScheduleError::UnknownSchedule(id))
    }

    /// Schedules due at `now`.
    pub fn due_schedules(&self, now: NaiveDateTime) -> Vec<ScheduleId> {
        self.schedules
            .values()
            .filter(|s| s.next_reference <= now)
            .map(|s| s.id)
            .collect()
    }

    /// Fire every due schedule once.
    #[instrument(skip(self))]
    pub fn tick(&mut self, now: NaiveDateTime) -> TickReport {
        let mut report = TickReport::default();
        for id in self.due_schedules(now) {
            let Some(schedule) = self.schedules.get(&id).cloned() else {
                continue;
            };
            debug!(%id, prog = %schedule.prog, due = %schedule.next_reference, "schedule firing");
            report.fired += 1;
            if let Err(error) = self.execute(schedule.prog, &[]) {
                warn!(%id, prog = %schedule.prog, %error, "scheduled prog failed");
                report.failures.push((id, error));
            }

            match self.calendar.add(schedule.next_reference, &schedule.interval) {
                Some(next) => {
                    if let Some(entry) = self.schedules.get_mut(&id) {
                        entry.next_reference = next;
                    }
                }
                None => {
                    warn!(%id, "schedule interval ran off the calendar, removing");
                    self.schedules.shift_remove(&id);
                    report.dropped.push(id);
                }
            }
        }
        report
    }

    /// Tick at the calendar's current time.
    pub fn tick_now(&mut self) -> TickReport {
        let now = self.calendar.now();
        self.tick(now)
    }
}
