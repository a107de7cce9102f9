//! Recurrence Expander — turns a frequency pattern into concrete dates.
//!
//! A `RecurrencePattern` is a cadence, a start date, and exactly one
//! termination rule: an explicit end date, a bounded repeat count, or
//! neither (unbounded — the caller's horizon bounds expansion). Patterns
//! specifying both an end date and a repeat count are rejected outright.
//!
//! Expansion is always bounded; there is no way to materialize an
//! infinite sequence. Output is ordered earliest-first with no duplicates.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::enums::DayOfWeek;
use crate::timeline::PlanError;

/// How often a scheduled clinical event repeats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cadence", rename_all = "snake_case")]
pub enum Cadence {
    Once,
    Daily,
    AlternateDays,
    Weekly,
    Biweekly,
    /// Explicit days of the week, e.g. every Monday and Thursday.
    DaysOfWeek { days: Vec<DayOfWeek> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrencePattern {
    pub cadence: Cadence,
    pub start: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub repeat_count: Option<u32>,
}

impl RecurrencePattern {
    /// A one-off event on the given date.
    pub fn once(date: NaiveDate) -> Self {
        Self { cadence: Cadence::Once, start: date, end_date: None, repeat_count: None }
    }

    /// Reject ill-formed patterns before they reach a plan.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.end_date.is_some() && self.repeat_count.is_some() {
            return Err(PlanError::Validation(
                "recurrence pattern must have at most one termination rule \
                 (end date or repeat count, not both)"
                    .into(),
            ));
        }
        if self.repeat_count == Some(0) {
            return Err(PlanError::Validation("repeat count must be at least 1".into()));
        }
        if let Some(end) = self.end_date {
            if end < self.start {
                return Err(PlanError::Validation("end date precedes start date".into()));
            }
        }
        if let Cadence::DaysOfWeek { days } = &self.cadence {
            if days.is_empty() {
                return Err(PlanError::Validation(
                    "days-of-week pattern needs at least one day".into(),
                ));
            }
        }
        Ok(())
    }

    /// All dates up to and including `horizon` (and within the pattern's
    /// own termination rule, if any).
    pub fn expand_through(&self, horizon: NaiveDate) -> Vec<NaiveDate> {
        self.expand(Some(horizon), None)
    }

    /// The next `n` dates. The pattern's own bounds still apply, so fewer
    /// than `n` may come back.
    pub fn expand_next(&self, n: usize) -> Vec<NaiveDate> {
        self.expand(None, Some(n))
    }

    /// The first date the pattern produces. For a days-of-week pattern
    /// whose start does not fall on a flagged day, this is the first
    /// flagged day after the start — the start itself is excluded.
    pub fn first_occurrence(&self) -> Option<NaiveDate> {
        self.expand(None, Some(1)).into_iter().next()
    }

    /// The first date strictly after `after`, or `None` if the pattern
    /// terminates before then.
    pub fn next_occurrence(&self, after: NaiveDate) -> Option<NaiveDate> {
        if let Some(n) = self.repeat_count {
            return self.expand_next(n as usize).into_iter().find(|d| *d > after);
        }
        if let Some(end) = self.end_date {
            return self.expand_through(end).into_iter().find(|d| *d > after);
        }
        // Unbounded: every cadence yields its next date within 14 days of
        // the later of start and `after`.
        let probe = self.start.max(after) + Days::new(14);
        self.expand_through(probe).into_iter().find(|d| *d > after)
    }

    fn expand(&self, horizon: Option<NaiveDate>, limit: Option<usize>) -> Vec<NaiveDate> {
        let date_cap = match (self.end_date, horizon) {
            (Some(end), Some(h)) => Some(end.min(h)),
            (Some(end), None) => Some(end),
            (None, Some(h)) => Some(h),
            (None, None) => None,
        };
        let count_cap = match (self.repeat_count, limit) {
            (Some(n), Some(m)) => Some((n as usize).min(m)),
            (Some(n), None) => Some(n as usize),
            (None, Some(m)) => Some(m),
            (None, None) => None,
        };
        // Unbounded expansion is a caller bug, not a runtime hazard.
        debug_assert!(date_cap.is_some() || count_cap.is_some());

        let mut out = Vec::new();
        let mut cursor = self.start;
        loop {
            if let Some(cap) = date_cap {
                if cursor > cap {
                    break;
                }
            }
            if let Some(cap) = count_cap {
                if out.len() >= cap {
                    break;
                }
            }
            if self.matches(cursor) {
                out.push(cursor);
            }
            cursor = match self.step_from(cursor) {
                Some(next) => next,
                None => break,
            };
        }
        out
    }

    fn matches(&self, date: NaiveDate) -> bool {
        match &self.cadence {
            Cadence::DaysOfWeek { days } => {
                days.iter().any(|d| d.to_chrono() == date.weekday())
            }
            // Other cadences only ever visit aligned dates.
            _ => true,
        }
    }

    fn step_from(&self, cursor: NaiveDate) -> Option<NaiveDate> {
        let step = match self.cadence {
            Cadence::Once => return None,
            Cadence::Daily | Cadence::DaysOfWeek { .. } => 1,
            Cadence::AlternateDays => 2,
            Cadence::Weekly => 7,
            Cadence::Biweekly => 14,
        };
        cursor.checked_add_days(Days::new(step))
    }
}
