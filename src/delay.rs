//! Delay Calculator — pure functions over scheduled and actual instants.
//!
//! "Overdue" is always derived from a caller-supplied `now`, never stored:
//! a persisted overdue flag would go stale the moment the clock moves.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::enums::ItemStatus;
use crate::models::item::TimelineItem;

/// Items scheduled without an explicit time are due by end of day.
fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).expect("valid constant time")
}

/// Whole days between the scheduled and actual date, clamped to zero.
/// Early or on-time completion is never a negative delay.
pub fn delay_days(scheduled: NaiveDate, actual: NaiveDate) -> i64 {
    (actual - scheduled).num_days().max(0)
}

/// The instant an item falls due: its scheduled date plus its scheduled
/// time, or end of the scheduled day when no time was set.
pub fn scheduled_instant(item: &TimelineItem) -> NaiveDateTime {
    item.scheduled_date.and_time(item.scheduled_time.unwrap_or_else(end_of_day))
}

/// An item is overdue iff it is still pending past its scheduled instant.
/// Terminal items are never overdue, regardless of how late they were.
pub fn is_overdue(item: &TimelineItem, now: NaiveDateTime) -> bool {
    item.status == ItemStatus::Scheduled && scheduled_instant(item) < now
}

/// Outcome of the delay check performed on completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayAssessment {
    pub days: i64,
    /// Late, but no delay reason was supplied. A soft flag for downstream
    /// reporting — the completion is still accepted.
    pub unexplained: bool,
}

pub fn assess_completion(
    scheduled: NaiveDate,
    actual: NaiveDate,
    delay_reason: Option<&str>,
) -> DelayAssessment {
    let days = delay_days(scheduled, actual);
    DelayAssessment {
        days,
        unexplained: days > 0 && delay_reason.map_or(true, |r| r.trim().is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::ItemDetail;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn item(scheduled: NaiveDate, status: ItemStatus) -> TimelineItem {
        TimelineItem {
            id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            title: "Hip X-ray".into(),
            scheduled_date: scheduled,
            scheduled_time: None,
            assignee: None,
            status,
            detail: ItemDetail::Procedure { surgeon: None, location: None },
            completion: None,
            cancellation: None,
            created_at: date(2024, 1, 1).and_hms_opt(9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn late_completion_counts_whole_days() {
        assert_eq!(delay_days(date(2024, 1, 10), date(2024, 1, 12)), 2);
    }

    #[test]
    fn on_time_completion_is_zero_delay() {
        assert_eq!(delay_days(date(2024, 1, 10), date(2024, 1, 10)), 0);
    }

    #[test]
    fn early_completion_is_never_negative() {
        assert_eq!(delay_days(date(2024, 1, 10), date(2024, 1, 8)), 0);
    }

    #[test]
    fn scheduled_item_past_due_is_overdue() {
        let it = item(date(2024, 1, 10), ItemStatus::Scheduled);
        let now = date(2024, 1, 15).and_hms_opt(8, 0, 0).unwrap();
        assert!(is_overdue(&it, now));
    }

    #[test]
    fn scheduled_item_not_overdue_on_its_own_day() {
        // No explicit time: due at end of day, so still pending mid-day.
        let it = item(date(2024, 1, 10), ItemStatus::Scheduled);
        let now = date(2024, 1, 10).and_hms_opt(14, 0, 0).unwrap();
        assert!(!is_overdue(&it, now));
    }

    #[test]
    fn explicit_time_moves_the_due_instant() {
        let mut it = item(date(2024, 1, 10), ItemStatus::Scheduled);
        it.scheduled_time = NaiveTime::from_hms_opt(9, 0, 0);
        let now = date(2024, 1, 10).and_hms_opt(14, 0, 0).unwrap();
        assert!(is_overdue(&it, now));
    }

    #[test]
    fn terminal_items_are_never_overdue() {
        let now = date(2024, 3, 1).and_hms_opt(0, 0, 0).unwrap();
        for status in [ItemStatus::Completed, ItemStatus::Cancelled] {
            let it = item(date(2024, 1, 10), status);
            assert!(!is_overdue(&it, now));
        }
    }

    #[test]
    fn late_without_reason_is_flagged_unexplained() {
        let a = assess_completion(date(2024, 1, 10), date(2024, 1, 12), None);
        assert_eq!(a, DelayAssessment { days: 2, unexplained: true });
    }

    #[test]
    fn late_with_reason_is_explained() {
        let a = assess_completion(date(2024, 1, 10), date(2024, 1, 12), Some("theatre list full"));
        assert_eq!(a, DelayAssessment { days: 2, unexplained: false });
    }

    #[test]
    fn blank_reason_counts_as_unexplained() {
        let a = assess_completion(date(2024, 1, 10), date(2024, 1, 12), Some("  "));
        assert!(a.unexplained);
    }

    #[test]
    fn on_time_is_never_unexplained() {
        let a = assess_completion(date(2024, 1, 10), date(2024, 1, 10), None);
        assert_eq!(a, DelayAssessment { days: 0, unexplained: false });
    }
}
