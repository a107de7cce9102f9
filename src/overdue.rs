//! Overdue Scanner — items requiring attention as of a given instant.
//!
//! Always recomputed from the caller's `now`; the result depends on
//! wall-clock time, so nothing here is memoized or keyed by plan id.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use uuid::Uuid;

use crate::delay::{delay_days, is_overdue};
use crate::models::enums::{ItemKind, PlanStatus};
use crate::models::item::TimelineItem;
use crate::models::plan::TreatmentPlan;

/// One overdue item, flattened for display.
#[derive(Debug, Clone, Serialize)]
pub struct OverdueEntry {
    pub plan_id: Uuid,
    pub item_id: Uuid,
    pub title: String,
    pub assignee: Option<String>,
    pub scheduled_date: NaiveDate,
    pub days_overdue: i64,
}

/// Three disjoint lists: overdue reviews, procedures, and medication
/// administration entries.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OverdueReport {
    pub reviews: Vec<OverdueEntry>,
    pub procedures: Vec<OverdueEntry>,
    pub medications: Vec<OverdueEntry>,
}

impl OverdueReport {
    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty() && self.procedures.is_empty() && self.medications.is_empty()
    }

    fn push(&mut self, plan_id: Uuid, item: &TimelineItem, now: NaiveDateTime) {
        let entry = OverdueEntry {
            plan_id,
            item_id: item.id,
            title: item.title.clone(),
            assignee: item.assignee.clone(),
            scheduled_date: item.scheduled_date,
            days_overdue: delay_days(item.scheduled_date, now.date()),
        };
        match item.kind() {
            ItemKind::Review => self.reviews.push(entry),
            ItemKind::Procedure => self.procedures.push(entry),
            ItemKind::Medication => self.medications.push(entry),
            // Investigations and discharge targets are chased through
            // their own views, not the overdue report.
            ItemKind::Investigation | ItemKind::Discharge => {}
        }
    }
}

/// Scan a single plan, whatever its status.
pub fn scan_plan(plan: &TreatmentPlan, now: NaiveDateTime) -> OverdueReport {
    let mut report = OverdueReport::default();
    for item in plan.items.iter().filter(|i| is_overdue(i, now)) {
        report.push(plan.id, item, now);
    }
    report
}

/// Scan every active plan in the set. Draft, completed, and archived
/// plans are skipped.
pub fn scan_plans<'a>(
    plans: impl IntoIterator<Item = &'a TreatmentPlan>,
    now: NaiveDateTime,
) -> OverdueReport {
    let mut report = OverdueReport::default();
    for plan in plans {
        if plan.status != PlanStatus::Active {
            continue;
        }
        for item in plan.items.iter().filter(|i| is_overdue(i, now)) {
            report.push(plan.id, item, now);
        }
    }
    report
}
