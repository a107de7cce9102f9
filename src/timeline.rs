//! Treatment Plan Timeline Engine — the aggregate owning all item mutation.
//!
//! Every lifecycle change to a timeline item flows through `TreatmentPlan`
//! methods: drafts are validated before an item exists, transitions are
//! checked against the item state machine, and plan-level invariants (one
//! active discharge target, forward-only plan status) are enforced here.
//! Read views are computed on demand and never cached across calls.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;
use uuid::Uuid;

use crate::delay::{assess_completion, is_overdue};
use crate::models::enums::{ItemKind, ItemStatus, OccurrenceStatus, PlanStatus};
use crate::models::item::{
    CancellationRecord, CompletionInput, CompletionRecord, InvestigationResult, ItemDetail,
    OccurrenceRecord, TimelineItem, TimelineItemDraft,
};
use crate::models::plan::TreatmentPlan;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("no item {0} in plan")]
    ItemNotFound(Uuid),
}

/// Result of completing one occurrence of a recurring review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceOutcome {
    pub due: NaiveDate,
    /// Dates between the due occurrence and the actual completion that
    /// were skipped and logged as missed.
    pub missed_logged: usize,
    /// The next pending occurrence, if the pattern continues.
    pub next_due: Option<NaiveDate>,
    /// True when the pattern is exhausted and the item went terminal.
    pub pattern_exhausted: bool,
}

impl TreatmentPlan {
    // ── Plan lifecycle ─────────────────────────────────────────────────

    /// Move the plan forward: draft → active → completed → archived.
    /// Backward moves are rejected; archived is final.
    pub fn advance_status(&mut self, to: PlanStatus) -> Result<(), PlanError> {
        if to.rank() <= self.status.rank() {
            return Err(PlanError::InvalidTransition(format!(
                "plan status cannot move from {} to {}",
                self.status.as_str(),
                to.as_str()
            )));
        }
        self.status = to;
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), PlanError> {
        match self.status {
            PlanStatus::Draft | PlanStatus::Active => Ok(()),
            _ => Err(PlanError::InvalidTransition(format!(
                "plan is {}; timeline items can no longer change",
                self.status.as_str()
            ))),
        }
    }

    // ── Item creation ──────────────────────────────────────────────────

    /// Validate a draft and add it to the plan. The item's scheduled date
    /// comes from the draft, or — for reviews — from the first date the
    /// recurrence pattern produces.
    pub fn add_item(
        &mut self,
        draft: TimelineItemDraft,
        now: NaiveDateTime,
    ) -> Result<Uuid, PlanError> {
        self.ensure_open()?;

        if draft.title.trim().is_empty() {
            return Err(PlanError::Validation("item title is required".into()));
        }

        let scheduled_date = match &draft.detail {
            ItemDetail::Review { pattern, occurrences } => {
                if !occurrences.is_empty() {
                    return Err(PlanError::Validation(
                        "a new review starts with an empty occurrence log".into(),
                    ));
                }
                pattern.validate()?;
                pattern.first_occurrence().ok_or_else(|| {
                    PlanError::Validation("recurrence pattern produces no occurrences".into())
                })?
            }
            ItemDetail::Medication { dosage, start_date, end_date, .. } => {
                if dosage.trim().is_empty() {
                    return Err(PlanError::Validation("medication dosage is required".into()));
                }
                if let (Some(s), Some(e)) = (start_date, end_date) {
                    if e < s {
                        return Err(PlanError::Validation(
                            "medication end date precedes start date".into(),
                        ));
                    }
                }
                draft.scheduled_date.ok_or_else(|| {
                    PlanError::Validation("scheduled date is required".into())
                })?
            }
            ItemDetail::Discharge { .. } => {
                if self.active_discharge_target().is_some() {
                    return Err(PlanError::Validation(
                        "plan already has an active discharge target; extend it instead".into(),
                    ));
                }
                draft.scheduled_date.ok_or_else(|| {
                    PlanError::Validation("scheduled date is required".into())
                })?
            }
            _ => draft.scheduled_date.ok_or_else(|| {
                PlanError::Validation("scheduled date is required".into())
            })?,
        };

        let item = TimelineItem {
            id: Uuid::new_v4(),
            plan_id: self.id,
            title: draft.title,
            scheduled_date,
            scheduled_time: draft.scheduled_time,
            assignee: draft.assignee,
            status: ItemStatus::Scheduled,
            detail: draft.detail,
            completion: None,
            cancellation: None,
            created_at: now,
        };
        let id = item.id;
        self.items.push(item);
        Ok(id)
    }

    // ── Item transitions ───────────────────────────────────────────────

    /// Complete a scheduled item. Recurring reviews are completed per
    /// occurrence via [`TreatmentPlan::complete_review_occurrence`].
    pub fn complete_item(
        &mut self,
        item_id: Uuid,
        input: CompletionInput,
    ) -> Result<&TimelineItem, PlanError> {
        self.ensure_open()?;
        let idx = self.index_of(item_id)?;

        {
            let item = &self.items[idx];
            Self::ensure_pending(item)?;
            if let ItemDetail::Review { pattern, .. } = &item.detail {
                if pattern.next_occurrence(item.scheduled_date).is_some() {
                    return Err(PlanError::Validation(
                        "recurring review is completed one occurrence at a time".into(),
                    ));
                }
            }
        }

        let item = &mut self.items[idx];
        item.completion = Some(Self::build_completion(item.scheduled_date, &input));
        item.status = ItemStatus::Completed;
        Ok(&self.items[idx])
    }

    /// Cancel a scheduled item. Cancellation is terminal, not deletion:
    /// the item stays in the plan as part of the record.
    pub fn cancel_item(
        &mut self,
        item_id: Uuid,
        reason: impl Into<String>,
        now: NaiveDateTime,
    ) -> Result<(), PlanError> {
        self.ensure_open()?;
        let idx = self.index_of(item_id)?;
        Self::ensure_pending(&self.items[idx])?;

        let item = &mut self.items[idx];
        item.cancellation = Some(CancellationRecord { reason: reason.into(), cancelled_at: now });
        item.status = ItemStatus::Cancelled;
        Ok(())
    }

    /// Complete the currently due occurrence of a recurring review.
    ///
    /// The due occurrence is logged as completed; any pattern dates that
    /// fell between it and the actual completion date are logged as
    /// missed; the item's scheduled date advances to the next occurrence.
    /// When the pattern is exhausted the item itself becomes completed.
    pub fn complete_review_occurrence(
        &mut self,
        item_id: Uuid,
        input: CompletionInput,
    ) -> Result<OccurrenceOutcome, PlanError> {
        self.ensure_open()?;
        let idx = self.index_of(item_id)?;
        Self::ensure_pending(&self.items[idx])?;

        let due = self.items[idx].scheduled_date;
        let item = &mut self.items[idx];
        let ItemDetail::Review { pattern, occurrences } = &mut item.detail else {
            return Err(PlanError::Validation(format!(
                "occurrence completion applies to reviews, not {}",
                item.detail.kind().as_str()
            )));
        };

        let assessment = assess_completion(due, input.actual_date, input.delay_reason.as_deref());
        occurrences.push(OccurrenceRecord {
            due,
            status: OccurrenceStatus::Completed,
            actual_date: Some(input.actual_date),
            notes: input.outcome.clone(),
            delay_days: Some(assessment.days),
        });

        // Occurrences the late completion skipped over.
        let mut missed_logged = 0;
        let mut cursor = pattern.next_occurrence(due);
        while let Some(d) = cursor {
            if d >= input.actual_date {
                break;
            }
            occurrences.push(OccurrenceRecord {
                due: d,
                status: OccurrenceStatus::Missed,
                actual_date: None,
                notes: None,
                delay_days: None,
            });
            missed_logged += 1;
            cursor = pattern.next_occurrence(d);
        }

        match cursor {
            Some(next) => {
                item.scheduled_date = next;
                Ok(OccurrenceOutcome {
                    due,
                    missed_logged,
                    next_due: Some(next),
                    pattern_exhausted: false,
                })
            }
            None => {
                item.completion = Some(Self::build_completion(due, &input));
                item.status = ItemStatus::Completed;
                Ok(OccurrenceOutcome {
                    due,
                    missed_logged,
                    next_due: None,
                    pattern_exhausted: true,
                })
            }
        }
    }

    /// Append to an investigation's result log. Recording a result does
    /// not complete the investigation.
    pub fn record_investigation_result(
        &mut self,
        item_id: Uuid,
        result: InvestigationResult,
    ) -> Result<(), PlanError> {
        self.ensure_open()?;
        let idx = self.index_of(item_id)?;
        Self::ensure_pending(&self.items[idx])?;

        let item = &mut self.items[idx];
        let ItemDetail::Investigation { results, .. } = &mut item.detail else {
            return Err(PlanError::Validation(format!(
                "result logging applies to investigations, not {}",
                item.detail.kind().as_str()
            )));
        };
        results.push(result);
        Ok(())
    }

    /// Set or move the plan's discharge target. A prior unresolved target
    /// is superseded, never duplicated: its date moves and the change is
    /// retained in the extension audit trail.
    pub fn set_discharge_target(
        &mut self,
        new_date: NaiveDate,
        reason: impl Into<String>,
        recorded_by: impl Into<String>,
        now: NaiveDateTime,
    ) -> Result<Uuid, PlanError> {
        self.ensure_open()?;
        let reason = reason.into();

        if let Some(existing) = self.active_discharge_target() {
            let id = existing.id;
            let old_date = existing.scheduled_date;
            let idx = self.index_of(id)?;
            let item = &mut self.items[idx];
            let ItemDetail::Discharge { extensions, .. } = &mut item.detail else {
                unreachable!("active_discharge_target only returns discharge items");
            };
            extensions.push(crate::models::item::DischargeExtension {
                new_date,
                added_days: (new_date - old_date).num_days(),
                reason,
                recorded_by: recorded_by.into(),
                recorded_at: now,
            });
            item.scheduled_date = new_date;
            return Ok(id);
        }

        self.add_item(
            TimelineItemDraft {
                title: "Discharge target".into(),
                scheduled_date: Some(new_date),
                scheduled_time: None,
                assignee: Some(recorded_by.into()),
                detail: ItemDetail::Discharge {
                    criteria: (!reason.trim().is_empty()).then_some(reason),
                    extensions: Vec::new(),
                },
            },
            now,
        )
    }

    // ── Read views (computed on demand, never cached) ──────────────────

    pub fn item(&self, item_id: Uuid) -> Option<&TimelineItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn items_of_kind(&self, kind: ItemKind) -> Vec<&TimelineItem> {
        self.items.iter().filter(|i| i.kind() == kind).collect()
    }

    pub fn reviews(&self) -> Vec<&TimelineItem> {
        self.items_of_kind(ItemKind::Review)
    }

    pub fn overdue_items(&self, now: NaiveDateTime) -> Vec<&TimelineItem> {
        self.items.iter().filter(|i| is_overdue(i, now)).collect()
    }

    /// The plan's single unresolved discharge target, if any.
    pub fn active_discharge_target(&self) -> Option<&TimelineItem> {
        self.items.iter().find(|i| {
            i.kind() == ItemKind::Discharge && i.status == ItemStatus::Scheduled
        })
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn index_of(&self, item_id: Uuid) -> Result<usize, PlanError> {
        self.items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or(PlanError::ItemNotFound(item_id))
    }

    fn ensure_pending(item: &TimelineItem) -> Result<(), PlanError> {
        if item.status.is_terminal() {
            return Err(PlanError::InvalidTransition(format!(
                "item is already {}",
                item.status.as_str()
            )));
        }
        Ok(())
    }

    fn build_completion(scheduled: NaiveDate, input: &CompletionInput) -> CompletionRecord {
        let assessment =
            assess_completion(scheduled, input.actual_date, input.delay_reason.as_deref());
        CompletionRecord {
            actual_date: input.actual_date,
            actual_time: input.actual_time,
            completed_by: input.completed_by.clone(),
            outcome: input.outcome.clone(),
            delay_reason: input.delay_reason.clone(),
            delay_days: assessment.days,
            delay_unexplained: assessment.unexplained,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::DayOfWeek;
    use crate::recurrence::{Cadence, RecurrencePattern};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(9, 0, 0).unwrap()
    }

    fn plan() -> TreatmentPlan {
        let mut p = TreatmentPlan::new(Uuid::new_v4(), "Fractured neck of femur", at(2024, 1, 1));
        p.advance_status(PlanStatus::Active).unwrap();
        p
    }

    fn procedure_draft(scheduled: Option<NaiveDate>) -> TimelineItemDraft {
        TimelineItemDraft {
            title: "Hip replacement".into(),
            scheduled_date: scheduled,
            scheduled_time: None,
            assignee: Some("Mr Adeyemi".into()),
            detail: ItemDetail::Procedure {
                surgeon: Some("Mr Adeyemi".into()),
                location: Some("Theatre 2".into()),
            },
        }
    }

    fn review_draft(pattern: RecurrencePattern) -> TimelineItemDraft {
        TimelineItemDraft {
            title: "Ward round review".into(),
            scheduled_date: None,
            scheduled_time: None,
            assignee: None,
            detail: ItemDetail::Review { pattern, occurrences: Vec::new() },
        }
    }

    fn completion(actual: NaiveDate, reason: Option<&str>) -> CompletionInput {
        CompletionInput {
            actual_date: actual,
            actual_time: None,
            completed_by: "Dr Navarro".into(),
            outcome: Some("reviewed, stable".into()),
            delay_reason: reason.map(Into::into),
        }
    }

    // ── Plan lifecycle ─────────────────────────────────────────────────

    #[test]
    fn plan_status_moves_forward_only() {
        let mut p = TreatmentPlan::new(Uuid::new_v4(), "Dx", at(2024, 1, 1));
        p.advance_status(PlanStatus::Active).unwrap();
        p.advance_status(PlanStatus::Completed).unwrap();
        p.advance_status(PlanStatus::Archived).unwrap();
        assert!(p.advance_status(PlanStatus::Active).is_err());
    }

    #[test]
    fn same_status_is_not_a_transition() {
        let mut p = plan();
        assert!(p.advance_status(PlanStatus::Active).is_err());
    }

    #[test]
    fn archived_plan_rejects_item_mutation() {
        let mut p = plan();
        let id = p.add_item(procedure_draft(Some(date(2024, 1, 10))), at(2024, 1, 2)).unwrap();
        p.advance_status(PlanStatus::Completed).unwrap();
        p.advance_status(PlanStatus::Archived).unwrap();

        let err = p.cancel_item(id, "n/a", at(2024, 2, 1)).unwrap_err();
        assert!(matches!(err, PlanError::InvalidTransition(_)));
    }

    // ── Item creation ──────────────────────────────────────────────────

    #[test]
    fn added_item_references_owning_plan() {
        let mut p = plan();
        let id = p.add_item(procedure_draft(Some(date(2024, 1, 10))), at(2024, 1, 2)).unwrap();
        let item = p.item(id).unwrap();
        assert_eq!(item.plan_id, p.id);
        assert_eq!(item.status, ItemStatus::Scheduled);
    }

    #[test]
    fn missing_scheduled_date_is_rejected() {
        let mut p = plan();
        let err = p.add_item(procedure_draft(None), at(2024, 1, 2)).unwrap_err();
        assert!(matches!(err, PlanError::Validation(_)));
        assert!(p.items.is_empty(), "invalid draft must not be partially added");
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut p = plan();
        let mut draft = procedure_draft(Some(date(2024, 1, 10)));
        draft.title = "  ".into();
        assert!(p.add_item(draft, at(2024, 1, 2)).is_err());
    }

    #[test]
    fn review_schedule_derives_from_pattern() {
        let mut p = plan();
        // 2024-01-02 is a Tuesday; first flagged day is Thursday the 4th.
        let pattern = RecurrencePattern {
            cadence: Cadence::DaysOfWeek { days: vec![DayOfWeek::Thursday] },
            start: date(2024, 1, 2),
            end_date: None,
            repeat_count: None,
        };
        let id = p.add_item(review_draft(pattern), at(2024, 1, 2)).unwrap();
        assert_eq!(p.item(id).unwrap().scheduled_date, date(2024, 1, 4));
    }

    #[test]
    fn double_bounded_review_pattern_is_rejected() {
        let mut p = plan();
        let pattern = RecurrencePattern {
            cadence: Cadence::Weekly,
            start: date(2024, 1, 1),
            end_date: Some(date(2024, 2, 1)),
            repeat_count: Some(3),
        };
        assert!(p.add_item(review_draft(pattern), at(2024, 1, 2)).is_err());
    }

    #[test]
    fn medication_window_must_be_ordered() {
        let mut p = plan();
        let draft = TimelineItemDraft {
            title: "IV co-amoxiclav".into(),
            scheduled_date: Some(date(2024, 1, 3)),
            scheduled_time: None,
            assignee: None,
            detail: ItemDetail::Medication {
                dosage: "1.2g".into(),
                route: "IV".into(),
                frequency: "TDS".into(),
                start_date: Some(date(2024, 1, 5)),
                end_date: Some(date(2024, 1, 3)),
            },
        };
        assert!(p.add_item(draft, at(2024, 1, 2)).is_err());
    }

    // ── Transitions ────────────────────────────────────────────────────

    #[test]
    fn complete_records_delay_and_outcome() {
        let mut p = plan();
        let mut draft = procedure_draft(Some(date(2024, 1, 10)));
        draft.title = "Review".into();
        let id = p.add_item(draft, at(2024, 1, 2)).unwrap();

        let item = p.complete_item(id, completion(date(2024, 1, 12), Some("bed shortage"))).unwrap();
        assert_eq!(item.status, ItemStatus::Completed);
        let rec = item.completion.as_ref().unwrap();
        assert_eq!(rec.delay_days, 2);
        assert!(!rec.delay_unexplained);
        assert_eq!(rec.completed_by, "Dr Navarro");
    }

    #[test]
    fn late_completion_without_reason_is_soft_flagged() {
        let mut p = plan();
        let id = p.add_item(procedure_draft(Some(date(2024, 1, 10))), at(2024, 1, 2)).unwrap();
        let item = p.complete_item(id, completion(date(2024, 1, 12), None)).unwrap();
        assert!(item.completion.as_ref().unwrap().delay_unexplained);
    }

    #[test]
    fn complete_twice_is_invalid_transition() {
        let mut p = plan();
        let id = p.add_item(procedure_draft(Some(date(2024, 1, 10))), at(2024, 1, 2)).unwrap();
        p.complete_item(id, completion(date(2024, 1, 10), None)).unwrap();

        let err = p.complete_item(id, completion(date(2024, 1, 11), None)).unwrap_err();
        assert!(matches!(err, PlanError::InvalidTransition(_)));
    }

    #[test]
    fn cancel_then_complete_is_invalid_transition() {
        let mut p = plan();
        let id = p.add_item(procedure_draft(Some(date(2024, 1, 10))), at(2024, 1, 2)).unwrap();
        p.cancel_item(id, "patient declined", at(2024, 1, 5)).unwrap();
        assert_eq!(p.item(id).unwrap().status, ItemStatus::Cancelled);

        let err = p.complete_item(id, completion(date(2024, 1, 10), None)).unwrap_err();
        assert!(matches!(err, PlanError::InvalidTransition(_)));
    }

    #[test]
    fn cancelled_item_stays_in_plan() {
        let mut p = plan();
        let id = p.add_item(procedure_draft(Some(date(2024, 1, 10))), at(2024, 1, 2)).unwrap();
        p.cancel_item(id, "superseded", at(2024, 1, 5)).unwrap();
        assert_eq!(p.items.len(), 1);
        assert_eq!(p.item(id).unwrap().cancellation.as_ref().unwrap().reason, "superseded");
    }

    #[test]
    fn unknown_item_id_errors() {
        let mut p = plan();
        let err = p.cancel_item(Uuid::new_v4(), "x", at(2024, 1, 5)).unwrap_err();
        assert!(matches!(err, PlanError::ItemNotFound(_)));
    }

    // ── Recurring reviews ──────────────────────────────────────────────

    #[test]
    fn occurrence_completion_advances_schedule() {
        let mut p = plan();
        let pattern = RecurrencePattern {
            cadence: Cadence::Weekly,
            start: date(2024, 1, 1),
            end_date: None,
            repeat_count: Some(3),
        };
        let id = p.add_item(review_draft(pattern), at(2024, 1, 1)).unwrap();

        let outcome = p.complete_review_occurrence(id, completion(date(2024, 1, 1), None)).unwrap();
        assert_eq!(outcome.due, date(2024, 1, 1));
        assert_eq!(outcome.next_due, Some(date(2024, 1, 8)));
        assert!(!outcome.pattern_exhausted);

        let item = p.item(id).unwrap();
        assert_eq!(item.status, ItemStatus::Scheduled, "pattern still active");
        assert_eq!(item.scheduled_date, date(2024, 1, 8));
    }

    #[test]
    fn skipped_occurrences_are_logged_missed() {
        let mut p = plan();
        let pattern = RecurrencePattern {
            cadence: Cadence::Weekly,
            start: date(2024, 1, 1),
            end_date: None,
            repeat_count: Some(4),
        };
        let id = p.add_item(review_draft(pattern), at(2024, 1, 1)).unwrap();

        // Due Jan 1, completed Jan 16: Jan 8 and Jan 15 were skipped.
        let outcome = p.complete_review_occurrence(id, completion(date(2024, 1, 16), None)).unwrap();
        assert_eq!(outcome.missed_logged, 2);
        assert_eq!(outcome.next_due, Some(date(2024, 1, 22)));

        let item = p.item(id).unwrap();
        let ItemDetail::Review { occurrences, .. } = &item.detail else { unreachable!() };
        assert_eq!(occurrences.len(), 3);
        assert_eq!(occurrences[0].status, OccurrenceStatus::Completed);
        assert_eq!(occurrences[1].due, date(2024, 1, 8));
        assert_eq!(occurrences[1].status, OccurrenceStatus::Missed);
        assert_eq!(occurrences[2].due, date(2024, 1, 15));
    }

    #[test]
    fn final_occurrence_completes_the_item() {
        let mut p = plan();
        let pattern = RecurrencePattern {
            cadence: Cadence::Weekly,
            start: date(2024, 1, 1),
            end_date: None,
            repeat_count: Some(2),
        };
        let id = p.add_item(review_draft(pattern), at(2024, 1, 1)).unwrap();

        p.complete_review_occurrence(id, completion(date(2024, 1, 1), None)).unwrap();
        let outcome = p.complete_review_occurrence(id, completion(date(2024, 1, 8), None)).unwrap();
        assert!(outcome.pattern_exhausted);
        assert_eq!(p.item(id).unwrap().status, ItemStatus::Completed);
    }

    #[test]
    fn whole_item_complete_rejected_while_pattern_active() {
        let mut p = plan();
        let pattern = RecurrencePattern {
            cadence: Cadence::Daily,
            start: date(2024, 1, 1),
            end_date: None,
            repeat_count: Some(5),
        };
        let id = p.add_item(review_draft(pattern), at(2024, 1, 1)).unwrap();

        let err = p.complete_item(id, completion(date(2024, 1, 1), None)).unwrap_err();
        assert!(matches!(err, PlanError::Validation(_)));
    }

    #[test]
    fn one_off_review_completes_as_a_whole() {
        let mut p = plan();
        let id = p
            .add_item(review_draft(RecurrencePattern::once(date(2024, 1, 10))), at(2024, 1, 1))
            .unwrap();
        let item = p.complete_item(id, completion(date(2024, 1, 10), None)).unwrap();
        assert_eq!(item.status, ItemStatus::Completed);
    }

    #[test]
    fn occurrence_completion_rejected_for_non_reviews() {
        let mut p = plan();
        let id = p.add_item(procedure_draft(Some(date(2024, 1, 10))), at(2024, 1, 2)).unwrap();
        let err = p.complete_review_occurrence(id, completion(date(2024, 1, 10), None)).unwrap_err();
        assert!(matches!(err, PlanError::Validation(_)));
    }

    // ── Investigations ─────────────────────────────────────────────────

    #[test]
    fn investigation_results_accumulate_without_completing() {
        let mut p = plan();
        let draft = TimelineItemDraft {
            title: "Serum potassium".into(),
            scheduled_date: Some(date(2024, 1, 3)),
            scheduled_time: None,
            assignee: None,
            detail: ItemDetail::Investigation {
                target_value: Some("4.0 mmol/L".into()),
                target_range: Some("3.5-5.3".into()),
                results: Vec::new(),
            },
        };
        let id = p.add_item(draft, at(2024, 1, 2)).unwrap();

        for (day, value) in [(3, "5.9"), (4, "5.1")] {
            p.record_investigation_result(
                id,
                InvestigationResult {
                    recorded_on: date(2024, 1, day),
                    value: value.into(),
                    recorded_by: Some("lab".into()),
                    note: None,
                },
            )
            .unwrap();
        }

        let item = p.item(id).unwrap();
        assert_eq!(item.status, ItemStatus::Scheduled);
        let ItemDetail::Investigation { results, .. } = &item.detail else { unreachable!() };
        assert_eq!(results.len(), 2);
    }

    // ── Discharge target ───────────────────────────────────────────────

    #[test]
    fn discharge_target_supersedes_with_audit_trail() {
        let mut p = plan();
        let id = p
            .set_discharge_target(date(2024, 1, 20), "mobilising well", "Dr Navarro", at(2024, 1, 5))
            .unwrap();

        let moved = p
            .set_discharge_target(date(2024, 1, 23), "wound not healed", "Dr Navarro", at(2024, 1, 18))
            .unwrap();
        assert_eq!(moved, id, "target superseded, not duplicated");

        let target = p.active_discharge_target().unwrap();
        assert_eq!(target.scheduled_date, date(2024, 1, 23));
        let ItemDetail::Discharge { extensions, .. } = &target.detail else { unreachable!() };
        assert_eq!(extensions.len(), 1);
        assert_eq!(extensions[0].added_days, 3);
        assert_eq!(extensions[0].reason, "wound not healed");
        assert_eq!(extensions[0].new_date, date(2024, 1, 23));

        assert_eq!(p.items_of_kind(ItemKind::Discharge).len(), 1);
    }

    #[test]
    fn direct_second_discharge_item_is_rejected() {
        let mut p = plan();
        p.set_discharge_target(date(2024, 1, 20), "", "Dr Navarro", at(2024, 1, 5)).unwrap();

        let draft = TimelineItemDraft {
            title: "Discharge target".into(),
            scheduled_date: Some(date(2024, 1, 25)),
            scheduled_time: None,
            assignee: None,
            detail: ItemDetail::Discharge { criteria: None, extensions: Vec::new() },
        };
        assert!(p.add_item(draft, at(2024, 1, 6)).is_err());
    }

    #[test]
    fn completed_discharge_target_allows_a_new_one() {
        let mut p = plan();
        let first = p
            .set_discharge_target(date(2024, 1, 20), "", "Dr Navarro", at(2024, 1, 5))
            .unwrap();
        p.cancel_item(first, "readmission to ICU", at(2024, 1, 15)).unwrap();

        let second = p
            .set_discharge_target(date(2024, 2, 10), "", "Dr Navarro", at(2024, 1, 25))
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(p.active_discharge_target().unwrap().id, second);
    }

    // ── Views ──────────────────────────────────────────────────────────

    #[test]
    fn overdue_view_tracks_now() {
        let mut p = plan();
        p.add_item(procedure_draft(Some(date(2024, 1, 10))), at(2024, 1, 2)).unwrap();

        assert!(p.overdue_items(at(2024, 1, 9)).is_empty());
        assert_eq!(p.overdue_items(at(2024, 1, 15)).len(), 1);
    }

    #[test]
    fn reviews_view_filters_by_kind() {
        let mut p = plan();
        p.add_item(procedure_draft(Some(date(2024, 1, 10))), at(2024, 1, 2)).unwrap();
        p.add_item(review_draft(RecurrencePattern::once(date(2024, 1, 12))), at(2024, 1, 2))
            .unwrap();

        assert_eq!(p.reviews().len(), 1);
        assert_eq!(p.items_of_kind(ItemKind::Procedure).len(), 1);
    }
}
