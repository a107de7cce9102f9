use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{ItemKind, ItemStatus, OccurrenceStatus};
use crate::recurrence::RecurrencePattern;

/// A single schedulable clinical event tracked against a planned and
/// (eventually) actual date. Items belong to exactly one plan and are
/// never shared or physically deleted — cancellation is terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineItem {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub title: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: Option<NaiveTime>,
    pub assignee: Option<String>,
    pub status: ItemStatus,
    pub detail: ItemDetail,
    pub completion: Option<CompletionRecord>,
    pub cancellation: Option<CancellationRecord>,
    pub created_at: NaiveDateTime,
}

impl TimelineItem {
    pub fn kind(&self) -> ItemKind {
        self.detail.kind()
    }
}

/// Kind-specific payload carried by each item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemDetail {
    Review {
        pattern: RecurrencePattern,
        /// Accumulating log of completed and missed occurrences.
        occurrences: Vec<OccurrenceRecord>,
    },
    Investigation {
        target_value: Option<String>,
        target_range: Option<String>,
        /// Accumulating result log; recording a result does not complete
        /// the investigation.
        results: Vec<InvestigationResult>,
    },
    Procedure {
        surgeon: Option<String>,
        location: Option<String>,
    },
    Medication {
        dosage: String,
        route: String,
        frequency: String,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    },
    Discharge {
        criteria: Option<String>,
        /// Audit trail of target-date extensions, oldest first.
        extensions: Vec<DischargeExtension>,
    },
}

impl ItemDetail {
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Review { .. } => ItemKind::Review,
            Self::Investigation { .. } => ItemKind::Investigation,
            Self::Procedure { .. } => ItemKind::Procedure,
            Self::Medication { .. } => ItemKind::Medication,
            Self::Discharge { .. } => ItemKind::Discharge,
        }
    }
}

/// Recorded when an item (or a review occurrence) is completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub actual_date: NaiveDate,
    pub actual_time: Option<NaiveTime>,
    pub completed_by: String,
    pub outcome: Option<String>,
    pub delay_reason: Option<String>,
    pub delay_days: i64,
    /// Soft flag: the completion was late but no delay reason was given.
    /// Accepted anyway; surfaced for downstream reporting.
    pub delay_unexplained: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationRecord {
    pub reason: String,
    pub cancelled_at: NaiveDateTime,
}

/// One entry in a recurring review's occurrence log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccurrenceRecord {
    pub due: NaiveDate,
    pub status: OccurrenceStatus,
    pub actual_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub delay_days: Option<i64>,
}

/// One entry in an investigation's result log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestigationResult {
    pub recorded_on: NaiveDate,
    pub value: String,
    pub recorded_by: Option<String>,
    pub note: Option<String>,
}

/// One entry in a discharge target's extension audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DischargeExtension {
    pub new_date: NaiveDate,
    pub added_days: i64,
    pub reason: String,
    pub recorded_by: String,
    pub recorded_at: NaiveDateTime,
}

/// Input for creating a timeline item, validated by the owning plan
/// before an item is constructed. Invalid drafts never become items.
#[derive(Debug, Clone, Deserialize)]
pub struct TimelineItemDraft {
    pub title: String,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<NaiveTime>,
    pub assignee: Option<String>,
    pub detail: ItemDetail,
}

/// Input for completing an item or a review occurrence.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionInput {
    pub actual_date: NaiveDate,
    pub actual_time: Option<NaiveTime>,
    pub completed_by: String,
    pub outcome: Option<String>,
    pub delay_reason: Option<String>,
}
