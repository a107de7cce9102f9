use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::PlanStatus;
use super::item::TimelineItem;

/// The aggregate owning all timeline items for one patient admission
/// episode. All item mutation goes through the methods in
/// `crate::timeline`; nothing outside the aggregate edits item fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatmentPlan {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub diagnosis: String,
    pub admitted_at: NaiveDateTime,
    pub status: PlanStatus,
    pub items: Vec<TimelineItem>,
}

impl TreatmentPlan {
    pub fn new(patient_id: Uuid, diagnosis: impl Into<String>, admitted_at: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id,
            diagnosis: diagnosis.into(),
            admitted_at,
            status: PlanStatus::Draft,
            items: Vec::new(),
        }
    }
}
