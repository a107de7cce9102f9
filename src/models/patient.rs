use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    /// Hospital number / medical record number.
    pub mrn: String,
    pub date_of_birth: Option<NaiveDate>,
    pub ward: Option<String>,
}

impl Patient {
    pub fn new(name: impl Into<String>, mrn: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            mrn: mrn.into(),
            date_of_birth: None,
            ward: None,
        }
    }
}
