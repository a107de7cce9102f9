use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(PlanStatus {
    Draft => "draft",
    Active => "active",
    Completed => "completed",
    Archived => "archived",
});

impl PlanStatus {
    /// Position in the forward-only lifecycle. Transitions must strictly
    /// increase; an archived plan is never resurrected.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Draft => 0,
            Self::Active => 1,
            Self::Completed => 2,
            Self::Archived => 3,
        }
    }
}

str_enum!(ItemStatus {
    Scheduled => "scheduled",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl ItemStatus {
    /// Completed and Cancelled are terminal; no transition leaves them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

str_enum!(ItemKind {
    Review => "review",
    Investigation => "investigation",
    Procedure => "procedure",
    Medication => "medication",
    Discharge => "discharge",
});

str_enum!(OccurrenceStatus {
    Completed => "completed",
    Missed => "missed",
});

str_enum!(DayOfWeek {
    Monday => "monday",
    Tuesday => "tuesday",
    Wednesday => "wednesday",
    Thursday => "thursday",
    Friday => "friday",
    Saturday => "saturday",
    Sunday => "sunday",
});

impl DayOfWeek {
    pub fn to_chrono(&self) -> chrono::Weekday {
        match self {
            Self::Monday => chrono::Weekday::Mon,
            Self::Tuesday => chrono::Weekday::Tue,
            Self::Wednesday => chrono::Weekday::Wed,
            Self::Thursday => chrono::Weekday::Thu,
            Self::Friday => chrono::Weekday::Fri,
            Self::Saturday => chrono::Weekday::Sat,
            Self::Sunday => chrono::Weekday::Sun,
        }
    }
}

str_enum!(RecordKind {
    Patient => "patients",
    TreatmentPlan => "treatment_plans",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn plan_status_roundtrip() {
        for s in ["draft", "active", "completed", "archived"] {
            let status = PlanStatus::from_str(s).unwrap();
            assert_eq!(status.as_str(), s);
        }
    }

    #[test]
    fn plan_status_rank_is_strictly_increasing() {
        assert!(PlanStatus::Draft.rank() < PlanStatus::Active.rank());
        assert!(PlanStatus::Active.rank() < PlanStatus::Completed.rank());
        assert!(PlanStatus::Completed.rank() < PlanStatus::Archived.rank());
    }

    #[test]
    fn item_status_terminality() {
        assert!(!ItemStatus::Scheduled.is_terminal());
        assert!(ItemStatus::Completed.is_terminal());
        assert!(ItemStatus::Cancelled.is_terminal());
    }

    #[test]
    fn invalid_enum_value_is_rejected() {
        let err = ItemKind::from_str("overdue").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEnum { .. }));
    }

    #[test]
    fn day_of_week_maps_to_chrono() {
        assert_eq!(DayOfWeek::Monday.to_chrono(), chrono::Weekday::Mon);
        assert_eq!(DayOfWeek::Sunday.to_chrono(), chrono::Weekday::Sun);
    }

    #[test]
    fn record_kind_names_match_remote_collections() {
        assert_eq!(RecordKind::Patient.as_str(), "patients");
        assert_eq!(RecordKind::TreatmentPlan.as_str(), "treatment_plans");
    }
}
