//! Ward-facing application service: the thin layer the UI calls.
//!
//! Composes the sync coordinator with a clock and the overdue scanner.
//! Holds no clinical logic of its own; plan mutations happen on
//! `TreatmentPlan` in memory and are persisted here as whole records.

use std::sync::Arc;

use crate::clock::Clock;
use crate::db::ReplicaSummary;
use crate::models::patient::Patient;
use crate::models::plan::TreatmentPlan;
use crate::overdue::{self, OverdueReport};
use crate::remote::RemoteStore;
use crate::sync::{DeleteOutcome, ReconcileSummary, SyncCoordinator, SyncError, SyncOutcome};

pub struct CareService<R: RemoteStore> {
    sync: SyncCoordinator<R>,
    clock: Arc<dyn Clock>,
}

impl<R: RemoteStore> CareService<R> {
    pub fn new(sync: SyncCoordinator<R>, clock: Arc<dyn Clock>) -> Self {
        Self { sync, clock }
    }

    pub async fn register_patient(&self, patient: &Patient) -> Result<SyncOutcome<Patient>, SyncError> {
        tracing::info!("registering patient {} ({})", patient.id, patient.mrn);
        self.sync.create(patient).await
    }

    pub async fn load_patients(&self) -> Result<Vec<Patient>, SyncError> {
        self.sync.fetch_all().await
    }

    pub async fn create_plan(&self, plan: &TreatmentPlan) -> Result<SyncOutcome<TreatmentPlan>, SyncError> {
        tracing::info!("creating plan {} for patient {}", plan.id, plan.patient_id);
        self.sync.create(plan).await
    }

    /// Persist a plan after in-memory edits (items added, completed, etc.).
    pub async fn save_plan(&self, plan: &TreatmentPlan) -> Result<SyncOutcome<TreatmentPlan>, SyncError> {
        self.sync.update(plan).await
    }

    pub async fn load_plans(&self) -> Result<Vec<TreatmentPlan>, SyncError> {
        self.sync.fetch_all().await
    }

    pub async fn delete_plan(&self, plan: &TreatmentPlan) -> Result<DeleteOutcome, SyncError> {
        tracing::info!("deleting plan {}", plan.id);
        self.sync.delete::<TreatmentPlan>(plan.id).await
    }

    /// Everything overdue across active plans, as of the service clock.
    pub async fn sweep_overdue(&self) -> Result<OverdueReport, SyncError> {
        let plans = self.load_plans().await?;
        Ok(overdue::scan_plans(plans.iter(), self.clock.now()))
    }

    /// Hook for the connectivity watcher: replay offline work.
    pub async fn on_connectivity_restored(&self) -> Result<ReconcileSummary, SyncError> {
        let summary = self.sync.reconcile().await?;
        if !summary.fully_synced() {
            tracing::warn!(
                "reconciliation incomplete: {}/{} writes, {}/{} deletes",
                summary.writes_synced,
                summary.writes_attempted,
                summary.deletes_confirmed,
                summary.deletes_attempted
            );
        }
        Ok(summary)
    }

    pub fn replica_summary(&self) -> Result<ReplicaSummary, SyncError> {
        self.sync.replica_summary()
    }
}
