//! Sync Coordinator — local replica vs. remote authoritative store.
//!
//! Availability over consistency, deliberately: a ward tool must stay
//! usable offline. Reads degrade to the cached replica; writes degrade to
//! "accepted locally, pending sync" and are replayed by `reconcile()`
//! when connectivity returns. Deletes always leave a soft tombstone so
//! the intent survives a failed remote call.
//!
//! Known limitation, by design for a single-writer-at-a-time system: no
//! per-record versioning. A successful fetch silently overwrites local
//! state for non-tombstoned records, and a local write silently wins on
//! the next reconcile. True concurrent-edit conflicts are not resolved
//! (see `SyncError::Conflict`).

use std::sync::Mutex;

use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, DatabaseError, ReplicaSummary};
use crate::models::enums::RecordKind;
use crate::models::patient::Patient;
use crate::models::plan::TreatmentPlan;
use crate::remote::{RemoteError, RemoteStore};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Non-transient remote failure (rejection, bad payload). Transient
    /// unavailability never reaches callers through this variant.
    #[error("remote store error: {0}")]
    Remote(#[from] RemoteError),

    #[error("replica payload corrupt for {kind} {id}: {reason}")]
    CorruptPayload { kind: String, id: String, reason: String },

    /// Reserved: a record modified both locally and remotely since the
    /// last sync. Detection needs per-record versioning, which this
    /// design does not carry yet; today remote wins on fetch and local
    /// wins on write, with no resolution policy.
    #[error("conflicting edits for {kind} {id}")]
    Conflict { kind: String, id: String },
}

/// An entity the coordinator can replicate.
pub trait SyncEntity: Serialize + DeserializeOwned + Clone {
    fn kind() -> RecordKind;
    fn record_id(&self) -> Uuid;
}

impl SyncEntity for Patient {
    fn kind() -> RecordKind {
        RecordKind::Patient
    }
    fn record_id(&self) -> Uuid {
        self.id
    }
}

impl SyncEntity for TreatmentPlan {
    fn kind() -> RecordKind {
        RecordKind::TreatmentPlan
    }
    fn record_id(&self) -> Uuid {
        self.id
    }
}

/// Result of a write: the stored record plus whether the remote saw it.
#[derive(Debug, Clone)]
pub struct SyncOutcome<T> {
    pub record: T,
    pub synced: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub remote_confirmed: bool,
}

/// What one reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub writes_attempted: usize,
    pub writes_synced: usize,
    pub deletes_attempted: usize,
    pub deletes_confirmed: usize,
}

impl ReconcileSummary {
    pub fn fully_synced(&self) -> bool {
        self.writes_synced == self.writes_attempted
            && self.deletes_confirmed == self.deletes_attempted
    }
}

pub struct SyncCoordinator<R: RemoteStore> {
    remote: R,
    conn: Mutex<Connection>,
    /// Serializes reconciliation passes: two connectivity-restore events
    /// must not race to resolve the same dirty record.
    reconcile_gate: tokio::sync::Mutex<()>,
}

impl<R: RemoteStore> SyncCoordinator<R> {
    pub fn new(remote: R, conn: Connection) -> Self {
        Self {
            remote,
            conn: Mutex::new(conn),
            reconcile_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Fetch every record of the entity's kind. On success the remote is
    /// authoritative: the replica is overwritten and marked synced,
    /// except for records with a pending local tombstone, which are
    /// neither resurrected nor returned. On transient failure the call
    /// degrades to the replica's live records.
    pub async fn fetch_all<T: SyncEntity>(&self) -> Result<Vec<T>, SyncError> {
        let kind = T::kind();
        match self.remote.fetch_all(&kind).await {
            Ok(values) => {
                let mut out = Vec::with_capacity(values.len());
                for value in values {
                    let record: T = decode(&kind, &value)?;
                    let id = record.record_id();
                    if self.with_conn(|c| db::is_tombstoned(c, &kind, &id))? {
                        continue;
                    }
                    let payload = value.to_string();
                    self.with_conn(|c| db::upsert_record(c, &kind, &id, &payload, true))?;
                    out.push(record);
                }
                Ok(out)
            }
            Err(RemoteError::Unavailable(reason)) => {
                tracing::warn!(
                    "fetch_all({}) degraded to local replica: {reason}",
                    kind.as_str()
                );
                let rows = self.with_conn(|c| db::list_records(c, &kind))?;
                rows.iter()
                    .map(|row| {
                        serde_json::from_str(&row.payload).map_err(|e| {
                            SyncError::CorruptPayload {
                                kind: kind.as_str().into(),
                                id: row.id.to_string(),
                                reason: e.to_string(),
                            }
                        })
                    })
                    .collect()
            }
            Err(other) => Err(other.into()),
        }
    }

    pub async fn create<T: SyncEntity>(&self, record: &T) -> Result<SyncOutcome<T>, SyncError> {
        self.write(record, "create").await
    }

    pub async fn update<T: SyncEntity>(&self, record: &T) -> Result<SyncOutcome<T>, SyncError> {
        self.write(record, "update").await
    }

    /// Remote-first write. Transient remote failure is absorbed: the
    /// record lands in the replica dirty and the caller still gets a
    /// usable result.
    async fn write<T: SyncEntity>(&self, record: &T, op: &str) -> Result<SyncOutcome<T>, SyncError> {
        let kind = T::kind();
        let id = record.record_id();
        let value = encode(&kind, &id, record)?;

        match self.remote.put(&kind, &id, &value).await {
            Ok(remote_value) => {
                let stored: T = decode(&kind, &remote_value)?;
                let payload = remote_value.to_string();
                self.with_conn(|c| db::upsert_record(c, &kind, &id, &payload, true))?;
                Ok(SyncOutcome { record: stored, synced: true })
            }
            Err(RemoteError::Unavailable(reason)) => {
                tracing::warn!(
                    "{op} {}/{id} accepted locally, pending sync: {reason}",
                    kind.as_str()
                );
                self.with_conn(|c| db::upsert_record(c, &kind, &id, &value.to_string(), false))?;
                Ok(SyncOutcome { record: record.clone(), synced: false })
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Soft delete. The local tombstone is set whatever the remote says;
    /// an unconfirmed tombstone is retried by `reconcile()`.
    pub async fn delete<T: SyncEntity>(&self, id: Uuid) -> Result<DeleteOutcome, SyncError> {
        let kind = T::kind();
        match self.remote.delete(&kind, &id).await {
            Ok(()) => {
                self.with_conn(|c| db::mark_deleted(c, &kind, &id, true))?;
                Ok(DeleteOutcome { remote_confirmed: true })
            }
            Err(RemoteError::Unavailable(reason)) => {
                tracing::warn!(
                    "delete {}/{id} tombstoned locally, pending sync: {reason}",
                    kind.as_str()
                );
                self.with_conn(|c| db::mark_deleted(c, &kind, &id, false))?;
                Ok(DeleteOutcome { remote_confirmed: false })
            }
            Err(other) => {
                // The tombstone stands even when the remote refuses.
                self.with_conn(|c| db::mark_deleted(c, &kind, &id, false))?;
                Err(other.into())
            }
        }
    }

    /// Replay everything the replica holds dirty: offline writes first,
    /// then unconfirmed tombstones. Safe to run repeatedly — records are
    /// only flipped to synced on remote success, and a clean replica
    /// makes the pass a no-op.
    pub async fn reconcile(&self) -> Result<ReconcileSummary, SyncError> {
        let _gate = self.reconcile_gate.lock().await;
        let mut summary = ReconcileSummary::default();

        for row in self.with_conn(db::dirty_writes)? {
            summary.writes_attempted += 1;
            let value: Value =
                serde_json::from_str(&row.payload).map_err(|e| SyncError::CorruptPayload {
                    kind: row.kind.as_str().into(),
                    id: row.id.to_string(),
                    reason: e.to_string(),
                })?;
            match self.remote.put(&row.kind, &row.id, &value).await {
                Ok(remote_value) => {
                    let payload = remote_value.to_string();
                    self.with_conn(|c| db::upsert_record(c, &row.kind, &row.id, &payload, true))?;
                    summary.writes_synced += 1;
                }
                Err(RemoteError::Unavailable(reason)) => {
                    tracing::debug!(
                        "reconcile left {}/{} dirty: {reason}",
                        row.kind.as_str(),
                        row.id
                    );
                }
                Err(other) => {
                    tracing::warn!(
                        "reconcile: remote rejected {}/{}: {other}",
                        row.kind.as_str(),
                        row.id
                    );
                }
            }
        }

        for row in self.with_conn(db::dirty_tombstones)? {
            summary.deletes_attempted += 1;
            match self.remote.delete(&row.kind, &row.id).await {
                Ok(()) => {
                    self.with_conn(|c| db::mark_deleted(c, &row.kind, &row.id, true))?;
                    summary.deletes_confirmed += 1;
                }
                Err(RemoteError::Unavailable(reason)) => {
                    tracing::debug!(
                        "reconcile left tombstone {}/{} pending: {reason}",
                        row.kind.as_str(),
                        row.id
                    );
                }
                Err(other) => {
                    tracing::warn!(
                        "reconcile: remote rejected delete {}/{}: {other}",
                        row.kind.as_str(),
                        row.id
                    );
                }
            }
        }

        tracing::info!(
            "reconcile pass: {}/{} writes, {}/{} deletes",
            summary.writes_synced,
            summary.writes_attempted,
            summary.deletes_confirmed,
            summary.deletes_attempted
        );
        Ok(summary)
    }

    /// Replica counts for the status display.
    pub fn replica_summary(&self) -> Result<ReplicaSummary, SyncError> {
        self.with_conn(db::replica_summary)
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, DatabaseError>,
    ) -> Result<T, SyncError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        f(&conn).map_err(SyncError::from)
    }
}

fn encode<T: Serialize>(kind: &RecordKind, id: &Uuid, record: &T) -> Result<Value, SyncError> {
    serde_json::to_value(record).map_err(|e| SyncError::CorruptPayload {
        kind: kind.as_str().into(),
        id: id.to_string(),
        reason: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(kind: &RecordKind, value: &Value) -> Result<T, SyncError> {
    serde_json::from_value(value.clone()).map_err(|e| SyncError::CorruptPayload {
        kind: kind.as_str().into(),
        id: value
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>")
            .to_string(),
        reason: e.to_string(),
    })
}
