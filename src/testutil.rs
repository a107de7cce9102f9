//! Test doubles shared across unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::Value;
use uuid::Uuid;

use crate::models::enums::RecordKind;
use crate::remote::{RemoteError, RemoteStore};
use crate::sync::SyncEntity;

/// In-memory stand-in for the remote clinical store. Connectivity is a
/// toggle; flipping it offline makes every call return `Unavailable`.
pub(crate) struct MemoryRemote {
    records: Mutex<HashMap<(String, Uuid), Value>>,
    online: AtomicBool,
    /// When non-zero, writes are rejected with this HTTP status.
    reject_status: AtomicU16,
    put_calls: AtomicUsize,
}

impl MemoryRemote {
    pub fn online() -> Self {
        Self::with_connectivity(true)
    }

    pub fn offline() -> Self {
        Self::with_connectivity(false)
    }

    fn with_connectivity(online: bool) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            online: AtomicBool::new(online),
            reject_status: AtomicU16::new(0),
            put_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn reject_writes(&self, status: u16) {
        self.reject_status.store(status, Ordering::SeqCst);
    }

    /// Place a record on the remote without going through the client.
    pub fn seed<T: SyncEntity>(&self, record: &T) {
        let value = serde_json::to_value(record).unwrap();
        self.records
            .lock()
            .unwrap()
            .insert((T::kind().as_str().to_string(), record.record_id()), value);
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), RemoteError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::Unavailable("simulated outage".into()))
        }
    }
}

impl RemoteStore for MemoryRemote {
    async fn fetch_all(&self, kind: &RecordKind) -> Result<Vec<Value>, RemoteError> {
        self.check_online()?;
        let records = self.records.lock().unwrap();
        let mut entries: Vec<(Uuid, Value)> = records
            .iter()
            .filter(|((k, _), _)| k == kind.as_str())
            .map(|((_, id), v)| (*id, v.clone()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        Ok(entries.into_iter().map(|(_, v)| v).collect())
    }

    async fn put(
        &self,
        kind: &RecordKind,
        id: &Uuid,
        payload: &Value,
    ) -> Result<Value, RemoteError> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        let status = self.reject_status.load(Ordering::SeqCst);
        if status != 0 {
            return Err(RemoteError::Rejected { status });
        }
        self.records
            .lock()
            .unwrap()
            .insert((kind.as_str().to_string(), *id), payload.clone());
        Ok(payload.clone())
    }

    async fn delete(&self, kind: &RecordKind, id: &Uuid) -> Result<(), RemoteError> {
        self.check_online()?;
        // Absent records delete cleanly, mirroring the 404 rule.
        self.records
            .lock()
            .unwrap()
            .remove(&(kind.as_str().to_string(), *id));
        Ok(())
    }
}
