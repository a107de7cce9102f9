//! Local replica of the remote clinical store.
//!
//! Every persisted entity is wrapped in a replica row carrying the two
//! reconciliation flags: `synced` (the remote store has seen this version)
//! and `deleted` (soft tombstone — a delete is propagated, never lost).
//! Payloads are stored as serialized JSON; the sync layer owns decoding.

use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::DatabaseError;
use crate::models::enums::RecordKind;

/// One replica row: a remote record plus its reconciliation flags.
#[derive(Debug, Clone)]
pub struct ReplicaRecord {
    pub kind: RecordKind,
    pub id: Uuid,
    pub payload: String,
    pub synced: bool,
    pub deleted: bool,
    pub updated_at: String,
}

/// Counts for the sync status display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaSummary {
    pub total: i64,
    pub dirty_writes: i64,
    pub dirty_tombstones: i64,
}

/// Insert or overwrite a replica row. Clears any tombstone: writing a
/// record with the same id supersedes a prior soft delete.
pub fn upsert_record(
    conn: &Connection,
    kind: &RecordKind,
    id: &Uuid,
    payload: &str,
    synced: bool,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO replica_records (kind, id, payload, synced, deleted, updated_at)
         VALUES (?1, ?2, ?3, ?4, 0, datetime('now'))
         ON CONFLICT(kind, id) DO UPDATE SET
            payload = excluded.payload,
            synced = excluded.synced,
            deleted = 0,
            updated_at = datetime('now')",
        params![kind.as_str(), id.to_string(), payload, synced as i32],
    )?;
    Ok(())
}

pub fn get_record(
    conn: &Connection,
    kind: &RecordKind,
    id: &Uuid,
) -> Result<Option<ReplicaRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT kind, id, payload, synced, deleted, updated_at
         FROM replica_records WHERE kind = ?1 AND id = ?2",
    )?;

    let result = stmt.query_row(params![kind.as_str(), id.to_string()], row_to_raw);

    match result {
        Ok(raw) => Ok(Some(raw_to_record(raw)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All live (non-tombstoned) records of a kind — the offline fallback view.
pub fn list_records(
    conn: &Connection,
    kind: &RecordKind,
) -> Result<Vec<ReplicaRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT kind, id, payload, synced, deleted, updated_at
         FROM replica_records WHERE kind = ?1 AND deleted = 0
         ORDER BY id",
    )?;

    let rows = stmt.query_map(params![kind.as_str()], row_to_raw)?;
    collect_records(rows)
}

/// Records written or edited offline, awaiting a remote write.
pub fn dirty_writes(conn: &Connection) -> Result<Vec<ReplicaRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT kind, id, payload, synced, deleted, updated_at
         FROM replica_records WHERE synced = 0 AND deleted = 0
         ORDER BY updated_at, id",
    )?;

    let rows = stmt.query_map([], row_to_raw)?;
    collect_records(rows)
}

/// Tombstones whose remote delete has not yet been confirmed.
pub fn dirty_tombstones(conn: &Connection) -> Result<Vec<ReplicaRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT kind, id, payload, synced, deleted, updated_at
         FROM replica_records WHERE synced = 0 AND deleted = 1
         ORDER BY updated_at, id",
    )?;

    let rows = stmt.query_map([], row_to_raw)?;
    collect_records(rows)
}

pub fn mark_synced(
    conn: &Connection,
    kind: &RecordKind,
    id: &Uuid,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE replica_records SET synced = 1, updated_at = datetime('now')
         WHERE kind = ?1 AND id = ?2",
        params![kind.as_str(), id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            kind: kind.as_str().into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Set the soft-delete tombstone. `synced` records whether the remote
/// store confirmed the delete; an unconfirmed tombstone is retried by
/// reconciliation. The row itself is never removed.
pub fn mark_deleted(
    conn: &Connection,
    kind: &RecordKind,
    id: &Uuid,
    synced: bool,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO replica_records (kind, id, payload, synced, deleted, updated_at)
         VALUES (?1, ?2, '{}', ?3, 1, datetime('now'))
         ON CONFLICT(kind, id) DO UPDATE SET
            synced = excluded.synced,
            deleted = 1,
            updated_at = datetime('now')",
        params![kind.as_str(), id.to_string(), synced as i32],
    )?;
    Ok(())
}

pub fn is_tombstoned(
    conn: &Connection,
    kind: &RecordKind,
    id: &Uuid,
) -> Result<bool, DatabaseError> {
    let deleted: Option<i32> = conn
        .query_row(
            "SELECT deleted FROM replica_records WHERE kind = ?1 AND id = ?2",
            params![kind.as_str(), id.to_string()],
            |row| row.get(0),
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })?;
    Ok(deleted == Some(1))
}

/// Replica counts for the sync status display.
pub fn replica_summary(conn: &Connection) -> Result<ReplicaSummary, DatabaseError> {
    let count = |sql: &str| -> Result<i64, DatabaseError> {
        conn.query_row(sql, [], |row| row.get(0)).map_err(DatabaseError::from)
    };

    Ok(ReplicaSummary {
        total: count("SELECT COUNT(*) FROM replica_records WHERE deleted = 0")?,
        dirty_writes: count(
            "SELECT COUNT(*) FROM replica_records WHERE synced = 0 AND deleted = 0",
        )?,
        dirty_tombstones: count(
            "SELECT COUNT(*) FROM replica_records WHERE synced = 0 AND deleted = 1",
        )?,
    })
}

// Internal raw row before enum/uuid parsing
struct RawRow {
    kind: String,
    id: String,
    payload: String,
    synced: i32,
    deleted: i32,
    updated_at: String,
}

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        kind: row.get(0)?,
        id: row.get(1)?,
        payload: row.get(2)?,
        synced: row.get(3)?,
        deleted: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn raw_to_record(raw: RawRow) -> Result<ReplicaRecord, DatabaseError> {
    Ok(ReplicaRecord {
        kind: RecordKind::from_str(&raw.kind)?,
        id: Uuid::parse_str(&raw.id).map_err(|_| DatabaseError::NotFound {
            kind: raw.kind.clone(),
            id: raw.id.clone(),
        })?,
        payload: raw.payload,
        synced: raw.synced != 0,
        deleted: raw.deleted != 0,
        updated_at: raw.updated_at,
    })
}

fn collect_records(
    rows: impl Iterator<Item = rusqlite::Result<RawRow>>,
) -> Result<Vec<ReplicaRecord>, DatabaseError> {
    let raw: Vec<RawRow> = rows.collect::<Result<_, _>>()?;
    raw.into_iter().map(raw_to_record).collect()
}
