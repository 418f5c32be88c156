//! SQLite-backed draft and session store.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OptionalExtension, params};

use crate::{
    fairness::PairingHistory,
    op::{LineupSnapshot, SnapshotEnvelope, SNAPSHOT_FORMAT_VERSION},
    types::{DraftId, SessionId, TripId},
};

use super::{DraftHandle, LineupSink, PairingHistorySource, PersistError, PersistResult, SessionRecord, StoredDraft};

/// SQLite implementation of [`LineupSink`] and [`PairingHistorySource`].
pub struct SqliteLineupStore {
    conn: Connection,
}

impl SqliteLineupStore {
    /// Opens or creates a store at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory store.
    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> PersistResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn })
    }

    /// Loads the latest revision of a draft.
    pub fn load_draft(&self, draft_id: DraftId) -> PersistResult<StoredDraft> {
        let row: Option<(i64, Vec<u8>)> = self
            .conn
            .query_row(
                "SELECT revision, payload FROM drafts WHERE draft_id = ?1",
                params![draft_id as i64],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((revision, payload)) = row else {
            return Err(PersistError::MissingDraft(draft_id));
        };
        Ok(StoredDraft {
            handle: DraftHandle {
                draft_id,
                revision: revision as u32,
            },
            snapshot: decode_snapshot(&payload)?,
        })
    }

    /// Most recently written draft for a trip, if any.
    pub fn latest_draft(&self, trip_id: TripId) -> PersistResult<Option<StoredDraft>> {
        let id: Option<i64> = self
            .conn
            .query_row(
                "SELECT draft_id FROM drafts WHERE trip_id = ?1 ORDER BY ts_ms DESC, draft_id DESC LIMIT 1",
                params![trip_id as i64],
                |row| row.get(0),
            )
            .optional()?;
        id.map(|id| self.load_draft(id as DraftId)).transpose()
    }

    /// Deletes a draft, returning whether it existed.
    pub fn delete_draft(&mut self, draft_id: DraftId) -> PersistResult<bool> {
        let n = self
            .conn
            .execute("DELETE FROM drafts WHERE draft_id = ?1", params![draft_id as i64])?;
        Ok(n > 0)
    }

    /// Published sessions for a trip, oldest first.
    pub fn published_sessions(&self, trip_id: TripId) -> PersistResult<Vec<(SessionId, LineupSnapshot)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT session_id, payload FROM sessions WHERE trip_id = ?1 ORDER BY session_id ASC")?;
        let rows = stmt.query_map(params![trip_id as i64], |row| {
            let id: i64 = row.get(0)?;
            let payload: Vec<u8> = row.get(1)?;
            Ok((id as SessionId, payload))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, payload) = row?;
            out.push((id, decode_snapshot(&payload)?));
        }
        Ok(out)
    }
}

impl LineupSink for SqliteLineupStore {
    fn persist_draft(&mut self, snapshot: &LineupSnapshot, previous: Option<&DraftHandle>) -> PersistResult<DraftHandle> {
        let payload = serde_json::to_vec(&SnapshotEnvelope::new(snapshot.clone()))?;
        let ts_ms = now_ms() as i64;

        let tx = self.conn.transaction()?;
        let existing: Option<i64> = match previous {
            Some(handle) => tx
                .query_row(
                    "SELECT revision FROM drafts WHERE draft_id = ?1",
                    params![handle.draft_id as i64],
                    |row| row.get(0),
                )
                .optional()?,
            None => None,
        };

        let handle = match (previous, existing) {
            (Some(handle), Some(revision)) => {
                let revision = revision + 1;
                tx.execute(
                    "UPDATE drafts SET revision = ?1, ts_ms = ?2, payload = ?3 WHERE draft_id = ?4",
                    params![revision, ts_ms, payload, handle.draft_id as i64],
                )?;
                DraftHandle {
                    draft_id: handle.draft_id,
                    revision: revision as u32,
                }
            }
            _ => {
                tx.execute(
                    "INSERT INTO drafts(trip_id, revision, ts_ms, payload) VALUES (?1, 1, ?2, ?3)",
                    params![snapshot.trip_id as i64, ts_ms, payload],
                )?;
                DraftHandle {
                    draft_id: tx.last_insert_rowid() as DraftId,
                    revision: 1,
                }
            }
        };
        tx.commit()?;
        Ok(handle)
    }

    fn publish_lineup(&mut self, snapshot: &LineupSnapshot) -> PersistResult<SessionRecord> {
        let payload = serde_json::to_vec(&SnapshotEnvelope::new(snapshot.clone()))?;
        self.conn.execute(
            "INSERT INTO sessions(trip_id, format_kind, ts_ms, payload) VALUES (?1, ?2, ?3, ?4)",
            params![
                snapshot.trip_id as i64,
                format!("{:?}", snapshot.format.kind),
                now_ms() as i64,
                payload,
            ],
        )?;
        Ok(SessionRecord {
            session_id: self.conn.last_insert_rowid() as SessionId,
        })
    }
}

impl PairingHistorySource for SqliteLineupStore {
    fn pairing_history(&self, trip_id: TripId) -> PersistResult<PairingHistory> {
        let mut history = PairingHistory::new();
        for (_, snapshot) in self.published_sessions(trip_id)? {
            history.record_lineup(&snapshot.slots);
        }
        Ok(history)
    }
}

fn decode_snapshot(payload: &[u8]) -> PersistResult<LineupSnapshot> {
    let envelope: SnapshotEnvelope = serde_json::from_slice(payload)?;
    if envelope.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(PersistError::Message(format!(
            "unsupported snapshot format version: {}",
            envelope.format_version
        )));
    }
    Ok(envelope.snapshot)
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
