//! Collaborator boundary for drafts, published sessions, and pairing history.

pub mod memory;
pub mod sqlite;

use serde::{Deserialize, Serialize};

use crate::{
    fairness::PairingHistory,
    op::LineupSnapshot,
    types::{DraftId, SessionId, TripId},
};

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serde: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("draft {0} not found")]
    MissingDraft(DraftId),
    #[error("{0}")]
    Message(String),
}

pub type PersistResult<T> = Result<T, PersistError>;

/// Opaque reference to a saved draft.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DraftHandle {
    pub draft_id: DraftId,
    // Save count for this draft, starting at 1.
    pub revision: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: SessionId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDraft {
    pub handle: DraftHandle,
    pub snapshot: LineupSnapshot,
}

pub trait LineupSink: Send {
    /// Stores a possibly incomplete lineup. `previous` is the handle from the
    /// last save of the same editing session, if any.
    fn persist_draft(&mut self, snapshot: &LineupSnapshot, previous: Option<&DraftHandle>) -> PersistResult<DraftHandle>;

    fn publish_lineup(&mut self, snapshot: &LineupSnapshot) -> PersistResult<SessionRecord>;
}

pub trait PairingHistorySource {
    /// Pairing counts over every session already published for `trip_id`.
    fn pairing_history(&self, trip_id: TripId) -> PersistResult<PairingHistory>;
}
