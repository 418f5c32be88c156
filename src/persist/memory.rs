//! In-memory [`LineupSink`] and [`PairingHistorySource`].

use hashbrown::HashMap;

use crate::{
    fairness::PairingHistory,
    op::LineupSnapshot,
    types::{DraftId, SessionId, TripId},
};

use super::{DraftHandle, LineupSink, PairingHistorySource, PersistError, PersistResult, SessionRecord, StoredDraft};

/// Keeps drafts and published sessions in process memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    drafts: HashMap<DraftId, StoredDraft>,
    sessions: Vec<(SessionId, LineupSnapshot)>,
    next_draft_id: DraftId,
    next_session_id: SessionId,
    fail_next: Option<String>,
}

impl MemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self {
            next_draft_id: 1,
            next_session_id: 1,
            ..Self::default()
        }
    }

    /// Makes the next collaborator call fail with `message`.
    pub fn fail_next(&mut self, message: impl Into<String>) {
        self.fail_next = Some(message.into());
    }

    /// Latest revision of a draft.
    pub fn draft(&self, draft_id: DraftId) -> Option<&StoredDraft> {
        self.drafts.get(&draft_id)
    }

    /// Published sessions in publish order.
    pub fn sessions(&self) -> &[(SessionId, LineupSnapshot)] {
        &self.sessions
    }

    fn check_failure(&mut self) -> PersistResult<()> {
        match self.fail_next.take() {
            Some(message) => Err(PersistError::Message(message)),
            None => Ok(()),
        }
    }
}

impl LineupSink for MemorySink {
    fn persist_draft(&mut self, snapshot: &LineupSnapshot, previous: Option<&DraftHandle>) -> PersistResult<DraftHandle> {
        self.check_failure()?;
        let handle = match previous.and_then(|h| self.drafts.get(&h.draft_id)) {
            Some(existing) => DraftHandle {
                draft_id: existing.handle.draft_id,
                revision: existing.handle.revision + 1,
            },
            None => {
                let draft_id = self.next_draft_id;
                self.next_draft_id += 1;
                DraftHandle { draft_id, revision: 1 }
            }
        };
        self.drafts.insert(
            handle.draft_id,
            StoredDraft {
                handle: handle.clone(),
                snapshot: snapshot.clone(),
            },
        );
        Ok(handle)
    }

    fn publish_lineup(&mut self, snapshot: &LineupSnapshot) -> PersistResult<SessionRecord> {
        self.check_failure()?;
        let session_id = self.next_session_id;
        self.next_session_id += 1;
        self.sessions.push((session_id, snapshot.clone()));
        Ok(SessionRecord { session_id })
    }
}

impl PairingHistorySource for MemorySink {
    fn pairing_history(&self, trip_id: TripId) -> PersistResult<PairingHistory> {
        let mut history = PairingHistory::new();
        for (_, snapshot) in self.sessions.iter().filter(|(_, s)| s.trip_id == trip_id) {
            history.record_lineup(&snapshot.slots);
        }
        Ok(history)
    }
}
