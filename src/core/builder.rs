use hashbrown::HashMap;
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    config::ConfigError,
    fairness::{score, FairnessScore, PairingHistory, ScoringConfig},
    op::{LineupOp, LineupSnapshot},
    persist::{DraftHandle, LineupSink, PairingHistorySource, PersistError, SessionRecord, StoredDraft},
    roster::{empty_slots, MatchSlot, Player, RosterSource, SessionFormat},
    types::{PlayerId, Side, SlotId, TripId},
};

use super::{
    balance::balance_lineup,
    partition::{auto_fill, validate_manual_assignment, Violation},
};

/// Why an edit was refused. The lineup is untouched whenever one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The slot side already holds `players_per_side` players.
    #[error("slot full")]
    SlotFull {
        /// Target slot.
        slot_id: SlotId,
        /// Target side.
        side: Side,
    },
    /// The player is already placed on their side somewhere in the lineup.
    #[error("player already assigned")]
    AlreadyAssigned {
        /// Player in question.
        player: PlayerId,
        /// Slot currently holding the player.
        slot_id: SlotId,
    },
    /// No slot has this id.
    #[error("unknown slot {0}")]
    UnknownSlot(SlotId),
    /// The player is not on either roster.
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    /// The player plays for the other side.
    #[error("player {player} does not play for side {side}")]
    WrongSide {
        /// Player in question.
        player: PlayerId,
        /// Side requested.
        side: Side,
    },
    /// The player is not at the given slot and side.
    #[error("player {player} is not assigned to slot {slot_id} on side {side}")]
    NotAssigned {
        /// Slot named.
        slot_id: SlotId,
        /// Side named.
        side: Side,
        /// Player named.
        player: PlayerId,
    },
    /// The lineup has been published and is frozen.
    #[error("lineup is already published")]
    Published,
    /// Undo stack is empty.
    #[error("nothing to undo")]
    NothingToUndo,
    /// Redo stack is empty.
    #[error("nothing to redo")]
    NothingToRedo,
}

/// Failures from builder construction, draft saves, and publishing.
#[derive(Debug, thiserror::Error)]
pub enum BuilderError {
    /// An edit or transition was refused.
    #[error("rejected: {0}")]
    Rejected(#[from] Rejection),
    /// Publishing without override while slot sides are short.
    #[error("lineup incomplete: {0} slot side(s) short of players")]
    Incomplete(usize),
    /// A supplied lineup breaks assignment rules.
    #[error("invalid lineup: {0:?}")]
    Invalid(Vec<Violation>),
    /// A collaborator call failed.
    #[error("persistence failed: {0}")]
    Persist(#[from] PersistError),
}

/// Lifecycle of one editing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderState {
    /// Freshly initialized with no edits.
    Empty,
    /// Modified since the last save.
    Editing,
    /// Matches the draft saved under this handle.
    Saved(DraftHandle),
    /// Handed off as a session. Terminal.
    Published(SessionRecord),
}

/// Whether [`LineupBuilder::publish`] accepts incomplete slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishMode {
    /// Every slot must be complete.
    RequireComplete,
    /// Publish even with incompleteness warnings outstanding.
    AllowWarnings,
}

/// Interactive lineup editor for one session.
///
/// Owns the slot list exclusively; every accepted mutation recomputes the
/// fairness score before returning.
#[derive(Debug)]
pub struct LineupBuilder {
    trip_id: TripId,
    format: SessionFormat,
    side_a: Vec<Player>,
    side_b: Vec<Player>,
    players: HashMap<PlayerId, Player>,
    slots: Vec<MatchSlot>,
    fairness: FairnessScore,
    history: Option<PairingHistory>,
    scoring: ScoringConfig,
    rng: StdRng,
    state: BuilderState,
    draft: Option<DraftHandle>,
    undo: Vec<LineupOp>,
    redo: Vec<LineupOp>,
}

impl LineupBuilder {
    /// Starts from `previous_draft` when given, else from `match_count` empty slots.
    ///
    /// Players passed in the wrong roster are ignored. A draft is refused
    /// when it belongs to another trip or format, or places anyone who is
    /// not on the rosters or not on the side they play for.
    pub fn initialize(
        trip_id: TripId,
        side_a: Vec<Player>,
        side_b: Vec<Player>,
        format: SessionFormat,
        previous_draft: Option<StoredDraft>,
    ) -> Result<Self, BuilderError> {
        let side_a = keep_side(side_a, Side::A);
        let side_b = keep_side(side_b, Side::B);
        let players: HashMap<PlayerId, Player> = side_a
            .iter()
            .chain(&side_b)
            .map(|p| (p.id, p.clone()))
            .collect();

        let (slots, state, draft) = match previous_draft {
            Some(stored) => {
                let violations = draft_violations(trip_id, &format, &players, &stored.snapshot);
                if !violations.is_empty() {
                    tracing::warn!(
                        trip_id,
                        draft_id = stored.handle.draft_id,
                        violations = violations.len(),
                        "draft refused"
                    );
                    return Err(BuilderError::Invalid(violations));
                }
                let handle = stored.handle;
                (stored.snapshot.slots, BuilderState::Saved(handle.clone()), Some(handle))
            }
            None => (empty_slots(format.match_count), BuilderState::Empty, None),
        };

        let mut builder = Self {
            trip_id,
            format,
            side_a,
            side_b,
            players,
            slots,
            fairness: FairnessScore::no_data(),
            history: None,
            scoring: ScoringConfig::default(),
            rng: StdRng::from_entropy(),
            state,
            draft,
            undo: Vec::new(),
            redo: Vec::new(),
        };
        builder.rescore();
        Ok(builder)
    }

    /// Pulls rosters and, optionally, trip pairing history from collaborators.
    pub fn from_sources(
        trip_id: TripId,
        roster: &dyn RosterSource,
        format: SessionFormat,
        history: Option<&dyn PairingHistorySource>,
        previous_draft: Option<StoredDraft>,
    ) -> Result<Self, BuilderError> {
        let builder = Self::initialize(
            trip_id,
            roster.roster(Side::A),
            roster.roster(Side::B),
            format,
            previous_draft,
        )?;
        match history {
            Some(source) => Ok(builder.with_history(source.pairing_history(trip_id)?)),
            None => Ok(builder),
        }
    }

    /// Scores against prior pairings from earlier sessions.
    pub fn with_history(mut self, history: PairingHistory) -> Self {
        self.history = Some(history);
        self.rescore();
        self
    }

    /// Replaces the scoring weights after validating them.
    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Result<Self, ConfigError> {
        scoring.validate()?;
        self.scoring = scoring;
        self.rescore();
        Ok(self)
    }

    /// Makes auto-fill deterministic.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Trip this lineup belongs to.
    pub fn trip_id(&self) -> TripId {
        self.trip_id
    }

    /// Session format being built.
    pub fn format(&self) -> &SessionFormat {
        &self.format
    }

    /// Current slot list in tee-time order.
    pub fn slots(&self) -> &[MatchSlot] {
        &self.slots
    }

    /// Slot by id.
    pub fn slot(&self, slot_id: SlotId) -> Option<&MatchSlot> {
        self.slots.iter().find(|s| s.slot_id == slot_id)
    }

    /// Roster for `side`.
    pub fn roster(&self, side: Side) -> &[Player] {
        match side {
            Side::A => &self.side_a,
            Side::B => &self.side_b,
        }
    }

    /// Lifecycle state.
    pub fn state(&self) -> &BuilderState {
        &self.state
    }

    /// Score for the current slot list. Never stale.
    pub fn current_fairness(&self) -> &FairnessScore {
        &self.fairness
    }

    /// True when every slot is at full strength on both sides.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(|s| s.is_complete(&self.format))
    }

    /// Slot and format as handed to collaborators.
    pub fn snapshot(&self) -> LineupSnapshot {
        LineupSnapshot {
            trip_id: self.trip_id,
            format: self.format.clone(),
            slots: self.slots.clone(),
        }
    }

    /// Pending undo steps.
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Pending redo steps.
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Replaces the lineup with a random fill. Discards manual edits.
    pub fn auto_fill(&mut self) -> Result<(), Rejection> {
        self.ensure_editable()?;
        let mut slots = auto_fill(&self.side_a, &self.side_b, &self.format, &mut self.rng);
        for (slot, existing) in slots.iter_mut().zip(&self.slots) {
            slot.slot_id = existing.slot_id;
            slot.order = existing.order;
        }
        self.commit(LineupOp::Replace { slots })?;
        tracing::debug!(trip_id = self.trip_id, "lineup auto-filled");
        Ok(())
    }

    /// Improves the current lineup by local search; returns moves applied.
    pub fn auto_balance(&mut self, max_passes: usize) -> Result<usize, Rejection> {
        self.ensure_editable()?;
        let outcome = balance_lineup(
            &self.slots,
            &self.side_a,
            &self.side_b,
            &self.format,
            self.history.as_ref(),
            &self.scoring,
            max_passes,
        );
        if outcome.moves > 0 {
            self.commit(LineupOp::Replace { slots: outcome.slots })?;
        }
        Ok(outcome.moves)
    }

    /// Places `player` on `side` of `slot_id`.
    pub fn assign(&mut self, slot_id: SlotId, side: Side, player: PlayerId) -> Result<(), Rejection> {
        let index = usize::from(self.format.players_per_side);
        self.commit(LineupOp::Assign {
            slot_id,
            side,
            player,
            index,
        })
        .inspect(|_| tracing::debug!(slot_id, %side, player, "player assigned"))
    }

    /// Removes `player` from `side` of `slot_id`.
    pub fn unassign(&mut self, slot_id: SlotId, side: Side, player: PlayerId) -> Result<(), Rejection> {
        self.commit(LineupOp::Unassign { slot_id, side, player })
            .inspect(|_| tracing::debug!(slot_id, %side, player, "player unassigned"))
    }

    /// Exchanges two placed players atomically.
    pub fn swap(
        &mut self,
        slot_a: SlotId,
        side_a: Side,
        player_a: PlayerId,
        slot_b: SlotId,
        side_b: Side,
        player_b: PlayerId,
    ) -> Result<(), Rejection> {
        if side_a != side_b {
            self.ensure_editable()?;
            let rejection = Rejection::WrongSide {
                player: player_b,
                side: side_a,
            };
            tracing::warn!(%rejection, "swap rejected");
            return Err(rejection);
        }
        self.commit(LineupOp::Swap {
            slot_a,
            player_a,
            slot_b,
            player_b,
            side: side_a,
        })
        .inspect(|_| tracing::debug!(slot_a, slot_b, player_a, player_b, "players swapped"))
    }

    /// Empties both sides of one slot. An already empty slot is left alone
    /// and records no undo step.
    pub fn clear_slot(&mut self, slot_id: SlotId) -> Result<(), Rejection> {
        self.ensure_editable()?;
        let pos = self.slot_pos(slot_id)?;
        if self.slots[pos].is_empty() {
            return Ok(());
        }
        let mut slots = self.slots.clone();
        slots[pos] = MatchSlot::empty(slot_id, slots[pos].order);
        self.commit(LineupOp::Replace { slots })
    }

    /// Empties every slot.
    pub fn clear_all(&mut self) -> Result<(), Rejection> {
        let slots = self
            .slots
            .iter()
            .map(|s| MatchSlot::empty(s.slot_id, s.order))
            .collect();
        self.commit(LineupOp::Replace { slots })
    }

    /// Reverts the last accepted edit.
    pub fn undo(&mut self) -> Result<(), Rejection> {
        self.ensure_editable()?;
        let op = self.undo.pop().ok_or(Rejection::NothingToUndo)?;
        let inverse = self.apply_op(op)?;
        self.redo.push(inverse);
        self.touch();
        Ok(())
    }

    /// Re-applies the last undone edit.
    pub fn redo(&mut self) -> Result<(), Rejection> {
        self.ensure_editable()?;
        let op = self.redo.pop().ok_or(Rejection::NothingToRedo)?;
        let inverse = self.apply_op(op)?;
        self.undo.push(inverse);
        self.touch();
        Ok(())
    }

    /// Persists the current lineup as a draft; completeness is not required.
    pub fn save_draft(&mut self, sink: &mut dyn LineupSink) -> Result<DraftHandle, BuilderError> {
        let (snapshot, previous) = self.draft_request()?;
        match sink.persist_draft(&snapshot, previous.as_ref()) {
            Ok(handle) => {
                tracing::info!(
                    trip_id = self.trip_id,
                    draft_id = handle.draft_id,
                    revision = handle.revision,
                    "draft saved"
                );
                self.mark_saved(handle.clone());
                Ok(handle)
            }
            Err(err) => {
                tracing::warn!(trip_id = self.trip_id, error = %err, "draft save failed");
                Err(err.into())
            }
        }
    }

    /// Hands the finished lineup to the session collaborator.
    ///
    /// On failure the builder keeps its state and slots so the call can be retried.
    pub fn publish(&mut self, sink: &mut dyn LineupSink, mode: PublishMode) -> Result<SessionRecord, BuilderError> {
        let snapshot = self.publish_request(mode)?;
        match sink.publish_lineup(&snapshot) {
            Ok(record) => {
                self.mark_published(record.clone());
                Ok(record)
            }
            Err(err) => {
                tracing::warn!(trip_id = self.trip_id, error = %err, "publish failed");
                Err(err.into())
            }
        }
    }

    /// The lineup to save and the handle of the draft it revises.
    pub fn draft_request(&self) -> Result<(LineupSnapshot, Option<DraftHandle>), Rejection> {
        self.ensure_editable()?;
        Ok((self.snapshot(), self.draft.clone()))
    }

    /// Checks publish preconditions and returns the lineup to hand off.
    pub fn publish_request(&self, mode: PublishMode) -> Result<LineupSnapshot, BuilderError> {
        self.ensure_editable()?;
        let report = validate_manual_assignment(&self.slots, &self.format);
        if !report.valid {
            return Err(BuilderError::Invalid(report.violations));
        }
        let short = self
            .slots
            .iter()
            .flat_map(|s| Side::BOTH.map(|side| s.missing(side, &self.format)))
            .filter(|missing| *missing > 0)
            .count();
        if short > 0 && mode == PublishMode::RequireComplete {
            return Err(BuilderError::Incomplete(short));
        }
        Ok(self.snapshot())
    }

    /// Records a successful draft save done outside [`Self::save_draft`].
    pub fn mark_saved(&mut self, handle: DraftHandle) {
        self.draft = Some(handle.clone());
        self.state = BuilderState::Saved(handle);
    }

    /// Records a successful publish done outside [`Self::publish`].
    pub fn mark_published(&mut self, record: SessionRecord) {
        tracing::info!(trip_id = self.trip_id, session_id = record.session_id, "lineup published");
        self.undo.clear();
        self.redo.clear();
        self.state = BuilderState::Published(record);
    }

    fn commit(&mut self, op: LineupOp) -> Result<(), Rejection> {
        self.ensure_editable()?;
        match self.apply_op(op) {
            Ok(inverse) => {
                self.undo.push(inverse);
                self.redo.clear();
                self.touch();
                Ok(())
            }
            Err(rejection) => {
                tracing::warn!(%rejection, "edit rejected");
                Err(rejection)
            }
        }
    }

    fn ensure_editable(&self) -> Result<(), Rejection> {
        match self.state {
            BuilderState::Published(_) => Err(Rejection::Published),
            _ => Ok(()),
        }
    }

    fn touch(&mut self) {
        self.state = BuilderState::Editing;
        self.rescore();
    }

    fn rescore(&mut self) {
        let players: Vec<Player> = self.side_a.iter().chain(&self.side_b).cloned().collect();
        self.fairness = score(&self.slots, &players, &self.format, self.history.as_ref(), &self.scoring);
    }

    /// Applies `op` in full or not at all, returning its inverse.
    fn apply_op(&mut self, op: LineupOp) -> Result<LineupOp, Rejection> {
        match op {
            LineupOp::Assign {
                slot_id,
                side,
                player,
                index,
            } => {
                let pos = self.slot_pos(slot_id)?;
                let rec = self.players.get(&player).ok_or(Rejection::UnknownPlayer(player))?;
                if rec.side != side {
                    return Err(Rejection::WrongSide { player, side });
                }
                if let Some(holder) = self.slots.iter().find(|s| s.contains(side, player)) {
                    return Err(Rejection::AlreadyAssigned {
                        player,
                        slot_id: holder.slot_id,
                    });
                }
                let limit = usize::from(self.format.players_per_side);
                let list = self.slots[pos].players_mut(side);
                if list.len() >= limit {
                    return Err(Rejection::SlotFull { slot_id, side });
                }
                list.insert(index.min(list.len()), player);
                Ok(LineupOp::Unassign { slot_id, side, player })
            }
            LineupOp::Unassign { slot_id, side, player } => {
                let pos = self.slot_pos(slot_id)?;
                let list = self.slots[pos].players_mut(side);
                let index = list
                    .iter()
                    .position(|id| *id == player)
                    .ok_or(Rejection::NotAssigned { slot_id, side, player })?;
                list.remove(index);
                Ok(LineupOp::Assign {
                    slot_id,
                    side,
                    player,
                    index,
                })
            }
            LineupOp::Swap {
                slot_a,
                player_a,
                slot_b,
                player_b,
                side,
            } => {
                let pos_a = self.slot_pos(slot_a)?;
                let pos_b = self.slot_pos(slot_b)?;
                let idx_a = self.position_in(pos_a, side, player_a)?;
                let idx_b = self.position_in(pos_b, side, player_b)?;
                self.slots[pos_a].players_mut(side)[idx_a] = player_b;
                self.slots[pos_b].players_mut(side)[idx_b] = player_a;
                Ok(LineupOp::Swap {
                    slot_a,
                    player_a: player_b,
                    slot_b,
                    player_b: player_a,
                    side,
                })
            }
            LineupOp::Replace { slots } => {
                let prev = std::mem::replace(&mut self.slots, slots);
                Ok(LineupOp::Replace { slots: prev })
            }
        }
    }

    fn slot_pos(&self, slot_id: SlotId) -> Result<usize, Rejection> {
        self.slots
            .iter()
            .position(|s| s.slot_id == slot_id)
            .ok_or(Rejection::UnknownSlot(slot_id))
    }

    fn position_in(&self, pos: usize, side: Side, player: PlayerId) -> Result<usize, Rejection> {
        let slot = &self.slots[pos];
        slot.players(side)
            .iter()
            .position(|id| *id == player)
            .ok_or(Rejection::NotAssigned {
                slot_id: slot.slot_id,
                side,
                player,
            })
    }
}

fn draft_violations(
    trip_id: TripId,
    format: &SessionFormat,
    players: &HashMap<PlayerId, Player>,
    snapshot: &LineupSnapshot,
) -> Vec<Violation> {
    let mut violations = validate_manual_assignment(&snapshot.slots, format).violations;
    if snapshot.trip_id != trip_id {
        violations.push(Violation::TripMismatch {
            found: snapshot.trip_id,
            expected: trip_id,
        });
    }
    if snapshot.format != *format {
        violations.push(Violation::FormatMismatch {
            found: snapshot.format.kind,
            expected: format.kind,
        });
    }
    for slot in &snapshot.slots {
        for side in Side::BOTH {
            for &player in slot.players(side) {
                let slot_id = slot.slot_id;
                match players.get(&player) {
                    None => violations.push(Violation::UnknownPlayer { slot_id, side, player }),
                    Some(p) if p.side != side => violations.push(Violation::WrongSide { slot_id, side, player }),
                    Some(_) => {}
                }
            }
        }
    }
    violations
}

fn keep_side(roster: Vec<Player>, side: Side) -> Vec<Player> {
    let before = roster.len();
    let kept: Vec<Player> = roster.into_iter().filter(|p| p.side == side).collect();
    if kept.len() != before {
        tracing::warn!(%side, dropped = before - kept.len(), "ignored players rostered on the wrong side");
    }
    kept
}
