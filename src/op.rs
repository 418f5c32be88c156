//! Lineup edit operations and persisted snapshot wrappers.

use serde::{Deserialize, Serialize};

use crate::{
    roster::{MatchSlot, SessionFormat},
    types::{PlayerId, Side, SlotId, TripId},
};

/// Version number for serialized [`SnapshotEnvelope`] payloads.
pub const SNAPSHOT_FORMAT_VERSION: u16 = 1;

/// A reversible edit applied to a lineup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineupOp {
    /// Place a player at `index` within a slot side.
    Assign {
        /// Target slot.
        slot_id: SlotId,
        /// Target side.
        side: Side,
        /// Player to place.
        player: PlayerId,
        /// Position within the side's player list.
        index: usize,
    },
    /// Remove a player from a slot side.
    Unassign {
        /// Source slot.
        slot_id: SlotId,
        /// Source side.
        side: Side,
        /// Player to remove.
        player: PlayerId,
    },
    /// Exchange two placed players on the same side.
    Swap {
        /// First player's slot.
        slot_a: SlotId,
        /// First player.
        player_a: PlayerId,
        /// Second player's slot.
        slot_b: SlotId,
        /// Second player.
        player_b: PlayerId,
        /// Side both players belong to.
        side: Side,
    },
    /// Replace the whole slot list.
    Replace {
        /// New slot list.
        slots: Vec<MatchSlot>,
    },
}

/// Lineup plus the session configuration it was built for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupSnapshot {
    /// Trip the session belongs to.
    pub trip_id: TripId,
    /// Session format.
    pub format: SessionFormat,
    /// Ordered match slots.
    pub slots: Vec<MatchSlot>,
}

/// Versioned wrapper for stable on-disk payload decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEnvelope {
    /// Payload format version.
    pub format_version: u16,
    /// Wrapped snapshot.
    pub snapshot: LineupSnapshot,
}

impl SnapshotEnvelope {
    /// Constructs an envelope using [`SNAPSHOT_FORMAT_VERSION`].
    pub fn new(snapshot: LineupSnapshot) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            snapshot,
        }
    }
}
