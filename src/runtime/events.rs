//! Runtime event stream payloads.

use crate::{
    persist::{DraftHandle, SessionRecord},
    types::{PlayerId, Side, SlotId},
};

/// Events emitted from the single-writer runtime loop.
#[derive(Debug, Clone, PartialEq)]
pub enum LineupEvent {
    /// A player was placed.
    Assigned {
        /// Target slot.
        slot_id: SlotId,
        /// Target side.
        side: Side,
        /// Placed player.
        player: PlayerId,
    },
    /// A player was removed.
    Unassigned {
        /// Source slot.
        slot_id: SlotId,
        /// Source side.
        side: Side,
        /// Removed player.
        player: PlayerId,
    },
    /// Two players were exchanged.
    Swapped {
        /// First slot.
        slot_a: SlotId,
        /// Second slot.
        slot_b: SlotId,
    },
    /// One slot, or every slot when `None`, was emptied.
    Cleared {
        /// Cleared slot.
        slot_id: Option<SlotId>,
    },
    /// The lineup was replaced by a random fill.
    AutoFilled,
    /// Local search improved the lineup.
    Rebalanced {
        /// Moves applied.
        moves: usize,
    },
    /// One undo step was applied.
    Undone,
    /// One redo step was applied.
    Redone,
    /// The fairness score was recomputed.
    FairnessChanged {
        /// New overall score.
        overall: Option<f64>,
        /// Number of warnings.
        warnings: usize,
    },
    /// A draft was stored.
    DraftSaved {
        /// Stored revision.
        handle: DraftHandle,
    },
    /// The lineup was published. No edits follow.
    Published {
        /// Created session.
        record: SessionRecord,
    },
}
