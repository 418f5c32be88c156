use std::fmt;

use hashbrown::HashSet;
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::{
    roster::{empty_slots, MatchSlot, Player, SessionFormat},
    types::{FormatKind, PlayerId, Side, SlotId, TripId},
};

/// Randomly partitions both rosters into `format.match_count` slots.
///
/// Each roster is shuffled uniformly, cut into chunks of
/// `players_per_side`, and chunk `i` of each side lands in slot `i + 1`.
/// Players beyond the slot demand stay unassigned; a side that runs short
/// leaves its remaining slots partial or empty.
pub fn auto_fill<R: Rng + ?Sized>(
    side_a: &[Player],
    side_b: &[Player],
    format: &SessionFormat,
    rng: &mut R,
) -> Vec<MatchSlot> {
    let mut slots = empty_slots(format.match_count);
    for (side, roster) in [(Side::A, side_a), (Side::B, side_b)] {
        let mut pool = eligible_ids(roster, side);
        pool.shuffle(rng);
        let per_side = usize::from(format.players_per_side);
        for (slot, chunk) in slots.iter_mut().zip(pool.chunks(per_side)) {
            slot.players_mut(side).extend_from_slice(chunk);
        }
    }
    slots
}

/// Distinct ids from `roster` that actually play for `side`, in roster order.
pub(crate) fn eligible_ids(roster: &[Player], side: Side) -> Vec<PlayerId> {
    let mut seen = HashSet::new();
    roster
        .iter()
        .filter(|p| p.side == side)
        .filter(|p| seen.insert(p.id))
        .map(|p| p.id)
        .collect()
}

/// A rule broken by a manual assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Violation {
    /// A player appears in more than one slot on the same side.
    DuplicatePlayer {
        /// Repeated player.
        player: PlayerId,
        /// Side on which it repeats.
        side: Side,
    },
    /// A slot side holds more players than the format allows.
    Overfull {
        /// Offending slot.
        slot_id: SlotId,
        /// Offending side.
        side: Side,
        /// Players placed.
        count: usize,
        /// Format limit.
        limit: usize,
    },
    /// The lineup does not have one slot per match.
    SlotCount {
        /// Slots present.
        found: usize,
        /// Slots the format requires.
        expected: usize,
    },
    /// A slot holds an id found on neither roster.
    UnknownPlayer {
        /// Slot holding the id.
        slot_id: SlotId,
        /// Side holding the id.
        side: Side,
        /// Unrecognized id.
        player: PlayerId,
    },
    /// A player is placed on the side they do not play for.
    WrongSide {
        /// Slot holding the player.
        slot_id: SlotId,
        /// Side the player was placed on.
        side: Side,
        /// Misplaced player.
        player: PlayerId,
    },
    /// A stored lineup belongs to another trip.
    TripMismatch {
        /// Trip recorded with the lineup.
        found: TripId,
        /// Trip being edited.
        expected: TripId,
    },
    /// A stored lineup was built for a different session format.
    FormatMismatch {
        /// Format recorded with the lineup.
        found: FormatKind,
        /// Format being edited.
        expected: FormatKind,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::DuplicatePlayer { player, side } => {
                write!(f, "player {player} is assigned more than once on side {side}")
            }
            Violation::Overfull { slot_id, side, count, limit } => {
                write!(f, "slot {slot_id} side {side} holds {count} players, limit is {limit}")
            }
            Violation::SlotCount { found, expected } => {
                write!(f, "lineup has {found} slots, format requires {expected}")
            }
            Violation::UnknownPlayer { slot_id, side, player } => {
                write!(f, "slot {slot_id} side {side} holds unknown player {player}")
            }
            Violation::WrongSide { slot_id, side, player } => {
                write!(f, "slot {slot_id} places player {player} on side {side}, which they do not play for")
            }
            Violation::TripMismatch { found, expected } => {
                write!(f, "lineup belongs to trip {found}, not trip {expected}")
            }
            Violation::FormatMismatch { found, expected } => {
                write!(f, "lineup was built for a different {found:?} session than the {expected:?} one being edited")
            }
        }
    }
}

/// Outcome of [`validate_manual_assignment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentReport {
    /// True when no violation was found.
    pub valid: bool,
    /// Every violation found.
    pub violations: Vec<Violation>,
}

/// Checks a lineup for double-booking, overfull slots, and slot count.
pub fn validate_manual_assignment(slots: &[MatchSlot], format: &SessionFormat) -> AssignmentReport {
    let mut violations = Vec::new();
    let expected = usize::from(format.match_count);
    if slots.len() != expected {
        violations.push(Violation::SlotCount {
            found: slots.len(),
            expected,
        });
    }

    let limit = usize::from(format.players_per_side);
    for side in Side::BOTH {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        for slot in slots {
            let count = slot.players(side).len();
            if count > limit {
                violations.push(Violation::Overfull {
                    slot_id: slot.slot_id,
                    side,
                    count,
                    limit,
                });
            }
            for id in slot.players(side) {
                if !seen.insert(*id) && reported.insert(*id) {
                    violations.push(Violation::DuplicatePlayer { player: *id, side });
                }
            }
        }
    }

    AssignmentReport {
        valid: violations.is_empty(),
        violations,
    }
}
