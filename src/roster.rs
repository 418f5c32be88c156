//! Player, session-format, and match-slot value types.

use serde::{Deserialize, Serialize};

use crate::types::{FormatKind, PlayerId, Side, SlotId};

/// A rostered golfer. Owned upstream; the lineup core only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Stable player identifier.
    pub id: PlayerId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Handicap index; negative values are "plus" handicaps.
    pub handicap_index: f64,
    /// Team this player plays for.
    pub side: Side,
    /// Optional avatar reference, opaque to the core.
    pub avatar_ref: Option<String>,
}

impl Player {
    /// Builds a player with no avatar.
    pub fn new(
        id: PlayerId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        handicap_index: f64,
        side: Side,
    ) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            handicap_index,
            side,
            avatar_ref: None,
        }
    }

    /// "First Last" display name.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Format configuration for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFormat {
    /// Catalog format.
    pub kind: FormatKind,
    /// Players each side fields per match.
    pub players_per_side: u8,
    /// Number of matches (slots) in the session.
    pub match_count: u8,
    /// Points awarded per match.
    pub points_per_match: f64,
}

impl SessionFormat {
    /// Builds a format with explicit sizing.
    ///
    /// Panics on zero sizes or non-positive points: no well-formed session
    /// configuration produces them.
    pub fn new(kind: FormatKind, players_per_side: u8, match_count: u8, points_per_match: f64) -> Self {
        assert!(players_per_side > 0, "players_per_side must be positive");
        assert!(match_count > 0, "match_count must be positive");
        assert!(
            points_per_match > 0.0 && points_per_match.is_finite(),
            "points_per_match must be positive"
        );
        Self {
            kind,
            players_per_side,
            match_count,
            points_per_match,
        }
    }

    /// Uses the catalog defaults for `kind` with one point per match.
    pub fn for_kind(kind: FormatKind) -> Self {
        let info = kind.info();
        Self::new(kind, info.players_per_side, info.default_matches, 1.0)
    }

    /// Player-slots one side must fill for a complete lineup.
    pub fn slot_demand(&self) -> usize {
        usize::from(self.players_per_side) * usize::from(self.match_count)
    }

    /// Points on offer across the whole session.
    pub fn total_points(&self) -> f64 {
        f64::from(self.match_count) * self.points_per_match
    }

    /// True when the format pits side A against side B.
    pub fn is_team_based(&self) -> bool {
        self.kind.info().is_team_based
    }
}

/// One scheduled match within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSlot {
    /// Identifier stable across edits.
    pub slot_id: SlotId,
    /// 1-based tee-time order.
    pub order: u32,
    /// Side A players in this match.
    pub side_a: Vec<PlayerId>,
    /// Side B players in this match.
    pub side_b: Vec<PlayerId>,
}

impl MatchSlot {
    /// An unfilled slot.
    pub fn empty(slot_id: SlotId, order: u32) -> Self {
        Self {
            slot_id,
            order,
            side_a: Vec::new(),
            side_b: Vec::new(),
        }
    }

    /// Players placed on `side`.
    pub fn players(&self, side: Side) -> &[PlayerId] {
        match side {
            Side::A => &self.side_a,
            Side::B => &self.side_b,
        }
    }

    /// Mutable access to the players placed on `side`.
    pub fn players_mut(&mut self, side: Side) -> &mut Vec<PlayerId> {
        match side {
            Side::A => &mut self.side_a,
            Side::B => &mut self.side_b,
        }
    }

    /// True when `player` is placed on `side` of this slot.
    pub fn contains(&self, side: Side, player: PlayerId) -> bool {
        self.players(side).contains(&player)
    }

    /// How many players `side` is short of the format's demand.
    pub fn missing(&self, side: Side, format: &SessionFormat) -> usize {
        usize::from(format.players_per_side).saturating_sub(self.players(side).len())
    }

    /// True when both sides are at full strength.
    pub fn is_complete(&self, format: &SessionFormat) -> bool {
        Side::BOTH.iter().all(|side| self.missing(*side, format) == 0)
    }

    /// True when no player is placed on either side.
    pub fn is_empty(&self) -> bool {
        self.side_a.is_empty() && self.side_b.is_empty()
    }
}

/// Builds `count` empty slots with ids and orders `1..=count`.
pub fn empty_slots(count: u8) -> Vec<MatchSlot> {
    (1..=u32::from(count))
        .map(|order| MatchSlot::empty(u64::from(order), order))
        .collect()
}

/// Read-only supply of rostered players.
pub trait RosterSource {
    /// Players available on `side`.
    fn roster(&self, side: Side) -> Vec<Player>;
}

/// A simple trip roster holding both sides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    /// Every rostered player, either side.
    pub players: Vec<Player>,
}

impl Roster {
    /// Wraps a list of players.
    pub fn new(players: Vec<Player>) -> Self {
        Self { players }
    }
}

impl RosterSource for Roster {
    fn roster(&self, side: Side) -> Vec<Player> {
        self.players.iter().filter(|p| p.side == side).cloned().collect()
    }
}
