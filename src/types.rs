//! Shared primitive IDs, sides, and the match-format catalog.

use serde::{Deserialize, Serialize};

/// Opaque player identifier.
pub type PlayerId = u64;
/// Stable match-slot identifier.
pub type SlotId = u64;
/// Trip identifier.
pub type TripId = u64;
/// Published session identifier.
pub type SessionId = u64;
/// Persisted draft identifier.
pub type DraftId = u64;

/// One of the two competing teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// Team A.
    A,
    /// Team B.
    B,
}

impl Side {
    /// Both sides in display order.
    pub const BOTH: [Side; 2] = [Side::A, Side::B];

    /// The opposing side.
    pub fn other(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::A => f.write_str("A"),
            Side::B => f.write_str("B"),
        }
    }
}

/// How a format's results are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoringMode {
    /// Hole-by-hole match play.
    MatchPlay,
    /// Gross strokes only.
    Gross,
    /// Net strokes after handicap.
    Net,
    /// Gross and net tracked together.
    Both,
    /// Points per hole (stableford style).
    Points,
    /// Total strokes.
    Stroke,
}

/// Supported session formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatKind {
    /// Alternate shot, two per side.
    Foursomes,
    /// Best ball, two per side.
    Fourball,
    /// One against one.
    Singles,
    /// Both drive, pick one, then alternate shot.
    Greensomes,
    /// Team scramble.
    Scramble,
    /// Per-hole skins.
    Skins,
    /// Front/back/total bets.
    Nassau,
    /// Points-based individual play.
    Stableford,
    /// Individual stroke play.
    StrokePlay,
}

/// Static metadata for a [`FormatKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    /// Players fielded per side in one match.
    pub players_per_side: u8,
    /// Default number of matches in a session.
    pub default_matches: u8,
    /// True when the format pits side A against side B.
    pub is_team_based: bool,
    /// Result counting mode.
    pub scoring_mode: ScoringMode,
}

impl FormatKind {
    /// Every catalog entry.
    pub const ALL: [FormatKind; 9] = [
        FormatKind::Foursomes,
        FormatKind::Fourball,
        FormatKind::Singles,
        FormatKind::Greensomes,
        FormatKind::Scramble,
        FormatKind::Skins,
        FormatKind::Nassau,
        FormatKind::Stableford,
        FormatKind::StrokePlay,
    ];

    /// Catalog metadata for this format.
    pub fn info(self) -> FormatInfo {
        use ScoringMode::*;
        let (players_per_side, default_matches, is_team_based, scoring_mode) = match self {
            FormatKind::Foursomes => (2, 4, true, MatchPlay),
            FormatKind::Fourball => (2, 4, true, MatchPlay),
            FormatKind::Singles => (1, 12, true, MatchPlay),
            FormatKind::Greensomes => (2, 4, true, MatchPlay),
            FormatKind::Scramble => (2, 4, true, Gross),
            FormatKind::Skins => (1, 1, false, Both),
            FormatKind::Nassau => (1, 6, true, MatchPlay),
            FormatKind::Stableford => (1, 1, false, Points),
            FormatKind::StrokePlay => (1, 1, false, Stroke),
        };
        FormatInfo {
            players_per_side,
            default_matches,
            is_team_based,
            scoring_mode,
        }
    }
}
