use std::fmt;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{
    roster::{MatchSlot, Player, SessionFormat},
    types::{FormatKind, PlayerId, Side, SlotId},
};

use super::{
    config::ScoringConfig,
    history::{opponent_pairs, partner_pairs, PairingHistory},
};

/// Fairness measures for one slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotFairness {
    /// Slot described.
    pub slot_id: SlotId,
    /// Slot tee-time order.
    pub order: u32,
    /// Absolute handicap difference between the sides; `None` when the slot
    /// is incomplete or references an unknown player.
    pub handicap_delta: Option<f64>,
    /// Weighted prior-pairing penalty; zero without history.
    pub repetition_penalty: f64,
}

/// Human-readable fairness findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FairnessWarning {
    /// The lineup has no slots at all.
    NoSlots,
    /// Slots exist but none is complete.
    NoCompleteSlots,
    /// Two-sided fairness is not defined for this format.
    IndividualFormat {
        /// Format that was scored.
        kind: FormatKind,
    },
    /// A slot is short of players on one or both sides.
    Incomplete {
        /// Slot order.
        order: u32,
        /// Players missing on side A.
        missing_a: usize,
        /// Players missing on side B.
        missing_b: usize,
    },
    /// A slot holds an id absent from the roster.
    UnknownPlayer {
        /// Slot order.
        order: u32,
        /// Unrecognized id.
        player: PlayerId,
    },
    /// Partners who have already played together more often than the threshold.
    RepeatedPartners {
        /// First player's name.
        first: String,
        /// Second player's name.
        second: String,
        /// Prior partner appearances.
        times: u32,
    },
    /// Opponents who have already met more often than the threshold.
    RepeatedOpponents {
        /// First player's name.
        first: String,
        /// Second player's name.
        second: String,
        /// Prior head-to-head appearances.
        times: u32,
    },
}

impl FairnessWarning {
    /// True for slot incompleteness findings.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, FairnessWarning::Incomplete { .. })
    }
}

impl fmt::Display for FairnessWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FairnessWarning::NoSlots => f.write_str("No match slots to score"),
            FairnessWarning::NoCompleteSlots => f.write_str("No complete slots to score"),
            FairnessWarning::IndividualFormat { kind } => {
                write!(f, "Fairness scoring is not defined for individual format {kind:?}")
            }
            FairnessWarning::Incomplete {
                order,
                missing_a,
                missing_b,
            } => match (*missing_a, *missing_b) {
                (a, 0) => write!(f, "Slot {order} incomplete: missing {a} player(s) on side A"),
                (0, b) => write!(f, "Slot {order} incomplete: missing {b} player(s) on side B"),
                (a, b) => write!(
                    f,
                    "Slot {order} incomplete: missing {a} player(s) on side A and {b} player(s) on side B"
                ),
            },
            FairnessWarning::UnknownPlayer { order, player } => {
                write!(f, "Slot {order} references unknown player {player}")
            }
            FairnessWarning::RepeatedPartners { first, second, times } => {
                write!(f, "Players {first} & {second} have been paired {times} times")
            }
            FairnessWarning::RepeatedOpponents { first, second, times } => {
                write!(f, "Players {first} & {second} have faced each other {times} times")
            }
        }
    }
}

/// Derived fairness measure over a lineup. Never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairnessScore {
    /// Aggregate in `(0, 1]`, `1.0` being perfectly balanced with no repeats.
    /// `None` means there was nothing to score.
    pub overall: Option<f64>,
    /// Per-slot measures in slot order.
    pub per_slot: Vec<SlotFairness>,
    /// Findings to surface to the captain.
    pub warnings: Vec<FairnessWarning>,
}

impl FairnessScore {
    /// The "nothing to score" result for an empty lineup.
    pub fn no_data() -> Self {
        Self {
            overall: None,
            per_slot: Vec::new(),
            warnings: vec![FairnessWarning::NoSlots],
        }
    }

    /// True when `overall` is the no-data sentinel.
    pub fn is_no_data(&self) -> bool {
        self.overall.is_none()
    }

    /// Number of incompleteness warnings.
    pub fn incomplete_count(&self) -> usize {
        self.warnings.iter().filter(|w| w.is_incomplete()).count()
    }

    /// Rendered warning strings.
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}

/// Scores `slots` for handicap balance and pairing repetition.
///
/// Pure: identical inputs always give identical output.
pub fn score(
    slots: &[MatchSlot],
    players: &[Player],
    format: &SessionFormat,
    history: Option<&PairingHistory>,
    config: &ScoringConfig,
) -> FairnessScore {
    if slots.is_empty() {
        return FairnessScore::no_data();
    }

    let index: HashMap<PlayerId, &Player> = players.iter().map(|p| (p.id, p)).collect();
    let mut warnings = Vec::new();
    let mut per_slot = Vec::with_capacity(slots.len());
    let mut costs = Vec::with_capacity(slots.len());

    for slot in slots {
        let missing_a = slot.missing(Side::A, format);
        let missing_b = slot.missing(Side::B, format);
        let mut determinate = missing_a == 0 && missing_b == 0;
        if !determinate {
            warnings.push(FairnessWarning::Incomplete {
                order: slot.order,
                missing_a,
                missing_b,
            });
        }
        for side in Side::BOTH {
            for id in slot.players(side) {
                if !index.contains_key(id) {
                    determinate = false;
                    warnings.push(FairnessWarning::UnknownPlayer {
                        order: slot.order,
                        player: *id,
                    });
                }
            }
        }

        let handicap_delta = determinate.then(|| {
            let total = |side: Side| -> f64 {
                slot.players(side)
                    .iter()
                    .filter_map(|id| index.get(id))
                    .map(|p| p.handicap_index)
                    .sum()
            };
            (total(Side::A) - total(Side::B)).abs()
        });
        let repetition_penalty = history
            .map(|h| slot_penalty(slot, h, config))
            .unwrap_or(0.0);

        if let Some(delta) = handicap_delta {
            costs.push(weight(config.handicap_weight) * delta + repetition_penalty);
        }
        if let Some(h) = history {
            repeat_warnings(slot, h, config, &index, &mut warnings);
        }

        per_slot.push(SlotFairness {
            slot_id: slot.slot_id,
            order: slot.order,
            handicap_delta,
            repetition_penalty,
        });
    }

    let overall = if !format.is_team_based() {
        warnings.insert(0, FairnessWarning::IndividualFormat { kind: format.kind });
        None
    } else if costs.is_empty() {
        warnings.push(FairnessWarning::NoCompleteSlots);
        None
    } else {
        let mean = costs.iter().sum::<f64>() / costs.len() as f64;
        Some(1.0 / (1.0 + mean))
    };

    FairnessScore {
        overall,
        per_slot,
        warnings,
    }
}

/// [`score`] with [`ScoringConfig::default`].
pub fn score_default(
    slots: &[MatchSlot],
    players: &[Player],
    format: &SessionFormat,
    history: Option<&PairingHistory>,
) -> FairnessScore {
    score(slots, players, format, history, &ScoringConfig::default())
}

fn slot_penalty(slot: &MatchSlot, history: &PairingHistory, config: &ScoringConfig) -> f64 {
    let partners: u32 = partner_pairs(slot)
        .iter()
        .map(|p| history.partner_count(p.first(), p.second()))
        .sum();
    let opponents: u32 = opponent_pairs(slot)
        .iter()
        .map(|p| history.opponent_count(p.first(), p.second()))
        .sum();
    weight(config.partner_repeat_weight) * f64::from(partners)
        + weight(config.opponent_repeat_weight) * f64::from(opponents)
}

// Negative or non-finite weights count as zero.
fn weight(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { 0.0 }
}

fn repeat_warnings(
    slot: &MatchSlot,
    history: &PairingHistory,
    config: &ScoringConfig,
    index: &HashMap<PlayerId, &Player>,
    warnings: &mut Vec<FairnessWarning>,
) {
    let name = |id: PlayerId| {
        index
            .get(&id)
            .map(|p| p.display_name())
            .unwrap_or_else(|| format!("#{id}"))
    };

    for pair in partner_pairs(slot) {
        let times = history.partner_count(pair.first(), pair.second());
        if times > config.repeat_warning_threshold {
            warnings.push(FairnessWarning::RepeatedPartners {
                first: name(pair.first()),
                second: name(pair.second()),
                times,
            });
        }
    }
    for pair in opponent_pairs(slot) {
        let times = history.opponent_count(pair.first(), pair.second());
        if times > config.repeat_warning_threshold {
            warnings.push(FairnessWarning::RepeatedOpponents {
                first: name(pair.first()),
                second: name(pair.second()),
                times,
            });
        }
    }
}
