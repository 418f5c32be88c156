use hashbrown::HashMap;

use crate::{
    roster::MatchSlot,
    types::{PlayerId, Side},
};

/// Unordered player pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(PlayerId, PlayerId);

impl PairKey {
    /// Normalizes `(a, b)` so that `PairKey::new(a, b) == PairKey::new(b, a)`.
    pub fn new(a: PlayerId, b: PlayerId) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }

    /// Lower id of the pair.
    pub fn first(&self) -> PlayerId {
        self.0
    }

    /// Higher id of the pair.
    pub fn second(&self) -> PlayerId {
        self.1
    }
}

/// How often pairs of players have partnered or opposed each other on a trip.
///
/// Owned by the trip collaborator; the scorer only reads a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairingHistory {
    partners: HashMap<PairKey, u32>,
    opponents: HashMap<PairKey, u32>,
}

impl PairingHistory {
    /// Empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no pairing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.partners.is_empty() && self.opponents.is_empty()
    }

    /// Prior times `a` and `b` played on the same side of a match.
    pub fn partner_count(&self, a: PlayerId, b: PlayerId) -> u32 {
        self.partners.get(&PairKey::new(a, b)).copied().unwrap_or(0)
    }

    /// Prior times `a` and `b` played on opposite sides of a match.
    pub fn opponent_count(&self, a: PlayerId, b: PlayerId) -> u32 {
        self.opponents.get(&PairKey::new(a, b)).copied().unwrap_or(0)
    }

    /// Adds `times` partner appearances for `(a, b)`.
    pub fn add_partners(&mut self, a: PlayerId, b: PlayerId, times: u32) {
        if a == b || times == 0 {
            return;
        }
        *self.partners.entry(PairKey::new(a, b)).or_insert(0) += times;
    }

    /// Adds `times` opponent appearances for `(a, b)`.
    pub fn add_opponents(&mut self, a: PlayerId, b: PlayerId, times: u32) {
        if a == b || times == 0 {
            return;
        }
        *self.opponents.entry(PairKey::new(a, b)).or_insert(0) += times;
    }

    /// Folds every partner and opponent pair of a played lineup into the counts.
    pub fn record_lineup(&mut self, slots: &[MatchSlot]) {
        for slot in slots {
            for pair in partner_pairs(slot) {
                self.add_partners(pair.first(), pair.second(), 1);
            }
            for pair in opponent_pairs(slot) {
                self.add_opponents(pair.first(), pair.second(), 1);
            }
        }
    }

    /// Adds all counts from `other`.
    pub fn merge(&mut self, other: &PairingHistory) {
        for (pair, n) in &other.partners {
            *self.partners.entry(*pair).or_insert(0) += n;
        }
        for (pair, n) in &other.opponents {
            *self.opponents.entry(*pair).or_insert(0) += n;
        }
    }
}

/// Same-side pairs within one slot.
pub fn partner_pairs(slot: &MatchSlot) -> Vec<PairKey> {
    let mut out = Vec::new();
    for side in Side::BOTH {
        let players = slot.players(side);
        for (i, a) in players.iter().enumerate() {
            for b in &players[i + 1..] {
                out.push(PairKey::new(*a, *b));
            }
        }
    }
    out
}

/// Cross-side pairs within one slot.
pub fn opponent_pairs(slot: &MatchSlot) -> Vec<PairKey> {
    slot.side_a
        .iter()
        .flat_map(|a| slot.side_b.iter().map(move |b| PairKey::new(*a, *b)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_key_is_unordered() {
        assert_eq!(PairKey::new(7, 3), PairKey::new(3, 7));
        assert_eq!(PairKey::new(7, 3).first(), 3);
    }

    #[test]
    fn record_lineup_counts_partners_and_opponents() {
        let slot = MatchSlot {
            slot_id: 1,
            order: 1,
            side_a: vec![1, 2],
            side_b: vec![11, 12],
        };
        let mut history = PairingHistory::new();
        history.record_lineup(std::slice::from_ref(&slot));
        history.record_lineup(std::slice::from_ref(&slot));

        assert_eq!(history.partner_count(2, 1), 2);
        assert_eq!(history.partner_count(11, 12), 2);
        assert_eq!(history.opponent_count(1, 12), 2);
        assert_eq!(history.opponent_count(1, 2), 0);
        assert_eq!(partner_pairs(&slot).len(), 2);
        assert_eq!(opponent_pairs(&slot).len(), 4);
    }

    #[test]
    fn merge_adds_counts_and_ignores_self_pairs() {
        let mut morning = PairingHistory::new();
        morning.add_partners(1, 2, 1);
        morning.add_partners(3, 3, 4);
        let mut afternoon = PairingHistory::new();
        afternoon.add_partners(2, 1, 2);
        afternoon.add_opponents(1, 11, 1);

        morning.merge(&afternoon);
        assert_eq!(morning.partner_count(1, 2), 3);
        assert_eq!(morning.opponent_count(11, 1), 1);
        assert_eq!(morning.partner_count(3, 3), 0);
        assert!(!morning.is_empty());
    }
}
