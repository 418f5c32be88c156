use hashbrown::HashSet;

use crate::{
    fairness::{score, PairingHistory, ScoringConfig},
    roster::{MatchSlot, Player, SessionFormat},
    types::{PlayerId, Side},
};

use super::partition::eligible_ids;

const MIN_GAIN: f64 = 1e-12;

/// Result of [`balance_lineup`].
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceOutcome {
    /// Rebalanced slots, same ids and order as the input.
    pub slots: Vec<MatchSlot>,
    /// Improving moves applied.
    pub moves: usize,
    /// Overall fairness after balancing.
    pub overall: Option<f64>,
}

/// Steepest-ascent local search over the fairness score.
///
/// Each pass evaluates every same-side swap between two slots and every
/// exchange of a placed player with a benched one, then applies the single
/// best move if it strictly raises `overall`. Stops at a local optimum or
/// after `max_passes`. The set of slots, their sizes, and the no-double-booking
/// property are preserved.
pub fn balance_lineup(
    slots: &[MatchSlot],
    side_a: &[Player],
    side_b: &[Player],
    format: &SessionFormat,
    history: Option<&PairingHistory>,
    config: &ScoringConfig,
    max_passes: usize,
) -> BalanceOutcome {
    let players: Vec<Player> = side_a.iter().chain(side_b).cloned().collect();
    let objective = |candidate: &[MatchSlot]| score(candidate, &players, format, history, config).overall;

    let mut current = slots.to_vec();
    let Some(mut best) = objective(&current) else {
        return BalanceOutcome {
            slots: current,
            moves: 0,
            overall: None,
        };
    };

    let mut moves = 0;
    for _ in 0..max_passes {
        let mut winner: Option<(f64, Vec<MatchSlot>)> = None;
        let mut consider = |candidate: Vec<MatchSlot>| {
            if let Some(value) = objective(&candidate) {
                if winner.as_ref().is_none_or(|(w, _)| value > *w) {
                    winner = Some((value, candidate));
                }
            }
        };

        for (side, roster) in [(Side::A, side_a), (Side::B, side_b)] {
            let positions = positions(&current, side);
            let bench = bench(&current, roster, side);

            for (x, &(si, pi)) in positions.iter().enumerate() {
                for &(sj, pj) in &positions[x + 1..] {
                    if si == sj {
                        continue;
                    }
                    let mut candidate = current.clone();
                    let a = candidate[si].players(side)[pi];
                    let b = candidate[sj].players(side)[pj];
                    candidate[si].players_mut(side)[pi] = b;
                    candidate[sj].players_mut(side)[pj] = a;
                    consider(candidate);
                }
                for id in &bench {
                    let mut candidate = current.clone();
                    candidate[si].players_mut(side)[pi] = *id;
                    consider(candidate);
                }
            }
        }

        match winner {
            Some((value, candidate)) if value > best + MIN_GAIN => {
                current = candidate;
                best = value;
                moves += 1;
            }
            _ => break,
        }
    }

    tracing::debug!(moves, overall = best, "lineup rebalanced");
    BalanceOutcome {
        slots: current,
        moves,
        overall: Some(best),
    }
}

fn positions(slots: &[MatchSlot], side: Side) -> Vec<(usize, usize)> {
    slots
        .iter()
        .enumerate()
        .flat_map(|(si, slot)| (0..slot.players(side).len()).map(move |pi| (si, pi)))
        .collect()
}

fn bench(slots: &[MatchSlot], roster: &[Player], side: Side) -> Vec<PlayerId> {
    let placed: HashSet<PlayerId> = slots
        .iter()
        .flat_map(|s| s.players(side).iter().copied())
        .collect();
    eligible_ids(roster, side)
        .into_iter()
        .filter(|id| !placed.contains(id))
        .collect()
}
