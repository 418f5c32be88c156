//! Lineup fairness scoring.

/// Scoring weights and thresholds.
pub mod config;
/// Prior partner/opponent pair counts.
pub mod history;
/// Fairness score computation.
pub mod scorer;

pub use config::ScoringConfig;
pub use history::{PairKey, PairingHistory};
pub use scorer::{score, score_default, FairnessScore, FairnessWarning, SlotFairness};
