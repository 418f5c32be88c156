use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Weights used by [`crate::fairness::score`].
///
/// Slot cost is `handicap_weight * delta + repetition penalty`, where the
/// penalty sums prior partner counts times `partner_repeat_weight` and prior
/// opponent counts times `opponent_repeat_weight`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Cost per stroke of handicap difference between the sides of a slot.
    pub handicap_weight: f64,
    /// Cost per prior time two partners have already played together.
    pub partner_repeat_weight: f64,
    /// Cost per prior time two opponents have already met.
    pub opponent_repeat_weight: f64,
    /// A pair is called out in warnings once its prior count exceeds this.
    pub repeat_warning_threshold: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            handicap_weight: 0.1,
            partner_repeat_weight: 0.5,
            opponent_repeat_weight: 0.25,
            repeat_warning_threshold: 2,
        }
    }
}

impl ScoringConfig {
    /// Rejects negative or non-finite weights.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("handicap_weight", self.handicap_weight),
            ("partner_repeat_weight", self.partner_repeat_weight),
            ("opponent_repeat_weight", self.opponent_repeat_weight),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}
