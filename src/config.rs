//! Crate configuration loaded from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{fairness::ScoringConfig, runtime::handle::RuntimeConfig};

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Could not read the file.
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
    /// Could not parse the JSON.
    #[error("config parse: {0}")]
    Parse(#[from] serde_json::Error),
    /// Parsed but out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Scoring and runtime settings. Missing keys take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineupConfig {
    /// Fairness weights.
    pub scoring: ScoringConfig,
    /// Runtime queue sizing.
    pub runtime: RuntimeConfig,
}

impl LineupConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads, parses, and validates a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate()?;
        if self.runtime.command_queue_bound == 0 || self.runtime.event_queue_bound == 0 {
            return Err(ConfigError::Invalid("runtime queue bounds must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = LineupConfig::from_json_str("{}").expect("parse");
        assert_eq!(cfg, LineupConfig::default());
        assert_eq!(cfg.scoring.repeat_warning_threshold, 2);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = LineupConfig::from_json_str(r#"{"scoring": {"handicap_weight": 0.5}}"#).expect("parse");
        assert_eq!(cfg.scoring.handicap_weight, 0.5);
        assert_eq!(cfg.scoring.partner_repeat_weight, ScoringConfig::default().partner_repeat_weight);
        assert_eq!(cfg.runtime, RuntimeConfig::default());
    }

    #[test]
    fn negative_weight_is_rejected() {
        let err = LineupConfig::from_json_str(r#"{"scoring": {"opponent_repeat_weight": -1.0}}"#);
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_queue_bound_is_rejected() {
        let err = LineupConfig::from_json_str(r#"{"runtime": {"command_queue_bound": 0}}"#);
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
    }
}
