//! Engine tuning knobs.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A game cannot be set up with the given configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineConfigError {
    #[error("{field} must be {expected}, got {got}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        got: String,
    },

    #[error("judge mode requested but the roster has no judge")]
    NoJudge,
}

fn out_of_range(
    field: &'static str,
    expected: &'static str,
    got: impl ToString,
) -> EngineConfigError {
    EngineConfigError::OutOfRange {
        field,
        expected,
        got: got.to_string(),
    }
}

/// Configuration for the turn engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Against-votes that end the game.
    pub vote_threshold: u32,
    /// Hard turn bound as a multiple of the roster size.
    pub turn_limit_factor: u32,
    /// Edit-distance ratio below which a justification counts as copied.
    pub plagiarism_ratio: f64,
    /// Upper bound on each inference call.
    pub inference_timeout_secs: u64,
    /// How long the endpoint keeps a model loaded between calls.
    pub keep_alive: Option<String>,
    /// Sampling temperature for judge calls.
    pub judge_temperature: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vote_threshold: 3,
            turn_limit_factor: 4,
            plagiarism_ratio: 0.25,
            inference_timeout_secs: 120,
            keep_alive: Some("2s".to_string()),
            judge_temperature: 0.0,
        }
    }
}

impl EngineConfig {
    /// Check every knob is within its usable range.
    pub fn validate(&self) -> Result<(), EngineConfigError> {
        if self.vote_threshold == 0 {
            return Err(out_of_range("vote_threshold", "at least 1", self.vote_threshold));
        }
        if self.turn_limit_factor == 0 {
            return Err(out_of_range(
                "turn_limit_factor",
                "at least 1",
                self.turn_limit_factor,
            ));
        }
        if self.inference_timeout_secs == 0 {
            return Err(out_of_range(
                "inference_timeout_secs",
                "at least 1",
                self.inference_timeout_secs,
            ));
        }
        if !(self.plagiarism_ratio.is_finite()
            && self.plagiarism_ratio > 0.0
            && self.plagiarism_ratio <= 1.0)
        {
            return Err(out_of_range(
                "plagiarism_ratio",
                "finite and in (0, 1]",
                self.plagiarism_ratio,
            ));
        }
        if !(self.judge_temperature.is_finite() && self.judge_temperature >= 0.0) {
            return Err(out_of_range(
                "judge_temperature",
                "finite and non-negative",
                self.judge_temperature,
            ));
        }
        Ok(())
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }

    /// Maximum turns for a roster of `roster_size` agents.
    pub fn turn_limit(&self, roster_size: usize) -> u32 {
        self.turn_limit_factor.saturating_mul(roster_size as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.vote_threshold, 3);
        assert_eq!(config.turn_limit(3), 12);
        assert_eq!(config.inference_timeout(), Duration::from_secs(120));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_degenerate_values() {
        let cases = [
            (
                EngineConfig {
                    vote_threshold: 0,
                    ..EngineConfig::default()
                },
                "vote_threshold",
            ),
            (
                EngineConfig {
                    turn_limit_factor: 0,
                    ..EngineConfig::default()
                },
                "turn_limit_factor",
            ),
            (
                EngineConfig {
                    inference_timeout_secs: 0,
                    ..EngineConfig::default()
                },
                "inference_timeout_secs",
            ),
            (
                EngineConfig {
                    plagiarism_ratio: f64::NAN,
                    ..EngineConfig::default()
                },
                "plagiarism_ratio",
            ),
            (
                EngineConfig {
                    plagiarism_ratio: 0.0,
                    ..EngineConfig::default()
                },
                "plagiarism_ratio",
            ),
            (
                EngineConfig {
                    plagiarism_ratio: 1.5,
                    ..EngineConfig::default()
                },
                "plagiarism_ratio",
            ),
            (
                EngineConfig {
                    judge_temperature: f32::INFINITY,
                    ..EngineConfig::default()
                },
                "judge_temperature",
            ),
        ];
        for (config, field) in cases {
            match config.validate() {
                Err(EngineConfigError::OutOfRange { field: f, .. }) => assert_eq!(f, field),
                other => panic!("{field}: expected OutOfRange, got {other:?}"),
            }
        }

        let edge = EngineConfig {
            vote_threshold: 1,
            turn_limit_factor: 1,
            inference_timeout_secs: 1,
            plagiarism_ratio: 1.0,
            ..EngineConfig::default()
        };
        assert_eq!(edge.validate(), Ok(()));
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"vote_threshold": 2}"#).unwrap();
        assert_eq!(config.vote_threshold, 2);
        assert_eq!(config.turn_limit_factor, 4);
        assert_eq!(config.plagiarism_ratio, 0.25);
    }
}
