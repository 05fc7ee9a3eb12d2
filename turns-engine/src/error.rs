//! Turn-level errors.
//!
//! Only failures that stop a turn from completing live here. Malformed,
//! self-targeted, unjustified or copied decisions are ordinary failed
//! verdicts and never reach this type.

use thiserror::Error;

use crate::config::EngineConfigError;
use crate::evaluator::EvaluationError;
use crate::inference::InferenceError;
use crate::roster::{AgentId, RosterError};
use crate::tally::TallyError;

/// Errors that abort a turn. The session is left exactly as it was before
/// the turn started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error("agent {agent} unavailable: {source}")]
    AgentUnavailable {
        agent: AgentId,
        #[source]
        source: InferenceError,
    },

    #[error("evaluator unavailable: {0}")]
    EvaluatorUnavailable(#[from] EvaluationError),

    #[error("invalid game setup: {0}")]
    Config(#[from] EngineConfigError),

    #[error("game is over")]
    GameOver,

    #[error("no game started")]
    NotStarted,

    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Tally(#[from] TallyError),
}

impl TurnError {
    /// Whether repeating the same step may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::AgentUnavailable { .. } | Self::EvaluatorUnavailable(_)
        )
    }
}

/// Result type for turn operations.
pub type TurnResult<T> = Result<T, TurnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_retryability() {
        let err = TurnError::AgentUnavailable {
            agent: "Beta".to_string(),
            source: InferenceError::Request("refused".to_string()),
        };
        assert_eq!(err.to_string(), "agent Beta unavailable: request failed: refused");
        assert!(err.is_retryable());

        let err = TurnError::from(EvaluationError::MalformedVerdict("x".to_string()));
        assert!(err.to_string().starts_with("evaluator unavailable"));
        assert!(err.is_retryable());

        assert!(!TurnError::GameOver.is_retryable());
        assert!(!TurnError::from(EngineConfigError::NoJudge).is_retryable());
    }
}
