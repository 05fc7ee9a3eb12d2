//! Response evaluation: turns a raw deliberation reply into a [`Verdict`].
//!
//! Two variants, fixed for a whole game at start time:
//! - [`RuleBasedEvaluator`]: parses the reply locally and applies the
//!   voting rules.
//! - [`JudgeEvaluator`]: delegates the decision to a judge model over the
//!   inference collaborator.

pub mod judge;
pub mod rules;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{EngineConfig, EngineConfigError};
use crate::decision::Verdict;
use crate::history::History;
use crate::inference::{InferenceClient, InferenceError};
use crate::roster::{Agent, Roster};

pub use judge::JudgeEvaluator;
pub use rules::RuleBasedEvaluator;

/// Errors that prevent a verdict from being produced at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("judge unavailable: {0}")]
    JudgeUnavailable(#[from] InferenceError),

    #[error("malformed judge verdict: {0}")]
    MalformedVerdict(String),
}

/// Which evaluator variant a game uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorKind {
    RuleBased,
    JudgeDelegated,
}

impl std::fmt::Display for EvaluatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RuleBased => write!(f, "rule_based"),
            Self::JudgeDelegated => write!(f, "judge_delegated"),
        }
    }
}

/// Evaluates one agent's deliberation reply.
#[async_trait]
pub trait ResponseEvaluator: Send + Sync {
    fn kind(&self) -> EvaluatorKind;

    async fn evaluate(
        &self,
        agent: &Agent,
        raw_reply: &str,
        roster: &Roster,
        history: &History,
    ) -> Result<Verdict, EvaluationError>;
}

/// Build the evaluator for a game.
pub fn build_evaluator(
    judge_mode: bool,
    roster: &Roster,
    client: Arc<dyn InferenceClient>,
    config: &EngineConfig,
) -> Result<Box<dyn ResponseEvaluator>, EngineConfigError> {
    if !judge_mode {
        return Ok(Box::new(RuleBasedEvaluator));
    }
    let judge = roster.judge().cloned().ok_or(EngineConfigError::NoJudge)?;
    Ok(Box::new(JudgeEvaluator::new(judge, client, config)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::MockInferenceClient;

    fn roster() -> Roster {
        Roster::new(vec![Agent::new("A", "m"), Agent::new("B", "m")]).unwrap()
    }

    #[test]
    fn test_build_rule_based() {
        let client: Arc<dyn InferenceClient> = Arc::new(MockInferenceClient::new());
        let evaluator =
            build_evaluator(false, &roster(), client, &EngineConfig::default()).unwrap();
        assert_eq!(evaluator.kind(), EvaluatorKind::RuleBased);
    }

    #[test]
    fn test_judge_mode_requires_judge() {
        let client: Arc<dyn InferenceClient> = Arc::new(MockInferenceClient::new());
        let err = build_evaluator(true, &roster(), client.clone(), &EngineConfig::default())
            .err()
            .unwrap();
        assert_eq!(err, EngineConfigError::NoJudge);

        let with_judge = roster().with_judge(Agent::new("Judge", "j"));
        let evaluator =
            build_evaluator(true, &with_judge, client, &EngineConfig::default()).unwrap();
        assert_eq!(evaluator.kind(), EvaluatorKind::JudgeDelegated);
    }
}
