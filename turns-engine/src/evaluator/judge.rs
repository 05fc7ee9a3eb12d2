//! Judge-delegated evaluation.
//!
//! The judge model is authoritative on compliance. Its output is still read
//! through a strict schema: anything that cannot be turned into a verdict is
//! an [`EvaluationError`], never a guessed outcome. A `pass` naming the acting
//! agent or a non-member cannot be tallied and is downgraded to a failed
//! verdict.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use super::{EvaluationError, EvaluatorKind, ResponseEvaluator};
use crate::config::EngineConfig;
use crate::decision::{json_object, Rejection, Verdict};
use crate::history::History;
use crate::inference::{chat_with_timeout, ChatMessage, ChatRequest, InferenceClient};
use crate::prompts;
use crate::roster::{Agent, Roster};

/// Verdict as emitted by the judge model.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JudgeVerdict {
    #[serde(default)]
    evaluation: Option<String>,
    #[serde(default)]
    vote_against: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

/// Evaluator that asks a judge model for the verdict.
pub struct JudgeEvaluator {
    judge: Agent,
    client: Arc<dyn InferenceClient>,
    timeout: Duration,
    temperature: f32,
    keep_alive: Option<String>,
}

impl JudgeEvaluator {
    pub fn new(judge: Agent, client: Arc<dyn InferenceClient>, config: &EngineConfig) -> Self {
        Self {
            judge,
            client,
            timeout: config.inference_timeout(),
            temperature: config.judge_temperature,
            keep_alive: config.keep_alive.clone(),
        }
    }

    /// Turn the judge's raw JSON into a verdict for `agent`.
    pub fn interpret(
        agent: &Agent,
        roster: &Roster,
        raw: &str,
    ) -> Result<Verdict, EvaluationError> {
        let value = json_object(raw).map_err(EvaluationError::MalformedVerdict)?;
        let parsed: JudgeVerdict = serde_json::from_value(value)
            .map_err(|e| EvaluationError::MalformedVerdict(e.to_string()))?;

        let reason = parsed
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .ok_or_else(|| EvaluationError::MalformedVerdict("missing reason".to_string()))?;

        let evaluation = parsed
            .evaluation
            .map(|e| e.trim().to_ascii_lowercase())
            .unwrap_or_default();

        match evaluation.as_str() {
            "pass" => {
                let target = parsed
                    .vote_against
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| {
                        EvaluationError::MalformedVerdict("pass without voteAgainst".to_string())
                    })?;
                if target == agent.id {
                    warn!(agent = %agent.id, "judge passed a self-vote");
                    return Ok(Verdict::rejected(Rejection::SelfVoteOrMissingTarget));
                }
                if !roster.contains(&target) {
                    warn!(agent = %agent.id, target = %target, "judge passed a non-member target");
                    return Ok(Verdict::rejected(Rejection::InvalidTarget));
                }
                Ok(Verdict::pass(target, reason))
            }
            "failed" | "fail" => Ok(Verdict::failed(reason)),
            other => Err(EvaluationError::MalformedVerdict(format!(
                "unknown evaluation {:?}",
                other
            ))),
        }
    }
}

#[async_trait]
impl ResponseEvaluator for JudgeEvaluator {
    fn kind(&self) -> EvaluatorKind {
        EvaluatorKind::JudgeDelegated
    }

    async fn evaluate(
        &self,
        agent: &Agent,
        raw_reply: &str,
        roster: &Roster,
        _history: &History,
    ) -> Result<Verdict, EvaluationError> {
        let prompt = prompts::judge_prompt(agent, roster, raw_reply);
        let request = ChatRequest::new(&self.judge.model, vec![ChatMessage::user(prompt)])
            .json()
            .temperature(self.temperature)
            .keep_alive(self.keep_alive.clone());

        let response = chat_with_timeout(self.client.as_ref(), request, self.timeout).await?;
        let verdict = Self::interpret(agent, roster, response.content())?;
        info!(
            agent = %agent.id,
            judge = %self.judge.id,
            outcome = %verdict.outcome,
            "judge verdict"
        );
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Outcome;
    use crate::inference::{ChatResponse, InferenceError, MockInferenceClient, ResponseFormat};

    fn roster() -> Roster {
        Roster::new(vec![
            Agent::new("A", "m"),
            Agent::new("B", "m"),
            Agent::new("C", "m"),
        ])
        .unwrap()
        .with_judge(Agent::new("Judge", "llama3.1:8b"))
    }

    fn evaluator(mock: MockInferenceClient) -> JudgeEvaluator {
        let roster = roster();
        JudgeEvaluator::new(
            roster.judge().unwrap().clone(),
            Arc::new(mock),
            &EngineConfig::default(),
        )
    }

    #[test]
    fn test_interpret_pass() {
        let roster = roster();
        let agent = roster.get("A").unwrap();
        let v = JudgeEvaluator::interpret(
            agent,
            &roster,
            r#"{"evaluation":"pass","voteAgainst":"C","reason":"complies"}"#,
        )
        .unwrap();
        assert_eq!(v.outcome, Outcome::Pass);
        assert_eq!(v.vote_against.as_deref(), Some("C"));
    }

    #[test]
    fn test_interpret_failed() {
        let roster = roster();
        let agent = roster.get("A").unwrap();
        let v = JudgeEvaluator::interpret(
            agent,
            &roster,
            r#"{"evaluation":"failed","reason":"no target named"}"#,
        )
        .unwrap();
        assert_eq!(v.outcome, Outcome::Failed);
        assert_eq!(v.reason, "no target named");
        assert_eq!(v.rejection, None);
    }

    #[test]
    fn test_interpret_downgrades_self_vote_and_unknown_target() {
        let roster = roster();
        let agent = roster.get("B").unwrap();
        let v = JudgeEvaluator::interpret(
            agent,
            &roster,
            r#"{"evaluation":"pass","voteAgainst":"B","reason":"ok"}"#,
        )
        .unwrap();
        assert_eq!(v.rejection, Some(Rejection::SelfVoteOrMissingTarget));

        let v = JudgeEvaluator::interpret(
            agent,
            &roster,
            r#"{"evaluation":"pass","voteAgainst":"Judge","reason":"ok"}"#,
        )
        .unwrap();
        assert_eq!(v.rejection, Some(Rejection::InvalidTarget));
    }

    #[test]
    fn test_interpret_malformed() {
        let roster = roster();
        let agent = roster.get("A").unwrap();
        for raw in [
            "the agent passes",
            r#"{"evaluation":"pass","reason":"ok"}"#,
            r#"{"evaluation":"maybe","reason":"ok"}"#,
            r#"{"evaluation":"failed"}"#,
            r#"["pass","B","ok"]"#,
        ] {
            let err = JudgeEvaluator::interpret(agent, &roster, raw).unwrap_err();
            assert!(matches!(err, EvaluationError::MalformedVerdict(_)), "{raw}");
        }
    }

    #[tokio::test]
    async fn test_evaluate_sends_json_request_to_judge_model() {
        let mut mock = MockInferenceClient::new();
        mock.expect_chat()
            .withf(|req| {
                req.model == "llama3.1:8b"
                    && req.format == Some(ResponseFormat::Json)
                    && req.messages.len() == 1
                    && req.messages[0].content.contains("message from A")
            })
            .times(1)
            .returning(|_| {
                Ok(ChatResponse::text(
                    r#"{"evaluation":"pass","voteAgainst":"B","reason":"fine"}"#,
                ))
            });

        let roster = roster();
        let agent = roster.get("A").unwrap().clone();
        let verdict = evaluator(mock)
            .evaluate(&agent, "I vote B", &roster, &History::new())
            .await
            .unwrap();
        assert!(verdict.is_pass());
    }

    #[tokio::test]
    async fn test_evaluate_surfaces_judge_failure() {
        let mut mock = MockInferenceClient::new();
        mock.expect_chat()
            .returning(|_| Err(InferenceError::Request("connection refused".to_string())));

        let roster = roster();
        let agent = roster.get("A").unwrap().clone();
        let err = evaluator(mock)
            .evaluate(&agent, "{}", &roster, &History::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EvaluationError::JudgeUnavailable(_)));
    }
}
