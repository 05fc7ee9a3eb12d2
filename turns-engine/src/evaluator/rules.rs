//! Rule-based evaluation.

use async_trait::async_trait;
use tracing::debug;

use super::{EvaluationError, EvaluatorKind, ResponseEvaluator};
use crate::decision::{AgentDecision, Rejection, Verdict};
use crate::history::History;
use crate::roster::{Agent, Roster};

/// Applies the voting rules to a parsed decision.
///
/// Checks run in order: parse, self-vote or missing target, roster
/// membership, justification present.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedEvaluator;

impl RuleBasedEvaluator {
    pub fn judge(&self, agent: &Agent, raw_reply: &str, roster: &Roster) -> Verdict {
        let decision = match AgentDecision::parse(raw_reply) {
            Ok(decision) => decision,
            Err(e) => {
                debug!(agent = %agent.id, error = %e, "reply is not a decision");
                return Verdict::rejected_with(Rejection::MalformedDecision, &e.0);
            }
        };

        let target = match decision.target() {
            Some(target) if target != agent.id => target,
            _ => return Verdict::rejected(Rejection::SelfVoteOrMissingTarget),
        };

        if !roster.contains(target) {
            return Verdict::rejected(Rejection::InvalidTarget);
        }

        match decision.justification() {
            Some(reason) => Verdict::pass(target, reason),
            None => Verdict::rejected(Rejection::MissingJustification),
        }
    }
}

#[async_trait]
impl ResponseEvaluator for RuleBasedEvaluator {
    fn kind(&self) -> EvaluatorKind {
        EvaluatorKind::RuleBased
    }

    async fn evaluate(
        &self,
        agent: &Agent,
        raw_reply: &str,
        roster: &Roster,
        _history: &History,
    ) -> Result<Verdict, EvaluationError> {
        Ok(self.judge(agent, raw_reply, roster))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Outcome;

    fn roster() -> Roster {
        Roster::new(vec![
            Agent::new("A", "m"),
            Agent::new("B", "m"),
            Agent::new("C", "m"),
        ])
        .unwrap()
    }

    fn eval(agent: &str, reply: &str) -> Verdict {
        let roster = roster();
        let agent = roster.get(agent).unwrap().clone();
        RuleBasedEvaluator.judge(&agent, reply, &roster)
    }

    #[test]
    fn test_valid_vote_passes() {
        let v = eval("A", r#"{"voteAgainst":"B","reason":"B is slow"}"#);
        assert_eq!(v.outcome, Outcome::Pass);
        assert_eq!(v.vote_against.as_deref(), Some("B"));
        assert_eq!(v.reason, "B is slow");
    }

    #[test]
    fn test_self_vote_fails() {
        let v = eval("A", r#"{"voteAgainst":"A","reason":"I confess"}"#);
        assert_eq!(v.rejection, Some(Rejection::SelfVoteOrMissingTarget));
        assert_eq!(v.reason, "self-vote or missing target");
    }

    #[test]
    fn test_missing_target_fails() {
        let v = eval("A", r#"{"reason":"someone is human"}"#);
        assert_eq!(v.rejection, Some(Rejection::SelfVoteOrMissingTarget));
    }

    #[test]
    fn test_unknown_target_fails() {
        let v = eval("A", r#"{"voteAgainst":"Zed","reason":"Zed is odd"}"#);
        assert_eq!(v.rejection, Some(Rejection::InvalidTarget));
    }

    #[test]
    fn test_missing_reason_fails() {
        let v = eval("A", r#"{"voteAgainst":"C"}"#);
        assert_eq!(v.rejection, Some(Rejection::MissingJustification));
        let v = eval("A", r#"{"voteAgainst":"C","reason":""}"#);
        assert_eq!(v.rejection, Some(Rejection::MissingJustification));
    }

    #[test]
    fn test_self_vote_checked_before_reason() {
        let v = eval("B", r#"{"voteAgainst":"B"}"#);
        assert_eq!(v.rejection, Some(Rejection::SelfVoteOrMissingTarget));
    }

    #[test]
    fn test_free_text_is_malformed() {
        let v = eval("C", "I vote against A because A is slow");
        assert_eq!(v.outcome, Outcome::Failed);
        assert_eq!(v.rejection, Some(Rejection::MalformedDecision));
        assert!(v.reason.starts_with("malformed decision"));
    }

    #[test]
    fn test_positional_array_is_malformed() {
        let v = eval("A", r#"["B", "B hesitates before answering"]"#);
        assert_eq!(v.outcome, Outcome::Failed);
        assert_eq!(v.vote_against, None);
        assert_eq!(v.rejection, Some(Rejection::MalformedDecision));
    }

    #[tokio::test]
    async fn test_trait_evaluate() {
        let roster = roster();
        let agent = roster.get("C").unwrap().clone();
        let verdict = RuleBasedEvaluator
            .evaluate(
                &agent,
                r#"{"voteAgainst":"A","reason":"too fast"}"#,
                &roster,
                &History::new(),
            )
            .await
            .unwrap();
        assert!(verdict.is_pass());
    }
}
