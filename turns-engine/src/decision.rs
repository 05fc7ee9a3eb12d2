//! Decisions and verdicts: the structured payloads of the deliberation
//! phase.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::roster::AgentId;

/// A deliberation reply parsed from JSON.
///
/// Fields are optional on the wire so that a missing target or
/// justification becomes an ordinary failed verdict, not a parse error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDecision {
    #[serde(default)]
    pub vote_against: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// The reply could not be read as an [`AgentDecision`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed decision: {0}")]
pub struct DecisionError(pub String);

impl AgentDecision {
    /// Parse a raw reply. The reply must be a single JSON object.
    pub fn parse(raw: &str) -> Result<Self, DecisionError> {
        let value = json_object(raw).map_err(DecisionError)?;
        serde_json::from_value(value).map_err(|e| DecisionError(e.to_string()))
    }

    /// Vote target, if present and non-blank.
    pub fn target(&self) -> Option<&str> {
        self.vote_against
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Justification, if present and non-blank.
    pub fn justification(&self) -> Option<&str> {
        self.reason
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Parse `raw` as JSON and require a top-level object. Arrays are refused
/// even where a derived deserializer would fill fields by position.
pub(crate) fn json_object(raw: &str) -> Result<serde_json::Value, String> {
    let value: serde_json::Value = serde_json::from_str(raw.trim()).map_err(|e| e.to_string())?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(format!("expected a JSON object, got {}", json_kind(&value)))
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Outcome of evaluating one reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Failed,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Why a reply was rejected locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    SelfVoteOrMissingTarget,
    InvalidTarget,
    MissingJustification,
    Plagiarism,
    MalformedDecision,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfVoteOrMissingTarget => write!(f, "self-vote or missing target"),
            Self::InvalidTarget => write!(f, "invalid target"),
            Self::MissingJustification => write!(f, "missing justification"),
            Self::Plagiarism => write!(f, "plagiarism"),
            Self::MalformedDecision => write!(f, "malformed decision"),
        }
    }
}

/// Result of evaluating a deliberation reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    #[serde(rename = "evaluation")]
    pub outcome: Outcome,
    /// Target of the vote; always set on `pass`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_against: Option<AgentId>,
    pub reason: String,
    /// Local rejection cause, `None` for passes and judge failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
}

impl Verdict {
    pub fn pass(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Pass,
            vote_against: Some(target.into()),
            reason: reason.into(),
            rejection: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Failed,
            vote_against: None,
            reason: reason.into(),
            rejection: None,
        }
    }

    pub fn rejected(rejection: Rejection) -> Self {
        Self {
            rejection: Some(rejection),
            ..Self::failed(rejection.to_string())
        }
    }

    /// Rejection with extra detail appended to the reason.
    pub fn rejected_with(rejection: Rejection, detail: &str) -> Self {
        Self {
            rejection: Some(rejection),
            ..Self::failed(format!("{}: {}", rejection, detail))
        }
    }

    pub fn is_pass(&self) -> bool {
        self.outcome == Outcome::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_decision() {
        let decision =
            AgentDecision::parse(r#" {"voteAgainst": "Beta", "reason": "too slow"} "#).unwrap();
        assert_eq!(decision.target(), Some("Beta"));
        assert_eq!(decision.justification(), Some("too slow"));
    }

    #[test]
    fn test_parse_tolerates_missing_fields() {
        let decision = AgentDecision::parse(r#"{"reason": "x"}"#).unwrap();
        assert_eq!(decision.target(), None);

        let decision = AgentDecision::parse(r#"{"voteAgainst": "B", "reason": "   "}"#).unwrap();
        assert_eq!(decision.justification(), None);
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(AgentDecision::parse("I vote against Beta").is_err());
        assert!(AgentDecision::parse(r#"["Beta"]"#).is_err());
        assert!(AgentDecision::parse(r#"{"voteAgainst": 7}"#).is_err());

        let err = AgentDecision::parse(r#"["B", "B hesitates before answering"]"#).unwrap_err();
        assert!(err.to_string().contains("expected a JSON object, got an array"));
        assert!(AgentDecision::parse(r#""Beta""#).is_err());
    }

    #[test]
    fn test_rejection_reasons() {
        let v = Verdict::rejected(Rejection::InvalidTarget);
        assert!(!v.is_pass());
        assert_eq!(v.reason, "invalid target");
        assert_eq!(v.rejection, Some(Rejection::InvalidTarget));

        let v = Verdict::rejected_with(Rejection::MalformedDecision, "expected value");
        assert_eq!(v.reason, "malformed decision: expected value");
    }

    #[test]
    fn test_verdict_wire_shape() {
        let v = Verdict::pass("Beta", "slow");
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["evaluation"], "pass");
        assert_eq!(json["voteAgainst"], "Beta");
        assert!(json.get("rejection").is_none());
    }
}
