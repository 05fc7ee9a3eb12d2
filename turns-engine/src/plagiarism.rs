//! Plagiarism detection for vote justifications.
//!
//! A justification is compared against every earlier non-system message in
//! the game, not only the current round, using Levenshtein distance
//! normalized by the candidate's length in characters.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decision::AgentDecision;
use crate::history::History;
use crate::roster::AgentId;

/// A prior message the candidate was found to copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlagiarismMatch {
    /// Sequence number of the copied message.
    pub sequence: u64,
    pub author: Option<AgentId>,
    pub distance: usize,
    pub ratio: f64,
}

/// Text a prior message contributes to the comparison: its `reason` field
/// when the content is a JSON decision, the whole content otherwise.
/// Always trimmed.
pub fn comparable_text(content: &str) -> String {
    match AgentDecision::parse(content) {
        Ok(AgentDecision {
            reason: Some(reason),
            ..
        }) => reason.trim().to_string(),
        _ => content.trim().to_string(),
    }
}

/// Whether `distance` over `length` falls under `threshold`.
///
/// Identical text always counts. The boundary is strict: a ratio equal to the
/// threshold is not plagiarism.
pub fn exceeds_similarity(distance: usize, length: usize, threshold: f64) -> bool {
    if distance == 0 {
        return true;
    }
    if length == 0 {
        return false;
    }
    (distance as f64 / length as f64) < threshold
}

/// Detector configured with a similarity threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlagiarismDetector {
    threshold: f64,
}

impl Default for PlagiarismDetector {
    fn default() -> Self {
        Self { threshold: 0.25 }
    }
}

impl PlagiarismDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// First prior message `justification` is too close to, if any.
    pub fn check(&self, justification: &str, history: &History) -> Option<PlagiarismMatch> {
        let justification = justification.trim();
        let length = justification.chars().count();

        history
            .iter()
            .filter(|m| !m.is_system())
            .find_map(|message| {
                let prior = comparable_text(&message.content);
                let distance = strsim::levenshtein(justification, &prior);
                if !exceeds_similarity(distance, length, self.threshold) {
                    return None;
                }
                let ratio = if length == 0 {
                    0.0
                } else {
                    distance as f64 / length as f64
                };
                debug!(
                    sequence = message.sequence,
                    distance, ratio, "justification matches prior message"
                );
                Some(PlagiarismMatch {
                    sequence: message.sequence,
                    author: message.author.clone(),
                    distance,
                    ratio,
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_boundary_is_strict() {
        // 0.25 exactly does not trigger
        assert!(!exceeds_similarity(1, 4, 0.25));
        assert!(!exceeds_similarity(250, 1000, 0.25));
        // 0.249 triggers
        assert!(exceeds_similarity(249, 1000, 0.25));
    }

    #[test]
    fn test_identical_always_triggers() {
        assert!(exceeds_similarity(0, 0, 0.25));
        assert!(exceeds_similarity(0, 10, 0.0));
    }

    #[test]
    fn test_comparable_text_extracts_reason() {
        assert_eq!(
            comparable_text(r#"{"voteAgainst":"B","reason":"B is slow"}"#),
            "B is slow"
        );
        assert_eq!(comparable_text("I am a machine"), "I am a machine");
        assert_eq!(
            comparable_text(r#"{"voteAgainst":"B"}"#),
            r#"{"voteAgainst":"B"}"#
        );
        assert_eq!(comparable_text(r#"{"reason":"  padded  "}"#), "padded");
        // positional arrays are not decisions
        assert_eq!(comparable_text(r#"["B","copied"]"#), r#"["B","copied"]"#);
    }

    fn history_with_reason(reason: &str) -> History {
        let mut history = History::new();
        history.push_agent(
            "A",
            &serde_json::json!({ "voteAgainst": "B", "reason": reason }).to_string(),
            false,
        );
        history
    }

    #[test]
    fn test_boundary_through_edit_distance() {
        let detector = PlagiarismDetector::default();
        // one edit over four characters: exactly 0.25
        assert!(detector.check("abcd", &history_with_reason("abce")).is_none());
        // one edit over five characters: 0.2
        let hit = detector
            .check("abcde", &history_with_reason("abcdf"))
            .unwrap();
        assert_eq!(hit.distance, 1);
        assert!((hit.ratio - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_padding_does_not_shift_ratio() {
        let detector = PlagiarismDetector::default();
        let hit = detector
            .check("  abcd ", &history_with_reason("   abcd   "))
            .unwrap();
        assert_eq!(hit.distance, 0);
        assert!(detector
            .check("abcd", &history_with_reason("  abce  "))
            .is_none());
    }

    #[test]
    fn test_detects_verbatim_copy_from_other_agent() {
        let mut history = History::new();
        history.push_agent("A", r#"{"voteAgainst":"B","reason":"B is slow"}"#, false);
        history.push_system("A voted against B");

        let hit = PlagiarismDetector::default()
            .check("B is slow", &history)
            .unwrap();
        assert_eq!(hit.sequence, 0);
        assert_eq!(hit.author.as_deref(), Some("A"));
        assert_eq!(hit.distance, 0);
    }

    #[test]
    fn test_scans_entire_history() {
        let mut history = History::new();
        history.push_agent(
            "C",
            r#"{"voteAgainst":"A","reason":"A answers far too quickly to be human"}"#,
            false,
        );
        for i in 0..20 {
            history.push_agent("B", &format!("unrelated opening argument number {}", i), false);
        }

        let hit = PlagiarismDetector::default()
            .check("A answers far too quickly to be a human", &history)
            .unwrap();
        assert_eq!(hit.sequence, 0);
    }

    #[test]
    fn test_ignores_system_messages() {
        let mut history = History::new();
        history.push_system("B is slow");
        assert!(PlagiarismDetector::default()
            .check("B is slow", &history)
            .is_none());
    }

    #[test]
    fn test_distinct_text_passes() {
        let mut history = History::new();
        history.push_agent("A", r#"{"voteAgainst":"B","reason":"B is slow"}"#, false);
        assert!(PlagiarismDetector::default()
            .check("C keeps contradicting itself about arithmetic", &history)
            .is_none());
    }
}
