//! Vote tally and end-condition check.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::roster::{AgentId, Roster};

/// Errors from tally updates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TallyError {
    #[error("agent not in tally: {0}")]
    UnknownAgent(String),
}

/// Per-agent count, shaped `{"against": n}` on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgainstCount {
    pub against: u32,
}

/// Against-votes per agent. Counts only ever increase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteTally {
    counts: BTreeMap<AgentId, AgainstCount>,
}

impl VoteTally {
    /// Zeroed tally for every agent in the roster.
    pub fn new(roster: &Roster) -> Self {
        Self {
            counts: roster
                .agents()
                .iter()
                .map(|a| (a.id.clone(), AgainstCount::default()))
                .collect(),
        }
    }

    /// Add one against-vote and return the new count.
    pub fn record_against(&mut self, agent: &str) -> Result<u32, TallyError> {
        let entry = self
            .counts
            .get_mut(agent)
            .ok_or_else(|| TallyError::UnknownAgent(agent.to_string()))?;
        entry.against += 1;
        debug!(agent, against = entry.against, "tally updated");
        Ok(entry.against)
    }

    pub fn against(&self, agent: &str) -> u32 {
        self.counts.get(agent).map(|c| c.against).unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().map(|c| c.against).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), v.against))
    }
}

/// Decides when a vote threshold has been reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndConditionChecker {
    threshold: u32,
}

impl EndConditionChecker {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    /// The losing agent, if any count has reached the threshold.
    ///
    /// Ties go to the lowest roster ordinal.
    pub fn loser<'r>(&self, tally: &VoteTally, roster: &'r Roster) -> Option<&'r str> {
        roster
            .agents()
            .iter()
            .find(|a| tally.against(&a.id) >= self.threshold)
            .map(|a| a.id.as_str())
    }
}
