//! Roster: the ordered set of agents taking part in one game, plus the
//! optional judge.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Agent identifier (the agent's unique display name).
pub type AgentId = String;

/// A participant in the game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Agent {
    /// Unique name, also used as the vote target.
    pub id: AgentId,
    /// Opaque model reference passed to the inference endpoint.
    pub model: String,
    /// Position in the current roster order (0-indexed).
    #[serde(default)]
    pub ordinal: usize,
}

impl Agent {
    pub fn new(id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            ordinal: 0,
        }
    }
}

impl std::fmt::Display for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Errors from roster construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    #[error("roster needs at least {min} agents, got {got}")]
    TooSmall { got: usize, min: usize },

    #[error("agent name must not be empty")]
    EmptyName,

    #[error("duplicate agent name: {0}")]
    DuplicateName(String),
}

/// How the roster is reordered when a game starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShuffleMode {
    /// Keep the current order.
    Keep,
    /// Random permutation from the thread-local entropy source.
    #[default]
    Random,
    /// Reproducible permutation derived from the seed.
    Seeded(u64),
}

/// Ordered agents for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RosterRecord")]
pub struct Roster {
    agents: Vec<Agent>,
    judge: Option<Agent>,
}

/// Unvalidated wire form of a [`Roster`].
#[derive(Deserialize)]
struct RosterRecord {
    agents: Vec<Agent>,
    #[serde(default)]
    judge: Option<Agent>,
}

impl TryFrom<RosterRecord> for Roster {
    type Error = RosterError;

    fn try_from(record: RosterRecord) -> Result<Self, Self::Error> {
        let roster = Roster::new(record.agents)?;
        Ok(match record.judge {
            Some(judge) => roster.with_judge(judge),
            None => roster,
        })
    }
}

impl Roster {
    /// Minimum number of agents: everyone must have someone else to vote against.
    pub const MIN_AGENTS: usize = 2;

    /// Build a roster, assigning ordinals in the given order.
    pub fn new(agents: Vec<Agent>) -> Result<Self, RosterError> {
        if agents.len() < Self::MIN_AGENTS {
            return Err(RosterError::TooSmall {
                got: agents.len(),
                min: Self::MIN_AGENTS,
            });
        }

        let mut seen = HashSet::new();
        for agent in &agents {
            if agent.id.trim().is_empty() {
                return Err(RosterError::EmptyName);
            }
            if !seen.insert(agent.id.as_str()) {
                return Err(RosterError::DuplicateName(agent.id.clone()));
            }
        }

        Ok(Self {
            agents: Self::renumber(agents),
            judge: None,
        })
    }

    /// Attach the judge used in judge-delegated evaluation.
    pub fn with_judge(mut self, judge: Agent) -> Self {
        self.judge = Some(judge);
        self
    }

    pub fn judge(&self) -> Option<&Agent> {
        self.judge.as_ref()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Agent whose turn it is for the given turn counter (roster-cyclic).
    pub fn for_turn(&self, turn: u32) -> &Agent {
        &self.agents[turn as usize % self.agents.len()]
    }

    pub fn get(&self, id: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Agent names in roster order.
    pub fn names(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.id.as_str()).collect()
    }

    /// Names of every agent except `id`, in roster order.
    pub fn others(&self, id: &str) -> Vec<&str> {
        self.agents
            .iter()
            .filter(|a| a.id != id)
            .map(|a| a.id.as_str())
            .collect()
    }

    /// Return a permutation of the same agents with ordinals reassigned.
    ///
    /// Identities (name, model) and the judge are untouched.
    pub fn shuffle(&self, mode: ShuffleMode) -> Roster {
        let mut agents = self.agents.clone();
        match mode {
            ShuffleMode::Keep => {}
            ShuffleMode::Random => agents.shuffle(&mut rand::thread_rng()),
            ShuffleMode::Seeded(seed) => agents.shuffle(&mut StdRng::seed_from_u64(seed)),
        }
        Roster {
            agents: Self::renumber(agents),
            judge: self.judge.clone(),
        }
    }

    fn renumber(mut agents: Vec<Agent>) -> Vec<Agent> {
        for (i, agent) in agents.iter_mut().enumerate() {
            agent.ordinal = i;
        }
        agents
    }
}
