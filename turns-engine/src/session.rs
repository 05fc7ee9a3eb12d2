//! Game session: all mutable state of one game, and the snapshot exposed
//! after every step.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::correction::AttemptRecord;
use crate::history::History;
use crate::inference::ChatResponse;
use crate::roster::{AgentId, Roster};
use crate::tally::VoteTally;

/// Phase of a game, derived from the turn counter and end state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Each agent argues once, free text, no tallying.
    Opening,
    /// Agents vote against each other.
    Deliberation,
    /// No further turns are scheduled.
    Terminal,
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Opening => write!(f, "opening"),
            Self::Deliberation => write!(f, "deliberation"),
            Self::Terminal => write!(f, "terminal"),
        }
    }
}

/// Why a game ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum EndReason {
    /// An agent's against-count reached the threshold.
    VoteThreshold { loser: AgentId },
    /// The hard turn bound was reached first.
    TurnLimit { turns: u32 },
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VoteThreshold { loser } => write!(f, "vote_threshold ({})", loser),
            Self::TurnLimit { turns } => write!(f, "turn_limit ({} turns)", turns),
        }
    }
}

/// State of the active game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    /// Turns completed so far.
    pub turn_counter: u32,
    /// Whether verdicts come from the judge.
    pub judge_mode: bool,
    pub history: History,
    pub votes: VoteTally,
    /// Accumulated tokens-per-second per agent.
    pub eval_rates: BTreeMap<AgentId, f64>,
    pub end: Option<EndReason>,
    pub started_at: DateTime<Utc>,
    /// Evaluated replies of the latest deliberation turn, empty otherwise.
    pub last_attempts: Vec<AttemptRecord>,
}

impl GameSession {
    pub fn new(roster: &Roster, judge_mode: bool) -> Self {
        Self {
            turn_counter: 0,
            judge_mode,
            history: History::new(),
            votes: VoteTally::new(roster),
            eval_rates: roster.agents().iter().map(|a| (a.id.clone(), 0.0)).collect(),
            end: None,
            started_at: Utc::now(),
            last_attempts: Vec::new(),
        }
    }

    pub fn phase(&self, roster_size: usize) -> GamePhase {
        if self.end.is_some() {
            GamePhase::Terminal
        } else if (self.turn_counter as usize) < roster_size {
            GamePhase::Opening
        } else {
            GamePhase::Deliberation
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.end.is_some()
    }

    pub fn loser(&self) -> Option<&str> {
        match &self.end {
            Some(EndReason::VoteThreshold { loser }) => Some(loser),
            _ => None,
        }
    }

    /// Add the generation rate of an agent's reply, if reported.
    pub fn record_eval_rate(&mut self, agent: &str, response: &ChatResponse) {
        if let Some(rate) = response.tokens_per_second() {
            *self.eval_rates.entry(agent.to_string()).or_insert(0.0) += rate;
        }
    }

    pub fn snapshot(&self, roster: &Roster) -> TurnSnapshot {
        TurnSnapshot {
            turn_counter: self.turn_counter,
            phase: self.phase(roster.len()),
            judge_mode: self.judge_mode,
            votes: self.votes.clone(),
            message_history: self.history.clone(),
            end_condition: self.loser().is_some(),
            loser: self.loser().map(str::to_string),
            end_reason: self.end.clone(),
            eval_rates: self.eval_rates.clone(),
            last_attempts: self.last_attempts.clone(),
        }
    }
}

/// What a step returns to the front door.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnSnapshot {
    pub turn_counter: u32,
    pub phase: GamePhase,
    pub judge_mode: bool,
    pub votes: VoteTally,
    pub message_history: History,
    /// True once an agent has reached the vote threshold.
    pub end_condition: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loser: Option<AgentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_reason: Option<EndReason>,
    pub eval_rates: BTreeMap<AgentId, f64>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub last_attempts: Vec<AttemptRecord>,
}

impl TurnSnapshot {
    /// Whether the engine will refuse further turns.
    pub fn is_terminal(&self) -> bool {
        self.phase == GamePhase::Terminal
    }

    pub fn status_line(&self) -> String {
        let votes = self
            .votes
            .iter()
            .map(|(agent, n)| format!("{}={}", agent, n))
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            "[{}] turn {} | votes: {} | {} messages",
            self.phase,
            self.turn_counter,
            votes,
            self.message_history.len()
        )
    }
}
