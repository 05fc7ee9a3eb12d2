//! Turns Engine
//!
//! Turn/verdict engine for "Turns", a deliberation-and-voting game played
//! by a fixed roster of LLM agents, optionally refereed by a judge model.
//!
//! # Game
//!
//! - **Opening**: every agent argues once, in free text, that it is the
//!   machine.
//! - **Deliberation**: each turn the acting agent votes against another
//!   agent with a JSON decision `{"voteAgainst": ..., "reason": ...}`.
//!   The decision is validated (rule-based or by the judge), checked for
//!   plagiarized justifications, corrected at most once, and tallied. A
//!   reply that still fails counts as a vote against its own author.
//! - The game ends when an agent reaches the vote threshold, or when the
//!   hard turn limit is hit.
//!
//! # Usage
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use turns_engine::{Agent, EngineConfig, InferenceClient, Roster, StartOptions, TurnEngine};
//! # async fn demo(client: Arc<dyn InferenceClient>) -> Result<(), Box<dyn std::error::Error>> {
//! let roster = Roster::new(vec![Agent::new("Alpha", "gemma:2b"), Agent::new("Beta", "phi3")])?;
//! let mut engine = TurnEngine::new(roster, client, EngineConfig::default());
//! engine.start(StartOptions::default())?;
//! let snapshot = engine.play_turn().await?;
//! println!("{}", snapshot.status_line());
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod config;
pub mod correction;
pub mod decision;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod history;
pub mod inference;
pub mod plagiarism;
pub mod prompts;
pub mod roster;
pub mod session;
pub mod tally;

pub use channel::AgentChannel;
pub use config::{EngineConfig, EngineConfigError};
pub use correction::{AttemptRecord, CorrectionController, CorrectionOutcome, MAX_ATTEMPTS};
pub use decision::{AgentDecision, DecisionError, Outcome, Rejection, Verdict};
pub use engine::{SharedTurnEngine, StartOptions, TurnEngine};
pub use error::{TurnError, TurnResult};
pub use evaluator::{
    build_evaluator, EvaluationError, EvaluatorKind, JudgeEvaluator, ResponseEvaluator,
    RuleBasedEvaluator,
};
pub use history::{History, Message};
pub use inference::{
    chat_with_timeout, ChatMessage, ChatRequest, ChatResponse, InferenceClient, InferenceError,
    Role,
};
pub use plagiarism::{PlagiarismDetector, PlagiarismMatch};
pub use roster::{Agent, AgentId, Roster, RosterError, ShuffleMode};
pub use session::{EndReason, GamePhase, GameSession, TurnSnapshot};
pub use tally::{EndConditionChecker, TallyError, VoteTally};
