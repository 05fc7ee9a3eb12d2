//! Turn engine: drives one game, one turn per step.
//!
//! # Turn Flow
//!
//! ```text
//! start → Opening (turn < roster size)
//!           │  free-text argument, appended unconditionally
//!           ▼
//!         Deliberation
//!           │  JSON vote → evaluate → plagiarism → [correction ×1] → tally
//!           ├─ against-count reaches threshold → Terminal (loser)
//!           ├─ turn limit reached            → Terminal
//!           └─ otherwise                     → next agent
//! ```
//!
//! Each step works on a draft copy of the session and commits it only when
//! the turn completes, so a failed inference call leaves history, tallies
//! and the turn counter untouched.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::channel::AgentChannel;
use crate::config::EngineConfig;
use crate::correction::CorrectionController;
use crate::decision::Verdict;
use crate::error::{TurnError, TurnResult};
use crate::evaluator::{build_evaluator, ResponseEvaluator};
use crate::inference::{ChatMessage, InferenceClient};
use crate::plagiarism::PlagiarismDetector;
use crate::prompts;
use crate::roster::{Agent, Roster, ShuffleMode};
use crate::session::{EndReason, GamePhase, GameSession, TurnSnapshot};
use crate::tally::EndConditionChecker;

/// Options for starting a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StartOptions {
    /// Delegate verdicts to the judge instead of local rules.
    pub judge_mode: bool,
    /// How to reorder the roster before the first turn.
    pub shuffle: ShuffleMode,
}

/// Shared reference to a TurnEngine; the mutex serializes turns.
pub type SharedTurnEngine = Arc<Mutex<TurnEngine>>;

/// Owns the roster, collaborators and the single active game session.
pub struct TurnEngine {
    roster: Roster,
    config: EngineConfig,
    client: Arc<dyn InferenceClient>,
    channel: AgentChannel,
    detector: PlagiarismDetector,
    checker: EndConditionChecker,
    evaluator: Option<Box<dyn ResponseEvaluator>>,
    session: Option<GameSession>,
}

impl TurnEngine {
    pub fn new(roster: Roster, client: Arc<dyn InferenceClient>, config: EngineConfig) -> Self {
        let channel = AgentChannel::new(client.clone(), &config);
        Self {
            roster,
            channel,
            client,
            detector: PlagiarismDetector::new(config.plagiarism_ratio),
            checker: EndConditionChecker::new(config.vote_threshold),
            config,
            evaluator: None,
            session: None,
        }
    }

    /// Wrap in a mutex for use from concurrent front ends.
    pub fn shared(self) -> SharedTurnEngine {
        Arc::new(Mutex::new(self))
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    /// Reset the game: reorder the roster, clear history, tallies and stats,
    /// and fix the evaluator variant for the whole game.
    pub fn start(&mut self, options: StartOptions) -> TurnResult<TurnSnapshot> {
        self.config.validate()?;
        let roster = self.roster.shuffle(options.shuffle);
        let evaluator = build_evaluator(
            options.judge_mode,
            &roster,
            self.client.clone(),
            &self.config,
        )?;

        info!(
            order = ?roster.names(),
            judge_mode = options.judge_mode,
            evaluator = %evaluator.kind(),
            "game started"
        );

        self.roster = roster;
        self.evaluator = Some(evaluator);
        let session = GameSession::new(&self.roster, options.judge_mode);
        let snapshot = session.snapshot(&self.roster);
        self.session = Some(session);
        Ok(snapshot)
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> TurnResult<TurnSnapshot> {
        self.session
            .as_ref()
            .map(|s| s.snapshot(&self.roster))
            .ok_or(TurnError::NotStarted)
    }

    /// Play exactly one turn.
    pub async fn play_turn(&mut self) -> TurnResult<TurnSnapshot> {
        let session = self.session.as_ref().ok_or(TurnError::NotStarted)?;
        let evaluator = self.evaluator.as_deref().ok_or(TurnError::NotStarted)?;
        if session.is_terminal() {
            return Err(TurnError::GameOver);
        }

        let mut draft = session.clone();
        let turn = draft.turn_counter;
        let phase = draft.phase(self.roster.len());
        let agent = self.roster.for_turn(turn).clone();

        info!(turn, agent = %agent.id, phase = %phase, "turn started");

        draft.last_attempts.clear();

        match phase {
            GamePhase::Opening => {
                let prompt = prompts::opening_prompt(&agent, &self.roster);
                let response = self.channel.ask(&agent, &[], prompt, false).await?;
                draft.record_eval_rate(&agent.id, &response);
                draft.history.push_agent(&agent.id, response.content(), false);
            }
            GamePhase::Deliberation => {
                let mut context = draft.history.project_for(&agent.id);
                context.push(ChatMessage::assistant(prompts::turn_metadata(
                    turn,
                    &self.roster,
                    &draft.votes,
                )));
                let prompt = prompts::deliberation_prompt(&agent, &self.roster);
                let response = self.channel.ask(&agent, &context, prompt, true).await?;
                draft.record_eval_rate(&agent.id, &response);

                let controller = CorrectionController::new(&self.channel, evaluator, self.detector);
                let outcome = controller
                    .resolve(
                        &agent,
                        &self.roster,
                        context,
                        response.message.content,
                        &mut draft,
                    )
                    .await?;
                if outcome.corrected() {
                    info!(
                        agent = %agent.id,
                        first = %outcome.attempts[0].verdict.reason,
                        plagiarized = outcome.attempts.iter().any(|a| a.plagiarism.is_some()),
                        "reply corrected"
                    );
                }
                Self::apply_verdict(&agent, &outcome.verdict, &mut draft)?;
                draft.last_attempts = outcome.attempts;
            }
            GamePhase::Terminal => return Err(TurnError::GameOver),
        }

        draft.turn_counter += 1;

        if phase == GamePhase::Deliberation {
            if let Some(loser) = self.checker.loser(&draft.votes, &self.roster) {
                info!(loser, against = draft.votes.against(loser), "vote threshold reached");
                draft.end = Some(EndReason::VoteThreshold {
                    loser: loser.to_string(),
                });
            }
        }

        let limit = self.config.turn_limit(self.roster.len());
        if draft.end.is_none() && draft.turn_counter >= limit {
            warn!(turns = draft.turn_counter, "turn limit reached without a loser");
            draft.end = Some(EndReason::TurnLimit {
                turns: draft.turn_counter,
            });
        }

        let snapshot = draft.snapshot(&self.roster);
        info!(status = %snapshot.status_line(), "turn complete");
        self.session = Some(draft);
        Ok(snapshot)
    }

    /// Play turns until the game ends.
    ///
    /// A turn that fails with a retryable error is repeated up to
    /// `max_retries` consecutive times before the error is returned.
    pub async fn run(&mut self, max_retries: u32) -> TurnResult<TurnSnapshot> {
        let mut failures = 0;
        loop {
            let snapshot = self.snapshot()?;
            if snapshot.is_terminal() {
                return Ok(snapshot);
            }
            match self.play_turn().await {
                Ok(_) => failures = 0,
                Err(e) if e.is_retryable() && failures < max_retries => {
                    failures += 1;
                    warn!(error = %e, attempt = failures, "turn failed, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Tally the final verdict of a deliberation turn.
    fn apply_verdict(agent: &Agent, verdict: &Verdict, draft: &mut GameSession) -> TurnResult<()> {
        match verdict.vote_against.as_deref() {
            Some(target) if verdict.is_pass() => {
                draft.votes.record_against(target)?;
                draft
                    .history
                    .push_system(&prompts::vote_notice(&agent.id, target));
                info!(voter = %agent.id, target, "vote counted");
            }
            _ => {
                draft.votes.record_against(&agent.id)?;
                draft
                    .history
                    .push_system(&prompts::penalty_notice(&agent.id, &verdict.reason));
                info!(agent = %agent.id, reason = %verdict.reason, "self-penalty applied");
            }
        }
        Ok(())
    }
}
