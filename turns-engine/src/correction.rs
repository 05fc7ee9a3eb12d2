//! Correction controller: evaluates a deliberation reply and, when it
//! fails, asks the agent for exactly one corrected reply.
//!
//! The retry is an explicit bounded loop: the original attempt plus one
//! correction. A second failure is final for the turn.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::channel::AgentChannel;
use crate::decision::{AgentDecision, Rejection, Verdict};
use crate::error::TurnResult;
use crate::evaluator::{EvaluationError, ResponseEvaluator};
use crate::history::History;
use crate::inference::ChatMessage;
use crate::plagiarism::{PlagiarismDetector, PlagiarismMatch};
use crate::prompts;
use crate::roster::{Agent, Roster};
use crate::session::GameSession;

/// Original attempt plus one correction.
pub const MAX_ATTEMPTS: u32 = 2;

/// One evaluated reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Attempt number (1-indexed).
    pub attempt: u32,
    pub reply: String,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plagiarism: Option<PlagiarismMatch>,
}

/// Final result of a deliberation turn's evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionOutcome {
    /// Verdict of the last attempt.
    pub verdict: Verdict,
    pub attempts: Vec<AttemptRecord>,
}

impl CorrectionOutcome {
    /// Whether a correction was requested.
    pub fn corrected(&self) -> bool {
        self.attempts.len() > 1
    }
}

/// The justification a reply offers for plagiarism comparison.
///
/// A parseable decision must carry a non-blank `reason`. Replies that are
/// not decisions (possible when a judge accepts free text) are compared
/// whole.
pub fn candidate_justification(reply: &str) -> Result<String, Rejection> {
    match AgentDecision::parse(reply) {
        Ok(decision) => decision
            .justification()
            .map(str::to_string)
            .ok_or(Rejection::MissingJustification),
        Err(_) => Ok(reply.trim().to_string()),
    }
}

/// Runs evaluation, plagiarism detection and the single correction retry.
pub struct CorrectionController<'a> {
    channel: &'a AgentChannel,
    evaluator: &'a dyn ResponseEvaluator,
    detector: PlagiarismDetector,
}

impl<'a> CorrectionController<'a> {
    pub fn new(
        channel: &'a AgentChannel,
        evaluator: &'a dyn ResponseEvaluator,
        detector: PlagiarismDetector,
    ) -> Self {
        Self {
            channel,
            evaluator,
            detector,
        }
    }

    /// Evaluate `reply`, then check a passing reply for plagiarism.
    pub async fn assess(
        &self,
        agent: &Agent,
        reply: &str,
        roster: &Roster,
        history: &History,
    ) -> Result<(Verdict, Option<PlagiarismMatch>), EvaluationError> {
        let verdict = self.evaluator.evaluate(agent, reply, roster, history).await?;
        if !verdict.is_pass() {
            return Ok((verdict, None));
        }

        let justification = match candidate_justification(reply) {
            Ok(text) => text,
            Err(rejection) => return Ok((Verdict::rejected(rejection), None)),
        };

        match self.detector.check(&justification, history) {
            Some(hit) => {
                warn!(
                    agent = %agent.id,
                    copied = hit.sequence,
                    ratio = hit.ratio,
                    "plagiarized justification"
                );
                Ok((Verdict::rejected(Rejection::Plagiarism), Some(hit)))
            }
            None => Ok((verdict, None)),
        }
    }

    /// Evaluate `first_reply`, requesting one correction on failure.
    ///
    /// Every evaluated reply is appended to the session history, flagged
    /// with `penalty` when it failed. `context` is the projected history
    /// the original request was built from.
    pub async fn resolve(
        &self,
        agent: &Agent,
        roster: &Roster,
        mut context: Vec<ChatMessage>,
        first_reply: String,
        session: &mut GameSession,
    ) -> TurnResult<CorrectionOutcome> {
        let mut attempts = Vec::new();
        let mut reply = first_reply;
        let mut attempt = 1;

        loop {
            let (verdict, plagiarism) =
                self.assess(agent, &reply, roster, &session.history).await?;
            session
                .history
                .push_agent(&agent.id, &reply, !verdict.is_pass());

            info!(
                agent = %agent.id,
                attempt,
                outcome = %verdict.outcome,
                reason = %verdict.reason,
                "reply evaluated"
            );

            let done = verdict.is_pass() || attempt >= MAX_ATTEMPTS;
            let reason = verdict.reason.clone();
            attempts.push(AttemptRecord {
                attempt,
                reply: reply.clone(),
                verdict: verdict.clone(),
                plagiarism,
            });

            if done {
                return Ok(CorrectionOutcome { verdict, attempts });
            }

            context.push(ChatMessage::system(prompts::rejected_reply_notice(&reply)));
            let prompt = prompts::correction_prompt(agent, &reason);
            let response = self.channel.ask(agent, &context, prompt, true).await?;
            session.record_eval_rate(&agent.id, &response);
            reply = response.message.content;
            attempt += 1;
        }
    }
}
