//! Agent channel: how the engine asks an agent for a reply.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{TurnError, TurnResult};
use crate::inference::{chat_with_timeout, ChatMessage, ChatRequest, ChatResponse, InferenceClient};
use crate::roster::Agent;

/// Sends prompts to agents through the inference collaborator.
#[derive(Clone)]
pub struct AgentChannel {
    client: Arc<dyn InferenceClient>,
    timeout: Duration,
    keep_alive: Option<String>,
}

impl AgentChannel {
    pub fn new(client: Arc<dyn InferenceClient>, config: &EngineConfig) -> Self {
        Self {
            client,
            timeout: config.inference_timeout(),
            keep_alive: config.keep_alive.clone(),
        }
    }

    /// Ask `agent` to answer `prompt` given `context`.
    ///
    /// `structured` requests a JSON reply. Any transport failure or timeout
    /// becomes [`TurnError::AgentUnavailable`].
    pub async fn ask(
        &self,
        agent: &Agent,
        context: &[ChatMessage],
        prompt: String,
        structured: bool,
    ) -> TurnResult<ChatResponse> {
        let mut messages = context.to_vec();
        messages.push(ChatMessage::user(prompt));

        let mut request =
            ChatRequest::new(&agent.model, messages).keep_alive(self.keep_alive.clone());
        if structured {
            request = request.json();
        }

        debug!(
            agent = %agent.id,
            model = %agent.model,
            messages = request.messages.len(),
            structured,
            "requesting agent reply"
        );

        chat_with_timeout(self.client.as_ref(), request, self.timeout)
            .await
            .map_err(|source| {
                warn!(agent = %agent.id, error = %source, "agent unavailable");
                TurnError::AgentUnavailable {
                    agent: agent.id.clone(),
                    source,
                }
            })
    }
}
