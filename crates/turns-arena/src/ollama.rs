//! Ollama chat client: the concrete inference collaborator.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;
use turns_engine::{ChatRequest, ChatResponse, InferenceClient, InferenceError};

/// Client for an Ollama-compatible `/api/chat` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    endpoint: String,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Build a client. `timeout` bounds the whole HTTP exchange; the engine
    /// applies its own per-call timeout on top.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl InferenceClient for OllamaClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, InferenceError> {
        let start = Instant::now();
        let model = request.model.clone();

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| InferenceError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::Parse(e.to_string()))?;

        debug!(
            model = %model,
            eval_count = ?parsed.eval_count,
            response_time_ms = start.elapsed().as_millis() as u64,
            "ollama chat complete"
        );
        Ok(parsed)
    }
}
