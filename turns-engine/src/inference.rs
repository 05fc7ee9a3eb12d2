//! Inference collaborator: the chat endpoint agents and the judge speak
//! through.
//!
//! The engine never performs I/O itself. Every call goes through
//! [`InferenceClient`] and is bounded by a timeout, so a hung endpoint
//! surfaces as [`InferenceError::Timeout`] instead of blocking the game.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Chat role on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
        }
    }
}

/// One message of a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Structured output constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    Json,
}

/// Sampling options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Request body for the chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub raw: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ChatOptions>,
}

impl ChatRequest {
    /// Non-streaming request for `model`.
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: false,
            raw: true,
            keep_alive: None,
            format: None,
            options: None,
        }
    }

    pub fn json(mut self) -> Self {
        self.format = Some(ResponseFormat::Json);
        self
    }

    pub fn keep_alive(mut self, keep_alive: Option<String>) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options = Some(ChatOptions {
            temperature: Some(temperature),
        });
        self
    }
}

/// Message body of a chat response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub content: String,
}

/// Response from the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: ResponseMessage,
    /// Tokens generated.
    #[serde(default)]
    pub eval_count: Option<u64>,
    /// Generation time in nanoseconds.
    #[serde(default)]
    pub eval_duration: Option<u64>,
}

impl ChatResponse {
    /// Plain response without timing statistics.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            message: ResponseMessage {
                content: content.into(),
            },
            eval_count: None,
            eval_duration: None,
        }
    }

    pub fn content(&self) -> &str {
        &self.message.content
    }

    /// Generation throughput in tokens per second, when the endpoint reports it.
    pub fn tokens_per_second(&self) -> Option<f64> {
        match (self.eval_count, self.eval_duration) {
            (Some(count), Some(duration)) if duration > 0 => {
                Some(count as f64 / duration as f64 * 1e9)
            }
            _ => None,
        }
    }
}

/// Errors from the inference collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response parse error: {0}")]
    Parse(String),

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

/// Chat endpoint used by agents and the judge.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Send one non-streaming chat request.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, InferenceError>;
}

/// Run `request` against `client`, giving up after `timeout`.
pub async fn chat_with_timeout(
    client: &dyn InferenceClient,
    request: ChatRequest,
    timeout: Duration,
) -> Result<ChatResponse, InferenceError> {
    let model = request.model.clone();
    let start = Instant::now();
    let response = tokio::time::timeout(timeout, client.chat(request))
        .await
        .map_err(|_| InferenceError::Timeout(timeout))??;
    debug!(
        model = %model,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "inference call complete"
    );
    Ok(response)
}
