//! Turns Arena
//!
//! Runs a Turns game against Ollama-served models: TOML/env configuration
//! and the HTTP inference client behind the engine's `InferenceClient` seam.

pub mod config;
pub mod ollama;

pub use config::{AgentSpec, ArenaConfig, ConfigError};
pub use ollama::OllamaClient;
