use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use turns_engine::{Agent, EngineConfig, EngineConfigError, Roster, RosterError};

/// Default Ollama chat endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/api/chat";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid roster: {0}")]
    Roster(#[from] RosterError),

    #[error("invalid engine settings: {0}")]
    Engine(#[from] EngineConfigError),

    #[error("judge name {0:?} collides with an agent")]
    JudgeCollision(String),
}

/// A configured participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    pub model: String,
}

impl AgentSpec {
    fn new(name: &str, model: &str) -> Self {
        Self {
            name: name.to_string(),
            model: model.to_string(),
        }
    }

    fn to_agent(&self) -> Agent {
        Agent::new(self.name.trim(), self.model.trim())
    }
}

/// Top-level arena configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Ollama-compatible `/api/chat` URL.
    pub ollama_endpoint: String,
    /// Players, in initial roster order.
    pub agents: Vec<AgentSpec>,
    /// Judge used when judge mode is on.
    pub judge: Option<AgentSpec>,
    /// Seed for a reproducible roster shuffle.
    pub shuffle_seed: Option<u64>,
    pub engine: EngineConfig,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            ollama_endpoint: std::env::var("TURNS_OLLAMA_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.into()),
            agents: vec![
                AgentSpec::new("Alpha", "gemma:2b"),
                AgentSpec::new("Beta", "phi3"),
                AgentSpec::new("Gamma", "qwen:4b"),
            ],
            judge: Some(AgentSpec::new("Judge", "llama3.1:8b")),
            shuffle_seed: None,
            engine: EngineConfig::default(),
        }
    }
}

impl ArenaConfig {
    /// Load from a TOML file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the roster and the engine settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.roster()?;
        self.engine.validate()?;
        Ok(())
    }

    /// Build the engine roster (agents + judge), validating names.
    pub fn roster(&self) -> Result<Roster, ConfigError> {
        let roster = Roster::new(self.agents.iter().map(AgentSpec::to_agent).collect())?;
        match &self.judge {
            Some(judge) if roster.contains(judge.name.trim()) => {
                Err(ConfigError::JudgeCollision(judge.name.clone()))
            }
            Some(judge) => Ok(roster.with_judge(judge.to_agent())),
            None => Ok(roster),
        }
    }
}
