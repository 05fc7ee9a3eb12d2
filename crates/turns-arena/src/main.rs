use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use turns_arena::{ArenaConfig, OllamaClient};
use turns_engine::{ShuffleMode, StartOptions, TurnEngine};

#[derive(Parser, Debug)]
#[command(name = "turns-arena", about = "Run a game of Turns against Ollama models")]
struct Args {
    /// TOML config file (defaults: built-in roster, TURNS_OLLAMA_ENDPOINT)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Let the judge model validate decisions
    #[arg(long)]
    judge: bool,

    /// Keep the configured roster order
    #[arg(long)]
    no_shuffle: bool,

    /// Seed for a reproducible roster shuffle
    #[arg(long)]
    seed: Option<u64>,

    /// Print the final snapshot as JSON
    #[arg(long)]
    json: bool,

    /// Consecutive retries for a turn whose model call failed
    #[arg(long, default_value_t = 3)]
    max_retries: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ArenaConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ArenaConfig::default(),
    };
    config.validate().context("validating config")?;
    let roster = config.roster().context("building roster")?;

    // Transport timeout sits just above the engine's own per-call timeout
    let transport_timeout = config.engine.inference_timeout() + Duration::from_secs(5);
    let client = OllamaClient::new(config.ollama_endpoint.clone(), transport_timeout)
        .context("building HTTP client")?;

    info!(
        endpoint = client.endpoint(),
        agents = ?roster.names(),
        judge_mode = args.judge,
        "turns-arena starting"
    );

    let shuffle = if args.no_shuffle {
        ShuffleMode::Keep
    } else {
        match args.seed.or(config.shuffle_seed) {
            Some(seed) => ShuffleMode::Seeded(seed),
            None => ShuffleMode::Random,
        }
    };

    let mut engine = TurnEngine::new(roster, Arc::new(client), config.engine.clone());
    engine
        .start(StartOptions {
            judge_mode: args.judge,
            shuffle,
        })
        .context("starting game")?;

    let snapshot = engine
        .run(args.max_retries)
        .await
        .context("game aborted")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("{}", snapshot.status_line());
        for (agent, against) in snapshot.votes.iter() {
            println!("  {agent}: {against}");
        }
        if let Some(loser) = &snapshot.loser {
            println!("{loser} was voted out.");
        }
    }

    Ok(())
}
