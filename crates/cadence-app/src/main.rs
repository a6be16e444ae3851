//! # Cadence
//!
//! Headless player: loads a queue of catalog records, plays it through a
//! simulated media element, and takes transport commands on stdin.

mod config;
mod history;
mod playhead;
mod shell;

use anyhow::{bail, Context, Result};
use cadence_history::records::tracks_from_json;
use cadence_player::{CommandSink, PlaybackEngine};
use config::AppConfig;
use history::History;
use playhead::SimulatedPlayer;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they don't interleave with the status lines
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "cadence=info,cadence_player=debug,cadence_history=info".into()
            }),
        )
        .init();

    info!("Starting Cadence v{}", env!("CARGO_PKG_VERSION"));

    let Some(queue_path) = std::env::args().nth(1) else {
        bail!("usage: cadence <queue.json>");
    };
    let raw = std::fs::read_to_string(&queue_path)
        .with_context(|| format!("Failed to read queue file {queue_path}"))?;
    let queue = tracks_from_json(&raw).context("Invalid queue file")?;
    if queue.is_empty() {
        bail!("Queue file {queue_path} has no playable entries");
    }
    info!("Loaded {} tracks from {queue_path}", queue.len());

    let config = AppConfig::load()?;
    let history = History::from_config(&config)?;

    let (sink, commands) = CommandSink::new();
    let engine = PlaybackEngine::new(sink, history, config.player)?;

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let player = tokio::spawn(SimulatedPlayer::new(&queue).run(commands, event_tx, config.tick()));
    let pump = engine.attach(event_rx);

    shell::run(&engine, &queue).await?;

    info!("Shutting down");
    pump.abort();
    player.abort();
    Ok(())
}
