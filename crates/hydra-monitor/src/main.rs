//! Composition root for the monitor pipeline binary: wires the ingestion
//! pipeline, dedup engine, AI gateway, and scheduled-report task together
//! behind one Telegram channel adapter, following the gateway's
//! `AppState`-plus-`tokio::main` shape.

mod category;
mod db;
mod error;
mod export;
mod format;
mod ingest;
mod report;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use hydra_channels::ChannelManager;
use hydra_core::config::HydraConfig;
use rusqlite::Connection;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "hydra-monitor", about = "Multi-channel ingestion, dedup, and report scheduler")]
struct Cli {
    /// Path to a TOML config file. Overlaid with `HYDRA_*` env vars.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured log level (e.g. "debug", "hydra_monitor=trace").
    #[arg(long)]
    log_level: Option<String>,

    /// Load config, open the database, and build the pipeline state without
    /// connecting any channel adapter — exercises startup wiring and config
    /// loading without touching a live transport or sending anything.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = HydraConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        eprintln!("config load failed ({e}), using defaults");
        HydraConfig::default()
    });

    let log_level = cli.log_level.clone().unwrap_or_else(|| config.log.level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level.clone())),
        )
        .init();

    let db_conn = Connection::open(&config.database.path)?;
    let gateway_conn = Connection::open(&config.database.path)?;
    let state = Arc::new(AppState::new(config.clone(), db_conn, gateway_conn)?);

    let (inbound_tx, mut inbound_rx) = mpsc::channel(256);
    let mut channels = ChannelManager::new();

    if let Some(bot_token) = config.monitor.bot_token.clone() {
        channels.register(Box::new(hydra_telegram::TelegramChannel::new(bot_token, inbound_tx)));
    } else {
        warn!("no bot token configured, the monitor will not receive any updates");
        drop(inbound_tx);
    }

    if cli.dry_run {
        warn!("dry-run: skipping channel connect, no updates will be received or sent");
    } else {
        channels.connect_all().await;
    }
    let channels = Arc::new(channels);

    let cancel = CancellationToken::new();

    let ingest_state = state.clone();
    let ingest_channels = channels.clone();
    let ingest_cancel = cancel.clone();
    let ingest_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                update = inbound_rx.recv() => {
                    match update {
                        Some(update) => {
                            ingest::handle_update(&ingest_state, &ingest_channels, update).await;
                        }
                        None => {
                            info!("ingestion: inbound channel closed, stopping");
                            return;
                        }
                    }
                }
                _ = ingest_cancel.cancelled() => {
                    info!("ingestion: cancellation requested, stopping");
                    return;
                }
            }
        }
    });

    let scheduler_state = state.clone();
    let scheduler_channels = channels.clone();
    let scheduler_cancel = cancel.clone();
    let scheduler_task =
        tokio::spawn(async move { report::run_scheduler(&scheduler_state, &scheduler_channels, scheduler_cancel).await });

    info!("hydra-monitor running, press ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    cancel.cancel();

    if let Err(e) = ingest_task.await {
        error!(error = %e, "ingestion task panicked");
    }
    if let Err(e) = scheduler_task.await {
        error!(error = %e, "scheduler task panicked");
    }

    if let Ok(mut channels) = Arc::try_unwrap(channels).map_err(|_| ()) {
        channels.disconnect_all().await;
    }

    Ok(())
}
