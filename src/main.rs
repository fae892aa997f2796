mod config;
mod platform;
mod reminders;
mod scheduler;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::platform::slack::SlackClient;
use crate::platform::Workspace;
use crate::reminders::{run_once, ReminderSettings};
use crate::scheduler::ReminderScheduler;

/// Remind Slack members about tagged messages they have not reacted to.
#[derive(Debug, Parser)]
#[command(name = "ackbot", version)]
struct Cli {
    /// Path to config.toml (or a legacy config.json)
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Build the digests and log them without sending anything
    #[arg(long)]
    dry_run: bool,

    /// Run a single sweep even if a schedule is configured
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ackbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    info!("Loading configuration from: {}", cli.config.display());
    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    let settings = ReminderSettings::from_config(&config, cli.dry_run);
    info!("Configuration loaded successfully");
    info!("  Marker: '{}'", settings.scan.marker);
    info!("  Scope: {:?}", settings.scope);
    info!("  History window: {} message(s)", settings.scan.history_limit);
    if cli.dry_run {
        info!("  Dry run: digests will be logged, not sent");
    }

    let workspace: Arc<dyn Workspace> = Arc::new(SlackClient::new(&config.slack)?);

    match config.schedule.as_ref().filter(|_| !cli.once) {
        None => {
            run_once(workspace.as_ref(), &settings).await;
        }
        Some(schedule) => {
            let mut scheduler = ReminderScheduler::new().await?;
            scheduler
                .schedule_sweep(&schedule.cron, workspace, Arc::new(settings))
                .await?;
            scheduler.start().await?;

            info!("Waiting for scheduled sweeps, press Ctrl-C to stop");
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl-C")?;
            scheduler.shutdown().await?;
        }
    }

    Ok(())
}
