//! Agent entry point.
//!
//! Two subcommands:
//!
//! - `necme-agent run` polls every configured display on the configured
//!   interval and logs state transitions.
//! - `necme-agent discover <host>` probes a host for an attached display,
//!   prints its identity, and appends it to the config file (refusing a
//!   display that is already configured).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use necme_agent::config::{self, AgentConfig, DisplayEntry};
use necme_agent::{discover, DisplayController, DisplayPoller, DEFAULT_CONTROL_PORT};

#[derive(Parser)]
#[command(name = "necme-agent", about = "Control agent for NEC M/ME-series displays")]
struct Cli {
    /// Path to the config file.  Defaults to the platform config directory.
    #[arg(long, env = "NECME_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Poll every configured display and log state transitions.
    Run,
    /// Probe a host for an attached display and add it to the config.
    Discover {
        /// Hostname or IP address of the display's LAN port.
        host: String,
        /// TCP control port.
        #[arg(long, default_value_t = DEFAULT_CONTROL_PORT)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => config::config_file_path().context("resolving config path")?,
    };
    let cfg = config::load_config_from(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    // Level from RUST_LOG when set, otherwise from the config file.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&cfg.agent.log_level)),
        )
        .init();

    match cli.command {
        CliCommand::Run => run(cfg).await,
        CliCommand::Discover { host, port } => discover_and_save(cfg, &config_path, &host, port).await,
    }
}

async fn run(cfg: AgentConfig) -> anyhow::Result<()> {
    if cfg.displays.is_empty() {
        warn!("no displays configured; run `necme-agent discover <host>` first");
        return Ok(());
    }

    let mut pollers: Vec<(String, DisplayPoller)> = cfg
        .displays
        .iter()
        .map(|entry| {
            let controller = Arc::new(
                DisplayController::new(entry.host.clone(), entry.monitor_id)
                    .with_port(entry.port),
            );
            (entry.unique_id(), DisplayPoller::new(controller))
        })
        .collect();

    info!(
        displays = pollers.len(),
        interval_secs = cfg.agent.poll_interval_secs,
        "agent started"
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(cfg.agent.poll_interval_secs));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
            _ = ticker.tick() => {
                for (id, poller) in &mut pollers {
                    let before = poller.state().clone();
                    match poller.refresh().await {
                        Ok(()) if before != *poller.state() => {
                            let state = poller.state();
                            info!(
                                display = %id,
                                power = ?state.power,
                                source = ?state.source,
                                "state changed"
                            );
                        }
                        Ok(()) => {}
                        Err(e) => warn!(display = %id, error = %e, "refresh failed"),
                    }
                }
            }
        }
    }

    info!("agent stopped");
    Ok(())
}

async fn discover_and_save(
    mut cfg: AgentConfig,
    config_path: &std::path::Path,
    host: &str,
    port: u16,
) -> anyhow::Result<()> {
    let identity = discover(host, port)
        .await
        .with_context(|| format!("discovering display at {host}:{port}"))?;

    println!("found display at {host}:{port}");
    println!("  monitor:   {}", identity.monitor_id);
    println!("  model:     {}", identity.model);
    println!("  serial:    {}", identity.serial);
    println!("  unique id: {}", identity.unique_id());

    let mut entry = DisplayEntry::from(identity);
    entry.port = port;
    cfg.add_display(entry)
        .context("adding display to the config")?;
    config::save_config_to(config_path, &cfg)
        .with_context(|| format!("saving config to {}", config_path.display()))?;

    println!("saved to {}", config_path.display());
    Ok(())
}
