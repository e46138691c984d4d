//! avaliod — the avalio health-monitoring daemon.
//!
//! Loads a TOML config, builds every resource, notificator and monitor,
//! and runs until SIGINT or SIGTERM.
//!
//! # Usage
//!
//! ```text
//! avaliod --config /etc/avalio/avalio.toml
//! avaliod check-config --config /etc/avalio/avalio.toml
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use avalio_app::Application;
use avalio_core::AvalioConfig;

const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Parser)]
#[command(name = "avaliod", about = "avalio health-monitoring daemon", version)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level, overriding the config file. RUST_LOG takes precedence.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Load, validate and resolve the config, then exit.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let path = cli
        .config
        .context("missing required option --config <PATH>")?;
    let config = AvalioConfig::load(&path)
        .with_context(|| format!("invalid config {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(
            cli.log_level.as_deref(),
            config.log_level.as_deref(),
        ))
        .init();

    info!(config = %path.display(), "configuration loaded");

    let app = Application::from_config(&config)?;

    match cli.command {
        Some(Command::CheckConfig) => {
            app.check()?;
            info!(
                resources = app.resources().len(),
                notificators = app.notificators().len(),
                monitors = app.monitors().len(),
                "configuration is valid"
            );
            Ok(())
        }
        None => run(app).await,
    }
}

async fn run(app: Application) -> anyhow::Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let running = app.start(shutdown_rx)?;
    if running.runner_count() == 0 {
        warn!("no monitor references any resource, nothing to do");
    }

    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    running.wait().await;
    info!("avaliod stopped");
    Ok(())
}

/// `RUST_LOG` wins, then `--log-level`, then the config file, then `info`.
fn env_filter(cli_level: Option<&str>, config_level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_directive(cli_level, config_level)))
}

fn log_directive<'a>(cli_level: Option<&'a str>, config_level: Option<&'a str>) -> &'a str {
    let non_empty = |level: &'a str| Some(level.trim()).filter(|l| !l.is_empty());
    cli_level
        .and_then(non_empty)
        .or_else(|| config_level.and_then(non_empty))
        .unwrap_or(DEFAULT_LOG_LEVEL)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
