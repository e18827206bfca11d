//! ptimer launcher - Main Entry Point
//! Boots the application core, the file worker and static assets behind a
//! status surface, then relays dropped files to the worker.

mod console_app;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ptimer_core::application::constants::DEFAULT_MIN_SPLASH_DURATION;
use ptimer_core::application::{shutdown_channel, Launcher, LauncherConfig, SessionOutcome};
use ptimer_core::domain::SlotState;
use ptimer_core::port::time_provider::SystemTimeProvider;
use ptimer_core::port::WorkerSpawner;
use ptimer_infra_system::{
    DirAssetLoader, JsonDocumentParser, StatusBoard, SubprocessWorkerSpawner, ThreadWorkerSpawner,
};

use console_app::ConsoleAppLoader;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "ptimer-launcher")]
#[command(about = "Launch the application behind a startup status surface", long_about = None)]
#[command(version)]
struct Cli {
    /// Minimum time the status surface stays up, in milliseconds
    #[arg(long, env = "PTIMER_MIN_SPLASH_MS", default_value_t = DEFAULT_MIN_SPLASH_DURATION.as_millis() as u64)]
    min_splash_ms: u64,

    /// Run the file worker as this command (default: in-process worker)
    #[arg(long, env = "PTIMER_WORKER_CMD")]
    worker_cmd: Option<String>,

    /// Extra argument for the worker command (repeatable)
    #[arg(long = "worker-arg", requires = "worker_cmd")]
    worker_args: Vec<String>,

    /// Directory of static assets to preload
    #[arg(long, env = "PTIMER_ASSETS_DIR")]
    assets_dir: Option<PathBuf>,

    /// Files to drop onto the application
    files: Vec<PathBuf>,
}

fn init_logging() -> Result<()> {
    let log_format = std::env::var("PTIMER_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("ptimer=info"))
        .context("Failed to create env filter")?;

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
    Ok(())
}

fn render_status(board: &StatusBoard) {
    println!("{}", "Startup".bold());
    for (slot, record) in board.snapshot() {
        let state = match &record.state {
            SlotState::Pending => "pending".yellow(),
            SlotState::Ready => "ready".green(),
            SlotState::Error(marker) => marker.as_str().red().bold(),
        };
        println!("  {:<16} {}", slot, state);
    }
    for entry in board.errors() {
        eprintln!("{}", entry.to_string().red());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging and configuration
    init_logging()?;
    let cli = Cli::parse();
    info!("ptimer launcher v{} starting...", VERSION);

    let config = LauncherConfig::default().with_min_splash(Duration::from_millis(cli.min_splash_ms));

    // 2. Adapters (DI wiring)
    let board = Arc::new(StatusBoard::new(
        &config.slot_ids(),
        Arc::new(SystemTimeProvider),
    ));

    let spawner: Arc<dyn WorkerSpawner> = match cli.worker_cmd {
        Some(command) => {
            info!(command = %command, "Using subprocess worker");
            Arc::new(SubprocessWorkerSpawner::new(command, cli.worker_args))
        }
        None => Arc::new(ThreadWorkerSpawner::new(Arc::new(JsonDocumentParser))),
    };

    let (shutdown_tx, shutdown_token) = shutdown_channel();
    let launcher = Launcher::new(
        config,
        board.clone(),
        Arc::new(ConsoleAppLoader::new(cli.files, shutdown_token.clone())),
        spawner,
        Arc::new(DirAssetLoader::new(cli.assets_dir)),
    );

    // 3. Bootstrap behind the status surface
    let booted = launcher.boot().await;
    render_status(&board);
    let session = booted.context("Startup failed")?;

    info!(session_id = %session.id(), "✅ Application ready");
    info!("Press Ctrl+C to shutdown");

    // 4. Relay dropped files until done or interrupted
    let mut run = tokio::spawn(session.run(shutdown_token));
    let outcome = tokio::select! {
        outcome = &mut run => outcome?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown signal received. Exiting gracefully...");
            shutdown_tx.shutdown();
            run.await?
        }
    };
    shutdown_tx.shutdown();

    match outcome {
        SessionOutcome::Completed => info!("Session complete."),
        SessionOutcome::Degraded(reason) => {
            warn!(reason = %reason, "Session ended without a worker");
            eprintln!("{} {}", "worker lost:".red().bold(), reason);
        }
    }

    Ok(())
}
