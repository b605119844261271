// # meshdns-sync
//
// One-shot job publishing Defined Networking hosts as Cloudflare A records.
// Meant to be run periodically (e.g. once a minute from cron or a systemd
// timer); every run is independent and converges on the current directory.
//
// This binary is a THIN integration layer:
// 1. Parse flags and initialize logging
// 2. Load the TOML config (tokens may come from CF_API_TOKEN / DN_API_TOKEN)
// 3. Build the two API clients
// 4. Run the reconciler once and map the outcome to an exit code
//
// All reconciliation logic lives in meshdns-core.
//
// ## Example
//
// ```bash
// export CF_API_TOKEN=...
// export DN_API_TOKEN=...
// meshdns-sync --config /etc/meshdns/config.toml
// ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use meshdns_core::{AppConfig, ReconcileSummary, Reconciler};
use meshdns_directory_defined::DefinedHostDirectory;
use meshdns_provider_cloudflare::CloudflareRecordStore;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for the job
///
/// - 0: Run completed
/// - 1: Configuration or startup error
/// - 2: Run aborted by an upstream or reconcile error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncExitCode {
    Success = 0,
    ConfigError = 1,
    RunError = 2,
}

impl From<SyncExitCode> for ExitCode {
    fn from(code: SyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Sync Defined Networking hosts into Cloudflare DNS
#[derive(Debug, Parser)]
#[command(name = "meshdns-sync", version, about)]
struct Cli {
    /// Path to config file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Read everything, log intended changes, write nothing
    #[arg(long)]
    dry_run: bool,

    /// Log verbosity
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::from(cli.log_level))
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SyncExitCode::ConfigError.into();
    }

    let config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config {}: {}", cli.config.display(), e);
            return SyncExitCode::ConfigError.into();
        }
    };

    // Strictly sequential work; a single-threaded runtime is enough
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SyncExitCode::RunError.into();
        }
    };

    match rt.block_on(run(config, cli.dry_run)) {
        Ok(_) => SyncExitCode::Success.into(),
        Err(e) => {
            error!("{:#}", e);
            exit_code_for(&e).into()
        }
    }
}

/// Build the clients and run the reconciler once
async fn run(config: AppConfig, dry_run: bool) -> Result<ReconcileSummary> {
    let mut directory = DefinedHostDirectory::new(config.defined.api_token.clone())?;
    if let Some(base_url) = &config.defined.base_url {
        directory = directory.with_base_url(base_url.clone());
    }

    let store = CloudflareRecordStore::new(config.cloudflare.api_token.clone())?
        .with_dry_run(dry_run);
    if dry_run {
        warn!("Running in DRY-RUN mode - no DNS records will be changed");
    }

    let reconciler = Reconciler::new(
        Box::new(directory),
        Box::new(store),
        config.reconcile_config()?,
    );

    info!("Starting reconciliation");
    let summary = reconciler.run().await.context("reconciliation failed")?;
    Ok(summary)
}

fn exit_code_for(err: &anyhow::Error) -> SyncExitCode {
    match err.downcast_ref::<meshdns_core::Error>() {
        Some(e) if e.is_config() => SyncExitCode::ConfigError,
        _ => SyncExitCode::RunError,
    }
}
