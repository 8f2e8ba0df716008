//! Log Sentinel - tail log files and directories, alert on keyword matches.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use log_sentinel::config::ConfigLoader;
use log_sentinel::engine::LogSentinel;
use log_sentinel::notifier::create_notifiers;

#[derive(Parser)]
#[command(
    name = "log-sentinel",
    about = "Tail log files and directories, alert on keyword matches",
    version
)]
struct Cli {
    /// Configuration file (defaults to ./log-sentinel.toml, then the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

/// Resolve when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let loader = cli
        .config
        .map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let config = match loader.load().and_then(|c| c.validate().map(|()| c)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        files = config.log_files.len(),
        directories = config.log_directories.len(),
        notifiers = config.notifiers.len(),
        "Configuration loaded"
    );
    if cli.check {
        return ExitCode::SUCCESS;
    }

    let notifiers = create_notifiers(&config.notifiers);
    if notifiers.is_empty() {
        tracing::error!("No usable notifiers configured");
        return ExitCode::FAILURE;
    }
    tracing::info!(count = notifiers.len(), "Notifiers ready");

    let mut sentinel = match LogSentinel::with_native_watcher(config, notifiers) {
        Ok(sentinel) => sentinel,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create log sentinel");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = sentinel.start().await {
        tracing::error!(error = %e, "Failed to start log sentinel");
        return ExitCode::FAILURE;
    }

    shutdown_signal().await;
    tracing::info!("Shutdown signal received");

    if let Err(e) = sentinel.stop().await {
        tracing::error!(error = %e, "Failed to stop log sentinel");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
