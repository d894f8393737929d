//! FraudLens CLI
//!
//! Runs the analysis HTTP service or a one-off analysis from the terminal.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::{Cli, Commands};

const DEFAULT_FILTER: &str = "fraudlens=info,fraudlens_web=debug,fraudlens_core=info";
const DEFAULT_LOG_FILE: &str = "fraudlens-serve.log";

/// Initialize tracing with optional file logging.
///
/// Without a log file, output goes to stderr when `stderr_only` is set so
/// that analysis results on stdout stay clean. The returned guard must live
/// as long as the process for buffered file output to be flushed.
fn init_tracing(log_file: Option<&Path>, stderr_only: bool) -> Result<Option<WorkerGuard>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_FILTER.into());

    if let Some(path) = log_file {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
        let file_name = path
            .file_name()
            .with_context(|| format!("Log file path {} has no file name", path.display()))?;

        let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

        // Log to both stdout and file when --log is used
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false),
            )
            .init();
        Ok(Some(guard))
    } else if stderr_only {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
        Ok(None)
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
        Ok(None)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Serve(args) if args.log => Some(
            args.log_file
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
        ),
        _ => None,
    };

    let stderr_only = matches!(&cli.command, Commands::Analyse(_));
    let _guard = init_tracing(log_file.as_deref(), stderr_only)?;

    cli.execute().await
}
