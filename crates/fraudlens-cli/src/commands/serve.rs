//! Web server command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use fraudlens_core::Settings;
use std::path::PathBuf;

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, default_value = "5000")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Also write logs to a file
    #[arg(long)]
    pub log: bool,

    /// Log file path (defaults to ./fraudlens-serve.log)
    #[arg(long, requires = "log")]
    pub log_file: Option<PathBuf>,
}

pub async fn execute(args: ServeArgs, settings: &Settings) -> Result<()> {
    let analyzer = super::build_analyzer(settings)?;

    println!();
    println!("  {} {}", "FraudLens".cyan().bold(), "Analysis Server".bold());
    println!();
    println!("  {}   http://{}:{}/analyse", "Analyse".green(), args.host, args.port);
    println!("  {}    http://{}:{}/analyse/stream", "Stream".green(), args.host, args.port);
    println!("  {}    http://{}:{}/status", "Status".green(), args.host, args.port);
    println!(
        "  {}  {} ({})",
        "Provider".green(),
        analyzer.provider_name(),
        settings.provider.model
    );
    println!();
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();

    fraudlens_web::run_server(analyzer, &args.host, args.port, settings.server.max_body_bytes).await?;

    Ok(())
}
