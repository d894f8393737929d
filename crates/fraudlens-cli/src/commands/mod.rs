//! CLI command definitions and handlers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fraudlens_core::{Analyzer, Settings};
use fraudlens_sonar::SonarClient;
use std::path::PathBuf;
use std::sync::Arc;

pub mod analyse;
pub mod serve;

/// FraudLens - fraud analysis for prescriptions and product reviews
#[derive(Parser)]
#[command(name = "fraudlens")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Print the effective (redacted) settings before running
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML settings file
    #[arg(short, long, global = true, env = "FRAUDLENS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the analysis HTTP server
    Serve(serve::ServeArgs),

    /// Analyse a single input and print the verdict
    Analyse(analyse::AnalyseArgs),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let settings = Settings::load(self.config.as_deref()).context("Failed to load settings")?;
        if self.verbose {
            eprintln!("{:#?}", settings.redacted());
        }

        match self.command {
            Commands::Serve(args) => serve::execute(args, &settings).await,
            Commands::Analyse(args) => analyse::execute(args, &settings).await,
        }
    }
}

/// Wire the Sonar provider into an analyzer.
pub fn build_analyzer(settings: &Settings) -> Result<Analyzer> {
    let api_key = settings.require_api_key()?;
    let client = SonarClient::new(api_key, &settings.provider)?;
    let analyzer = Analyzer::from_settings(settings, Arc::new(client))?;
    Ok(analyzer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["fraudlens", "serve"]).unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.port, 5000);
                assert_eq!(args.host, "127.0.0.1");
                assert!(!args.log);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_analyse() {
        let cli = Cli::try_parse_from([
            "fraudlens",
            "analyse",
            "--input-type",
            "url",
            "--model-type",
            "reviews",
            "--stream",
            "https://example.com/product",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyse(args) => {
                assert_eq!(args.input_type, "url");
                assert_eq!(args.model_type.as_deref(), Some("reviews"));
                assert!(args.stream);
                assert_eq!(args.content.as_deref(), Some("https://example.com/product"));
            }
            _ => panic!("expected analyse"),
        }
    }

    #[test]
    fn test_file_conflicts_with_content() {
        let result = Cli::try_parse_from([
            "fraudlens",
            "analyse",
            "--input-type",
            "image",
            "--file",
            "scan.png",
            "inline",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_build_analyzer_requires_key() {
        let settings = Settings::default();
        let err = build_analyzer(&settings).err().unwrap();
        assert!(err.to_string().contains("PERPLEXITY_API_KEY"));
    }
}
