//! One-off analysis command.

use anyhow::{bail, Context, Result};
use base64::Engine;
use clap::Args;
use colored::Colorize;
use fraudlens_core::{AnalysisRequest, Settings};
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

use crate::output;

#[derive(Args)]
pub struct AnalyseArgs {
    /// Input kind: image, url or text
    #[arg(long = "input-type", default_value = "text")]
    pub input_type: String,

    /// Analysis domain: prescription or reviews
    #[arg(long = "model-type")]
    pub model_type: Option<String>,

    /// Print reasoning as it is generated
    #[arg(long)]
    pub stream: bool,

    /// Read an image file and submit it base64-encoded
    #[arg(long, conflicts_with = "content")]
    pub file: Option<PathBuf>,

    /// Inline content: text, a URL, or base64 image data
    pub content: Option<String>,
}

impl AnalyseArgs {
    fn load_content(&self) -> Result<String> {
        if let Some(path) = &self.file {
            let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
            return Ok(base64::engine::general_purpose::STANDARD.encode(bytes));
        }
        match &self.content {
            Some(content) => Ok(content.clone()),
            None => bail!("Provide CONTENT or --file"),
        }
    }
}

pub async fn execute(args: AnalyseArgs, settings: &Settings) -> Result<()> {
    let content = args.load_content()?;
    let request = AnalysisRequest::from_fields(Some(&args.input_type), Some(&content), args.model_type.as_deref())?;
    let analyzer = super::build_analyzer(settings)?;
    debug!(
        input_kind = request.input_kind.as_str(),
        domain = request.domain.as_str(),
        stream = args.stream,
        "Running analysis"
    );

    if args.stream {
        let mut analysis = analyzer.analyse_stream(&request).await?;
        println!("{}", "Reasoning".bold());
        let mut stdout = std::io::stdout();
        while let Some(fragment) = analysis.next_fragment().await {
            print!("{}", fragment);
            stdout.flush()?;
        }
        println!();
        println!();

        let processed_text = analysis.processed_text.clone();
        let verdict = analysis.finish().await?;
        output::print_verdict(&verdict, &processed_text, false);
    } else {
        let outcome = analyzer.analyse(&request).await?;
        output::print_verdict(&outcome.verdict, &outcome.processed_text, true);
    }

    Ok(())
}
