//! Terminal output formatting.

use colored::{ColoredString, Colorize};
use fraudlens_core::Verdict;

const PREVIEW_CHARS: usize = 200;

fn verdict_label(verdict: &Verdict) -> ColoredString {
    if verdict.fraud_detected {
        "FRAUD SUSPECTED".red().bold()
    } else {
        "NO FRAUD DETECTED".green().bold()
    }
}

/// Print a verdict, optionally with the full reasoning.
pub fn print_verdict(verdict: &Verdict, processed_text: &str, show_reasoning: bool) {
    println!("{}: {}", "Verdict".bold(), verdict_label(verdict));
    println!("{}: {:.2}", "Confidence".bold(), verdict.confidence);

    if !processed_text.is_empty() {
        let preview: String = processed_text.chars().take(PREVIEW_CHARS).collect();
        let ellipsis = if processed_text.chars().count() > PREVIEW_CHARS { "..." } else { "" };
        println!("{}: {}{}", "Input".bold(), preview.dimmed(), ellipsis.dimmed());
    }

    if show_reasoning {
        println!();
        println!("{}", "Reasoning".bold());
        println!("{}", verdict.reasoning);
    }
}
