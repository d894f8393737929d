//! Turns free-form provider text into a [`Verdict`].
//!
//! Both signals are keyword heuristics over the model's prose, not a measure
//! of accuracy. A provider-native structured output would replace them.

use crate::analysis::model::{Domain, Verdict};

const PRESCRIPTION_KEYWORDS: &[&str] = &[
    "fraud",
    "forged",
    "forgery",
    "counterfeit",
    "unlicensed",
    "overdose",
    "unsafe",
    "dangerous",
    "invalid",
    "red flag",
    "suspicious",
];

const REVIEW_KEYWORDS: &[&str] = &[
    "fraud",
    "fake",
    "bot",
    "deceptive",
    "suspicious",
    "red flag",
    "dangerous",
    "counterfeit",
    "forged",
    "unlicensed",
];

const BASELINE_CONFIDENCE: f64 = 0.5;
const HIGH_CONFIDENCE_BONUS: f64 = 0.3;
const VERIFICATION_PENALTY: f64 = 0.2;

/// Fraud-indicator keywords for a domain.
pub fn fraud_keywords(domain: Domain) -> &'static [&'static str] {
    match domain {
        Domain::Prescription => PRESCRIPTION_KEYWORDS,
        Domain::Reviews => REVIEW_KEYWORDS,
    }
}

/// True if any domain keyword occurs anywhere in `text`, ignoring case.
pub fn detect_fraud(text: &str, domain: Domain) -> bool {
    let lower = text.to_lowercase();
    fraud_keywords(domain).iter().any(|k| lower.contains(k))
}

/// Additive confidence over fixed trigger phrases, clamped to `[0.0, 1.0]`.
pub fn confidence(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let mut score = BASELINE_CONFIDENCE;
    if lower.contains("high confidence") {
        score += HIGH_CONFIDENCE_BONUS;
    }
    if lower.contains("recommend verification") {
        score -= VERIFICATION_PENALTY;
    }
    score.clamp(0.0, 1.0)
}

/// Interpret raw provider output.
pub fn interpret(raw: &str, domain: Domain) -> Verdict {
    let reasoning = raw.trim().to_string();
    Verdict {
        fraud_detected: detect_fraud(&reasoning, domain),
        confidence: confidence(&reasoning),
        reasoning,
    }
}
