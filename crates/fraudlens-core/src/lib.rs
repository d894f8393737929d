//! FraudLens Core Library
//!
//! Turns heterogeneous user input into a bounded prompt for an external
//! reasoning provider and turns the provider's free text back into a verdict.

pub mod analysis;
pub mod config;
pub mod error;
pub mod fetch;
pub mod interpret;
pub mod normalize;
pub mod provider;

pub use analysis::model::{AnalysisRequest, Domain, InputKind, NormalizedContent, Verdict};
pub use analysis::{AnalysisOutcome, AnalysisStream, Analyzer};
pub use config::{Settings, SettingsError};
pub use error::{AnalysisError, AnalysisResult};
pub use provider::{ProviderPrompt, ProviderResult, ReasoningProvider};
