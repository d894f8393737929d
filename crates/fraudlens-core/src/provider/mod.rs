//! Reasoning provider contract.
//!
//! A provider receives a role-structured prompt and answers either in one
//! shot or as a finite stream of text fragments.

pub mod mock;
pub mod prompt;
pub mod stream;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::AnalysisResult;

pub use mock::MockProvider;
pub use prompt::{build_prompt, system_instructions};
pub use stream::FragmentTrimmer;

/// One piece of user content.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentSegment {
    Text(String),
    Image { data_uri: String },
}

/// System instructions plus ordered user content. Built per request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPrompt {
    pub system_instructions: String,
    pub user_content: Vec<ContentSegment>,
}

/// Unstructured model output.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResult {
    pub raw_text: String,
}

/// Finite, non-restartable sequence of partial text.
pub type FragmentStream = Pin<Box<dyn Stream<Item = AnalysisResult<String>> + Send>>;

/// An external reasoning/search service.
#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    /// Provider name (e.g., "sonar").
    fn name(&self) -> &str;

    /// Wait for the complete response.
    async fn complete(&self, prompt: &ProviderPrompt) -> AnalysisResult<ProviderResult>;

    /// Open a streaming response. Errors while connecting are returned here;
    /// errors mid-stream arrive as stream items.
    async fn stream(&self, prompt: &ProviderPrompt) -> AnalysisResult<FragmentStream>;
}
