//! A provider that returns canned responses.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream;

use crate::error::{AnalysisError, AnalysisResult};

use super::{FragmentStream, ProviderPrompt, ProviderResult, ReasoningProvider};

pub struct MockProvider {
    response: String,
    failure: Option<String>,
    stream_failure: Option<(usize, String)>,
    fragment_chars: usize,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<ProviderPrompt>>,
}

impl MockProvider {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            failure: None,
            stream_failure: None,
            fragment_chars: 8,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Fail every call with a provider error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new("")
        }
    }

    /// Stream `fragments` fragments, then fail with a provider error.
    /// Single-shot calls fail with the same error.
    pub fn failing_after(mut self, fragments: usize, message: impl Into<String>) -> Self {
        self.stream_failure = Some((fragments, message.into()));
        self
    }

    /// Size of streamed fragments, in characters.
    pub fn with_fragment_chars(mut self, chars: usize) -> Self {
        self.fragment_chars = chars.max(1);
        self
    }

    /// Number of `complete` and `stream` calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<ProviderPrompt> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }

    fn record(&self, prompt: &ProviderPrompt) -> AnalysisResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.clone());
        }
        match &self.failure {
            Some(message) => Err(AnalysisError::provider(message.clone())),
            None => Ok(()),
        }
    }

    fn fragments(&self) -> Vec<String> {
        let chars: Vec<char> = self.response.chars().collect();
        chars
            .chunks(self.fragment_chars)
            .map(|c| c.iter().collect())
            .collect()
    }
}

#[async_trait]
impl ReasoningProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, prompt: &ProviderPrompt) -> AnalysisResult<ProviderResult> {
        self.record(prompt)?;
        if let Some((_, message)) = &self.stream_failure {
            return Err(AnalysisError::provider(message.clone()));
        }
        Ok(ProviderResult {
            raw_text: self.response.clone(),
        })
    }

    async fn stream(&self, prompt: &ProviderPrompt) -> AnalysisResult<FragmentStream> {
        self.record(prompt)?;
        let mut items: Vec<AnalysisResult<String>> = self.fragments().into_iter().map(Ok).collect();
        if let Some((after, message)) = &self.stream_failure {
            items.truncate(*after);
            items.push(Err(AnalysisError::provider(message.clone())));
        }
        Ok(Box::pin(stream::iter(items)))
    }
}
