//! Request orchestration: normalize, ask the provider, interpret.

pub mod model;

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{AnalysisError, AnalysisResult};
use crate::interpret::interpret;
use crate::normalize::Normalizer;
use crate::provider::{build_prompt, FragmentStream, FragmentTrimmer, ProviderPrompt, ReasoningProvider};

use model::{AnalysisRequest, Domain, Verdict};

/// Buffered fragments between the upstream reader and the consumer.
const FRAGMENT_BUFFER: usize = 32;

/// A completed analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub verdict: Verdict,
    /// The normalized text that was submitted (empty for image-only input).
    pub processed_text: String,
}

/// A streaming analysis: partial fragments on one channel, the terminal
/// verdict on another.
///
/// The verdict resolves only once every fragment has been received.
pub struct AnalysisStream {
    pub processed_text: String,
    fragments: mpsc::Receiver<String>,
    verdict: oneshot::Receiver<AnalysisResult<Verdict>>,
}

impl AnalysisStream {
    /// Next partial fragment, or `None` once the upstream stream has closed.
    pub async fn next_fragment(&mut self) -> Option<String> {
        self.fragments.recv().await
    }

    /// Drain any remaining fragments and wait for the verdict.
    pub async fn finish(mut self) -> AnalysisResult<Verdict> {
        while self.fragments.recv().await.is_some() {}
        self.verdict
            .await
            .map_err(|_| AnalysisError::Unexpected("stream ended without a verdict".to_string()))?
    }
}

/// The externally-facing entry point. Cheap to clone and share across requests.
#[derive(Clone)]
pub struct Analyzer {
    normalizer: Normalizer,
    provider: Arc<dyn ReasoningProvider>,
}

impl Analyzer {
    pub fn new(normalizer: Normalizer, provider: Arc<dyn ReasoningProvider>) -> Self {
        Self {
            normalizer,
            provider,
        }
    }

    /// Build the default normalizer from settings around the given provider.
    pub fn from_settings(settings: &Settings, provider: Arc<dyn ReasoningProvider>) -> AnalysisResult<Self> {
        Ok(Self::new(Normalizer::from_settings(settings)?, provider))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    async fn prepare(&self, request: &AnalysisRequest) -> AnalysisResult<(String, ProviderPrompt)> {
        let content = self.normalizer.normalize(request).await?;
        debug!(
            input_kind = request.input_kind.as_str(),
            domain = request.domain.as_str(),
            chars = content.text.chars().count(),
            has_image = content.image.is_some(),
            "Normalized input"
        );
        let prompt = build_prompt(&content, request.domain);
        Ok((content.text, prompt))
    }

    /// Run a single-shot analysis.
    pub async fn analyse(&self, request: &AnalysisRequest) -> AnalysisResult<AnalysisOutcome> {
        let (processed_text, prompt) = self.prepare(request).await?;

        let result = self.provider.complete(&prompt).await.map_err(|e| {
            warn!(provider = self.provider.name(), error = %e, "Provider call failed");
            e
        })?;

        let verdict = interpret(&result.raw_text, request.domain);
        info!(
            domain = request.domain.as_str(),
            fraud_detected = verdict.fraud_detected,
            confidence = verdict.confidence,
            "Analysis complete"
        );

        Ok(AnalysisOutcome {
            verdict,
            processed_text,
        })
    }

    /// Start a streaming analysis.
    ///
    /// Normalization and provider connection errors are returned directly;
    /// later failures resolve the verdict channel with an error.
    pub async fn analyse_stream(&self, request: &AnalysisRequest) -> AnalysisResult<AnalysisStream> {
        let (processed_text, prompt) = self.prepare(request).await?;
        let upstream = self.provider.stream(&prompt).await?;

        let (fragment_tx, fragment_rx) = mpsc::channel(FRAGMENT_BUFFER);
        let (verdict_tx, verdict_rx) = oneshot::channel();
        tokio::spawn(relay(upstream, request.domain, fragment_tx, verdict_tx));

        Ok(AnalysisStream {
            processed_text,
            fragments: fragment_rx,
            verdict: verdict_rx,
        })
    }
}

async fn relay(
    mut upstream: FragmentStream,
    domain: Domain,
    fragment_tx: mpsc::Sender<String>,
    verdict_tx: oneshot::Sender<AnalysisResult<Verdict>>,
) {
    let mut trimmer = FragmentTrimmer::new();
    let mut full = String::new();

    while let Some(item) = upstream.next().await {
        match item {
            Ok(fragment) => {
                full.push_str(&fragment);
                if let Some(ready) = trimmer.push(&fragment) {
                    if fragment_tx.send(ready).await.is_err() {
                        debug!("Stream consumer went away");
                        return;
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Provider stream failed");
                drop(fragment_tx);
                let _ = verdict_tx.send(Err(e));
                return;
            }
        }
    }

    drop(fragment_tx);
    let verdict = interpret(&full, domain);
    info!(
        domain = domain.as_str(),
        fraud_detected = verdict.fraud_detected,
        confidence = verdict.confidence,
        "Streaming analysis complete"
    );
    let _ = verdict_tx.send(Ok(verdict));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchSettings;
    use crate::fetch::Fetcher;
    use crate::provider::{ContentSegment, MockProvider};
    use model::InputKind;

    fn analyzer(provider: Arc<MockProvider>) -> Analyzer {
        let normalizer = Normalizer::new(Fetcher::new(&FetchSettings::default()).unwrap(), None, 3000);
        Analyzer::new(normalizer, provider)
    }

    fn text_request(content: &str, domain: Domain) -> AnalysisRequest {
        AnalysisRequest {
            input_kind: InputKind::Text,
            raw_content: content.to_string(),
            domain,
        }
    }

    #[tokio::test]
    async fn test_text_scenario() {
        let provider = Arc::new(MockProvider::new("Likely Fraudulent: fake enthusiasm, high confidence."));
        let outcome = analyzer(provider.clone())
            .analyse(&text_request("Buy now, 100% real, guaranteed!", Domain::Reviews))
            .await
            .unwrap();

        assert!(outcome.verdict.fraud_detected);
        assert!((outcome.verdict.confidence - 0.8).abs() < 1e-9);
        assert_eq!(outcome.processed_text, "Buy now, 100% real, guaranteed!");

        let prompt = provider.last_prompt().unwrap();
        assert!(prompt.system_instructions.contains("linguistic forensics"));
        assert_eq!(
            prompt.user_content,
            vec![ContentSegment::Text("Buy now, 100% real, guaranteed!".into())]
        );
    }

    #[tokio::test]
    async fn test_provider_failure_is_server_error() {
        let provider = Arc::new(MockProvider::failing("API timeout"));
        let err = analyzer(provider)
            .analyse(&text_request("sample text", Domain::Prescription))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Provider(_)));
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_normalization_failure_skips_provider() {
        let provider = Arc::new(MockProvider::new("unused"));
        let request = AnalysisRequest {
            input_kind: InputKind::Image,
            raw_content: "not base64 at all!".to_string(),
            domain: Domain::Prescription,
        };
        let err = analyzer(provider.clone()).analyse(&request).await.unwrap_err();
        assert!(matches!(err, AnalysisError::InputDecoding(_)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_stream_fragments_match_reasoning() {
        let raw = "\n  Risk level: High. Forged signature, recommend verification.  \n";
        let provider = Arc::new(MockProvider::new(raw).with_fragment_chars(3));
        let mut stream = analyzer(provider)
            .analyse_stream(&text_request("Rx: 100 oxycodone", Domain::Prescription))
            .await
            .unwrap();

        let mut joined = String::new();
        while let Some(fragment) = stream.next_fragment().await {
            assert!(!fragment.is_empty());
            joined.push_str(&fragment);
        }
        let verdict = stream.finish().await.unwrap();

        assert_eq!(joined, verdict.reasoning);
        assert_eq!(verdict, interpret(raw, Domain::Prescription));
        assert!(verdict.fraud_detected);
    }

    #[tokio::test]
    async fn test_stream_finish_drains() {
        let provider = Arc::new(MockProvider::new("x".repeat(500)).with_fragment_chars(1));
        let stream = analyzer(provider)
            .analyse_stream(&text_request("hello", Domain::Reviews))
            .await
            .unwrap();
        let verdict = stream.finish().await.unwrap();
        assert_eq!(verdict.reasoning.len(), 500);
    }

    #[tokio::test]
    async fn test_stream_connect_failure() {
        let provider = Arc::new(MockProvider::failing("401 Unauthorized"));
        let result = analyzer(provider)
            .analyse_stream(&text_request("hello", Domain::Reviews))
            .await;
        assert!(matches!(result, Err(AnalysisError::Provider(_))));
    }

    #[tokio::test]
    async fn test_stream_failure_after_fragments() {
        let provider = Arc::new(
            MockProvider::new("Suspicious pattern in reviews")
                .with_fragment_chars(4)
                .failing_after(2, "connection reset"),
        );
        let mut stream = analyzer(provider)
            .analyse_stream(&text_request("Great product!!!", Domain::Reviews))
            .await
            .unwrap();

        let mut received = Vec::new();
        while let Some(fragment) = stream.next_fragment().await {
            received.push(fragment);
        }
        assert_eq!(received, vec!["Susp".to_string(), "icio".to_string()]);

        let err = stream.finish().await.unwrap_err();
        assert!(matches!(err, AnalysisError::Provider(ref m) if m.contains("connection reset")));
    }
}
