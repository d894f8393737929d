//! Chat-completions HTTP client.
//!
//! Sends role-tagged messages (system + multimodal user content) to
//! `{base_url}/chat/completions` with a bearer credential.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

use fraudlens_core::config::ProviderSettings;
use fraudlens_core::provider::{ContentSegment, FragmentStream, ProviderPrompt, ProviderResult, ReasoningProvider};
use fraudlens_core::{AnalysisError, AnalysisResult};

use crate::sse::{SseDecoder, SseEvent};

/// Sonar reasoning/search provider.
#[derive(Clone)]
pub struct SonarClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChunkResponse {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Deserialize, Default)]
struct Delta {
    content: Option<String>,
}

impl SonarClient {
    /// Create a client from provider settings and a credential.
    pub fn new(api_key: &str, settings: &ProviderSettings) -> AnalysisResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AnalysisError::Unexpected(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn request_body(&self, prompt: &ProviderPrompt, stream: bool) -> ChatRequest<'_> {
        let parts = prompt
            .user_content
            .iter()
            .map(|segment| match segment {
                ContentSegment::Text(text) => ContentPart::Text { text: text.clone() },
                ContentSegment::Image { data_uri } => ContentPart::ImageUrl {
                    image_url: ImageUrl { url: data_uri.clone() },
                },
            })
            .collect();

        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(prompt.system_instructions.clone()),
                },
                ChatMessage {
                    role: "user",
                    content: MessageContent::Parts(parts),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream,
        }
    }

    async fn send(&self, body: &ChatRequest<'_>) -> AnalysisResult<reqwest::Response> {
        debug!(model = %self.model, stream = body.stream, "Calling Sonar API");
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AnalysisError::provider(format!("Failed to call Sonar API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::provider(format!(
                "Sonar API error (HTTP {}): {}",
                status, error_body
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl ReasoningProvider for SonarClient {
    fn name(&self) -> &str {
        "sonar"
    }

    async fn complete(&self, prompt: &ProviderPrompt) -> AnalysisResult<ProviderResult> {
        let start = Instant::now();
        let response = self.send(&self.request_body(prompt, false)).await?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::provider(format!("Failed to parse Sonar response: {}", e)))?;

        let raw_text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AnalysisError::provider("No text content in Sonar response"))?;

        debug!(
            chars = raw_text.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Sonar response received"
        );
        Ok(ProviderResult { raw_text })
    }

    async fn stream(&self, prompt: &ProviderPrompt) -> AnalysisResult<FragmentStream> {
        let response = self.send(&self.request_body(prompt, true)).await?;
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();

        let state = StreamState {
            body,
            decoder: SseDecoder::new(),
            queue: VecDeque::new(),
            done: false,
        };
        Ok(Box::pin(stream::unfold(state, StreamState::next_item)))
    }
}

struct StreamState {
    body: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    decoder: SseDecoder,
    queue: VecDeque<AnalysisResult<String>>,
    done: bool,
}

impl StreamState {
    async fn next_item(mut self) -> Option<(AnalysisResult<String>, Self)> {
        loop {
            if let Some(item) = self.queue.pop_front() {
                return Some((item, self));
            }
            if self.done {
                return None;
            }
            match self.body.next().await {
                Some(Ok(chunk)) => {
                    let events = self.decoder.push(&chunk);
                    self.absorb(events);
                }
                Some(Err(e)) => {
                    self.done = true;
                    self.queue
                        .push_back(Err(AnalysisError::provider(format!("Sonar stream interrupted: {}", e))));
                }
                None => {
                    let events = self.decoder.finish();
                    self.absorb(events);
                    self.done = true;
                }
            }
        }
    }

    fn absorb(&mut self, events: Vec<SseEvent>) {
        for event in events {
            if self.done {
                return;
            }
            match event {
                SseEvent::Done => self.done = true,
                SseEvent::Data(data) => match parse_chunk(&data) {
                    Ok(Some(fragment)) => self.queue.push_back(Ok(fragment)),
                    Ok(None) => {}
                    Err(e) => {
                        self.queue.push_back(Err(e));
                        self.done = true;
                    }
                },
            }
        }
    }
}

/// Extract the content delta from one streamed chunk.
fn parse_chunk(data: &str) -> AnalysisResult<Option<String>> {
    let chunk: ChunkResponse = serde_json::from_str(data)
        .map_err(|e| AnalysisError::provider(format!("Malformed Sonar stream chunk: {}", e)))?;
    if let Some(error) = chunk.error {
        return Err(AnalysisError::provider(format!("Sonar stream error: {}", error)));
    }
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|c| !c.is_empty()))
}
