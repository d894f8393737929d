//! # FraudLens Sonar
//!
//! Reasoning provider backed by an OpenAI-compatible chat-completions API
//! (Perplexity Sonar by default), in single-shot and SSE streaming modes.

pub mod client;
pub mod sse;

pub use client::SonarClient;
pub use sse::{SseDecoder, SseEvent};
