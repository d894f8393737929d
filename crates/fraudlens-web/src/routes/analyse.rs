//! Analysis route handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use fraudlens_core::{AnalysisOutcome, AnalysisRequest, Verdict};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Loosely-typed request body; validation happens in [`AnalysisRequest::from_fields`].
#[derive(Debug, Default, Deserialize)]
pub struct AnalyseRequest {
    pub input_type: Option<String>,
    pub content: Option<String>,
    pub model_type: Option<String>,
}

impl AnalyseRequest {
    pub fn into_request(self) -> Result<AnalysisRequest, ApiError> {
        AnalysisRequest::from_fields(
            self.input_type.as_deref(),
            self.content.as_deref(),
            self.model_type.as_deref(),
        )
        .map_err(ApiError::from)
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyseResponse {
    #[serde(flatten)]
    pub verdict: Verdict,
    pub processed_text: String,
}

impl AnalyseResponse {
    pub fn new(verdict: Verdict, processed_text: String) -> Self {
        Self {
            verdict,
            processed_text,
        }
    }
}

impl From<AnalysisOutcome> for AnalyseResponse {
    fn from(outcome: AnalysisOutcome) -> Self {
        Self::new(outcome.verdict, outcome.processed_text)
    }
}

pub async fn analyse(
    State(state): State<AppState>,
    payload: Result<Json<AnalyseRequest>, JsonRejection>,
) -> Result<Json<AnalyseResponse>, ApiError> {
    let Json(body) = payload?;
    let request = body.into_request()?;
    debug!(input_kind = request.input_kind.as_str(), domain = request.domain.as_str(), "Analyse request");

    let outcome = state.analyzer.analyse(&request).await?;
    Ok(Json(outcome.into()))
}

/// Server-Sent Events variant: `partial` events, then one `verdict` or `error` event.
pub async fn analyse_stream(
    State(state): State<AppState>,
    payload: Result<Json<AnalyseRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let Json(body) = payload?;
    let request = body.into_request()?;
    debug!(input_kind = request.input_kind.as_str(), domain = request.domain.as_str(), "Streaming analyse request");

    let analysis = state.analyzer.analyse_stream(&request).await?;

    let events = stream::unfold(Some(analysis), |pending| async move {
        let mut analysis = pending?;
        match analysis.next_fragment().await {
            Some(fragment) => {
                let event = Event::default()
                    .event("partial")
                    .json_data(json!({ "partial": fragment }));
                Some((event, Some(analysis)))
            }
            None => {
                let processed_text = analysis.processed_text.clone();
                let event = match analysis.finish().await {
                    Ok(verdict) => Event::default()
                        .event("verdict")
                        .json_data(AnalyseResponse::new(verdict, processed_text)),
                    Err(e) => Event::default()
                        .event("error")
                        .json_data(json!({ "error": e.to_string() })),
                };
                Some((event, None))
            }
        }
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
