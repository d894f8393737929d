//! Mapping of analysis failures onto HTTP responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fraudlens_core::AnalysisError;
use serde_json::json;
use tracing::{error, warn};

/// An error body of the form `{ "error": "..." }`.
#[derive(Debug)]
pub struct ApiError(pub AnalysisError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AnalysisError::validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.0.to_string();
        if status.is_server_error() {
            error!(%status, error = %message, "Request failed");
        } else {
            warn!(%status, error = %message, "Request rejected");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}
