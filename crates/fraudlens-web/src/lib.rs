//! FraudLens Web Server
//!
//! Axum-based HTTP surface for the analysis pipeline.

pub mod error;
pub mod routes;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use fraudlens_core::Analyzer;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use state::AppState;

/// Create the application router.
///
/// `max_body_bytes` replaces axum's 2 MB default so base64 photos fit.
pub fn create_router(state: AppState, max_body_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/analyse", post(routes::analyse::analyse))
        .route("/analyse/stream", post(routes::analyse::analyse_stream))
        .route("/status", get(routes::status::status))
        .route("/health", get(routes::status::status))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the web server.
pub async fn run_server(analyzer: Analyzer, host: &str, port: u16, max_body_bytes: usize) -> anyhow::Result<()> {
    let state = AppState::new(analyzer);
    let app = create_router(state, max_body_bytes);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    tracing::info!("Web server listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}
