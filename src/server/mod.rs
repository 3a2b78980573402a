//! HTTP service: axum router over [`ReportAnalyzer`] and the admin store.
//!
//! Endpoints:
//! - `GET  /`                   liveness probe
//! - `POST /analyze-report`     multipart upload (field `file`) → report
//! - `POST /admin/login`        username/password → token
//! - `GET  /admin/key`          preview of the stored provider key
//! - `PUT  /admin/key`          verify and store a new provider key
//! - `GET  /admin/verify-token` check a token

mod handlers;
mod types;

use crate::analyze::ReportAnalyzer;
use crate::credentials::CredentialStore;
use crate::token::TokenSigner;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use handlers::*;
pub use types::*;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Pipeline; reads the API key from `store` on every request.
    pub analyzer: Arc<ReportAnalyzer>,
    /// Admin record and provider key.
    pub store: Arc<CredentialStore>,
    /// Admin token issuer/verifier.
    pub tokens: Arc<TokenSigner>,
    /// Largest accepted request body, in bytes.
    pub upload_limit: usize,
}

impl AppState {
    pub fn new(
        analyzer: Arc<ReportAnalyzer>,
        store: Arc<CredentialStore>,
        tokens: Arc<TokenSigner>,
        upload_limit: usize,
    ) -> Self {
        Self {
            analyzer,
            store,
            tokens,
            upload_limit,
        }
    }
}

/// Build the API router with all endpoints
pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.upload_limit;
    Router::new()
        .route("/", get(root))
        .route("/analyze-report", post(analyze_report))
        .route("/admin/login", post(admin_login))
        .route("/admin/key", get(get_current_key).put(update_api_key))
        .route("/admin/verify-token", get(verify_admin_token))
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve on an already-bound listener.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Listening on {}", addr);
    }
    axum::serve(listener, build_router(state)).await
}

/// Bind `addr` and serve until the process stops.
pub async fn start_server(addr: &str, state: AppState) -> Result<(), std::io::Error> {
    tracing::info!("Starting API server on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    serve(listener, state).await
}
