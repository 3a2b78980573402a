//! Route handlers.

use super::types::*;
use super::AppState;
use crate::credentials::key_preview;
use crate::error::ReportError;
use crate::pipeline::classify::UploadedDocument;
use crate::report::AnalysisOutput;
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use tracing::{debug, info, warn};

/// Name of the multipart field carrying the document.
pub const UPLOAD_FIELD: &str = "file";

/// Liveness probe.
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::new("Inspection report analyzer is live."))
}

/// Analyze an uploaded inspection document.
pub async fn analyze_report(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisOutput>, ApiError> {
    let document = read_upload(multipart, state.upload_limit).await?;
    let output = state.analyzer.analyze(document).await?;
    Ok(Json(output))
}

/// Pull the `file` field out of the form; other fields are ignored.
async fn read_upload(
    mut multipart: Multipart,
    limit: usize,
) -> Result<UploadedDocument, ReportError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(e, limit))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| upload_error(e, limit))?;
        return Ok(UploadedDocument::new(filename, bytes.to_vec()));
    }
    Err(invalid_upload(format!(
        "multipart field '{UPLOAD_FIELD}' is required"
    )))
}

/// Body-limit breaches keep their 413; every other multipart failure is a 400.
fn upload_error(e: MultipartError, limit: usize) -> ReportError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ReportError::PayloadTooLarge { limit }
    } else {
        invalid_upload(e.body_text())
    }
}

fn invalid_upload(reason: impl Into<String>) -> ReportError {
    ReportError::InvalidUpload {
        reason: reason.into(),
    }
}

/// Exchange admin username/password for a token.
pub async fn admin_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let credentials = state.store.read().await?;
    if request.username != credentials.admin_username
        || request.password != credentials.admin_password
    {
        warn!("Failed admin login for '{}'", request.username);
        return Err(ReportError::InvalidCredentials.into());
    }

    info!("Admin '{}' logged in", request.username);
    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token: state.tokens.issue(&request.username),
    }))
}

/// Preview of the stored provider key.
pub async fn get_current_key(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<KeyPreviewResponse>, ApiError> {
    authorize(&state, &headers)?;
    let credentials = state.store.read().await?;
    Ok(Json(KeyPreviewResponse {
        current_key: key_preview(&credentials.openai_api_key),
    }))
}

/// Check the new key against the provider, then store it.
///
/// The body is taken raw and decoded only after the token check.
pub async fn update_api_key(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MessageResponse>, ApiError> {
    authorize(&state, &headers)?;
    let request: UpdateKeyRequest =
        serde_json::from_slice(&body).map_err(|e| ReportError::InvalidRequestBody {
            detail: e.to_string(),
        })?;

    let new_key = request.new_key.unwrap_or_default();
    let new_key = new_key.trim();
    if !new_key.starts_with("sk-") {
        return Err(ReportError::InvalidKeyFormat.into());
    }

    state
        .analyzer
        .providers()
        .verify_key(new_key)
        .await
        .map_err(|e| ReportError::KeyRejected {
            detail: e.to_string(),
        })?;

    state.store.set_api_key(new_key).await?;
    Ok(Json(MessageResponse::new("API key updated successfully")))
}

/// Confirm that the presented token is still valid.
pub async fn verify_admin_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    authorize(&state, &headers)?;
    Ok(Json(MessageResponse::new("Token is valid")))
}

/// Accepts `Authorization: <token>` or `Authorization: Bearer <token>`.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ReportError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ReportError::Unauthorized)?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();

    match state.tokens.verify(token) {
        Ok(claims) => {
            debug!("Token accepted for '{}'", claims.username);
            Ok(())
        }
        Err(e) => {
            debug!("Token rejected: {}", e);
            Err(ReportError::Unauthorized)
        }
    }
}
