//! Request/response bodies and the HTTP error mapping.

use crate::error::ReportError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Generic `{"message": …}` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error body: `{"detail": …}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Absent fields deserialize as empty strings and simply fail the check.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPreviewResponse {
    pub current_key: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateKeyRequest {
    #[serde(default)]
    pub new_key: Option<String>,
}

/// HTTP status for each request-fatal error.
pub fn status_for(error: &ReportError) -> StatusCode {
    match error {
        ReportError::UnsupportedFileType { .. }
        | ReportError::InvalidUpload { .. }
        | ReportError::InvalidRequestBody { .. }
        | ReportError::InvalidKeyFormat
        | ReportError::KeyRejected { .. } => StatusCode::BAD_REQUEST,
        ReportError::Unauthorized | ReportError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        ReportError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        ReportError::ApiKeyNotConfigured
        | ReportError::ModelCallFailed { .. }
        | ReportError::MalformedReport { .. }
        | ReportError::CredentialStore { .. }
        | ReportError::InvalidConfig(_)
        | ReportError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// [`ReportError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub ReportError);

impl From<ReportError> for ApiError {
    fn from(e: ReportError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!("{} → {}", status, self.0);
        } else {
            warn!("{} → {}", status, self.0);
        }
        (
            status,
            Json(ErrorBody {
                detail: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
