//! Error types for the inspect2report library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ReportError`]: **fatal** for one request. The document cannot be
//!   turned into a report (unsupported file, key not configured, model
//!   unreachable after retries, unreadable reply). Returned as
//!   `Err(ReportError)` from [`crate::analyze::ReportAnalyzer::analyze`] and
//!   mapped to an HTTP status by the server.
//!
//! * [`ModelError`]: **transient**. A single call to the model provider
//!   failed. The retry policy in [`crate::pipeline::llm`] absorbs these; only
//!   the last one survives, wrapped in [`ReportError::ModelCallFailed`].
//!
//! PDF text-extraction failures are neither: they are reported through
//! [`crate::pipeline::extract::Extraction::Failed`] and turn into the vision
//! fallback instead of an error.

use std::path::PathBuf;
use thiserror::Error;

/// All request-fatal errors returned by the inspect2report library.
#[derive(Debug, Error)]
pub enum ReportError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The uploaded filename has no supported suffix.
    #[error("Unsupported file type: '{filename}'. Upload a .pdf, .jpg, .jpeg or .png file.")]
    UnsupportedFileType { filename: String },

    /// The request did not carry a usable file upload.
    #[error("Invalid upload: {reason}")]
    InvalidUpload { reason: String },

    /// The request body exceeded the configured upload limit.
    #[error("Upload exceeds the {limit}-byte limit")]
    PayloadTooLarge { limit: usize },

    /// A JSON request body could not be decoded.
    #[error("Invalid request body: {detail}")]
    InvalidRequestBody { detail: String },

    // ── Model errors ──────────────────────────────────────────────────────
    /// No provider API key has been configured by the administrator.
    #[error("Model provider API key not configured by admin.")]
    ApiKeyNotConfigured,

    /// Every attempt of the model call failed.
    #[error("Model call failed after {attempts} attempts: {last_error}")]
    ModelCallFailed { attempts: u32, last_error: String },

    /// The model reply did not contain a well-formed report.
    #[error("Model reply is not a well-formed report: {detail}")]
    MalformedReport { detail: String },

    // ── Admin errors ──────────────────────────────────────────────────────
    /// Missing, tampered or expired admin token.
    #[error("Unauthorized")]
    Unauthorized,

    /// Login attempt with the wrong username or password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A new provider key that does not look like one.
    #[error("Invalid key format")]
    InvalidKeyFormat,

    /// The provider refused the new key.
    #[error("Invalid or inactive API key: {detail}")]
    KeyRejected { detail: String },

    /// The admin credential file could not be read or written.
    #[error("Credential store '{path}' unavailable: {detail}")]
    CredentialStore { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A single failed call to the model provider.
///
/// Retried by the gateway; never returned directly to HTTP clients.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// The request never produced an HTTP response (DNS, TLS, timeout…).
    #[error("request to model provider failed: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("model provider returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The response body was not the expected chat-completion shape.
    #[error("could not decode model provider response: {0}")]
    Decode(String),

    /// The provider client reported an error (auth, rate limit, bad request…).
    #[error("model provider error: {0}")]
    Provider(String),

    /// The provider answered without any message content.
    #[error("model provider returned an empty reply")]
    EmptyReply,
}

impl From<edgequake_llm::LlmError> for ModelError {
    fn from(err: edgequake_llm::LlmError) -> Self {
        use edgequake_llm::LlmError;
        match err {
            LlmError::NetworkError(msg) => ModelError::Transport(msg),
            LlmError::Timeout => ModelError::Transport("request timed out".into()),
            LlmError::SerializationError(e) => ModelError::Decode(e.to_string()),
            other => ModelError::Provider(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_file_type_names_the_file() {
        let e = ReportError::UnsupportedFileType {
            filename: "notes.docx".into(),
        };
        assert!(e.to_string().contains("notes.docx"), "got: {e}");
    }

    #[test]
    fn model_call_failed_display() {
        let e = ReportError::ModelCallFailed {
            attempts: 3,
            last_error: ModelError::Api {
                status: 503,
                body: "overloaded".into(),
            }
            .to_string(),
        };
        let msg = e.to_string();
        assert!(msg.contains("3 attempts"), "got: {msg}");
        assert!(msg.contains("HTTP 503"), "got: {msg}");
    }

    #[test]
    fn credential_store_display() {
        let e = ReportError::CredentialStore {
            path: PathBuf::from("config/admin_data.json"),
            detail: "not found".into(),
        };
        assert!(e.to_string().contains("admin_data.json"));
    }

    #[test]
    fn llm_errors_map_to_model_errors() {
        use edgequake_llm::LlmError;
        assert!(matches!(
            ModelError::from(LlmError::NetworkError("reset".into())),
            ModelError::Transport(_)
        ));
        assert!(matches!(ModelError::from(LlmError::Timeout), ModelError::Transport(_)));
        let auth = ModelError::from(LlmError::AuthError("invalid_api_key".into()));
        assert!(matches!(auth, ModelError::Provider(_)));
        assert!(auth.to_string().contains("invalid_api_key"));
    }
}
