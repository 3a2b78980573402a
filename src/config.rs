//! Configuration types for report analysis and the HTTP service.
//!
//! All analysis behaviour is controlled through [`AnalyzerConfig`], built via
//! its [`AnalyzerConfigBuilder`]. The service-level knobs (bind address,
//! credential file, token secret) live in [`ServerConfig`] so the library can
//! be used without the HTTP layer.

use crate::error::ReportError;
use crate::retry::RetryPolicy;
use std::path::PathBuf;
use std::time::Duration;

/// Default chat-completion endpoint root.
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for turning one document into a report.
///
/// # Example
/// ```rust
/// use inspect2report::AnalyzerConfig;
///
/// let config = AnalyzerConfig::builder()
///     .model("gpt-4o")
///     .temperature(0.2)
///     .build()
///     .unwrap();
/// assert_eq!(config.retry.max_attempts, 3);
/// ```
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Model identifier sent with every request. Default: `gpt-4o`.
    pub model: String,

    /// Sampling temperature for both modes. Default: 0.2.
    ///
    /// Low temperature keeps the report close to what the document says.
    pub temperature: f32,

    /// Output token cap for vision requests. Default: 800.
    pub vision_max_tokens: usize,

    /// Output token cap for text requests. Default: none (provider default).
    pub text_max_tokens: Option<usize>,

    /// Retry policy around each model call. Default: 3 attempts, 4s → 8s, cap 10s.
    pub retry: RetryPolicy,

    /// What to send to the vision model when a PDF has no extractable text.
    pub pdf_vision_fallback: PdfVisionFallback,

    /// Longest edge, in pixels, of a rendered PDF page. Default: 2000.
    pub max_rendered_pixels: u32,

    /// Chat-completion API root. Default: [`DEFAULT_API_BASE_URL`].
    pub api_base_url: String,

    /// Per-request timeout for the provider. `None` keeps the HTTP client default.
    pub request_timeout: Option<Duration>,

    /// Explicit pdfium library to bind. `None` searches the system library path.
    pub pdfium_library: Option<PathBuf>,

    /// Custom system prompt. If None, uses [`crate::prompts::DEFAULT_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.2,
            vision_max_tokens: 800,
            text_max_tokens: None,
            retry: RetryPolicy::default(),
            pdf_vision_fallback: PdfVisionFallback::default(),
            max_rendered_pixels: 2000,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: None,
            pdfium_library: None,
            system_prompt: None,
        }
    }
}

impl AnalyzerConfig {
    /// Create a new builder for `AnalyzerConfig`.
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnalyzerConfig`].
#[derive(Debug)]
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn vision_max_tokens(mut self, n: usize) -> Self {
        self.config.vision_max_tokens = n;
        self
    }

    pub fn text_max_tokens(mut self, n: usize) -> Self {
        self.config.text_max_tokens = Some(n);
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.retry.max_attempts = n;
        self
    }

    pub fn pdf_vision_fallback(mut self, mode: PdfVisionFallback) -> Self {
        self.config.pdf_vision_fallback = mode;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalyzerConfig, ReportError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(ReportError::InvalidConfig("model must not be empty".into()));
        }
        if c.retry.max_attempts == 0 {
            return Err(ReportError::InvalidConfig(
                "max attempts must be ≥ 1".into(),
            ));
        }
        if c.retry.initial_backoff > c.retry.max_backoff {
            return Err(ReportError::InvalidConfig(format!(
                "initial backoff {:?} exceeds max backoff {:?}",
                c.retry.initial_backoff, c.retry.max_backoff
            )));
        }
        if !(c.api_base_url.starts_with("http://") || c.api_base_url.starts_with("https://")) {
            return Err(ReportError::InvalidConfig(format!(
                "API base URL must be http(s), got '{}'",
                c.api_base_url
            )));
        }
        Ok(self.config)
    }
}

/// What the vision model receives for a PDF without extractable text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PdfVisionFallback {
    /// Rasterise the first page to PNG; send the original bytes only if
    /// rendering fails. (default)
    #[default]
    RenderFirstPage,
    /// Always send the original PDF bytes as the image payload.
    OriginalBytes,
}

/// Settings for the HTTP service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on. Default: `0.0.0.0:8000`.
    pub bind_addr: String,
    /// JSON file holding the admin credentials and provider key.
    pub credentials_path: PathBuf,
    /// HMAC secret for admin tokens.
    pub token_secret: String,
    /// Tokens older than this are rejected. `None` disables expiry.
    pub token_max_age: Option<Duration>,
    /// Largest accepted upload body in bytes. Default: 20 MiB.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            credentials_path: PathBuf::from("config/admin_data.json"),
            token_secret: String::new(),
            token_max_age: Some(Duration::from_secs(24 * 60 * 60)),
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.token_secret.len() < 16 {
            return Err(ReportError::InvalidConfig(
                "token secret must be at least 16 bytes".into(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(ReportError::InvalidConfig(
                "upload limit must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_behaviour() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.vision_max_tokens, 800);
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.pdf_vision_fallback, PdfVisionFallback::RenderFirstPage);
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn builder_rejects_zero_attempts() {
        let err = AnalyzerConfig::builder().max_attempts(0).build().unwrap_err();
        assert!(matches!(err, ReportError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_non_http_base_url() {
        let err = AnalyzerConfig::builder()
            .api_base_url("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("ftp://example.com"));
    }

    #[test]
    fn builder_trims_trailing_slash_and_clamps() {
        let config = AnalyzerConfig::builder()
            .api_base_url("http://localhost:9999/v1/")
            .temperature(5.0)
            .max_rendered_pixels(10)
            .build()
            .unwrap();
        assert_eq!(config.api_base_url, "http://localhost:9999/v1");
        assert_eq!(config.temperature, 2.0);
        assert_eq!(config.max_rendered_pixels, 100);
    }

    #[test]
    fn server_config_requires_secret() {
        let config = ServerConfig::default();
        assert!(config.validate().is_err());

        let config = ServerConfig {
            token_secret: "a-long-enough-secret".into(),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
