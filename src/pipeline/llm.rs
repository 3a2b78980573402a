//! Model interaction: build text or vision requests and call the provider.
//!
//! This module stays thin: all prompt text lives in
//! [`crate::prompts`] and the backoff arithmetic in [`crate::retry`], so
//! either can change without touching the call logic here.
//!
//! ## Retry Strategy
//!
//! Every call error (transport, provider error, empty reply) is retried under
//! [`crate::config::AnalyzerConfig::retry`]: 3 attempts, waiting 4 s then
//! 8 s. Parsing the reply is not retried; that happens later in
//! [`super::parse`].
//!
//! `edgequake_llm`'s OpenAI client retries rate-limit and 5xx responses
//! internally before an attempt here is counted as failed.

use crate::config::AnalyzerConfig;
use crate::error::{ModelError, ReportError};
use crate::prompts::{text_instruction, DEFAULT_SYSTEM_PROMPT, VISION_INSTRUCTION};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, LLMResponse};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Which kind of payload a request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    Text,
    Vision,
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMode::Text => f.write_str("text"),
            AnalysisMode::Vision => f.write_str("vision"),
        }
    }
}

/// A fully built model request. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    mode: AnalysisMode,
    messages: Vec<ChatMessage>,
    options: CompletionOptions,
}

impl ModelRequest {
    /// System persona + one user turn carrying the image.
    ///
    /// Vision requests cannot use JSON mode, so the schema in the system
    /// prompt is what keeps the reply parseable.
    pub fn vision(image: &ImageData, config: &AnalyzerConfig) -> Self {
        Self {
            mode: AnalysisMode::Vision,
            messages: vec![
                ChatMessage::system(system_prompt(config)),
                ChatMessage::user_with_images(VISION_INSTRUCTION, vec![image.clone()]),
            ],
            options: CompletionOptions {
                temperature: Some(config.temperature),
                max_tokens: Some(config.vision_max_tokens),
                ..Default::default()
            },
        }
    }

    /// System persona + the extracted text, in strict JSON-object mode.
    pub fn text(text: &str, config: &AnalyzerConfig) -> Self {
        Self {
            mode: AnalysisMode::Text,
            messages: vec![
                ChatMessage::system(system_prompt(config)),
                ChatMessage::user(text_instruction(text)),
            ],
            options: CompletionOptions {
                temperature: Some(config.temperature),
                max_tokens: config.text_max_tokens,
                response_format: Some("json_object".to_string()),
                ..Default::default()
            },
        }
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn options(&self) -> &CompletionOptions {
        &self.options
    }

    /// Whether the request asks for a single JSON object.
    pub fn json_mode(&self) -> bool {
        self.options.response_format.as_deref() == Some("json_object")
    }
}

fn system_prompt(config: &AnalyzerConfig) -> &str {
    config
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT)
}

/// Sends requests to one provider under the configured retry policy.
pub struct ModelGateway<'a> {
    provider: Arc<dyn LLMProvider>,
    config: &'a AnalyzerConfig,
}

impl<'a> ModelGateway<'a> {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &'a AnalyzerConfig) -> Self {
        Self { provider, config }
    }

    /// Analyse an image (uploaded photo or rendered page).
    pub async fn analyze_vision(&self, image: &ImageData) -> Result<String, ReportError> {
        self.invoke(&ModelRequest::vision(image, self.config)).await
    }

    /// Analyse text extracted from a PDF.
    pub async fn analyze_text(&self, text: &str) -> Result<String, ReportError> {
        self.invoke(&ModelRequest::text(text, self.config)).await
    }

    /// Call the provider, retrying failed attempts; returns the raw reply.
    pub async fn invoke(&self, request: &ModelRequest) -> Result<String, ReportError> {
        let start = Instant::now();
        let provider = &self.provider;
        let label = format!("{} analysis", request.mode());
        info!("Sending {} to {} ({})", label, provider.name(), provider.model());

        let result = self
            .config
            .retry
            .run(&label, |attempt| async move {
                debug!("{} analysis: attempt {}", request.mode(), attempt);
                match provider.chat(request.messages(), Some(request.options())).await {
                    Ok(response) => non_empty(response),
                    Err(e) => Err(ModelError::from(e)),
                }
            })
            .await;

        match result {
            Ok(response) => {
                info!(
                    "{} responded in {:.2}s ({} input tokens, {} output tokens)",
                    label,
                    start.elapsed().as_secs_f64(),
                    response.prompt_tokens,
                    response.completion_tokens
                );
                Ok(response.content)
            }
            Err(exhausted) => {
                error!(
                    "{} failed after {} attempts in {:.2}s: {}",
                    label,
                    exhausted.attempts,
                    start.elapsed().as_secs_f64(),
                    exhausted.last_error
                );
                Err(ReportError::ModelCallFailed {
                    attempts: exhausted.attempts,
                    last_error: exhausted.last_error.to_string(),
                })
            }
        }
    }
}

/// An empty reply counts as a failed attempt.
fn non_empty(response: LLMResponse) -> Result<LLMResponse, ModelError> {
    if response.content.trim().is_empty() {
        Err(ModelError::EmptyReply)
    } else {
        Ok(response)
    }
}
