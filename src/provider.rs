//! Model provider wiring.
//!
//! The pipeline only ever talks to `Arc<dyn LLMProvider>` from
//! `edgequake_llm`. A fresh provider is created per request by a
//! [`ProviderFactory`] because the API key is read from the admin store on
//! every request and may change between them. Tests swap in scripted
//! providers through the same trait.
//!
//! `verify_key` is the one call `edgequake_llm` has no counterpart for: a
//! key is checked with `GET {base}/models` before the admin store accepts it.

use crate::config::AnalyzerConfig;
use crate::error::{ModelError, ReportError};
use async_trait::async_trait;
use edgequake_llm::{LLMProvider, OpenAIProvider};
use std::sync::Arc;

/// Builds providers from an API key, and checks keys before they are stored.
#[async_trait]
pub trait ProviderFactory: Send + Sync {
    fn create(&self, api_key: &str) -> Arc<dyn LLMProvider>;

    /// Succeeds if the provider accepts `api_key`.
    async fn verify_key(&self, api_key: &str) -> Result<(), ModelError>;
}

/// Error bodies can be large HTML pages; keep logs and messages readable.
const MAX_ERROR_BODY: usize = 500;

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push('…');
    }
    body
}

/// Creates `edgequake_llm` OpenAI providers for an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiFactory {
    /// Only used for key verification; chat calls go through the provider.
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OpenAiFactory {
    pub fn new(config: &AnalyzerConfig) -> Result<Self, ReportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ReportError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl ProviderFactory for OpenAiFactory {
    fn create(&self, api_key: &str) -> Arc<dyn LLMProvider> {
        let provider =
            OpenAIProvider::compatible(api_key, self.base_url.as_str()).with_model(&self.model);
        Arc::new(provider)
    }

    async fn verify_key(&self, api_key: &str) -> Result<(), ModelError> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ModelError::Api {
                status: status.as_u16(),
                body: truncate_body(body),
            })
        }
    }
}
