//! Shared fakes for integration tests: a scripted `LLMProvider` and
//! in-memory stand-ins for the pdfium-backed extractor and rasteriser.

#![allow(dead_code)]

use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, LLMResponse, LlmError};
use image::{DynamicImage, Rgba, RgbaImage};
use inspect2report::pipeline::extract::{Extraction, TextExtractor};
use inspect2report::pipeline::render::PageRasteriser;
use inspect2report::provider::ProviderFactory;
use inspect2report::{AnalyzerConfig, ModelError, RetryPolicy};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const VALID_REPORT: &str = r#"{"summary":"Vehicle in fair condition","risk_level":"Medium","issues":["- Worn brake pads"],"maintenance":["Replace brake pads"],"recommendation":"Service within a month"}"#;

/// Magic bytes are enough for suffix classification and MIME sniffing.
pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n%fake\n";
pub const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n', 0, 0, 0, 0];

/// Config whose retries never sleep.
pub fn fast_config() -> AnalyzerConfig {
    AnalyzerConfig::builder()
        .retry(RetryPolicy::immediate(3))
        .build()
        .expect("valid config")
}

/// What a [`ScriptedProvider`] saw on one call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub user_text: String,
    /// Data URI of the first attached image.
    pub image_url: Option<String>,
    pub json_mode: bool,
    pub max_tokens: Option<usize>,
}

/// Returns queued replies in order; fails once the queue is empty.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(reply: &str) -> Arc<Self> {
        Self::new(vec![Ok(reply.to_string())])
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn next_reply(&self) -> Result<LLMResponse, LlmError> {
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::NetworkError("no scripted reply left".into())));
        reply.map(|content| LLMResponse::new(content, "scripted-model").with_usage(10, 5))
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    fn max_context_length(&self) -> usize {
        128_000
    }

    async fn complete(&self, prompt: &str) -> edgequake_llm::Result<LLMResponse> {
        self.chat(&[ChatMessage::user(prompt)], None).await
    }

    async fn complete_with_options(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> edgequake_llm::Result<LLMResponse> {
        self.chat(&[ChatMessage::user(prompt)], Some(options)).await
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: Option<&CompletionOptions>,
    ) -> edgequake_llm::Result<LLMResponse> {
        let user = messages.last().expect("at least one message");
        let options = options.cloned().unwrap_or_default();
        self.calls.lock().unwrap().push(RecordedCall {
            user_text: user.content.clone(),
            image_url: user
                .images
                .as_ref()
                .and_then(|images| images.first())
                .map(|image| image.to_data_uri()),
            json_mode: options.response_format.as_deref() == Some("json_object"),
            max_tokens: options.max_tokens,
        });
        self.next_reply()
    }
}

/// Hands out one shared [`ScriptedProvider`] and records the keys it saw.
pub struct ScriptedFactory {
    pub provider: Arc<ScriptedProvider>,
    keys: Mutex<Vec<String>>,
    verify: Result<(), ModelError>,
}

impl ScriptedFactory {
    pub fn new(provider: Arc<ScriptedProvider>) -> Arc<Self> {
        Arc::new(Self {
            provider,
            keys: Mutex::new(Vec::new()),
            verify: Ok(()),
        })
    }

    pub fn rejecting_keys(provider: Arc<ScriptedProvider>) -> Arc<Self> {
        Arc::new(Self {
            provider,
            keys: Mutex::new(Vec::new()),
            verify: Err(ModelError::Api {
                status: 401,
                body: "invalid_api_key".into(),
            }),
        })
    }

    /// Keys passed to `create`, in order.
    pub fn keys_used(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderFactory for ScriptedFactory {
    fn create(&self, api_key: &str) -> Arc<dyn LLMProvider> {
        self.keys.lock().unwrap().push(api_key.to_string());
        self.provider.clone()
    }

    async fn verify_key(&self, _api_key: &str) -> Result<(), ModelError> {
        self.verify.clone()
    }
}

/// Returns a fixed [`Extraction`] and counts calls.
pub struct FakeExtractor {
    result: Extraction,
    calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn new(result: Extraction) -> Arc<Self> {
        Arc::new(Self {
            result,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextExtractor for FakeExtractor {
    fn extract(&self, _pdf: &[u8]) -> Extraction {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Renders a tiny solid image, or fails with a fixed reason.
pub struct FakeRasteriser {
    fail_with: Option<String>,
    calls: AtomicUsize,
}

impl FakeRasteriser {
    pub fn rendering() -> Arc<Self> {
        Arc::new(Self {
            fail_with: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            fail_with: Some(reason.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PageRasteriser for FakeRasteriser {
    fn render_first_page(&self, _pdf: &[u8]) -> Result<DynamicImage, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(reason) => Err(reason.clone()),
            None => Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                4,
                4,
                Rgba([255, 255, 255, 255]),
            ))),
        }
    }
}
