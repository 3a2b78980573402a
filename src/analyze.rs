//! Document-to-report orchestration.
//!
//! [`ReportAnalyzer::analyze`] walks one upload through the pipeline:
//!
//! ```text
//! Received → Classified → {TextExtracted | VisionOnly} → ModelInvoked → Parsed → Done
//!      └──────────┴───────────────┴──────────────────────────┴────────────┴──▶ Failed(reason)
//! ```
//!
//! Each request runs one sequential chain; the only await points that leave
//! the process are the model calls. PDF work (text extraction, page
//! rendering) runs on the blocking pool because pdfium is not async-safe.

use crate::config::{AnalyzerConfig, PdfVisionFallback};
use crate::credentials::ApiKeySource;
use crate::error::ReportError;
use crate::pipeline::classify::{DocumentKind, UploadedDocument};
use crate::pipeline::encode::{encode_page, encode_upload};
use crate::pipeline::extract::{Extraction, PdfiumTextExtractor, TextExtractor};
use crate::pipeline::llm::ModelGateway;
use crate::pipeline::parse::parse_report;
use crate::pipeline::render::{PageRasteriser, PdfiumRasteriser};
use crate::provider::{OpenAiFactory, ProviderFactory};
use crate::report::AnalysisOutput;
use edgequake_llm::{ImageData, LLMProvider};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Turns uploaded inspection documents into [`AnalysisOutput`]s.
///
/// Cheap to share: wrap it in an `Arc` and call [`analyze`](Self::analyze)
/// from as many concurrent requests as needed. No state is kept between
/// calls.
pub struct ReportAnalyzer {
    config: AnalyzerConfig,
    keys: Arc<dyn ApiKeySource>,
    providers: Arc<dyn ProviderFactory>,
    extractor: Arc<dyn TextExtractor>,
    rasteriser: Arc<dyn PageRasteriser>,
}

impl ReportAnalyzer {
    /// Analyzer with pdfium-backed extraction and rendering.
    pub fn new(
        config: AnalyzerConfig,
        keys: Arc<dyn ApiKeySource>,
        providers: Arc<dyn ProviderFactory>,
    ) -> Self {
        let extractor = Arc::new(PdfiumTextExtractor::new(config.pdfium_library.clone()));
        let rasteriser = Arc::new(PdfiumRasteriser::new(
            config.pdfium_library.clone(),
            config.max_rendered_pixels,
        ));
        Self {
            config,
            keys,
            providers,
            extractor,
            rasteriser,
        }
    }

    /// Analyzer talking to the OpenAI-compatible endpoint in `config`.
    pub fn with_openai(
        config: AnalyzerConfig,
        keys: Arc<dyn ApiKeySource>,
    ) -> Result<Self, ReportError> {
        let providers = Arc::new(OpenAiFactory::new(&config)?);
        Ok(Self::new(config, keys, providers))
    }

    pub fn with_text_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_rasteriser(mut self, rasteriser: Arc<dyn PageRasteriser>) -> Self {
        self.rasteriser = rasteriser;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn providers(&self) -> &Arc<dyn ProviderFactory> {
        &self.providers
    }

    /// Analyze one uploaded document.
    ///
    /// # Errors
    /// - [`ReportError::UnsupportedFileType`] before any key lookup or call
    /// - [`ReportError::ApiKeyNotConfigured`] when no key is stored
    /// - [`ReportError::ModelCallFailed`] once every attempt has failed
    /// - [`ReportError::MalformedReport`] when the reply holds no valid report
    pub async fn analyze(&self, document: UploadedDocument) -> Result<AnalysisOutput, ReportError> {
        let start = Instant::now();
        let filename = document.filename.clone();
        info!("Analyzing '{}' ({} bytes)", filename, document.bytes.len());

        match self.run(document).await {
            Ok(output) => {
                info!(
                    "Analysis of '{}' complete: risk={}, {}ms total",
                    filename,
                    output.report.risk_level,
                    start.elapsed().as_millis()
                );
                Ok(output)
            }
            Err(e) => {
                error!("Analysis of '{}' failed: {}", filename, e);
                Err(e)
            }
        }
    }

    /// Read `path` and analyze it.
    pub async fn analyze_file(&self, path: impl AsRef<Path>) -> Result<AnalysisOutput, ReportError> {
        let document = UploadedDocument::from_path(path).await?;
        self.analyze(document).await
    }

    async fn run(&self, document: UploadedDocument) -> Result<AnalysisOutput, ReportError> {
        // ── Step 1: Classify ─────────────────────────────────────────────────
        let kind = document.ensure_supported()?;
        let file = document.filename.to_lowercase();
        let bytes: Arc<[u8]> = document.bytes.into();

        // ── Step 2: Provider for this request's key ──────────────────────────
        let provider = self.resolve_provider().await?;
        let gateway = ModelGateway::new(provider, &self.config);

        // ── Step 3: Text or vision ───────────────────────────────────────────
        let raw_reply = if kind == DocumentKind::Pdf {
            match self.extract_text(Arc::clone(&bytes)).await {
                Some(text) => gateway.analyze_text(&text).await?,
                None => {
                    let image = self.pdf_vision_image(bytes).await;
                    gateway.analyze_vision(&image).await?
                }
            }
        } else {
            gateway.analyze_vision(&encode_upload(&bytes)).await?
        };

        // ── Step 4: Parse ────────────────────────────────────────────────────
        let report = parse_report(&raw_reply)?;

        Ok(AnalysisOutput { file, report })
    }

    async fn resolve_provider(&self) -> Result<Arc<dyn LLMProvider>, ReportError> {
        let key = self
            .keys
            .api_key()
            .await?
            .ok_or(ReportError::ApiKeyNotConfigured)?;
        Ok(self.providers.create(&key))
    }

    /// Text layer of the PDF, or `None` to switch to vision.
    async fn extract_text(&self, pdf: Arc<[u8]>) -> Option<String> {
        let extractor = Arc::clone(&self.extractor);
        let extraction = tokio::task::spawn_blocking(move || extractor.extract(&pdf))
            .await
            .unwrap_or_else(|e| Extraction::Failed(format!("extraction task panicked: {e}")));

        match extraction {
            Extraction::Text(text) => {
                info!("Extracted {} chars of PDF text; using text analysis", text.chars().count());
                Some(text)
            }
            Extraction::Absent => {
                info!("PDF has no text layer; using vision analysis");
                None
            }
            Extraction::Failed(reason) => {
                warn!("PDF text extraction failed ({}); using vision analysis", reason);
                None
            }
        }
    }

    /// Vision payload for a PDF without text.
    async fn pdf_vision_image(&self, pdf: Arc<[u8]>) -> ImageData {
        if self.config.pdf_vision_fallback == PdfVisionFallback::OriginalBytes {
            return encode_upload(&pdf);
        }

        let rasteriser = Arc::clone(&self.rasteriser);
        let source = Arc::clone(&pdf);
        let rendered = tokio::task::spawn_blocking(move || rasteriser.render_first_page(&source))
            .await
            .unwrap_or_else(|e| Err(format!("render task panicked: {e}")));

        let encoded = rendered.and_then(|img| {
            encode_page(&img).map_err(|e| format!("PNG encoding failed: {e}"))
        });

        match encoded {
            Ok(image) => image,
            Err(reason) => {
                warn!("Cannot render first PDF page ({}); sending original bytes", reason);
                encode_upload(&pdf)
            }
        }
    }
}
