//! PDF text extraction.
//!
//! Text-layer PDFs are far cheaper and more accurate to analyse as text than
//! as an image, so every PDF goes through here first. Scanned documents have
//! no text layer and come back as [`Extraction::Absent`]; corrupt or
//! unreadable files come back as [`Extraction::Failed`]. The orchestrator
//! treats both the same way: it falls back to vision analysis.

use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Outcome of a text-extraction attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Non-empty, trimmed document text.
    Text(String),
    /// The document opened but has no text layer.
    Absent,
    /// The document could not be read at all.
    Failed(String),
}

impl Extraction {
    /// Collapse to the text, if any.
    pub fn into_text(self) -> Option<String> {
        match self {
            Extraction::Text(t) => Some(t),
            Extraction::Absent | Extraction::Failed(_) => None,
        }
    }

    /// Join per-page text with newlines and trim.
    pub fn from_pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = pages
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = joined.trim();
        if trimmed.is_empty() {
            Extraction::Absent
        } else {
            Extraction::Text(trimmed.to_string())
        }
    }
}

/// Pulls literal text out of PDF bytes. Blocking; call from `spawn_blocking`.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, pdf: &[u8]) -> Extraction;
}

/// [`TextExtractor`] backed by pdfium.
#[derive(Debug, Clone, Default)]
pub struct PdfiumTextExtractor {
    library: Option<PathBuf>,
}

impl PdfiumTextExtractor {
    /// `library`: explicit pdfium shared library, or `None` for the system one.
    pub fn new(library: Option<PathBuf>) -> Self {
        Self { library }
    }
}

impl TextExtractor for PdfiumTextExtractor {
    fn extract(&self, pdf: &[u8]) -> Extraction {
        let pdfium = match bind_pdfium(self.library.as_deref()) {
            Ok(p) => p,
            Err(e) => return Extraction::Failed(e),
        };

        let document = match pdfium.load_pdf_from_byte_slice(pdf, None) {
            Ok(d) => d,
            Err(e) => return Extraction::Failed(format!("cannot open PDF: {:?}", e)),
        };

        let pages = document.pages();
        debug!("PDF loaded: {} pages", pages.len());

        // A page without a text layer contributes an empty string.
        let texts: Vec<String> = pages
            .iter()
            .map(|page| page.text().map(|t| t.all()).unwrap_or_default())
            .collect();

        Extraction::from_pages(texts)
    }
}

/// Bind to pdfium at `library`, or search the system library path.
pub(crate) fn bind_pdfium(library: Option<&Path>) -> Result<Pdfium, String> {
    let bindings = match library {
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_system_library(),
    };
    bindings
        .map(Pdfium::new)
        .map_err(|e| format!("cannot bind pdfium library: {:?}", e))
}
