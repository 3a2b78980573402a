//! First-page rasterisation for the PDF vision fallback.
//!
//! A scanned PDF has no text layer, and vision models take images, not PDF
//! containers. The first page is rendered through pdfium and handed to the
//! encoder as a PNG. Inspection reports put the verdict and the defect list
//! on page one, so one page keeps the request small.
//!
//! ## Why cap pixels, not DPI?
//!
//! Page sizes vary wildly: an A3 scan at 300 DPI would produce a
//! 3,500 × 5,000 px image. `max_rendered_pixels` caps the longest edge
//! regardless of physical size, keeping memory bounded and matching the
//! image-size sweet spot for vision models (around 1,024–2,048 px).

use super::extract::bind_pdfium;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::debug;

/// Renders a page of a PDF to an image. Blocking; call from `spawn_blocking`.
pub trait PageRasteriser: Send + Sync {
    fn render_first_page(&self, pdf: &[u8]) -> Result<DynamicImage, String>;
}

/// [`PageRasteriser`] backed by pdfium.
#[derive(Debug, Clone)]
pub struct PdfiumRasteriser {
    library: Option<PathBuf>,
    max_pixels: u32,
}

impl PdfiumRasteriser {
    pub fn new(library: Option<PathBuf>, max_pixels: u32) -> Self {
        Self {
            library,
            max_pixels,
        }
    }
}

impl PageRasteriser for PdfiumRasteriser {
    fn render_first_page(&self, pdf: &[u8]) -> Result<DynamicImage, String> {
        let pdfium = bind_pdfium(self.library.as_deref())?;

        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| format!("cannot open PDF: {:?}", e))?;

        let pages = document.pages();
        if pages.len() == 0 {
            return Err("PDF has no pages".to_string());
        }

        let page = pages
            .get(0)
            .map_err(|e| format!("cannot load page 1: {:?}", e))?;

        let render_config = PdfRenderConfig::new()
            .set_target_width(self.max_pixels as i32)
            .set_maximum_height(self.max_pixels as i32);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| format!("rasterisation failed for page 1: {:?}", e))?;

        let image = bitmap.as_image();
        debug!("Rendered page 1 → {}x{} px", image.width(), image.height());

        Ok(image)
    }
}
