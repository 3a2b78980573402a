//! Image encoding: bytes or rendered pages → base64 [`ImageData`].
//!
//! Vision APIs accept images as base64 data URLs embedded in the JSON
//! request body. Uploaded images are passed through untouched (re-encoding a
//! phone photo would only lose detail); rendered PDF pages are written as
//! PNG because lossless compression keeps small print legible.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Used when the payload is not a recognisable image (e.g. raw PDF bytes).
const FALLBACK_MIME: &str = "image/jpeg";

/// Encode a rasterised page as a base64 PNG.
///
/// `detail: "high"` lets GPT-4-class models tile the image instead of
/// squeezing it into one low-resolution tile; without it fine print is lost.
pub fn encode_page(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded page → {} bytes base64", b64.len());

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}

/// Encode uploaded bytes as-is, labelled with their sniffed MIME type.
pub fn encode_upload(bytes: &[u8]) -> ImageData {
    let mime = sniff_mime(bytes);
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded upload ({}) → {} bytes base64", mime, b64.len());
    ImageData::new(b64, mime).with_detail("high")
}

/// MIME type from the image magic bytes, or [`FALLBACK_MIME`].
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|f| f.to_mime_type())
        .unwrap_or(FALLBACK_MIME)
}
