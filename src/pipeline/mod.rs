//! Pipeline stages for document-to-report analysis.
//!
//! Each submodule implements exactly one transformation step, so every stage
//! can be tested without the others and the PDF backend can be swapped
//! without touching the model or parsing logic.
//!
//! ## Data Flow
//!
//! ```text
//!              ┌─ pdf ──▶ extract ──┬─ text ───────────────▶ llm (text) ──┐
//! classify ────┤                    └─ absent ─▶ render ─▶ encode ─┐      ├─▶ parse
//!              └─ image ──────────────────────────────▶ encode ─┴─▶ llm (vision)
//! ```
//!
//! 1. [`classify`]: decide PDF / image / unsupported from the filename
//! 2. [`extract`]: pull the PDF text layer; failures become "absent"
//! 3. [`render`]: rasterise the first PDF page for the vision fallback;
//!    runs in `spawn_blocking` because pdfium is not async-safe
//! 4. [`encode`]: wrap image bytes as a base64 data URL payload
//! 5. [`llm`]: drive the model call with retry/backoff; the only stage
//!    with network I/O
//! 6. [`parse`]: recover the JSON report from the raw reply and tidy it

pub mod classify;
pub mod encode;
pub mod extract;
pub mod llm;
pub mod parse;
pub mod render;
