//! # inspect2report
//!
//! Turn vehicle and property inspection documents into structured reports
//! using a chat-completion model.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (.pdf / .jpg / .jpeg / .png)
//!  │
//!  ├─ 1. Classify  suffix check; anything else is rejected before any call
//!  ├─ 2. Key       provider API key read from the admin store per request
//!  ├─ 3. Extract   PDF text layer via pdfium (spawn_blocking)
//!  │     ├─ text   → JSON-mode text analysis
//!  │     └─ none   → first page rendered to PNG → vision analysis
//!  ├─ 4. Model     up to 3 attempts, 4 s / 8 s backoff
//!  └─ 5. Parse     first `{` … last `}` → InspectionReport
//! ```
//!
//! Images skip step 3 and go straight to vision analysis.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use inspect2report::{AnalyzerConfig, ReportAnalyzer, StaticApiKey};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let keys = Arc::new(StaticApiKey::new(std::env::var("OPENAI_API_KEY").ok()));
//!     let analyzer = ReportAnalyzer::with_openai(AnalyzerConfig::default(), keys)?;
//!     let output = analyzer.analyze_file("inspection.pdf").await?;
//!     println!("{}: {}", output.file, output.report.risk_level);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `inspect2report` binary (clap + anyhow + tracing-subscriber) |
//!
//! The HTTP service in [`server`] is part of the library and does not need
//! the `cli` feature.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod credentials;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod provider;
pub mod report;
pub mod retry;
pub mod server;
pub mod token;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::ReportAnalyzer;
pub use config::{AnalyzerConfig, AnalyzerConfigBuilder, PdfVisionFallback, ServerConfig};
pub use credentials::{AdminCredentials, ApiKeySource, CredentialStore, StaticApiKey};
pub use error::{ModelError, ReportError};
pub use pipeline::classify::{DocumentKind, UploadedDocument};
pub use report::{AnalysisOutput, InspectionReport, RiskLevel};
pub use retry::RetryPolicy;
pub use server::{build_router, start_server, AppState};
pub use token::TokenSigner;
