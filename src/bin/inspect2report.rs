//! CLI binary for inspect2report.
//!
//! A thin shim over the library crate: `serve` runs the HTTP service,
//! `analyze` runs one document through the pipeline and prints the JSON.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use inspect2report::{
    AdminCredentials, AnalyzerConfig, ApiKeySource, AppState, CredentialStore, PdfVisionFallback,
    ReportAnalyzer, ServerConfig, StaticApiKey, TokenSigner,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the HTTP service (creates config/admin_data.json on first start)
  INSPECT2REPORT_TOKEN_SECRET=change-me-please-0123 \
  INSPECT2REPORT_ADMIN_PASSWORD=s3cret inspect2report serve

  # Analyze one file with a key from the environment
  OPENAI_API_KEY=sk-... inspect2report analyze report.pdf

  # Send the raw PDF instead of a rendered page when there is no text layer
  inspect2report analyze --pdf-fallback original-bytes scan.pdf

HTTP ENDPOINTS:
  GET  /                     liveness probe
  POST /analyze-report       multipart form, field "file"
  POST /admin/login          {"username", "password"} → token
  GET  /admin/key            preview of the stored API key   (Authorization)
  PUT  /admin/key            {"new_key": "sk-..."}            (Authorization)
  GET  /admin/verify-token   token check                      (Authorization)

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY                  Key for `analyze` (the service uses the admin store)
  INSPECT2REPORT_MODEL            Chat model ID
  INSPECT2REPORT_API_BASE_URL     OpenAI-compatible endpoint
  INSPECT2REPORT_TOKEN_SECRET     HMAC secret for admin tokens
  PDFIUM_LIB_PATH                 Path to libpdfium (default: system library)
"#;

/// Analyze vehicle and property inspection documents with a chat model.
#[derive(Parser, Debug)]
#[command(
    name = "inspect2report",
    version,
    about = "Analyze inspection documents (PDF, JPEG, PNG) into structured reports",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "INSPECT2REPORT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "INSPECT2REPORT_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service.
    Serve(ServeArgs),
    /// Analyze one local file and print the report as JSON.
    Analyze(AnalyzeArgs),
}

/// Pipeline settings shared by both subcommands.
#[derive(Args, Debug)]
struct AnalyzerArgs {
    /// Chat model ID.
    #[arg(long, env = "INSPECT2REPORT_MODEL", default_value = "gpt-4o")]
    model: String,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "INSPECT2REPORT_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max output tokens for vision requests.
    #[arg(long, env = "INSPECT2REPORT_VISION_MAX_TOKENS", default_value_t = 800)]
    vision_max_tokens: usize,

    /// Attempts per model call.
    #[arg(long, env = "INSPECT2REPORT_MAX_ATTEMPTS", default_value_t = 3,
          value_parser = clap::value_parser!(u32).range(1..=10))]
    max_attempts: u32,

    /// OpenAI-compatible base URL.
    #[arg(long, env = "INSPECT2REPORT_API_BASE_URL",
          default_value = inspect2report::config::DEFAULT_API_BASE_URL)]
    api_base_url: String,

    /// Per-request HTTP timeout in seconds (0 = none).
    #[arg(long, env = "INSPECT2REPORT_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Path to libpdfium; the system library is used when unset.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// What to send for a PDF with no text layer.
    #[arg(long, env = "INSPECT2REPORT_PDF_FALLBACK", value_enum, default_value = "render-first-page")]
    pdf_fallback: FallbackArg,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "INSPECT2REPORT_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[command(flatten)]
    analyzer: AnalyzerArgs,

    /// Address to listen on.
    #[arg(long, env = "INSPECT2REPORT_ADDR", default_value = "0.0.0.0:8000")]
    addr: String,

    /// Admin credential store.
    #[arg(long, env = "INSPECT2REPORT_CREDENTIALS", default_value = "config/admin_data.json")]
    credentials: PathBuf,

    /// HMAC secret for admin tokens (at least 16 bytes).
    #[arg(long, env = "INSPECT2REPORT_TOKEN_SECRET", hide_env_values = true)]
    token_secret: String,

    /// Token lifetime in hours (0 = never expires).
    #[arg(long, env = "INSPECT2REPORT_TOKEN_MAX_AGE_HOURS", default_value_t = 24)]
    token_max_age_hours: u64,

    /// Admin username written to a new credential store.
    #[arg(long, env = "INSPECT2REPORT_ADMIN_USERNAME", default_value = "admin")]
    admin_username: String,

    /// Admin password written to a new credential store.
    #[arg(long, env = "INSPECT2REPORT_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,

    /// Largest accepted upload in MiB.
    #[arg(long, env = "INSPECT2REPORT_MAX_UPLOAD_MB", default_value_t = 20)]
    max_upload_mb: usize,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    #[command(flatten)]
    analyzer: AnalyzerArgs,

    /// Inspection document (.pdf, .jpg, .jpeg, .png).
    file: PathBuf,

    /// Provider API key.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Write the JSON to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FallbackArg {
    RenderFirstPage,
    OriginalBytes,
}

impl From<FallbackArg> for PdfVisionFallback {
    fn from(v: FallbackArg) -> Self {
        match v {
            FallbackArg::RenderFirstPage => PdfVisionFallback::RenderFirstPage,
            FallbackArg::OriginalBytes => PdfVisionFallback::OriginalBytes,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "inspect2report=debug,tower_http=debug"
    } else {
        "inspect2report=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Analyze(args) => analyze(args).await,
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let server = ServerConfig {
        bind_addr: args.addr.clone(),
        credentials_path: args.credentials.clone(),
        token_secret: args.token_secret.clone(),
        token_max_age: (args.token_max_age_hours > 0)
            .then(|| Duration::from_secs(args.token_max_age_hours * 3600)),
        max_upload_bytes: args.max_upload_mb.saturating_mul(1024 * 1024),
    };
    server.validate().context("Invalid server configuration")?;

    // ── Credential store ─────────────────────────────────────────────────
    let store = Arc::new(CredentialStore::new(&server.credentials_path));
    if !server.credentials_path.exists() {
        let password = args.admin_password.clone().context(
            "No credential store found; set --admin-password to create one",
        )?;
        store
            .ensure_exists(&AdminCredentials {
                admin_username: args.admin_username.clone(),
                admin_password: password,
                openai_api_key: String::new(),
            })
            .await
            .context("Failed to create credential store")?;
    }
    if store.api_key().await?.is_none() {
        tracing::warn!("No provider API key stored yet; set one via PUT /admin/key");
    }

    // ── Analyzer + server ────────────────────────────────────────────────
    let config = build_config(&args.analyzer).await?;
    let keys: Arc<dyn ApiKeySource> = store.clone();
    let analyzer = ReportAnalyzer::with_openai(config, keys).context("Failed to build analyzer")?;

    let tokens = TokenSigner::new(&server.token_secret, server.token_max_age);
    let state = AppState::new(
        Arc::new(analyzer),
        store,
        Arc::new(tokens),
        server.max_upload_bytes,
    );

    inspect2report::start_server(&server.bind_addr, state)
        .await
        .with_context(|| format!("Server on {} stopped", server.bind_addr))
}

async fn analyze(args: AnalyzeArgs) -> Result<()> {
    let config = build_config(&args.analyzer).await?;
    let keys = Arc::new(StaticApiKey::new(args.api_key.clone()));
    let analyzer = ReportAnalyzer::with_openai(config, keys).context("Failed to build analyzer")?;

    let output = analyzer
        .analyze_file(&args.file)
        .await
        .with_context(|| format!("Analysis of {} failed", args.file.display()))?;

    let json = serde_json::to_string_pretty(&output).context("Failed to serialise report")?;
    match args.output {
        Some(path) => {
            tokio::fs::write(&path, format!("{json}\n"))
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{json}").context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

/// Map CLI args to `AnalyzerConfig`.
async fn build_config(args: &AnalyzerArgs) -> Result<AnalyzerConfig> {
    let mut builder = AnalyzerConfig::builder()
        .model(&args.model)
        .temperature(args.temperature)
        .vision_max_tokens(args.vision_max_tokens)
        .max_attempts(args.max_attempts)
        .api_base_url(&args.api_base_url)
        .pdf_vision_fallback(args.pdf_fallback.into());

    if args.api_timeout > 0 {
        builder = builder.request_timeout(Duration::from_secs(args.api_timeout));
    }
    if let Some(ref path) = args.pdfium_lib {
        builder = builder.pdfium_library(path);
    }
    if let Some(ref path) = args.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}
