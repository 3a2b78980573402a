//! Prompts sent to the model provider.
//!
//! Both analysis modes share one expert persona. The vision prompt embeds the
//! output schema because vision requests cannot use the provider's strict
//! JSON mode; the text request relies on JSON mode plus the same schema.
//!
//! Callers can override the system prompt via
//! [`crate::config::AnalyzerConfig::system_prompt`]; the constants here are
//! used only when no override is provided.

/// Default system prompt: inspection expert persona and JSON output schema.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a vehicle inspection expert. You analyze vehicle inspection reports written in English or Arabic.

Guidelines:
- Respond in Arabic if the report is in Arabic, otherwise respond in English.
- Be short, clear, and friendly.
- Never mention being an AI.
- Return ONLY valid JSON with exactly these fields:

{
  "summary": "1-line car condition",
  "risk_level": "Low|Medium|High|Critical",
  "issues": ["bullet points"],
  "maintenance": ["action items"],
  "recommendation": "final advice"
}"#;

/// User-turn instruction accompanying an image.
pub const VISION_INSTRUCTION: &str =
    "Analyze this car inspection report image and respond in JSON only.";

/// Build the user turn for text analysis.
pub fn text_instruction(report_text: &str) -> String {
    format!(
        "Analyze this inspection report text and return JSON only:\n{}",
        report_text
    )
}
