//! Response parsing: recover an [`InspectionReport`] from a raw model reply.
//!
//! ## Why is this necessary?
//!
//! Even well-prompted models wrap their JSON in prose ("Here is the
//! result: …"), markdown fences, or trailing pleasantries. The parser takes
//! everything from the first `{` to the last `}` and deserializes that. Any
//! failure at this point is final: the reply is not retried.
//!
//! The object is returned exactly as the model wrote it. Strings are not
//! trimmed and list items are neither rewritten nor dropped; `risk_level`
//! values outside the four known levels are kept and only logged.

use crate::error::ReportError;
use crate::report::InspectionReport;
use tracing::{debug, warn};

/// Parse a raw model reply into a report.
pub fn parse_report(raw: &str) -> Result<InspectionReport, ReportError> {
    let json = extract_json_object(raw).ok_or_else(|| ReportError::MalformedReport {
        detail: "no JSON object found in model reply".to_string(),
    })?;

    let report: InspectionReport =
        serde_json::from_str(json).map_err(|e| ReportError::MalformedReport {
            detail: e.to_string(),
        })?;

    if !report.risk_level.is_known() {
        warn!("Model returned unrecognised risk level '{}'", report.risk_level);
    }

    debug!(
        "Parsed report: risk={}, {} issues, {} maintenance items",
        report.risk_level,
        report.issues.len(),
        report.maintenance.len()
    );
    Ok(report)
}

/// Slice from the first `{` to the last `}`, inclusive.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RiskLevel;
    use serde_json::json;

    #[test]
    fn test_reply_wrapped_in_prose() {
        let raw = "Here is the result: {\"summary\":\"ok\",\"risk_level\":\"Low\",\"issues\":[],\"maintenance\":[],\"recommendation\":\"none\"} Thanks!";
        let report = parse_report(raw).unwrap();
        assert_eq!(
            report,
            InspectionReport {
                summary: "ok".into(),
                risk_level: RiskLevel::Low,
                issues: vec![],
                maintenance: vec![],
                recommendation: "none".into(),
            }
        );
    }

    #[test]
    fn test_reply_in_markdown_fence() {
        let raw = "```json\n{\"summary\":\"Fair\",\"risk_level\":\"high\",\"issues\":[\"Oil leak\"],\"maintenance\":[\"Replace gasket\"],\"recommendation\":\"Repair soon\"}\n```";
        let report = parse_report(raw).unwrap();
        assert_eq!(report.risk_level.canonical(), RiskLevel::High);
        assert_eq!(report.issues, vec![json!("Oil leak")]);
    }

    #[test]
    fn test_no_brace_is_malformed() {
        let err = parse_report("Sorry, I cannot read this document.").unwrap_err();
        assert!(matches!(err, ReportError::MalformedReport { .. }));
    }

    #[test]
    fn test_reversed_braces_are_malformed() {
        assert_eq!(extract_json_object("} nothing {"), None);
        assert!(parse_report("} nothing {").is_err());
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = parse_report("{\"summary\": \"ok\", }").unwrap_err();
        assert!(matches!(err, ReportError::MalformedReport { .. }));
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let err = parse_report(r#"{"summary":"ok","risk_level":"Low","issues":[],"maintenance":[]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("recommendation"), "got: {err}");
    }

    #[test]
    fn test_extract_spans_nested_objects() {
        let raw = "pre {\"a\": {\"b\": 1}} post";
        assert_eq!(extract_json_object(raw), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn test_embedded_object_is_returned_verbatim() {
        let raw = r#"Result: {"summary":" ok ","risk_level":"Low","issues":["- Oil leak",""],"maintenance":["1. Replace gasket"],"recommendation":"none"} bye"#;
        let report = parse_report(raw).unwrap();
        assert_eq!(report.summary, " ok ");
        assert_eq!(report.issues, vec![json!("- Oil leak"), json!("")]);
        assert_eq!(report.maintenance, vec![json!("1. Replace gasket")]);
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            serde_json::from_str::<serde_json::Value>(extract_json_object(raw).unwrap()).unwrap()
        );
    }

    #[test]
    fn test_object_items_and_numeric_risk_level() {
        let raw = r#"{"summary":"ok","risk_level":4,"issues":[{"part":"brakes","note":"worn"}],"maintenance":[],"recommendation":"fix"}"#;
        let report = parse_report(raw).unwrap();
        assert_eq!(report.risk_level, RiskLevel::Other("4".into()));
        assert_eq!(report.issues[0]["part"], "brakes");
    }

    #[test]
    fn test_unknown_risk_level_is_kept() {
        let raw = r#"{"summary":"حالة جيدة","risk_level":"منخفض","issues":[],"maintenance":[],"recommendation":"لا شيء"}"#;
        let report = parse_report(raw).unwrap();
        assert_eq!(report.risk_level, RiskLevel::Other("منخفض".into()));
        assert_eq!(report.summary, "حالة جيدة");
    }
}
