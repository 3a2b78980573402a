//! Report types produced by the pipeline.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// The structured reading of one inspection document.
///
/// Every field is required when deserializing: a model reply missing any of
/// them is rejected rather than turned into a partial report. List items are
/// kept as the JSON the model wrote, so a string, an object or an empty
/// entry all come back out unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionReport {
    /// One-line condition of the vehicle.
    pub summary: String,
    /// Overall risk as judged by the model.
    pub risk_level: RiskLevel,
    /// Problems found, in the order the model listed them.
    pub issues: Vec<Value>,
    /// Suggested maintenance actions, in order.
    pub maintenance: Vec<Value>,
    /// Final advice.
    pub recommendation: String,
}

/// Risk level reported by the model.
///
/// Only the exact spellings `Low`, `Medium`, `High` and `Critical` map to the
/// named variants; anything else is kept verbatim in [`RiskLevel::Other`] and
/// serialized back unchanged. [`RiskLevel::canonical`] gives the
/// case-insensitive reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
    Other(String),
}

impl RiskLevel {
    /// Case-insensitive reading of `s`, ignoring surrounding whitespace.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "low" => RiskLevel::Low,
            "medium" => RiskLevel::Medium,
            "high" => RiskLevel::High,
            "critical" => RiskLevel::Critical,
            _ => RiskLevel::Other(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
            RiskLevel::Other(s) => s,
        }
    }

    /// Exact spelling from a reply; never rewrites the text.
    pub fn from_reply(s: String) -> Self {
        match s.as_str() {
            "Low" => RiskLevel::Low,
            "Medium" => RiskLevel::Medium,
            "High" => RiskLevel::High,
            "Critical" => RiskLevel::Critical,
            _ => RiskLevel::Other(s),
        }
    }

    /// The known level this value names once case and spacing are ignored.
    pub fn canonical(&self) -> RiskLevel {
        match self {
            RiskLevel::Other(s) => RiskLevel::parse(s),
            known => known.clone(),
        }
    }

    /// `true` when the value names one of the four levels the prompt asks for.
    pub fn is_known(&self) -> bool {
        !matches!(self.canonical(), RiskLevel::Other(_))
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RiskLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RiskLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Models sometimes answer with a number or an object here.
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => RiskLevel::from_reply(s),
            other => RiskLevel::Other(other.to_string()),
        })
    }
}

/// Successful response of the analysis endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    /// Lower-cased name of the uploaded file.
    pub file: String,
    pub report: InspectionReport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn risk_level_is_case_insensitive() {
        assert_eq!(RiskLevel::parse("HIGH"), RiskLevel::High);
        assert_eq!(RiskLevel::parse(" critical "), RiskLevel::Critical);
        assert_eq!(RiskLevel::parse("low"), RiskLevel::Low);
    }

    #[test]
    fn unknown_risk_level_is_preserved() {
        let level = RiskLevel::parse("متوسط");
        assert_eq!(level, RiskLevel::Other("متوسط".into()));
        assert!(!level.is_known());
        assert_eq!(serde_json::to_value(&level).unwrap(), "متوسط");
    }

    #[test]
    fn report_serializes_with_snake_case_risk_key() {
        let report = InspectionReport {
            summary: "Good".into(),
            risk_level: RiskLevel::Medium,
            issues: vec![Value::from("Worn tyres")],
            maintenance: vec![],
            recommendation: "Replace tyres".into(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["risk_level"], "Medium");
        assert_eq!(json["issues"][0], "Worn tyres");
    }

    #[test]
    fn missing_field_is_rejected() {
        let err = serde_json::from_str::<InspectionReport>(
            r#"{"summary":"ok","risk_level":"Low","issues":[],"maintenance":[]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("recommendation"));
    }

    #[test]
    fn reply_spelling_is_kept() {
        let level: RiskLevel = serde_json::from_str(r#"" high ""#).unwrap();
        assert_eq!(level, RiskLevel::Other(" high ".into()));
        assert_eq!(level.canonical(), RiskLevel::High);
        assert!(level.is_known());
        assert_eq!(serde_json::to_value(&level).unwrap(), " high ");

        let exact: RiskLevel = serde_json::from_str(r#""Critical""#).unwrap();
        assert_eq!(exact, RiskLevel::Critical);
    }

    #[test]
    fn non_string_risk_level_is_kept_as_text() {
        let level: RiskLevel = serde_json::from_str("3").unwrap();
        assert_eq!(level, RiskLevel::Other("3".into()));
        assert!(!level.is_known());

        let level: RiskLevel = serde_json::from_str(r#"{"score":7}"#).unwrap();
        assert_eq!(level, RiskLevel::Other(r#"{"score":7}"#.into()));
    }

    #[test]
    fn object_list_items_are_accepted() {
        let report: InspectionReport = serde_json::from_str(
            r#"{"summary":"ok","risk_level":"High","issues":[{"part":"brakes","note":"worn"}],"maintenance":[],"recommendation":"fix"}"#,
        )
        .unwrap();
        assert_eq!(report.risk_level, RiskLevel::High);
        assert_eq!(report.issues, vec![json!({"part": "brakes", "note": "worn"})]);
        assert_eq!(
            serde_json::to_value(&report).unwrap()["issues"][0]["part"],
            "brakes"
        );
    }
}
