//! Extraction result data model.
//!
//! `ExtractionResult` is the single artifact the pipeline hands back. Its JSON
//! form (field order preserved, `null` for missing values) is the export format.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of document types that steer prompts and rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    /// Commercial invoice (also the fallback).
    #[default]
    Invoice,
    /// Hospital or clinic bill.
    MedicalBill,
    /// Medical prescription.
    Prescription,
}

impl DocType {
    /// All document types, in routing priority order.
    pub const ALL: [DocType; 3] = [DocType::Invoice, DocType::MedicalBill, DocType::Prescription];

    /// Snake-case label used in prompts and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Invoice => "invoice",
            DocType::MedicalBill => "medical_bill",
            DocType::Prescription => "prescription",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "invoice" => Ok(DocType::Invoice),
            "medical_bill" => Ok(DocType::MedicalBill),
            "prescription" => Ok(DocType::Prescription),
            other => Err(format!(
                "unknown document type '{}' (expected invoice, medical_bill or prescription)",
                other
            )),
        }
    }
}

/// A field value as produced by the model: text or a JSON number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n.into())
    }
}

/// Where a field value was found in the source document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Page number (1-indexed).
    pub page: Option<u32>,

    /// Bounding box (x1, y1, x2, y2).
    pub bbox: Option<[i32; 4]>,
}

impl Source {
    /// Source pointing at a page with no box.
    pub fn page(page_no: u32) -> Self {
        Self {
            page: Some(page_no),
            bbox: None,
        }
    }
}

/// One extracted, named data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name (possibly rewritten by name normalization).
    pub name: String,

    /// Extracted value, `None` when the model reported it missing.
    pub value: Option<FieldValue>,

    /// Confidence (0.0 - 1.0). Model-reported until the scorer adjusts it.
    pub confidence: f64,

    /// Source attribution.
    #[serde(default)]
    pub source: Source,

    /// Confidence carried into the first scoring pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_confidence: Option<f64>,
}

impl Field {
    pub fn new(name: impl Into<String>, value: Option<FieldValue>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            value,
            confidence,
            source: Source::default(),
            base_confidence: None,
        }
    }

    /// Value rendered as text, `None` for null values.
    pub fn value_text(&self) -> Option<String> {
        self.value.as_ref().map(|v| v.to_string())
    }
}

/// Passed and failed validation rules for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QaReport {
    /// Identifiers of passed rules, in evaluation order.
    pub passed_rules: Vec<String>,

    /// Identifiers of failed rules, in evaluation order.
    pub failed_rules: Vec<String>,

    /// Free-form notes about skipped rules.
    pub notes: String,
}

impl QaReport {
    pub fn is_passed(&self, rule: &str) -> bool {
        self.passed_rules.iter().any(|r| r == rule)
    }

    pub fn is_failed(&self, rule: &str) -> bool {
        self.failed_rules.iter().any(|r| r == rule)
    }
}

/// Final output of the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Document type used for extraction.
    pub doc_type: DocType,

    /// Extracted fields in model output order; names may repeat.
    pub fields: Vec<Field>,

    /// Mean of the final per-field confidences.
    pub overall_confidence: f64,

    /// Validation report.
    #[serde(default)]
    pub qa: QaReport,
}

impl ExtractionResult {
    /// Unscored result as produced by the extractor.
    pub fn unscored(doc_type: DocType, fields: Vec<Field>) -> Self {
        Self {
            doc_type,
            fields,
            overall_confidence: 0.0,
            qa: QaReport::default(),
        }
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a previously exported result.
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_doc_type_parse_and_display() {
        assert_eq!("medical_bill".parse::<DocType>().unwrap(), DocType::MedicalBill);
        assert_eq!(" Invoice ".parse::<DocType>().unwrap(), DocType::Invoice);
        assert!("receipt".parse::<DocType>().is_err());
        assert_eq!(DocType::Prescription.to_string(), "prescription");
    }

    #[test]
    fn test_json_keeps_nulls_and_number_kinds() {
        let mut total = Field::new("Total", Some(FieldValue::from(420)), 0.9);
        total.source = Source::page(1);
        let result = ExtractionResult::unscored(
            DocType::Invoice,
            vec![total, Field::new("Date", None, 0.2)],
        );

        let json = result.to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["doc_type"], "invoice");
        assert_eq!(value["fields"][0]["value"], 420);
        assert_eq!(value["fields"][0]["source"]["page"], 1);
        assert!(value["fields"][1]["value"].is_null());
        assert!(value["fields"][1]["source"]["bbox"].is_null());

        assert_eq!(ExtractionResult::from_json(&json).unwrap(), result);
    }

    #[test]
    fn test_decode_encode_is_lossless() {
        let input = r#"{"doc_type":"prescription","fields":[{"name":"Dose","value":"5mg","confidence":0.75,"source":{"page":2,"bbox":[1,2,3,4]},"base_confidence":0.8},{"name":"Qty","value":2.5,"confidence":0.5,"source":{"page":null,"bbox":null}}],"overall_confidence":0.625,"qa":{"passed_rules":[],"failed_rules":["totals_match"],"notes":""}}"#;
        let result = ExtractionResult::from_json(input).unwrap();
        assert_eq!(serde_json::to_string(&result).unwrap(), input);
    }

    #[test]
    fn test_value_text() {
        assert_eq!(Field::new("A", Some("x".into()), 0.0).value_text().as_deref(), Some("x"));
        assert_eq!(Field::new("A", None, 0.0).value_text(), None);
    }
}
