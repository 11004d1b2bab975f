//! Confidence scoring from validation outcomes.
//!
//! Boost and penalty are computed once per document and applied uniformly to
//! every field, including fields unrelated to the rules that produced them.

use tracing::debug;

use crate::models::{ExtractionResult, QaReport};
use crate::validator::TOTALS_MATCH;

const FORMAT_RULE_BOOST: f64 = 0.05;
const TOTALS_MATCH_BOOST: f64 = 0.1;
const FAILED_RULE_PENALTY: f64 = 0.05;

/// Global confidence adjustment derived from a QA report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    pub boost: f64,
    pub penalty: f64,
}

impl Adjustment {
    pub fn from_report(qa: &QaReport) -> Self {
        let format_passes = qa
            .passed_rules
            .iter()
            .filter(|r| r.contains("date_format") || r.contains("amount_numeric"))
            .count();

        let mut boost = FORMAT_RULE_BOOST * format_passes as f64;
        if qa.is_passed(TOTALS_MATCH) {
            boost += TOTALS_MATCH_BOOST;
        }

        let penalty = FAILED_RULE_PENALTY * qa.failed_rules.len() as f64;

        Self { boost, penalty }
    }

    /// Clamp `base + boost - penalty` into [0, 1], rounded to 3 decimals.
    pub fn apply(&self, base: f64) -> f64 {
        round3((base + self.boost - self.penalty).clamp(0.0, 1.0))
    }
}

/// Finalize confidences and attach the QA report.
///
/// Every field is scored from its extractor-stage confidence, which is kept in
/// `base_confidence`, so scoring the same result twice gives the same numbers.
pub fn score(mut extraction: ExtractionResult, qa: QaReport) -> ExtractionResult {
    let adjustment = Adjustment::from_report(&qa);

    for field in &mut extraction.fields {
        let base = *field.base_confidence.get_or_insert(field.confidence);
        field.confidence = adjustment.apply(base);
    }

    extraction.overall_confidence = if extraction.fields.is_empty() {
        0.0
    } else {
        let sum: f64 = extraction.fields.iter().map(|f| f.confidence).sum();
        round3(sum / extraction.fields.len() as f64)
    };

    debug!(
        boost = adjustment.boost,
        penalty = adjustment.penalty,
        overall = extraction.overall_confidence,
        "Scoring complete"
    );

    extraction.qa = qa;
    extraction
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocType, Field};
    use crate::validator::validate;
    use pretty_assertions::assert_eq;

    fn report(passed: &[&str], failed: &[&str]) -> QaReport {
        QaReport {
            passed_rules: passed.iter().map(|s| s.to_string()).collect(),
            failed_rules: failed.iter().map(|s| s.to_string()).collect(),
            notes: String::new(),
        }
    }

    fn result(confidences: &[f64]) -> ExtractionResult {
        let fields = confidences
            .iter()
            .enumerate()
            .map(|(i, c)| Field::new(format!("F{}", i), Some("x".into()), *c))
            .collect();
        ExtractionResult::unscored(DocType::Invoice, fields)
    }

    #[test]
    fn test_adjustment() {
        let qa = report(
            &["date_format:Date", "amount_numeric:Total", "totals_match"],
            &["amount_numeric:Tax"],
        );
        let adj = Adjustment::from_report(&qa);
        assert!((adj.boost - 0.2).abs() < 1e-9);
        assert!((adj.penalty - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_score_applies_uniformly() {
        let qa = report(&["date_format:Date", "totals_match"], &[]);
        let scored = score(result(&[0.5, 0.8]), qa.clone());

        assert_eq!(scored.fields[0].confidence, 0.65);
        assert_eq!(scored.fields[1].confidence, 0.95);
        assert_eq!(scored.overall_confidence, 0.8);
        assert_eq!(scored.qa, qa);
    }

    #[test]
    fn test_score_clamps() {
        let scored = score(result(&[0.99]), report(&["totals_match"], &[]));
        assert_eq!(scored.fields[0].confidence, 1.0);

        let failed: Vec<&str> = vec!["totals_match"; 5];
        let scored = score(result(&[0.1]), report(&[], &failed));
        assert_eq!(scored.fields[0].confidence, 0.0);
    }

    #[test]
    fn test_out_of_range_base_clamps_after_adjustment() {
        let scored = score(result(&[1.7]), report(&[], &["totals_match"]));
        assert_eq!(scored.fields[0].confidence, 1.0);
        assert_eq!(scored.fields[0].base_confidence, Some(1.7));

        let scored = score(result(&[-0.2]), report(&["totals_match"], &[]));
        assert_eq!(scored.fields[0].confidence, 0.0);
    }

    #[test]
    fn test_empty_fields() {
        let scored = score(result(&[]), report(&["totals_match"], &[]));
        assert_eq!(scored.overall_confidence, 0.0);
    }

    #[test]
    fn test_rescoring_is_idempotent() {
        let mut input = result(&[0.7, 0.4]);
        input.fields[0].name = "Date".to_string();
        input.fields[0].value = Some("01/02/2024".into());

        let qa = validate(&input, DocType::Invoice);
        let once = score(input, qa);

        let qa_again = validate(&once, DocType::Invoice);
        let twice = score(once.clone(), qa_again);

        assert_eq!(twice, once);
    }

    #[test]
    fn test_monotonic_in_rules() {
        let base = score(result(&[0.5]), report(&["date_format:A"], &["x"]));
        let more_passed = score(result(&[0.5]), report(&["date_format:A", "amount_numeric:B"], &["x"]));
        let more_failed = score(result(&[0.5]), report(&["date_format:A"], &["x", "y"]));

        assert!(more_passed.fields[0].confidence >= base.fields[0].confidence);
        assert!(more_failed.fields[0].confidence <= base.fields[0].confidence);
    }

    #[test]
    fn test_overall_is_mean_of_final() {
        let scored = score(result(&[0.1234, 0.5, 0.9]), report(&[], &[]));
        let mean = scored.fields.iter().map(|f| f.confidence).sum::<f64>() / 3.0;
        assert_eq!(scored.overall_confidence, round3(mean));
        assert!((0.0..=1.0).contains(&scored.overall_confidence));
    }
}
