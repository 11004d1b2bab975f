//! Rule-based validation of extracted fields.

pub mod format;
pub mod patterns;
pub mod totals;

pub use format::{AmountNumericRule, DateFormatRule, coerce_amount};
pub use totals::{TOTALS_MATCH, Totals, TotalsCheck};

use tracing::debug;

use crate::models::{DocType, ExtractionResult, Field, QaReport};

/// Outcome of a single rule evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    /// Namespaced rule identifier, e.g. `date_format:Date`.
    pub rule_id: String,
    pub passed: bool,
}

impl RuleOutcome {
    pub fn new(rule_id: impl Into<String>, passed: bool) -> Self {
        Self {
            rule_id: rule_id.into(),
            passed,
        }
    }
}

/// A rule evaluated independently per field.
pub trait FieldRule {
    /// Rule namespace.
    fn id(&self) -> &'static str;

    /// Evaluate the rule, `None` when it does not apply to this field.
    fn check(&self, field: &Field) -> Option<RuleOutcome>;
}

/// Validate an extraction and build its QA report.
///
/// Per-field format rules run first, in field order, then the cross-field
/// totals rule. The rules are the same for every document type.
pub fn validate(extraction: &ExtractionResult, doc_type: DocType) -> QaReport {
    let rules: [&dyn FieldRule; 2] = [&DateFormatRule, &AmountNumericRule];
    let mut report = QaReport::default();
    let mut notes = Vec::new();

    for field in &extraction.fields {
        for outcome in rules.iter().filter_map(|rule| rule.check(field)) {
            record(&mut report, outcome);
        }
    }

    match Totals::collect(&extraction.fields).check() {
        TotalsCheck::Passed => report.passed_rules.push(TOTALS_MATCH.to_string()),
        TotalsCheck::Failed { .. } => report.failed_rules.push(TOTALS_MATCH.to_string()),
        TotalsCheck::Skipped { missing } => {
            notes.push(format!("{} skipped: missing {}", TOTALS_MATCH, missing.join(", ")));
        }
    }

    report.notes = notes.join("; ");

    debug!(
        doc_type = %doc_type,
        passed = report.passed_rules.len(),
        failed = report.failed_rules.len(),
        "Validation complete"
    );

    report
}

fn record(report: &mut QaReport, outcome: RuleOutcome) {
    if outcome.passed {
        report.passed_rules.push(outcome.rule_id);
    } else {
        report.failed_rules.push(outcome.rule_id);
    }
}
