//! Per-field format rules.

use crate::models::{Field, FieldValue};

use super::patterns::{DATE_PATTERN, NON_AMOUNT_CHARS};
use super::{FieldRule, RuleOutcome};

/// Name fragments that mark a field as a monetary amount.
const AMOUNT_NAME_PARTS: &[&str] = &["amount", "total", "subtotal"];

/// Checks that date-named fields look like a date.
pub struct DateFormatRule;

impl FieldRule for DateFormatRule {
    fn id(&self) -> &'static str {
        "date_format"
    }

    fn check(&self, field: &Field) -> Option<RuleOutcome> {
        if !field.name.to_lowercase().contains("date") {
            return None;
        }
        let value = field.value.as_ref().filter(|v| is_present(v))?;
        let passed = DATE_PATTERN.is_match(&value.to_string());
        Some(RuleOutcome::new(format!("{}:{}", self.id(), field.name), passed))
    }
}

/// Checks that amount-named fields coerce to a number.
pub struct AmountNumericRule;

impl FieldRule for AmountNumericRule {
    fn id(&self) -> &'static str {
        "amount_numeric"
    }

    fn check(&self, field: &Field) -> Option<RuleOutcome> {
        let name = field.name.to_lowercase();
        if !AMOUNT_NAME_PARTS.iter().any(|part| name.contains(part)) {
            return None;
        }
        // Null values are checked too and fail.
        let passed = coerce_amount(field.value.as_ref()).is_some();
        Some(RuleOutcome::new(format!("{}:{}", self.id(), field.name), passed))
    }
}

/// Coerce a field value to an amount.
///
/// Strips every character that is not a digit or a dot, then parses the rest.
/// Empty or malformed leftovers give `None`, never zero.
pub fn coerce_amount(value: Option<&FieldValue>) -> Option<f64> {
    let raw = value?.to_string();
    let cleaned = NON_AMOUNT_CHARS.replace_all(&raw, "");
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_present(value: &FieldValue) -> bool {
    match value {
        FieldValue::Text(s) => !s.is_empty(),
        FieldValue::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
    }
}
