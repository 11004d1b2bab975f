//! Cross-field consistency: subtotal + tax = total.

use crate::models::Field;

use super::format::coerce_amount;

pub const TOTALS_MATCH: &str = "totals_match";

const TOTAL_NAMES: &[&str] = &["total", "totalamount", "grandtotal"];
const SUBTOTAL_NAMES: &[&str] = &["subtotal", "sub_total"];
const TAX_NAMES: &[&str] = &["tax", "gst", "igst", "sgst", "cgst"];

const TOLERANCE: f64 = 0.01;

/// Outcome of the totals rule.
#[derive(Debug, Clone, PartialEq)]
pub enum TotalsCheck {
    /// `|subtotal + tax - total| < 0.01`.
    Passed,
    /// All inputs present but inconsistent.
    Failed { subtotal: f64, tax: f64, total: f64 },
    /// At least one input missing; the rule is not evaluated.
    Skipped { missing: Vec<&'static str> },
}

/// Collected totals inputs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Totals {
    pub total: Option<f64>,
    pub subtotal: Option<f64>,
    pub tax: Option<f64>,
}

impl Totals {
    /// Collect inputs across all fields by lower-cased exact name.
    ///
    /// The last total/subtotal wins. Tax components are summed and an
    /// unparseable component counts as zero.
    pub fn collect(fields: &[Field]) -> Self {
        let mut totals = Totals::default();

        for field in fields {
            let name = field.name.to_lowercase();
            let amount = coerce_amount(field.value.as_ref());

            if TOTAL_NAMES.contains(&name.as_str()) {
                totals.total = amount;
            }
            if SUBTOTAL_NAMES.contains(&name.as_str()) {
                totals.subtotal = amount;
            }
            if TAX_NAMES.contains(&name.as_str()) {
                totals.tax = Some(totals.tax.unwrap_or(0.0) + amount.unwrap_or(0.0));
            }
        }

        totals
    }

    pub fn check(&self) -> TotalsCheck {
        match (self.subtotal, self.tax, self.total) {
            (Some(subtotal), Some(tax), Some(total)) => {
                if (subtotal + tax - total).abs() < TOLERANCE {
                    TotalsCheck::Passed
                } else {
                    TotalsCheck::Failed { subtotal, tax, total }
                }
            }
            _ => {
                let mut missing = Vec::new();
                if self.subtotal.is_none() {
                    missing.push("subtotal");
                }
                if self.tax.is_none() {
                    missing.push("tax");
                }
                if self.total.is_none() {
                    missing.push("total");
                }
                TotalsCheck::Skipped { missing }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;

    fn field(name: &str, value: &str) -> Field {
        Field::new(name, Some(FieldValue::from(value)), 0.9)
    }

    #[test]
    fn test_totals_match() {
        let fields = vec![
            field("Subtotal", "400.00"),
            field("GST", "20.00"),
            field("Total", "420.00"),
        ];
        assert_eq!(Totals::collect(&fields).check(), TotalsCheck::Passed);
    }

    #[test]
    fn test_tax_components_are_summed() {
        let fields = vec![
            field("sub_total", "1000"),
            field("CGST", "90"),
            field("SGST", "90"),
            field("GrandTotal", "1180"),
        ];
        let totals = Totals::collect(&fields);
        assert_eq!(totals.tax, Some(180.0));
        assert_eq!(totals.check(), TotalsCheck::Passed);
    }

    #[test]
    fn test_mismatch_fails() {
        let fields = vec![
            field("Subtotal", "400"),
            field("Tax", "20"),
            field("Total", "500"),
        ];
        assert_eq!(
            Totals::collect(&fields).check(),
            TotalsCheck::Failed { subtotal: 400.0, tax: 20.0, total: 500.0 }
        );
    }

    #[test]
    fn test_unparseable_tax_counts_as_zero() {
        let fields = vec![
            field("Subtotal", "400"),
            field("Tax", "exempt"),
            field("Total", "400"),
        ];
        assert_eq!(Totals::collect(&fields).check(), TotalsCheck::Passed);
    }

    #[test]
    fn test_missing_input_skips() {
        let fields = vec![field("Subtotal", "400"), field("Total", "420")];
        assert_eq!(
            Totals::collect(&fields).check(),
            TotalsCheck::Skipped { missing: vec!["tax"] }
        );

        let fields = vec![field("Subtotal", "400"), field("Tax", "20"), field("Total", "n/a")];
        assert_eq!(
            Totals::collect(&fields).check(),
            TotalsCheck::Skipped { missing: vec!["total"] }
        );
    }

    #[test]
    fn test_last_total_wins() {
        let fields = vec![field("Total", "1"), field("total", "2")];
        assert_eq!(Totals::collect(&fields).total, Some(2.0));
    }
}
