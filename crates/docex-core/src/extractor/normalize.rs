//! Fuzzy field-name normalization against an expected name list.

use tracing::trace;

use crate::models::Field;

/// Fuzzy string matcher returning the best target and a 0 - 100 score.
pub trait FuzzyMatcher: Send + Sync {
    /// Best-scoring target for `candidate`. Earlier targets win ties.
    fn best_match<'a>(&self, candidate: &str, targets: &'a [String]) -> Option<(&'a str, f64)>;
}

/// Partial-ratio matcher.
///
/// The shorter string is aligned against every window of the longer one,
/// including the partial windows hanging off either end, and the best
/// similarity `2 * LCS / (len(short) + len(window))` is kept. `Total` scores
/// 100 against `TotalAmount`. Comparison is case-sensitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialRatioMatcher;

impl PartialRatioMatcher {
    /// Partial ratio of two strings on a 0 - 100 scale.
    pub fn partial_ratio(a: &str, b: &str) -> f64 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        if a.len() == b.len() {
            return best_alignment(&a, &b).max(best_alignment(&b, &a));
        }
        if a.len() < b.len() {
            best_alignment(&a, &b)
        } else {
            best_alignment(&b, &a)
        }
    }
}

/// Best window score of `short` against `long` (`short.len() <= long.len()`).
fn best_alignment(short: &[char], long: &[char]) -> f64 {
    let (m, n) = (short.len(), long.len());

    let prefixes = (1..m).map(move |end| &long[..end]);
    let full = long.windows(m);
    let suffixes = (n - m + 1..n).map(move |start| &long[start..]);

    let mut best = 0.0f64;
    for window in prefixes.chain(full).chain(suffixes) {
        best = best.max(indel_ratio(short, window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

/// Normalized Indel similarity on a 0 - 100 scale.
fn indel_ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_length(a, b) as f64 / total as f64
}

/// Length of the longest common subsequence, two rows at a time.
fn lcs_length(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

impl FuzzyMatcher for PartialRatioMatcher {
    fn best_match<'a>(&self, candidate: &str, targets: &'a [String]) -> Option<(&'a str, f64)> {
        let mut best: Option<(&'a str, f64)> = None;
        for target in targets {
            let score = Self::partial_ratio(candidate, target);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((target.as_str(), score));
            }
        }
        best
    }
}

/// Rename fields to their best expected name when the score beats `threshold`.
///
/// Fields below the threshold keep the model-provided name.
pub fn normalize_names<M: FuzzyMatcher + ?Sized>(
    fields: &mut [Field],
    expected_fields: &[String],
    matcher: &M,
    threshold: f64,
) {
    for field in fields.iter_mut() {
        if let Some((matched, score)) = matcher.best_match(&field.name, expected_fields) {
            trace!(name = %field.name, matched, score, "Name match");
            if score > threshold {
                field.name = matched.to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_partial_ratio() {
        assert_eq!(PartialRatioMatcher::partial_ratio("Total", "TotalAmount"), 100.0);
        assert_eq!(PartialRatioMatcher::partial_ratio("TotalAmount", "Total"), 100.0);
        assert_eq!(PartialRatioMatcher::partial_ratio("abc", "abc"), 100.0);
        assert_eq!(PartialRatioMatcher::partial_ratio("", "abc"), 0.0);
        assert!(PartialRatioMatcher::partial_ratio("Vendor", "Date") < 70.0);
    }

    fn rounded(a: &str, b: &str) -> f64 {
        (PartialRatioMatcher::partial_ratio(a, b) * 10.0).round() / 10.0
    }

    #[test]
    fn test_partial_ratio_uses_edge_windows() {
        assert_eq!(rounded("Invoice No", "InvoiceNumber"), 88.9);
        assert_eq!(rounded("Total Amt", "TotalAmount"), 87.5);
        assert_eq!(rounded("Inv Number", "InvoiceNumber"), 75.0);
        assert_eq!(rounded("Invoice Number", "InvoiceNumber"), 92.3);
    }

    #[test]
    fn test_abbreviated_names_are_renamed() {
        let expected = names(&["InvoiceNumber", "TotalAmount"]);
        let mut fields = vec![
            Field::new("Invoice No", Some("A-1".into()), 0.9),
            Field::new("Total Amt", Some("10".into()), 0.9),
            Field::new("Inv Number", Some("A-1".into()), 0.9),
        ];

        normalize_names(&mut fields, &expected, &PartialRatioMatcher, 70.0);

        let renamed: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(renamed, vec!["InvoiceNumber", "TotalAmount", "InvoiceNumber"]);
    }

    #[test]
    fn test_best_match_prefers_first_on_tie() {
        let targets = names(&["TotalAmount", "Total"]);
        let (matched, score) = PartialRatioMatcher.best_match("Total", &targets).unwrap();
        assert_eq!(matched, "TotalAmount");
        assert_eq!(score, 100.0);
        assert!(PartialRatioMatcher.best_match("Total", &[]).is_none());
    }

    #[test]
    fn test_normalize_names() {
        let expected = names(&["InvoiceNumber", "InvoiceDate", "GrandTotal"]);
        let mut fields = vec![
            Field::new("Invoice Number", Some("A-1".into()), 0.9),
            Field::new("GrandTotal", Some("10".into()), 0.9),
            Field::new("Vendor", Some("ACME".into()), 0.9),
        ];

        normalize_names(&mut fields, &expected, &PartialRatioMatcher, 70.0);

        assert_eq!(fields[0].name, "InvoiceNumber");
        assert_eq!(fields[1].name, "GrandTotal");
        assert_eq!(fields[2].name, "Vendor");
    }
}
