//! Regex patterns for field format validation.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // D/M/YYYY, D-M-YY or YYYY-M-D. Shape only, no calendar check.
    pub static ref DATE_PATTERN: Regex = Regex::new(
        r"\b(?:\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\d{4}[/-]\d{1,2}[/-]\d{1,2})\b"
    ).unwrap();

    // Everything that is not part of a plain decimal number.
    pub static ref NON_AMOUNT_CHARS: Regex = Regex::new(r"[^0-9.]+").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_shapes() {
        for date in ["1/2/2024", "01-02-24", "2024-1-5", "2024/12/31", "Issued 15/01/2024"] {
            assert!(DATE_PATTERN.is_match(date), "{date}");
        }
        for bad in ["15.01.2024", "January 5, 2024", "2024", "1/2"] {
            assert!(!DATE_PATTERN.is_match(bad), "{bad}");
        }
    }

    #[test]
    fn test_strip_amount() {
        assert_eq!(NON_AMOUNT_CHARS.replace_all("Rs. 1,234.50/-", ""), ".1234.50");
    }
}
