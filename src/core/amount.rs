//! Amount field normalization.
//!
//! The amount is kept as a canonical string of ASCII digits and only grouped
//! for display. Edits that do not reduce to digits are dropped without error.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Grouping separator inserted every three digits for display.
pub const GROUP_SEPARATOR: char = '.';

/// Groups a digit string from the right, e.g. `"1234567"` becomes `"1.234.567"`.
///
/// Input is expected to contain digits only. Leading zeros are kept as typed.
pub fn to_display(digits: &str) -> String {
    let len = digits.chars().count();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(GROUP_SEPARATOR);
        }
        grouped.push(c);
    }
    grouped
}

/// Strips grouping separators and returns the canonical digits, or `None` if
/// anything other than digits remains.
pub fn to_canonical(display_text: &str) -> Option<String> {
    let stripped: String = display_text
        .chars()
        .filter(|c| *c != GROUP_SEPARATOR)
        .collect();
    if stripped.chars().all(|c| c.is_ascii_digit()) {
        Some(stripped)
    } else {
        None
    }
}

/// Applies an edit of the amount field. A rejected edit keeps `current`.
pub fn apply_edit(current: &str, display_text: &str) -> String {
    to_canonical(display_text).unwrap_or_else(|| current.to_string())
}

/// Numeric value of a canonical amount. `None` for an empty amount or one too
/// large to represent.
pub fn parse_amount(canonical: &str) -> Option<Decimal> {
    if canonical.is_empty() {
        return None;
    }
    Decimal::from_str(canonical).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_display_groups_from_the_right() {
        assert_eq!(to_display(""), "");
        assert_eq!(to_display("7"), "7");
        assert_eq!(to_display("999"), "999");
        assert_eq!(to_display("1000"), "1.000");
        assert_eq!(to_display("12345"), "12.345");
        assert_eq!(to_display("1234567"), "1.234.567");
        assert_eq!(to_display("000123"), "000.123");
    }

    #[test]
    fn test_to_canonical_strips_separators() {
        assert_eq!(to_canonical("1.234.567").as_deref(), Some("1234567"));
        assert_eq!(to_canonical("").as_deref(), Some(""));
        assert_eq!(to_canonical("...").as_deref(), Some(""));
        // Misplaced separators are still only separators
        assert_eq!(to_canonical("12.34").as_deref(), Some("1234"));
        assert_eq!(to_canonical("0012").as_deref(), Some("0012"));
    }

    #[test]
    fn test_to_canonical_rejects_non_digits() {
        assert!(to_canonical("12a").is_none());
        assert!(to_canonical("1,000").is_none());
        assert!(to_canonical("-5").is_none());
        assert!(to_canonical(" 5").is_none());
        assert!(to_canonical("1٣").is_none());
    }

    #[test]
    fn test_display_round_trip_is_lossless() {
        let mut digits = String::new();
        for d in "9081726354091827364550".chars() {
            digits.push(d);
            assert_eq!(to_canonical(&to_display(&digits)), Some(digits.clone()));
        }
    }

    #[test]
    fn test_apply_edit_keeps_prior_value_on_rejection() {
        assert_eq!(apply_edit("1000", "1.000x"), "1000");
        assert_eq!(apply_edit("1000", "abc"), "1000");
        assert_eq!(apply_edit("", "12e3"), "");
        assert_eq!(apply_edit("1000", "1.0005"), "10005");
        assert_eq!(apply_edit("1000", ""), "");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("0"), Some(Decimal::ZERO));
        assert_eq!(parse_amount("000"), Some(Decimal::ZERO));
        assert_eq!(parse_amount("0042"), Some(Decimal::from(42)));
        assert_eq!(parse_amount("1000"), Some(Decimal::from(1000)));
        assert_eq!(parse_amount("99999999999999999999999999999999999"), None);
    }
}
