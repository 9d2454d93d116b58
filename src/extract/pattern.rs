//! Label-anchored date patterns.
//!
//! Payslips announce their payment date under many labels. Patterns are
//! tried in priority order against the full document text; the bare
//! `Date:` pattern is a deliberate catch-all and therefore last. A label
//! whose captured text fails to parse does not end the search; the next
//! pattern gets its chance.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use super::date::parse_fuzzy_dayfirst;

/// Date labels in priority order. Most specific first; `Date` last.
const LABELS: [&str; 10] = [
    "Payment Date",
    "Date of Payment",
    "Pay Date",
    "Pmt Date",
    "Date Paid",
    "Paid On",
    "Issue Date",
    "Salary Date",
    "Payslip Date",
    "Date",
];

struct LabelPattern {
    label: &'static str,
    regex: Regex,
}

fn patterns() -> &'static [LabelPattern] {
    static PATTERNS: OnceLock<Vec<LabelPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        LABELS
            .iter()
            .map(|label| {
                // Capture the rest of the line after the label; the fuzzy
                // parser digs the date out of whatever trails it. Word
                // boundaries keep "Date" from matching inside "Updated".
                let pattern = format!(
                    r"(?i)\b{}\b[:\s]*([^\r\n]{{1,48}})",
                    label.replace(' ', r"\s+")
                );
                LabelPattern {
                    label,
                    regex: Regex::new(&pattern).expect("valid label pattern"),
                }
            })
            .collect()
    })
}

/// Find the highest-priority labeled date in a text buffer.
///
/// Tries each pattern in order, and within a pattern every occurrence in
/// the text; the first captured text that parses as a date wins. Matching
/// is case-insensitive.
#[must_use]
pub fn find_labeled_date(text: &str) -> Option<NaiveDate> {
    for pattern in patterns() {
        for captures in pattern.regex.captures_iter(text) {
            let raw = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            if let Some(date) = parse_fuzzy_dayfirst(raw) {
                log::debug!("Matched '{}' -> {}", pattern.label, date);
                return Some(date);
            }
            log::trace!("'{}' matched but '{}' did not parse", pattern.label, raw);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_payment_date_label() {
        let text = "ACME Ltd\nPayment Date: 01/02/2024\nNet Pay: 1000";
        assert_eq!(find_labeled_date(text), Some(date(2024, 2, 1)));
    }

    #[test]
    fn test_pattern_priority_over_catch_all() {
        // "Pay Date" outranks the bare "Date" catch-all even though
        // "Date:" appears too
        let text = "Date: 15/06/2024\nPay Date: 01/02/2024";
        assert_eq!(find_labeled_date(text), Some(date(2024, 2, 1)));
    }

    #[test]
    fn test_catch_all_date_label() {
        let text = "Date: 15/06/2024";
        assert_eq!(find_labeled_date(text), Some(date(2024, 6, 15)));
    }

    #[test]
    fn test_case_insensitive() {
        let text = "PAY DATE: 01/02/2024";
        assert_eq!(find_labeled_date(text), Some(date(2024, 2, 1)));
    }

    #[test]
    fn test_fuzzy_textual_capture() {
        let text = "Salary Date: March 3rd, 2024";
        assert_eq!(find_labeled_date(text), Some(date(2024, 3, 3)));
    }

    #[test]
    fn test_unparsable_match_falls_through() {
        // "Payment Date" matches but captures garbage; the later
        // "Date Paid" line still resolves
        let text = "Payment Date: pending\nDate Paid: 07/03/2024";
        assert_eq!(find_labeled_date(text), Some(date(2024, 3, 7)));
    }

    #[test]
    fn test_label_inside_a_word_does_not_match() {
        // "Updated" and "Validated" contain "date" but are not labels;
        // a footer like this must stay date-not-found
        assert_eq!(find_labeled_date("Updated: 15/06/2024"), None);
        assert_eq!(find_labeled_date("Validated: 15/06/2024"), None);
        assert_eq!(find_labeled_date("Consolidated pay 15/06/2024"), None);
    }

    #[test]
    fn test_no_label_no_date() {
        assert_eq!(find_labeled_date("Employee: Jane Doe\nNet: 2000"), None);
    }

    #[test]
    fn test_all_specific_labels_recognized() {
        for label in [
            "Payment Date",
            "Date of Payment",
            "Pay Date",
            "Pmt Date",
            "Date Paid",
            "Paid On",
            "Issue Date",
            "Salary Date",
            "Payslip Date",
        ] {
            let text = format!("{}: 05/04/2024", label);
            assert_eq!(
                find_labeled_date(&text),
                Some(date(2024, 4, 5)),
                "label {} did not match",
                label
            );
        }
    }
}
