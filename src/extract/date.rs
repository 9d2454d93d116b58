//! Day-first fuzzy date parsing.
//!
//! Payslips write dates every way imaginable: `01/02/2024`, `1-2-24`,
//! `2024-02-01`, `March 3rd, 2024`, `3 March 2024`. This parser accepts all
//! of those, preferring day/month/year ordering for ambiguous numeric
//! forms and falling back to month/day only when the day-first reading is
//! impossible (e.g. `03/15/2024`).

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

fn numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{1,4})[/\-.](\d{1,2})[/\-.](\d{2,4})").expect("valid numeric date regex")
    })
}

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z]+|\d+").expect("valid token regex"))
}

/// Parse a loosely formatted date string, preferring day-first ordering.
///
/// The input may contain surrounding noise (trailing amounts, labels);
/// the first recognizable date wins. Two-digit years map 00-69 to 20xx
/// and 70-99 to 19xx.
#[must_use]
pub fn parse_fuzzy_dayfirst(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(date) = parse_numeric(raw) {
        return Some(date);
    }

    parse_textual(raw)
}

/// Numeric forms: `d/m/y`, `d-m-y`, `d.m.y`, and ISO `yyyy-mm-dd`.
fn parse_numeric(raw: &str) -> Option<NaiveDate> {
    let captures = numeric_re().captures(raw)?;
    let first: i64 = captures[1].parse().ok()?;
    let second: u32 = captures[2].parse().ok()?;
    let third: i64 = captures[3].parse().ok()?;

    // A 4-digit leading field is a year: ISO ordering
    if captures[1].len() == 4 {
        return NaiveDate::from_ymd_opt(first as i32, second, third as u32);
    }

    let year = expand_year(third);
    let day = first as u32;

    // Day-first, then month-first when the day-first reading is impossible
    NaiveDate::from_ymd_opt(year, second, day)
        .or_else(|| NaiveDate::from_ymd_opt(year, day, second))
}

/// Textual forms: a month name plus a day and year in either order,
/// with ordinal suffixes (`3rd`) tolerated.
fn parse_textual(raw: &str) -> Option<NaiveDate> {
    let mut month: Option<u32> = None;
    let mut numbers: Vec<i64> = Vec::new();

    for token in token_re().find_iter(raw) {
        let token = token.as_str();
        if let Ok(n) = token.parse::<i64>() {
            numbers.push(n);
        } else if month.is_none() {
            month = month_number(token);
        }
    }

    let month = month?;

    let year_pos = numbers.iter().position(|&n| n >= 1000);
    let year = match year_pos {
        Some(pos) => numbers.remove(pos),
        // No 4-digit year: the last number is the year, expanded
        None if numbers.len() >= 2 => expand_year(numbers.pop()?) as i64,
        None => return None,
    };

    let day = numbers.iter().copied().find(|&n| (1..=31).contains(&n))?;

    NaiveDate::from_ymd_opt(year as i32, month, day as u32)
}

/// Map a month name or unambiguous prefix to its number.
fn month_number(token: &str) -> Option<u32> {
    let lower = token.to_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| m.starts_with(&lower) || lower.starts_with(m))
        .map(|i| i as u32 + 1)
}

/// Expand a possibly 2-digit year: 00-69 => 20xx, 70-99 => 19xx.
fn expand_year(year: i64) -> i32 {
    match year {
        0..=69 => (year + 2000) as i32,
        70..=99 => (year + 1900) as i32,
        _ => year as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_numeric_dayfirst() {
        assert_eq!(parse_fuzzy_dayfirst("01/02/2024"), Some(date(2024, 2, 1)));
        assert_eq!(parse_fuzzy_dayfirst("15.06.2024"), Some(date(2024, 6, 15)));
        assert_eq!(parse_fuzzy_dayfirst("7-12-2023"), Some(date(2023, 12, 7)));
    }

    #[test]
    fn test_numeric_monthfirst_fallback() {
        // 15 cannot be a month, so this must read as March 15th
        assert_eq!(parse_fuzzy_dayfirst("03/15/2024"), Some(date(2024, 3, 15)));
    }

    #[test]
    fn test_two_digit_years() {
        assert_eq!(parse_fuzzy_dayfirst("01/02/24"), Some(date(2024, 2, 1)));
        assert_eq!(parse_fuzzy_dayfirst("01/02/99"), Some(date(1999, 2, 1)));
    }

    #[test]
    fn test_iso_format() {
        assert_eq!(parse_fuzzy_dayfirst("2024-02-01"), Some(date(2024, 2, 1)));
    }

    #[test]
    fn test_textual_month_with_ordinal() {
        assert_eq!(
            parse_fuzzy_dayfirst("March 3rd, 2024"),
            Some(date(2024, 3, 3))
        );
        assert_eq!(
            parse_fuzzy_dayfirst("June 21st 2023"),
            Some(date(2023, 6, 21))
        );
    }

    #[test]
    fn test_textual_day_before_month() {
        assert_eq!(parse_fuzzy_dayfirst("3 March 2024"), Some(date(2024, 3, 3)));
        assert_eq!(parse_fuzzy_dayfirst("21 Jun 2023"), Some(date(2023, 6, 21)));
    }

    #[test]
    fn test_abbreviated_month() {
        assert_eq!(
            parse_fuzzy_dayfirst("Mar 3, 2024"),
            Some(date(2024, 3, 3))
        );
    }

    #[test]
    fn test_textual_two_digit_year() {
        assert_eq!(parse_fuzzy_dayfirst("3 March 24"), Some(date(2024, 3, 3)));
    }

    #[test]
    fn test_surrounding_noise_tolerated() {
        assert_eq!(
            parse_fuzzy_dayfirst("01/02/2024  Net: 1,234.56"),
            Some(date(2024, 2, 1))
        );
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_fuzzy_dayfirst(""), None);
        assert_eq!(parse_fuzzy_dayfirst("no date here"), None);
        assert_eq!(parse_fuzzy_dayfirst("99/99/9999"), None);
    }

    #[test]
    fn test_rejects_impossible_date() {
        assert_eq!(parse_fuzzy_dayfirst("31/02/2024"), None);
    }
}
