//! Cell-level coercion shared by the ingestion layer and the CLI.
//!
//! Source tables come from many tools and locales, so both helpers here are
//! deliberately lenient: they return `None` for anything they cannot read
//! instead of failing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::{ClimateError, Result};

// ── Numbers ───────────────────────────────────────────────────────────────────

/// Parse a numeric cell, accepting a comma as the decimal separator.
///
/// Empty, non-numeric and non-finite input yields `None`.
pub fn parse_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalised = if trimmed.contains(',') {
        trimmed.replacen(',', ".", 1)
    } else {
        trimmed.to_string()
    };
    normalised.parse::<f64>().ok().filter(|n| n.is_finite())
}

// ── Dates ─────────────────────────────────────────────────────────────────────

/// Parses observation dates from the spellings commonly found in exported
/// climate tables.
pub struct DateParser;

impl DateParser {
    const DATETIME_FORMATS: &'static [&'static str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];

    const DATE_FORMATS: &'static [&'static str] =
        &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d", "%m/%d/%Y"];

    /// Parse `s` into a UTC calendar date.
    ///
    /// Handles RFC 3339 timestamps (converted to UTC before the date is
    /// taken), naive date-times and the date-only spellings in
    /// [`Self::DATE_FORMATS`]. Returns `None` for empty or unrecognised
    /// input.
    pub fn parse(s: &str) -> Option<NaiveDate> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        let normalised = match s.strip_suffix('Z') {
            Some(stripped) => format!("{stripped}+00:00"),
            None => s.to_string(),
        };
        if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
            return Some(dt.with_timezone(&Utc).date_naive());
        }

        for fmt in Self::DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(naive.date());
            }
        }

        Self::DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    }

    /// Strict variant of [`DateParser::parse`] for user-supplied parameters.
    pub fn parse_required(s: &str) -> Result<NaiveDate> {
        Self::parse(s).ok_or_else(|| ClimateError::DateParse(s.to_string()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── parse_number ─────────────────────────────────────────────────────────

    #[test]
    fn test_parse_number_plain() {
        assert_eq!(parse_number("12.5"), Some(12.5));
        assert_eq!(parse_number("  -3 "), Some(-3.0));
    }

    #[test]
    fn test_parse_number_decimal_comma() {
        assert_eq!(parse_number("12,5"), Some(12.5));
        assert_eq!(parse_number("-0,25"), Some(-0.25));
    }

    #[test]
    fn test_parse_number_empty_and_garbage() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("   "), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("1,2,3"), None);
    }

    #[test]
    fn test_parse_number_rejects_non_finite() {
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
    }

    // ── DateParser ───────────────────────────────────────────────────────────

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(DateParser::parse("2021-07-04"), Some(date(2021, 7, 4)));
    }

    #[test]
    fn test_parse_rfc3339_converts_to_utc() {
        assert_eq!(
            DateParser::parse("2021-01-01T01:30:00+03:00"),
            Some(date(2020, 12, 31))
        );
        assert_eq!(
            DateParser::parse("2021-01-01T00:00:00Z"),
            Some(date(2021, 1, 1))
        );
    }

    #[test]
    fn test_parse_naive_datetime() {
        assert_eq!(
            DateParser::parse("2019-03-15 12:00:00"),
            Some(date(2019, 3, 15))
        );
        assert_eq!(
            DateParser::parse("2019-03-15T23:59"),
            Some(date(2019, 3, 15))
        );
    }

    #[test]
    fn test_parse_other_date_spellings() {
        assert_eq!(DateParser::parse("2019/03/15"), Some(date(2019, 3, 15)));
        assert_eq!(DateParser::parse("20190315"), Some(date(2019, 3, 15)));
        assert_eq!(DateParser::parse("03/15/2019"), Some(date(2019, 3, 15)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(DateParser::parse(""), None);
        assert_eq!(DateParser::parse("yesterday"), None);
        assert_eq!(DateParser::parse("2019-13-45"), None);
    }

    #[test]
    fn test_parse_required_error() {
        let err = DateParser::parse_required("soon").unwrap_err();
        assert_eq!(err.to_string(), "Invalid date format: soon");
    }
}
