use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

// ── Day-of-year windows ───────────────────────────────────────────────────────

/// Length of the year used for boundary wraparound.
pub const WRAP_YEAR_DAYS: u32 = 366;

/// 1-based ordinal day of `date` within its year (1–366).
pub fn day_of_year(date: NaiveDate) -> u32 {
    date.ordinal()
}

/// `true` when `candidate` falls within `window_days` of `reference` by
/// day-of-year, ignoring the year.
///
/// The distance wraps at the year boundary, so a reference of 30 December
/// with a 5-day window matches 2 January.
pub fn within_day_window(reference: NaiveDate, candidate: NaiveDate, window_days: u32) -> bool {
    let diff = day_of_year(candidate).abs_diff(day_of_year(reference));
    diff <= window_days || WRAP_YEAR_DAYS.saturating_sub(diff) <= window_days
}

/// `date + days`, or `None` past the end of the supported calendar.
pub fn add_days(date: NaiveDate, days: u32) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(u64::from(days)))
}

// ── Seasons ───────────────────────────────────────────────────────────────────

/// Meteorological seasons (northern-hemisphere month grouping).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    /// Case-insensitive lookup; `"autumn"` is accepted for [`Season::Fall`].
    ///
    /// Returns `None` for unrecognised names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "spring" => Some(Season::Spring),
            "summer" => Some(Season::Summer),
            "fall" | "autumn" => Some(Season::Fall),
            "winter" => Some(Season::Winter),
            _ => None,
        }
    }

    /// Calendar months (1–12) in this season.
    pub fn months(&self) -> [u32; 3] {
        match self {
            Season::Spring => [3, 4, 5],
            Season::Summer => [6, 7, 8],
            Season::Fall => [9, 10, 11],
            Season::Winter => [12, 1, 2],
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.months().contains(&date.month())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
            Season::Winter => "winter",
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── day_of_year ──────────────────────────────────────────────────────────

    #[test]
    fn test_day_of_year_bounds() {
        assert_eq!(day_of_year(date(2023, 1, 1)), 1);
        assert_eq!(day_of_year(date(2023, 12, 31)), 365);
        assert_eq!(day_of_year(date(2024, 12, 31)), 366);
    }

    // ── within_day_window ────────────────────────────────────────────────────

    #[test]
    fn test_window_same_season_other_year() {
        assert!(within_day_window(date(2024, 7, 10), date(1999, 7, 15), 7));
        assert!(!within_day_window(date(2024, 7, 10), date(1999, 7, 25), 7));
    }

    #[test]
    fn test_window_wraps_year_boundary() {
        // Dec 30 vs Jan 2: diff 362 (or 363 in a leap year), wrap distance ≤ 5.
        assert!(within_day_window(date(2023, 12, 30), date(2021, 1, 2), 5));
        assert!(within_day_window(date(2024, 12, 30), date(2021, 1, 2), 5));
        assert!(within_day_window(date(2021, 1, 2), date(2023, 12, 30), 5));
    }

    #[test]
    fn test_window_excludes_opposite_side_of_year() {
        assert!(!within_day_window(date(2023, 12, 30), date(2020, 6, 15), 5));
    }

    #[test]
    fn test_window_zero_matches_same_ordinal_only() {
        assert!(within_day_window(date(2023, 3, 1), date(2019, 3, 1), 0));
        assert!(!within_day_window(date(2023, 3, 1), date(2019, 3, 2), 0));
    }

    // ── add_days ─────────────────────────────────────────────────────────────

    #[test]
    fn test_add_days_crosses_year() {
        assert_eq!(add_days(date(2024, 12, 28), 7), Some(date(2025, 1, 4)));
        assert_eq!(add_days(date(2024, 1, 1), 0), Some(date(2024, 1, 1)));
    }

    // ── Season ───────────────────────────────────────────────────────────────

    #[test]
    fn test_season_from_name() {
        assert_eq!(Season::from_name("Summer"), Some(Season::Summer));
        assert_eq!(Season::from_name(" autumn "), Some(Season::Fall));
        assert_eq!(Season::from_name("monsoon"), None);
    }

    #[test]
    fn test_winter_spans_year_end() {
        assert!(Season::Winter.contains(date(2020, 12, 1)));
        assert!(Season::Winter.contains(date(2021, 1, 15)));
        assert!(Season::Winter.contains(date(2021, 2, 28)));
        assert!(!Season::Winter.contains(date(2021, 3, 1)));
    }

    #[test]
    fn test_season_months_cover_year_once() {
        let mut months: Vec<u32> = [Season::Spring, Season::Summer, Season::Fall, Season::Winter]
            .iter()
            .flat_map(|s| s.months())
            .collect();
        months.sort_unstable();
        assert_eq!(months, (1..=12).collect::<Vec<u32>>());
    }
}
