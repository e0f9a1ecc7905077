//! Spatial and temporal subset selection over a dataset snapshot.

use chrono::Datelike;
use climate_core::models::{Coordinates, Dataset, Record, SubsetConfig, SubsetQuery, Timeframe};
use climate_core::time_utils::{within_day_window, Season};

/// Select the records matching `query`, preserving dataset order.
///
/// The spatial filter is an axis-aligned bounding box of half-width
/// `query.radius_deg` (or `config.radius_deg`) and only applies when the
/// query carries coordinates; records without lat/lon never pass it. An
/// empty result is a valid answer.
pub fn select_subset<'d>(
    dataset: &'d Dataset,
    query: &SubsetQuery,
    config: &SubsetConfig,
) -> Vec<&'d Record> {
    let radius = query.radius_deg.unwrap_or(config.radius_deg);
    let temporal = TemporalFilter::new(&query.timeframe, config.window_days);

    dataset
        .records()
        .iter()
        .filter(|r| match query.coordinates {
            Some(center) => in_bounding_box(r, center, radius),
            None => true,
        })
        .filter(|r| temporal.matches(r))
        .collect()
}

/// `true` when the record has coordinates within `radius` degrees of
/// `center` on both axes.
pub fn in_bounding_box(record: &Record, center: Coordinates, radius: f64) -> bool {
    match (record.lat, record.lon) {
        (Some(lat), Some(lon)) => {
            (lat - center.lat).abs() <= radius && (lon - center.lon).abs() <= radius
        }
        _ => false,
    }
}

// ── TemporalFilter ────────────────────────────────────────────────────────────

/// A timeframe with its parameter resolved once per query.
enum TemporalFilter {
    DayWindow { reference: chrono::NaiveDate, window_days: u32 },
    Month(u32),
    Season(Season),
    Nothing,
    Everything,
}

impl TemporalFilter {
    fn new(timeframe: &Timeframe, window_days: u32) -> Self {
        match timeframe {
            Timeframe::SpecificDate { date } => TemporalFilter::DayWindow {
                reference: *date,
                window_days,
            },
            Timeframe::Month { month } => TemporalFilter::Month(*month),
            Timeframe::Season { season } => match Season::from_name(season) {
                Some(s) => TemporalFilter::Season(s),
                None => {
                    tracing::debug!("unrecognised season {:?}; subset is empty", season);
                    TemporalFilter::Nothing
                }
            },
            Timeframe::YearRound => TemporalFilter::Everything,
        }
    }

    fn matches(&self, record: &Record) -> bool {
        match self {
            TemporalFilter::DayWindow {
                reference,
                window_days,
            } => within_day_window(*reference, record.date, *window_days),
            TemporalFilter::Month(month) => record.date.month() == *month,
            TemporalFilter::Season(season) => season.contains(record.date),
            TemporalFilter::Nothing => false,
            TemporalFilter::Everything => true,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
