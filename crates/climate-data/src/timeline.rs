//! Forward-looking timeline of per-date statistics.

use chrono::{Datelike, NaiveDate};
use climate_core::error::{ClimateError, Result};
use climate_core::models::{
    Dataset, SubsetConfig, SubsetQuery, Timeframe, TimelinePoint, TimelineRequest,
};
use climate_core::time_utils::add_days;

use crate::analysis::{run_query, StatsRequest};
use crate::statistics::StatisticsEngine;

/// Average Gregorian month length used to turn `months` into days.
pub const AVG_MONTH_DAYS: f64 = 30.4375;

pub const MONTHS_RANGE: std::ops::RangeInclusive<u32> = 1..=12;
pub const STEP_DAYS_RANGE: std::ops::RangeInclusive<u32> = 1..=14;

/// Build a timeline of `specific-date` queries starting at
/// `request.start_date`.
///
/// Steps are `request.step_days` apart and cover
/// `round(months × 30.4375)` days inclusive of both ends. The spatial part of
/// `base` is kept for every step; its timeframe is replaced. When `stats`
/// carries a trend adjustment its target year becomes the step date's year.
pub fn generate_timeline(
    dataset: &Dataset,
    base: &SubsetQuery,
    request: &TimelineRequest,
    stats: &StatsRequest,
    config: &SubsetConfig,
    engine: &StatisticsEngine,
) -> Result<Vec<TimelinePoint>> {
    validate(request)?;

    let total_days = timeline_span_days(request.months);
    let mut points = Vec::with_capacity((total_days / request.step_days + 1) as usize);

    for offset in (0..=total_days).step_by(request.step_days as usize) {
        let date = add_days(request.start_date, offset).ok_or_else(|| {
            ClimateError::invalid(
                "startDate",
                format!("{} + {offset} days is out of range", request.start_date),
            )
        })?;
        let query = base.with_timeframe(Timeframe::SpecificDate { date });
        let step_stats = stats_for_date(stats, date);
        let data = run_query(dataset, &query, &step_stats, config, engine);
        points.push(TimelinePoint { date, data });
    }

    tracing::debug!(
        "timeline from {}: {} points over {} days",
        request.start_date,
        points.len(),
        total_days
    );
    Ok(points)
}

/// Number of days a timeline of `months` months spans.
pub fn timeline_span_days(months: u32) -> u32 {
    (f64::from(months) * AVG_MONTH_DAYS).round() as u32
}

fn validate(request: &TimelineRequest) -> Result<()> {
    if !MONTHS_RANGE.contains(&request.months) {
        return Err(ClimateError::invalid(
            "months",
            format!("{} is outside 1-12", request.months),
        ));
    }
    if !STEP_DAYS_RANGE.contains(&request.step_days) {
        return Err(ClimateError::invalid(
            "stepDays",
            format!("{} is outside 1-14", request.step_days),
        ));
    }
    Ok(())
}

fn stats_for_date(stats: &StatsRequest, date: NaiveDate) -> StatsRequest {
    let mut step = stats.clone();
    if let Some(trend) = step.trend_adjust.as_mut() {
        trend.target_year = Some(date.year());
    }
    step
}

// ── Tests ─────────────────────────────────────────────────────────────────────
