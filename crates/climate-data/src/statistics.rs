//! Per-variable statistics over a selected subset.
//!
//! [`StatisticsEngine::compute`] is a pure function of its inputs plus the
//! engine's notion of the current year, which is only consulted when trend
//! adjustment is enabled without an explicit target year.

use chrono::{Datelike, Utc};
use climate_core::models::{
    QueryResult, Record, StatMeta, StatResult, Thresholds, TrendAdjustment, HISTORY_LEN,
};
use climate_core::stats::{
    exceedance_probability, linear_regression_slope, mean, percentile, sorted,
};

/// Minimum number of (year, value) pairs required before a trend is fitted.
pub const MIN_TREND_POINTS: usize = 12;

// ── StatisticsEngine ──────────────────────────────────────────────────────────

/// Computes [`StatResult`] bundles for requested variables.
#[derive(Debug, Clone, Copy)]
pub struct StatisticsEngine {
    /// Target year used when trend adjustment gives none.
    current_year: i32,
}

impl Default for StatisticsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StatisticsEngine {
    /// Engine whose default target year is the current UTC year.
    pub fn new() -> Self {
        Self::with_current_year(Utc::now().year())
    }

    /// Engine with a fixed default target year.
    pub fn with_current_year(current_year: i32) -> Self {
        Self { current_year }
    }

    /// Compute statistics for every key in `variables`.
    ///
    /// Each key is handled independently:
    /// 1. Collect the non-null values in subset order. No values → the
    ///    canonical empty result.
    /// 2. Mean, median and the 90th/10th percentiles of the raw series.
    /// 3. Decadal trend (see [`trend_percent_per_decade`]).
    /// 4. With trend adjustment enabled, scale the series by
    ///    `1 + trend/100 × yearsAhead/10` and recompute the mean only;
    ///    median and percentiles stay on the raw series.
    /// 5. Exceedance probability and the last [`HISTORY_LEN`] values use the
    ///    (possibly scaled) series.
    pub fn compute<S: AsRef<str>>(
        &self,
        subset: &[&Record],
        variables: &[S],
        thresholds: &Thresholds,
        trend_adjust: Option<&TrendAdjustment>,
    ) -> QueryResult {
        let (year_min, year_max) = year_span(subset);
        let adjust = trend_adjust.filter(|t| t.enable);

        let mut result = QueryResult::new();
        for key in variables {
            let key = key.as_ref();
            let raw: Vec<f64> = subset.iter().filter_map(|r| r.value(key)).collect();
            if raw.is_empty() {
                result.insert(key.to_string(), StatResult::empty());
                continue;
            }

            let raw_sorted = sorted(&raw);
            let median_value = percentile(&raw_sorted, 50.0);
            let percentile90 = percentile(&raw_sorted, 90.0);
            let percentile10 = percentile(&raw_sorted, 10.0);
            let trend = trend_percent_per_decade(subset, key);

            let mut series = raw.clone();
            let mut mean_value = mean(&raw);
            if let (Some(opts), Some(max_year)) = (adjust, year_max) {
                let target_year = opts.target_year.unwrap_or(self.current_year);
                // Any pair of i32 years has a difference that fits in i64.
                let years_ahead = i64::from(target_year) - i64::from(max_year);
                let factor = adjustment_factor(trend, years_ahead);
                series.iter_mut().for_each(|v| *v *= factor);
                mean_value = mean(&series);
            }

            let probability = thresholds
                .get(key)
                .and_then(|t| t.high)
                .map(|high| exceedance_probability(&series, high))
                .unwrap_or(0.0);

            let history_start = series.len().saturating_sub(HISTORY_LEN);
            let historical_data = series[history_start..].to_vec();

            result.insert(
                key.to_string(),
                StatResult {
                    probability,
                    trend,
                    mean: mean_value,
                    median: median_value,
                    percentile90,
                    percentile10,
                    historical_data,
                    meta: StatMeta {
                        samples: raw.len(),
                        year_min,
                        year_max,
                    },
                },
            );
        }

        tracing::debug!(
            subset = subset.len(),
            variables = result.len(),
            "statistics computed"
        );
        result
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Smallest and largest observation year in `subset`.
pub fn year_span(subset: &[&Record]) -> (Option<i32>, Option<i32>) {
    let years = subset.iter().map(|r| r.year());
    (years.clone().min(), years.max())
}

/// Regression trend of `key` against calendar year, in percent of the mean
/// per decade.
///
/// Returns `0.0` with fewer than [`MIN_TREND_POINTS`] values or when the
/// mean of the values is exactly zero.
pub fn trend_percent_per_decade(subset: &[&Record], key: &str) -> f64 {
    let points: Vec<(f64, f64)> = subset
        .iter()
        .filter_map(|r| r.value(key).map(|v| (f64::from(r.year()), v)))
        .collect();
    if points.len() < MIN_TREND_POINTS {
        return 0.0;
    }

    let values: Vec<f64> = points.iter().map(|(_, y)| *y).collect();
    let mean = mean(&values);
    if mean == 0.0 {
        return 0.0;
    }

    let slope_per_year = linear_regression_slope(&points);
    slope_per_year / mean * 100.0 * 10.0
}

/// Multiplier that extrapolates a value `years_ahead` years along a trend of
/// `trend_pct_per_decade`.
pub fn adjustment_factor(trend_pct_per_decade: f64, years_ahead: i64) -> f64 {
    1.0 + (trend_pct_per_decade / 100.0) * (years_ahead as f64 / 10.0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
