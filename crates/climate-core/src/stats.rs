//! Descriptive statistics over plain `f64` series.
//!
//! Every function here is total: empty input yields `0.0` rather than an
//! error or `NaN`.

use std::cmp::Ordering;

// ── Percentile helpers ────────────────────────────────────────────────────────

/// Compute the `p`-th percentile of a **sorted** slice using standard linear
/// interpolation (the same algorithm used by NumPy's `percentile` function).
///
/// Returns `0.0` for an empty slice.
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }
    let len = sorted_data.len();
    if len == 1 {
        return sorted_data[0];
    }
    let rank = (p / 100.0).clamp(0.0, 1.0) * (len as f64 - 1.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted_data[lo];
    }
    let frac = rank - lo as f64;
    sorted_data[lo] + frac * (sorted_data[hi] - sorted_data[lo])
}

/// Copy of `data` sorted ascending.
pub fn sorted(data: &[f64]) -> Vec<f64> {
    let mut v = data.to_vec();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    v
}

/// Arithmetic mean; `0.0` for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Median of an unsorted slice; `0.0` for an empty slice.
pub fn median(data: &[f64]) -> f64 {
    percentile(&sorted(data), 50.0)
}

// ── Regression ────────────────────────────────────────────────────────────────

/// Ordinary least-squares slope of `y` on `x`.
///
/// Returns `0.0` for fewer than two points or when every `x` is identical.
pub fn linear_regression_slope(points: &[(f64, f64)]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
        let dx = x - mean_x;
        (sxy + dx * (y - mean_y), sxx + dx * dx)
    });

    if sxx == 0.0 {
        return 0.0;
    }
    sxy / sxx
}

// ── Exceedance ────────────────────────────────────────────────────────────────

/// Percentage (0–100) of values greater than or equal to `threshold`.
///
/// Returns `0.0` for an empty slice.
pub fn exceedance_probability(data: &[f64], threshold: f64) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let hits = data.iter().filter(|&&v| v >= threshold).count();
    hits as f64 / data.len() as f64 * 100.0
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── percentile ───────────────────────────────────────────────────────────

    #[test]
    fn test_percentile_empty_returns_zero() {
        assert_eq!(percentile(&[], 90.0), 0.0);
    }

    #[test]
    fn test_percentile_single_element() {
        assert_eq!(percentile(&[42.0], 90.0), 42.0);
        assert_eq!(percentile(&[42.0], 10.0), 42.0);
    }

    #[test]
    fn test_percentile_p50_even() {
        let data = vec![1.0, 2.0, 3.0, 4.0];
        // rank = 0.5 * 3 = 1.5 → interpolate between data[1]=2 and data[2]=3
        assert!((percentile(&data, 50.0) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_p90_and_p10_ten_elements() {
        // 1..=10 sorted: rank = 0.9 * 9 = 8.1 → 9 + 0.1*(10-9) = 9.1
        let data: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        assert!((percentile(&data, 90.0) - 9.1).abs() < 1e-9);
        // rank = 0.1 * 9 = 0.9 → 1 + 0.9*(2-1) = 1.9
        assert!((percentile(&data, 10.0) - 1.9).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_bounds() {
        let data = vec![10.0, 20.0, 30.0];
        assert!((percentile(&data, 0.0) - 10.0).abs() < 1e-9);
        assert!((percentile(&data, 100.0) - 30.0).abs() < 1e-9);
    }

    // ── mean / median ────────────────────────────────────────────────────────

    #[test]
    fn test_mean_and_median() {
        let data = vec![5.0, 1.0, 3.0, 2.0, 4.0];
        assert!((mean(&data) - 3.0).abs() < 1e-9);
        assert!((median(&data) - 3.0).abs() < 1e-9);
        assert!((median(&[4.0, 1.0, 3.0, 2.0]) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_mean_and_median_empty() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn test_single_value_series_is_constant() {
        let v = [7.25];
        assert_eq!(mean(&v), 7.25);
        assert_eq!(median(&v), 7.25);
        assert_eq!(percentile(&v, 90.0), 7.25);
        assert_eq!(percentile(&v, 10.0), 7.25);
    }

    // ── linear_regression_slope ──────────────────────────────────────────────

    #[test]
    fn test_slope_exact_line() {
        let points: Vec<(f64, f64)> = (0..10).map(|i| (2000.0 + i as f64, 3.0 + 0.5 * i as f64)).collect();
        assert!((linear_regression_slope(&points) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_slope_degenerate_inputs() {
        assert_eq!(linear_regression_slope(&[]), 0.0);
        assert_eq!(linear_regression_slope(&[(2000.0, 1.0)]), 0.0);
        assert_eq!(
            linear_regression_slope(&[(2000.0, 1.0), (2000.0, 5.0), (2000.0, 9.0)]),
            0.0
        );
    }

    // ── exceedance_probability ───────────────────────────────────────────────

    #[test]
    fn test_exceedance_inclusive_threshold() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((exceedance_probability(&data, 3.0) - 60.0).abs() < 1e-9);
        assert_eq!(exceedance_probability(&data, 6.0), 0.0);
        assert_eq!(exceedance_probability(&data, 1.0), 100.0);
    }

    #[test]
    fn test_exceedance_empty() {
        assert_eq!(exceedance_probability(&[], 3.0), 0.0);
    }
}
