//! Query pipeline: subset selection followed by statistics.
//!
//! Both [`run_query`] and the timeline generator go through this module so a
//! timeline step is exactly a `specific-date` query on the same snapshot.

use climate_core::models::{
    Dataset, QueryResult, SubsetConfig, SubsetQuery, Thresholds, TrendAdjustment,
};
use serde::{Deserialize, Serialize};

use crate::statistics::StatisticsEngine;
use crate::subset::select_subset;

// ── Public types ──────────────────────────────────────────────────────────────

/// Which variables to summarise and how.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRequest {
    /// Requested variable keys; unknown keys yield the empty result.
    pub variables: Vec<String>,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub trend_adjust: Option<TrendAdjustment>,
}

impl StatsRequest {
    /// Request for `variables` with no thresholds or trend adjustment.
    pub fn for_variables<I, S>(variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variables: variables.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

// ── Public function ───────────────────────────────────────────────────────────

/// Select the subset for `query` and compute statistics over it.
///
/// A query whose subset is empty still returns one (empty) result per
/// requested variable.
pub fn run_query(
    dataset: &Dataset,
    query: &SubsetQuery,
    stats: &StatsRequest,
    config: &SubsetConfig,
    engine: &StatisticsEngine,
) -> QueryResult {
    let started = std::time::Instant::now();
    let subset = select_subset(dataset, query, config);
    let result = engine.compute(
        &subset,
        &stats.variables,
        &stats.thresholds,
        stats.trend_adjust.as_ref(),
    );

    tracing::debug!(
        "query {:?}: {} of {} records selected in {:.3}s",
        query.timeframe,
        subset.len(),
        dataset.len(),
        started.elapsed().as_secs_f64()
    );
    result
}

// ── Tests ─────────────────────────────────────────────────────────────────────
