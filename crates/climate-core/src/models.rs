use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::variables;

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Default half-width (degrees) of the spatial bounding box.
pub const DEFAULT_RADIUS_DEG: f64 = 1.0;

/// Default day-of-year window for `specific-date` matching.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Default timeline length in months.
pub const DEFAULT_TIMELINE_MONTHS: u32 = 6;

/// Default timeline step in days.
pub const DEFAULT_TIMELINE_STEP_DAYS: u32 = 7;

/// Number of trailing series values returned as `historicalData`.
pub const HISTORY_LEN: usize = 30;

// ── Record / Dataset ──────────────────────────────────────────────────────────

/// One normalised observation row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Observation date (UTC calendar date). Always present.
    pub date: NaiveDate,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Canonical variable key → value; `None` when the cell was empty or
    /// not numeric.
    #[serde(default)]
    pub values: BTreeMap<String, Option<f64>>,
}

impl Record {
    /// Create a record with no coordinates and no variable values.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            lat: None,
            lon: None,
            values: BTreeMap::new(),
        }
    }

    /// Value of `key`, or `None` when the key is absent or null.
    pub fn value(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied().flatten()
    }

    /// Calendar year of the observation.
    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

/// An immutable, fully built set of normalised records.
///
/// Built wholesale by one ingestion pass; the variable set is derived from
/// the records at construction time and never changes afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
    variables: BTreeSet<String>,
}

impl Dataset {
    /// Build a dataset from records in ingestion order, discovering every
    /// variable key that has at least one non-null value.
    pub fn from_records(records: Vec<Record>) -> Self {
        let variables = records
            .iter()
            .flat_map(|r| r.values.iter())
            .filter(|(key, value)| value.is_some() && !variables::is_structural_key(key))
            .map(|(key, _)| key.clone())
            .collect();
        Self { records, variables }
    }

    /// An empty dataset (no records, no variables).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Discovered variable keys, sorted.
    pub fn variables(&self) -> &BTreeSet<String> {
        &self.variables
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ── VariableDescriptor ────────────────────────────────────────────────────────

/// Public description of a discovered variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDescriptor {
    pub key: String,
    pub display_name: String,
    pub unit: String,
}

// ── Query types ───────────────────────────────────────────────────────────────

/// Centre of a spatial bounding-box query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Temporal selector of a subset query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "timeframe", rename_all = "kebab-case")]
pub enum Timeframe {
    /// Records within the day-of-year window around `date`, any year.
    SpecificDate { date: NaiveDate },
    /// Records in calendar month `month` (1–12).
    Month { month: u32 },
    /// Records in the named meteorological season.
    Season { season: String },
    /// No temporal filter.
    YearRound,
}

/// Spatial and temporal selection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsetQuery {
    /// Bounding-box centre; no spatial filter when absent.
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    /// Bounding-box half-width; the configured default applies when absent.
    #[serde(default)]
    pub radius_deg: Option<f64>,
    #[serde(flatten)]
    pub timeframe: Timeframe,
}

impl SubsetQuery {
    /// A query over every record in the dataset.
    pub fn year_round() -> Self {
        Self {
            coordinates: None,
            radius_deg: None,
            timeframe: Timeframe::YearRound,
        }
    }

    /// Copy of this query with a different timeframe.
    pub fn with_timeframe(&self, timeframe: Timeframe) -> Self {
        Self {
            coordinates: self.coordinates,
            radius_deg: self.radius_deg,
            timeframe,
        }
    }
}

/// Subset-selection tuning consumed by the core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsetConfig {
    /// Default bounding-box half-width in degrees.
    pub radius_deg: f64,
    /// Day-of-year tolerance for `specific-date` matching.
    pub window_days: u32,
}

impl Default for SubsetConfig {
    fn default() -> Self {
        Self {
            radius_deg: DEFAULT_RADIUS_DEG,
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

/// Exceedance threshold for one variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    #[serde(default)]
    pub high: Option<f64>,
}

/// Variable key → threshold.
pub type Thresholds = HashMap<String, Threshold>;

/// Trend-based extrapolation options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAdjustment {
    #[serde(default)]
    pub enable: bool,
    /// Year to extrapolate to; the current UTC year when absent.
    #[serde(default)]
    pub target_year: Option<i32>,
}

/// Parameters of a timeline query on top of a base subset query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineRequest {
    pub start_date: NaiveDate,
    #[serde(default = "default_timeline_months")]
    pub months: u32,
    #[serde(default = "default_timeline_step_days")]
    pub step_days: u32,
}

impl TimelineRequest {
    /// Request with the default length and step.
    pub fn starting(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            months: DEFAULT_TIMELINE_MONTHS,
            step_days: DEFAULT_TIMELINE_STEP_DAYS,
        }
    }
}

fn default_timeline_months() -> u32 {
    DEFAULT_TIMELINE_MONTHS
}

fn default_timeline_step_days() -> u32 {
    DEFAULT_TIMELINE_STEP_DAYS
}

// ── Results ───────────────────────────────────────────────────────────────────

/// Sample count and year span of the subset a result was computed from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatMeta {
    /// Number of non-null values before any trend adjustment.
    pub samples: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub year_min: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub year_max: Option<i32>,
}

/// Descriptive and trend statistics for one variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatResult {
    /// Percentage of values at or above the `high` threshold (0–100).
    pub probability: f64,
    /// Regression trend in percent per decade.
    pub trend: f64,
    pub mean: f64,
    pub median: f64,
    pub percentile90: f64,
    pub percentile10: f64,
    /// Last [`HISTORY_LEN`] series values in subset order.
    pub historical_data: Vec<f64>,
    pub meta: StatMeta,
}

impl StatResult {
    /// The canonical result for a variable with no samples.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Variable key → statistics.
pub type QueryResult = BTreeMap<String, StatResult>;

/// One step of a timeline query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub data: QueryResult,
}

// ── LoadSummary ───────────────────────────────────────────────────────────────

/// Report of a successful ingestion pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSummary {
    /// Data rows seen (header excluded).
    pub rows_read: usize,
    /// Rows that made it into the dataset.
    pub rows_kept: usize,
    /// Rows dropped for a missing or unparseable date.
    pub rows_dropped: usize,
    pub delimiter: char,
    /// Canonical key → source header text.
    pub header_map: BTreeMap<String, String>,
    /// Discovered variable keys, sorted.
    pub variables: Vec<String>,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
