use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::error::{ClimateError, Result};
use crate::models::{
    Coordinates, SubsetConfig, SubsetQuery, Threshold, Thresholds, TimelineRequest, Timeframe,
    TrendAdjustment,
};
use crate::parsing::{parse_number, DateParser};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Descriptive and trend statistics over climate observation tables
#[derive(Parser, Debug, Clone)]
#[command(
    name = "climate-stats",
    about = "Descriptive and trend statistics over climate observation tables",
    version
)]
pub struct Settings {
    /// Delimited observations file to load
    #[arg(long, env = "CSV_PATH")]
    pub csv_path: Option<PathBuf>,

    /// Half-width of the spatial bounding box in degrees
    #[arg(long, env = "CSV_RADIUS_DEG", default_value = "1.0")]
    pub radius_deg: f64,

    /// Day-of-year window for specific-date matching
    #[arg(long, env = "CSV_WINDOW_DAYS", default_value = "7")]
    pub window_days: u32,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Boundary operation to run against the loaded dataset.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the variables discovered in the dataset
    Variables,
    /// Statistics for one subset of the dataset
    Query(QueryArgs),
    /// Statistics for a stepped range of dates
    Timeline(TimelineArgs),
}

/// Optional bounding-box centre.
#[derive(Args, Debug, Clone, Default)]
pub struct LocationArgs {
    /// Latitude of the bounding-box centre
    #[arg(long, allow_negative_numbers = true, requires = "lon")]
    pub lat: Option<f64>,

    /// Longitude of the bounding-box centre
    #[arg(long, allow_negative_numbers = true, requires = "lat")]
    pub lon: Option<f64>,
}

impl LocationArgs {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates { lat, lon }),
            _ => None,
        }
    }
}

/// Variables, thresholds and trend options shared by `query` and `timeline`.
#[derive(Args, Debug, Clone, Default)]
pub struct StatsArgs {
    /// Comma-separated variable keys
    #[arg(long, value_delimiter = ',', required = true)]
    pub variables: Vec<String>,

    /// Exceedance threshold as KEY=HIGH (repeatable)
    #[arg(long = "threshold", value_name = "KEY=HIGH")]
    pub thresholds: Vec<String>,

    /// Extrapolate values along the decadal trend
    #[arg(long)]
    pub trend: bool,

    /// Year to extrapolate to (defaults to the current year)
    #[arg(long, requires = "trend")]
    pub target_year: Option<i32>,
}

impl StatsArgs {
    /// Parse the repeated `KEY=HIGH` flags into a threshold map.
    pub fn thresholds(&self) -> Result<Thresholds> {
        let mut map = Thresholds::new();
        for raw in &self.thresholds {
            let (key, value) = raw.split_once('=').ok_or_else(|| {
                ClimateError::invalid("threshold", format!("expected KEY=HIGH, got {raw:?}"))
            })?;
            let high = parse_number(value).ok_or_else(|| {
                ClimateError::invalid("threshold", format!("{value:?} is not a number"))
            })?;
            map.insert(key.trim().to_string(), Threshold { high: Some(high) });
        }
        Ok(map)
    }

    /// Trend options, or `None` when `--trend` was not given.
    pub fn trend_adjustment(&self) -> Option<TrendAdjustment> {
        self.trend.then_some(TrendAdjustment {
            enable: true,
            target_year: self.target_year,
        })
    }
}

/// Arguments of the `query` subcommand.
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    #[command(flatten)]
    pub location: LocationArgs,

    /// Temporal selector
    #[arg(long, default_value = "year-round", value_parser = ["specific-date", "month", "season", "year-round"])]
    pub timeframe: String,

    /// Reference date for --timeframe specific-date
    #[arg(long)]
    pub date: Option<String>,

    /// Month number (1-12) for --timeframe month
    #[arg(long)]
    pub month: Option<u32>,

    /// Season name for --timeframe season
    #[arg(long)]
    pub season: Option<String>,

    #[command(flatten)]
    pub stats: StatsArgs,
}

impl QueryArgs {
    /// Build the subset query, requiring the parameter that matches
    /// `--timeframe`.
    pub fn subset_query(&self) -> Result<SubsetQuery> {
        let timeframe = match self.timeframe.as_str() {
            "specific-date" => {
                let raw = self
                    .date
                    .as_deref()
                    .ok_or_else(|| ClimateError::invalid("date", "required for specific-date"))?;
                Timeframe::SpecificDate {
                    date: DateParser::parse_required(raw)?,
                }
            }
            "month" => Timeframe::Month {
                month: self
                    .month
                    .ok_or_else(|| ClimateError::invalid("month", "required for month"))?,
            },
            "season" => Timeframe::Season {
                season: self
                    .season
                    .clone()
                    .ok_or_else(|| ClimateError::invalid("season", "required for season"))?,
            },
            _ => Timeframe::YearRound,
        };
        Ok(SubsetQuery {
            coordinates: self.location.coordinates(),
            radius_deg: None,
            timeframe,
        })
    }
}

/// Arguments of the `timeline` subcommand.
#[derive(Args, Debug, Clone)]
pub struct TimelineArgs {
    #[command(flatten)]
    pub location: LocationArgs,

    /// First date of the timeline
    #[arg(long)]
    pub start_date: String,

    /// Timeline length in months (1-12)
    #[arg(long, default_value = "6", value_parser = clap::value_parser!(u32).range(1..=12))]
    pub months: u32,

    /// Days between timeline points (1-14)
    #[arg(long, default_value = "7", value_parser = clap::value_parser!(u32).range(1..=14))]
    pub step_days: u32,

    #[command(flatten)]
    pub stats: StatsArgs,
}

impl TimelineArgs {
    /// Base query carrying only the spatial part; the timeline supplies the
    /// dates.
    pub fn base_query(&self) -> SubsetQuery {
        SubsetQuery {
            coordinates: self.location.coordinates(),
            ..SubsetQuery::year_round()
        }
    }

    pub fn request(&self) -> Result<TimelineRequest> {
        Ok(TimelineRequest {
            start_date: DateParser::parse_required(&self.start_date)?,
            months: self.months,
            step_days: self.step_days,
        })
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments and resolve derived values.
    pub fn load() -> Result<Self> {
        Self::resolve(Settings::parse())
    }

    /// Same as [`Settings::load`] with an explicit argument list, enabling
    /// unit-testing without spawning subprocesses.
    pub fn load_from<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let settings = Settings::try_parse_from(args)
            .map_err(|e| ClimateError::Config(e.to_string()))?;
        Self::resolve(settings)
    }

    /// Apply `--debug` and reject values clap cannot range-check.
    fn resolve(mut settings: Settings) -> Result<Self> {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        if !settings.radius_deg.is_finite() || settings.radius_deg < 0.0 {
            return Err(ClimateError::Config(format!(
                "radius must be a non-negative number of degrees, got {}",
                settings.radius_deg
            )));
        }
        Ok(settings)
    }

    /// Subset-selection tuning derived from the CLI / environment.
    pub fn subset_config(&self) -> SubsetConfig {
        SubsetConfig {
            radius_deg: self.radius_deg,
            window_days: self.window_days,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
