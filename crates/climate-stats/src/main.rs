mod bootstrap;

use anyhow::Result;
use climate_core::settings::{Command, Settings, StatsArgs};
use climate_data::analysis::StatsRequest;
use climate_runtime::service::ClimateService;
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load()?;
    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("climate-stats v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::debug!(
        "radius {}°, window {} days",
        settings.radius_deg,
        settings.window_days
    );

    let service = ClimateService::new(settings.subset_config());

    match &settings.csv_path {
        Some(path) => {
            let reload = service.reload_path(path.clone());
            let cancel = reload.cancel_flag();
            tokio::select! {
                result = reload.wait() => {
                    let summary = result?;
                    tracing::debug!(
                        "{} of {} rows kept, delimiter {:?}",
                        summary.rows_kept,
                        summary.rows_read,
                        summary.delimiter
                    );
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received; cancelling load");
                    cancel.cancel();
                    anyhow::bail!("interrupted while loading {}", path.display());
                }
            }
        }
        None => tracing::warn!("CSV_PATH not set; queries run against an empty dataset"),
    }

    let output = run_command(&service, &settings.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

/// Execute one boundary operation and return its JSON representation.
fn run_command(service: &ClimateService, command: &Command) -> Result<Value> {
    let value = match command {
        Command::Variables => serde_json::to_value(service.list_variables())?,
        Command::Query(args) => {
            let query = args.subset_query()?;
            let stats = stats_request(&args.stats)?;
            serde_json::to_value(service.query(&query, &stats))?
        }
        Command::Timeline(args) => {
            let request = args.request()?;
            let stats = stats_request(&args.stats)?;
            let points = service.timeline_query(&args.base_query(), &stats, &request)?;
            serde_json::to_value(points)?
        }
    };
    Ok(value)
}

fn stats_request(args: &StatsArgs) -> Result<StatsRequest> {
    Ok(StatsRequest {
        variables: args.variables.clone(),
        thresholds: args.thresholds()?,
        trend_adjust: args.trend_adjustment(),
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────────
