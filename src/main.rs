use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use groundwater_analytics::models::Dataset;
use groundwater_analytics::{extract, report, sampler, stats, store, AnalyticsError, TableStore};

#[derive(Parser)]
#[command(name = "groundwater-analytics")]
#[command(about = "Groundwater prediction analytics for monitored districts", long_about = None)]
struct Cli {
    /// Directory holding the prediction CSV tables
    #[arg(long, env = "GROUNDWATER_DATA_DIR", default_value = "data/predictions")]
    data_dir: PathBuf,
    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "GROUNDWATER_LOG", default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dashboard averages, risk counts and trend
    Stats,
    /// Twelve-point forecast chart series
    Forecast,
    /// Every monitored location with its risk status
    Districts {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Metrics, advisory and time series for one district
    District { name: String },
    /// Sorted unique district names
    Names,
    /// Number of monitored locations
    Count,
    /// Paginated prediction records
    Predictions {
        #[arg(long)]
        dataset: Option<Dataset>,
        #[arg(long, default_value_t = 100)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Model performance per dataset split
    ModelMetrics,
    /// Overall prediction summary statistics
    Summary,
    /// Locations as a GeoJSON feature collection
    Geojson,
    /// Data file availability
    Health,
    /// Build the conversational context block for a user message
    Context {
        message: String,
        /// Pre-selected district, skips extraction
        #[arg(long)]
        district: Option<String>,
    },
    /// Write a markdown report for one district
    Report {
        name: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    detail: String,
}

#[derive(Serialize)]
struct NameList {
    districts: Vec<String>,
    count: usize,
}

#[derive(Serialize)]
struct LocationCount {
    count: usize,
    columns: Vec<String>,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let body = serde_json::to_string_pretty(value).context("failed to serialize response")?;
    println!("{body}");
    Ok(())
}

fn run(command: Commands, store: &TableStore) -> anyhow::Result<()> {
    match command {
        Commands::Stats => {
            let locations = store.locations()?;
            let test_predictions = store.test_predictions()?;
            let summary = stats::dashboard_stats(&locations, &test_predictions)
                .context("failed to compute dashboard stats")?;
            print_json(&summary)?;
        }
        Commands::Forecast => {
            let rows = store.detailed_predictions()?;
            print_json(&sampler::forecast(&rows))?;
        }
        Commands::Districts { limit } => {
            let locations = store.locations()?;
            print_json(&stats::district_summaries(&locations, limit))?;
        }
        Commands::District { name } => {
            let locations = store.locations()?;
            let predictions = store.detailed_predictions()?;
            let detail = stats::district_detail(&locations, &predictions, &name)?;
            print_json(&detail)?;
        }
        Commands::Names => {
            let locations = store.locations()?;
            let districts = stats::district_names(&locations);
            print_json(&NameList {
                count: districts.len(),
                districts,
            })?;
        }
        Commands::Count => {
            let locations = store.locations()?;
            let columns = store.columns(store::LOCATIONS_FILE)?;
            print_json(&LocationCount {
                count: locations.len(),
                columns,
            })?;
        }
        Commands::Predictions {
            dataset,
            limit,
            offset,
        } => {
            let rows = store.predictions(dataset)?;
            print_json(&stats::paginate(&rows, offset, limit))?;
        }
        Commands::ModelMetrics => {
            let rows = store.model_metrics()?;
            print_json(&stats::model_metrics(&rows))?;
        }
        Commands::Summary => {
            let rows = store.summary_statistics()?;
            print_json(&stats::summary_statistics(&rows))?;
        }
        Commands::Geojson => {
            let locations = store.locations()?;
            print_json(&stats::geojson(&locations))?;
        }
        Commands::Health => {
            print_json(&store.health())?;
        }
        Commands::Context { message, district } => {
            let locations = store.locations()?;
            let known = stats::known_names(&locations);
            let extraction = extract::extract(&message, &known, district.as_deref())?;
            print_json(&extract::chat_context(&extraction, &locations))?;
        }
        Commands::Report { name, out } => {
            let locations = store.locations()?;
            let predictions = store.detailed_predictions()?;
            let detail = stats::district_detail(&locations, &predictions, &name)?;
            let report = report::build_report(&detail, Utc::now().date_naive());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write report to {}", out.display()))?;
            info!(district = %detail.district, out = %out.display(), "report written");
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let store = TableStore::new(cli.data_dir);
    info!(data_dir = %store.data_dir().display(), "table store ready");

    match run(cli.command, &store) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let kind = err
                .downcast_ref::<AnalyticsError>()
                .map(AnalyticsError::kind)
                .unwrap_or("internal_error");
            error!(kind, "request failed: {err:#}");
            let body = ErrorBody {
                error: kind,
                detail: format!("{err:#}"),
            };
            match serde_json::to_string_pretty(&body) {
                Ok(json) => println!("{json}"),
                Err(_) => println!("{{\"error\":\"{kind}\"}}"),
            }
            ExitCode::FAILURE
        }
    }
}
