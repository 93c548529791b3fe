//! One-shot district and burn status lookup.
//!
//! Resolves a coordinate to its fire district, fetches that district's
//! status once and prints the result as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use burnwatch::models::{Coordinate, DistrictStatus, ResolutionPhase, ResolutionResult};
use burnwatch::service::NO_DISTRICT_FOUND;
use burnwatch::sources::{PageClient, StatusFetcher};
use burnwatch::{Config, DistrictIndex};

#[derive(Parser, Debug)]
#[command(name = "lookup")]
#[command(about = "Look up the fire district and burn status for a location")]
struct Args {
    /// Latitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Longitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    /// TOML config file (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Announcement date to look for (YYYY-MM-DD), defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Only resolve the district, skip the status fetch
    #[arg(long)]
    no_fetch: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = Config::load_or_default(args.config.as_deref())?;
    let point = Coordinate::new(args.lat, args.lon).context("Invalid coordinate")?;

    let index = DistrictIndex::from_files(
        &config.data.polygons,
        &config.data.contacts,
        &config.data.name_property,
    );
    info!("Loaded {} districts, {} contacts", index.len(), index.contact_count());

    let mut result = ResolutionResult {
        sequence: 1,
        phase: ResolutionPhase::Settled,
        coordinate: Some(point),
        district: None,
        contact: None,
        status: DistrictStatus::Unavailable,
        error: Some(NO_DISTRICT_FOUND.to_string()),
        updated_at: Utc::now(),
    };

    if let Some(resolution) = index.resolve(point) {
        info!("{} resolved to {} ({:?})", point, resolution.district, resolution.matched_by);
        result.district = Some(resolution.district.to_string());
        result.contact = resolution.contact.cloned();
        result.error = None;

        if args.no_fetch {
            result.status = DistrictStatus::Pending;
        } else {
            let client =
                PageClient::new(&config.http_settings()).context("Failed to build HTTP client")?;
            let mut fetcher = StatusFetcher::new(client, config.timezone()?);
            if let Some(date) = args.date {
                fetcher = fetcher.with_fixed_date(date);
            }

            let registry = config.registry()?;
            let outcome = fetcher.fetch(registry.source_for(resolution.district)).await;
            result.status = outcome.status;
            result.error = outcome.error;
        }
        result.updated_at = Utc::now();
    }

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
