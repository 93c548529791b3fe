//! HTTP server for district and burn status lookups.
//!
//! Wraps a running resolution service: clients push live or manual
//! locations and read back the latest published result.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use burnwatch::models::{ContactInfo, Coordinate, CoordinateError, ResolutionResult};
use burnwatch::pip::MatchKind;
use burnwatch::service::{CoordinateMode, ResolutionHandle, ServiceClosed};
use burnwatch::sources::{PageClient, StatusFetcher};
use burnwatch::{Config, DistrictIndex};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Fire district burn status server")]
struct Args {
    /// TOML config file (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the config file
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Start with the manual location authoritative
    #[arg(long)]
    manual: bool,
}

/// Application state shared across handlers
struct AppState {
    service: ResolutionHandle,
}

type ApiError = (StatusCode, String);

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = Config::load_or_default(args.config.as_deref())?;

    info!("Burnwatch Server");
    info!(
        "Loading districts from {} and contacts from {}",
        config.data.polygons.display(),
        config.data.contacts.display()
    );

    let index = DistrictIndex::from_files(
        &config.data.polygons,
        &config.data.contacts,
        &config.data.name_property,
    );
    if index.is_empty() {
        warn!("No districts loaded, every lookup will report no district");
    }

    let client = PageClient::new(&config.http_settings()).context("Failed to build HTTP client")?;
    let fetcher = StatusFetcher::new(client, config.timezone()?);
    let registry = config.registry()?;

    let mode = if args.manual {
        CoordinateMode::Manual
    } else {
        CoordinateMode::Live
    };
    let service = ResolutionHandle::spawn(
        Arc::new(index),
        Arc::new(registry),
        Arc::new(fetcher),
        mode,
    );

    let state = Arc::new(AppState { service });

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/status", get(status_handler))
        .route("/v1/district", get(district_handler))
        .route("/v1/location/live", post(live_handler))
        .route("/v1/location/manual", post(manual_handler))
        .route("/v1/mode", post(mode_handler))
        .route("/v1/refresh", post(refresh_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listen = args.listen.unwrap_or(config.server.listen);
    info!("Starting server on {}", listen);

    let listener = tokio::net::TcpListener::bind(listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let index = state.service.index();
    Json(HealthResponse {
        status: if index.is_empty() { "degraded" } else { "ok" },
        districts: index.len(),
        contacts: index.contact_count(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    districts: usize,
    contacts: usize,
}

/// Latest published resolution result
async fn status_handler(State(state): State<Arc<AppState>>) -> Json<ResolutionResult> {
    Json(state.service.current())
}

/// Resolve a point to a district without fetching its status
async fn district_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DistrictQueryParams>,
) -> Result<Json<DistrictResponse>, ApiError> {
    let point = Coordinate::new(params.lat, params.lon).map_err(bad_coordinate)?;

    let response = match state.service.index().resolve(point) {
        Some(resolution) => DistrictResponse {
            district: Some(resolution.district.to_string()),
            contact: resolution.contact.cloned(),
            matched_by: Some(resolution.matched_by),
        },
        None => DistrictResponse {
            district: None,
            contact: None,
            matched_by: None,
        },
    };

    Ok(Json(response))
}

/// New device position
async fn live_handler(
    State(state): State<Arc<AppState>>,
    Json(coordinate): Json<Coordinate>,
) -> Result<StatusCode, ApiError> {
    let coordinate = coordinate.validate().map_err(bad_coordinate)?;
    state.service.update_live(coordinate).map_err(closed)?;
    Ok(StatusCode::ACCEPTED)
}

/// Set the manual location; `null` clears it
async fn manual_handler(
    State(state): State<Arc<AppState>>,
    Json(coordinate): Json<Option<Coordinate>>,
) -> Result<StatusCode, ApiError> {
    let coordinate = coordinate
        .map(Coordinate::validate)
        .transpose()
        .map_err(bad_coordinate)?;
    state.service.set_manual(coordinate).map_err(closed)?;
    Ok(StatusCode::ACCEPTED)
}

async fn mode_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ModeRequest>,
) -> Result<StatusCode, ApiError> {
    state.service.set_mode(request.mode).map_err(closed)?;
    Ok(StatusCode::ACCEPTED)
}

async fn refresh_handler(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.service.refresh().map_err(closed)?;
    Ok(StatusCode::ACCEPTED)
}

fn bad_coordinate(e: CoordinateError) -> ApiError {
    (StatusCode::BAD_REQUEST, e.to_string())
}

fn closed(e: ServiceClosed) -> ApiError {
    tracing::error!("{}", e);
    (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
}

#[derive(Deserialize)]
struct DistrictQueryParams {
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
struct ModeRequest {
    mode: CoordinateMode,
}

#[derive(Serialize)]
struct DistrictResponse {
    district: Option<String>,
    contact: Option<ContactInfo>,
    matched_by: Option<MatchKind>,
}
