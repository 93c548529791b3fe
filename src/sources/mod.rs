//! Burn status sources: page fetching, extraction and routing.

pub mod advisory;
pub mod http;
pub mod registry;
pub mod restriction;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::models::{BurnAdvisory, DistrictStatus, RestrictionLevel};

pub use advisory::{announcement_header, ordinal_suffix, AdvisoryExtractor, AnnouncementBlockExtractor};
pub use http::{HttpSettings, PageClient};
pub use registry::{ExtractionStrategy, SourceRegistry, StatusSource};
pub use restriction::{LabelledHeadingExtractor, RestrictionExtractor};

/// Why a status page could not be read
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("HTTP Error: Status code {status}. Response: {snippet}...")]
    Status { status: u16, snippet: String },

    #[error("Could not decode HTML content: {0}")]
    Decode(#[source] std::string::FromUtf8Error),

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

/// Parses a CSS selector string, returning a [`FetchError`] on failure
pub(crate) fn parse_selector(selector: &str) -> Result<Selector, FetchError> {
    Selector::parse(selector)
        .map_err(|e| FetchError::Parse(format!("invalid CSS selector '{}': {}", selector, e)))
}

/// Status plus the user-facing error, if any, from one fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub status: DistrictStatus,
    pub error: Option<String>,
}

/// Fetches a source page and runs the matching extractor
#[derive(Clone)]
pub struct StatusFetcher {
    client: PageClient,
    timezone: Tz,
    fixed_date: Option<NaiveDate>,
    advisory: Arc<dyn AdvisoryExtractor>,
    restriction: Arc<dyn RestrictionExtractor>,
}

impl StatusFetcher {
    pub fn new(client: PageClient, timezone: Tz) -> Self {
        Self {
            client,
            timezone,
            fixed_date: None,
            advisory: Arc::new(AnnouncementBlockExtractor),
            restriction: Arc::new(LabelledHeadingExtractor),
        }
    }

    /// Look for a specific day's announcement instead of today's
    pub fn with_fixed_date(mut self, date: NaiveDate) -> Self {
        self.fixed_date = Some(date);
        self
    }

    pub fn with_advisory_extractor(mut self, extractor: impl AdvisoryExtractor + 'static) -> Self {
        self.advisory = Arc::new(extractor);
        self
    }

    pub fn with_restriction_extractor(
        mut self,
        extractor: impl RestrictionExtractor + 'static,
    ) -> Self {
        self.restriction = Arc::new(extractor);
        self
    }

    /// Calendar date in the configured time zone
    pub fn today(&self) -> NaiveDate {
        self.fixed_date
            .unwrap_or_else(|| Utc::now().with_timezone(&self.timezone).date_naive())
    }

    pub async fn fetch(&self, source: &StatusSource) -> FetchOutcome {
        info!("Fetching {} status from {}", source.label, source.url);
        match source.strategy {
            ExtractionStrategy::DailyAdvisory => {
                let advisory = self.fetch_advisory(&source.url).await;
                FetchOutcome {
                    error: advisory.error.clone(),
                    status: DistrictStatus::Advisory(advisory),
                }
            }
            ExtractionStrategy::RestrictionLevel => {
                let (level, error) = self.fetch_restriction(&source.url).await;
                FetchOutcome {
                    status: DistrictStatus::Restriction(level),
                    error,
                }
            }
        }
    }

    pub async fn fetch_advisory(&self, url: &Url) -> BurnAdvisory {
        let today = self.today();
        match self.client.fetch(url).await {
            Ok(body) => self.extract_advisory(&body, today),
            Err(e) => {
                warn!("Burn advisory fetch failed: {}", e);
                BurnAdvisory::unavailable(e.to_string())
            }
        }
    }

    pub async fn fetch_restriction(&self, url: &Url) -> (RestrictionLevel, Option<String>) {
        match self.client.fetch(url).await {
            Ok(body) => (self.extract_restriction(&body), None),
            Err(e) => {
                warn!("Restriction level fetch failed: {}", e);
                (RestrictionLevel::error(), Some(e.to_string()))
            }
        }
    }

    // Html is not Send, so parsing stays out of the async fns
    fn extract_advisory(&self, body: &str, today: NaiveDate) -> BurnAdvisory {
        let document = Html::parse_document(body);
        self.advisory.extract_advisory(&document, today)
    }

    fn extract_restriction(&self, body: &str) -> RestrictionLevel {
        let document = Html::parse_document(body);
        self.restriction.extract_restriction_level(&document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BurnWindow, RestrictionKind};
    use crate::test_support::{advisory_page, restriction_page, serve};
    use axum::{http::StatusCode, routing::get, Router};

    fn fetcher(date: NaiveDate) -> StatusFetcher {
        let client = PageClient::new(&HttpSettings::default()).unwrap();
        StatusFetcher::new(client, chrono_tz::America::Los_Angeles).with_fixed_date(date)
    }

    fn june_3rd() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 3).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_dispatches_on_strategy() {
        let advisory = advisory_page(june_3rd());
        let router = Router::new()
            .route("/burn.php", get(move || async move { advisory }))
            .route("/", get(|| async { restriction_page("MODERATE") }));
        let base = serve(router).await;
        let fetcher = fetcher(june_3rd());

        let outcome = fetcher
            .fetch(&StatusSource::new(
                "valley",
                base.join("/burn.php").unwrap(),
                ExtractionStrategy::DailyAdvisory,
            ))
            .await;
        match outcome.status {
            DistrictStatus::Advisory(advisory) => {
                assert_eq!(
                    advisory.agricultural,
                    BurnWindow::Window("9:30 a.m. to 4:00 p.m.".to_string())
                );
                assert_eq!(advisory.backyard, BurnWindow::NoBurning);
            }
            other => panic!("expected advisory, got {:?}", other),
        }
        assert!(outcome.error.is_none());

        let outcome = fetcher
            .fetch(&StatusSource::new(
                "sutherlin",
                base.clone(),
                ExtractionStrategy::RestrictionLevel,
            ))
            .await;
        match outcome.status {
            DistrictStatus::Restriction(level) => assert_eq!(level.kind, RestrictionKind::Moderate),
            other => panic!("expected restriction, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_network_failures_are_distinct_from_format_drift() {
        let router = Router::new()
            .route("/down", get(|| async { (StatusCode::BAD_GATEWAY, "upstream gone") }))
            .route("/changed", get(|| async { "<html><body><h2>Redesigned</h2></body></html>" }));
        let base = serve(router).await;
        let fetcher = fetcher(june_3rd());

        let (level, error) = fetcher.fetch_restriction(&base.join("/down").unwrap()).await;
        assert_eq!(level, RestrictionLevel::error());
        assert!(error.unwrap().contains("502"));

        let (level, error) = fetcher.fetch_restriction(&base.join("/changed").unwrap()).await;
        assert_eq!(level, RestrictionLevel::not_available());
        assert!(error.is_none());

        let advisory = fetcher.fetch_advisory(&base.join("/down").unwrap()).await;
        assert_eq!(advisory.agricultural, BurnWindow::NotAvailable);
        assert!(advisory.error.unwrap().starts_with("HTTP Error: Status code 502"));

        let advisory = fetcher.fetch_advisory(&base.join("/changed").unwrap()).await;
        assert_eq!(advisory.backyard, BurnWindow::NotAvailable);
        assert!(advisory
            .error
            .unwrap()
            .starts_with("Today's burn announcement not found"));
    }

    #[test]
    fn test_today_uses_fixed_date() {
        assert_eq!(fetcher(june_3rd()).today(), june_3rd());
    }

    #[test]
    fn test_bad_selector_is_a_parse_error() {
        assert!(matches!(parse_selector("h2[["), Err(FetchError::Parse(_))));
    }
}
