//! District to status source routing.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use url::Url;

pub const ADVISORY_URL: &str = "https://smkmgt.com/burn.php";
pub const RESTRICTION_URL: &str = "https://www.dfpa.net/";
/// District whose status comes from the restriction source by default
pub const RESTRICTION_DISTRICT: &str = "SUTHERLIN FD";

/// How a source page is turned into a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Dated announcement blocks with burn windows
    DailyAdvisory,
    /// Labelled restriction level
    RestrictionLevel,
}

/// Where and how to read a district's status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSource {
    pub label: String,
    pub url: Url,
    pub strategy: ExtractionStrategy,
}

impl StatusSource {
    pub fn new(label: impl Into<String>, url: Url, strategy: ExtractionStrategy) -> Self {
        Self {
            label: label.into(),
            url,
            strategy,
        }
    }
}

/// Default source plus exact-name per-district overrides
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    default: StatusSource,
    overrides: HashMap<String, StatusSource>,
}

impl SourceRegistry {
    pub fn new(default: StatusSource) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    pub fn with_override(mut self, district: impl Into<String>, source: StatusSource) -> Self {
        self.overrides.insert(district.into(), source);
        self
    }

    pub fn source_for(&self, district: &str) -> &StatusSource {
        self.overrides.get(district).unwrap_or(&self.default)
    }

    pub fn default_source(&self) -> &StatusSource {
        &self.default
    }

    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }

    /// Willamette Valley advisory for everyone, Douglas County restriction
    /// level for Sutherlin
    pub fn oregon() -> Result<Self, url::ParseError> {
        Ok(Self::new(StatusSource::new(
            "Willamette Valley",
            Url::parse(ADVISORY_URL)?,
            ExtractionStrategy::DailyAdvisory,
        ))
        .with_override(
            RESTRICTION_DISTRICT,
            StatusSource::new(
                "Sutherlin FD",
                Url::parse(RESTRICTION_URL)?,
                ExtractionStrategy::RestrictionLevel,
            ),
        ))
    }
}
