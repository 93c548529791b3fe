use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::pip::DEFAULT_NAME_PROPERTY;
use crate::sources::http::{DEFAULT_REFERER, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use crate::sources::registry::{ADVISORY_URL, RESTRICTION_DISTRICT, RESTRICTION_URL};
use crate::sources::{ExtractionStrategy, HttpSettings, SourceRegistry, StatusSource};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub http: HttpConfig,
    pub time: TimeConfig,
    pub sources: SourcesConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    pub polygons: PathBuf,
    pub contacts: PathBuf,
    pub name_property: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            polygons: PathBuf::from("data/fire_districts.geojson"),
            contacts: PathBuf::from("data/fire_district_contacts.json"),
            name_property: DEFAULT_NAME_PROPERTY.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub referer: String,
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TimeConfig {
    /// IANA zone used to decide which day's announcement is "today"
    pub timezone: String,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            timezone: "America/Los_Angeles".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub label: String,
    pub url: String,
    pub strategy: ExtractionStrategy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OverrideConfig {
    pub district: String,
    #[serde(flatten)]
    pub source: SourceConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SourcesConfig {
    pub default: SourceConfig,
    pub overrides: Vec<OverrideConfig>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            default: SourceConfig {
                label: "Willamette Valley".to_string(),
                url: ADVISORY_URL.to_string(),
                strategy: ExtractionStrategy::DailyAdvisory,
            },
            overrides: vec![OverrideConfig {
                district: RESTRICTION_DISTRICT.to_string(),
                source: SourceConfig {
                    label: "Sutherlin FD".to_string(),
                    url: RESTRICTION_URL.to_string(),
                    strategy: ExtractionStrategy::RestrictionLevel,
                },
            }],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }
}

impl SourceConfig {
    fn to_source(&self) -> Result<StatusSource> {
        let url = Url::parse(&self.url)
            .with_context(|| format!("Invalid URL for source '{}': {}", self.label, self.url))?;
        Ok(StatusSource::new(self.label.clone(), url, self.strategy))
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Load `path` if given, built-in defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            user_agent: self.http.user_agent.clone(),
            referer: self.http.referer.clone(),
            timeout: Duration::from_secs(self.http.timeout_secs),
        }
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.time
            .timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid time zone '{}': {}", self.time.timezone, e))
    }

    pub fn registry(&self) -> Result<SourceRegistry> {
        let mut registry = SourceRegistry::new(self.sources.default.to_source()?);
        for entry in &self.sources.overrides {
            registry = registry.with_override(entry.district.clone(), entry.source.to_source()?);
        }
        Ok(registry)
    }
}
