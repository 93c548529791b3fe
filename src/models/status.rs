//! Burn status results and the published resolution state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ContactInfo, Coordinate};

pub const NO_BURNING: &str = "no burning permitted today";
pub const NOT_AVAILABLE: &str = "not available";
pub const FETCH_ERROR: &str = "Error";

/// One permitted burning window from the daily advisory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "text", rename_all = "snake_case")]
pub enum BurnWindow {
    /// Free-text time range, e.g. "8:00 a.m. to 2:00 p.m."
    Window(String),
    NoBurning,
    NotAvailable,
}

impl BurnWindow {
    pub fn permits_burning(&self) -> bool {
        matches!(self, BurnWindow::Window(_))
    }
}

impl std::fmt::Display for BurnWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BurnWindow::Window(text) => f.write_str(text),
            BurnWindow::NoBurning => f.write_str(NO_BURNING),
            BurnWindow::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

/// Today's agricultural and backyard burn windows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnAdvisory {
    pub agricultural: BurnWindow,
    pub backyard: BurnWindow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BurnAdvisory {
    /// Both windows unavailable, with a reason
    pub fn unavailable(error: impl Into<String>) -> Self {
        Self {
            agricultural: BurnWindow::NotAvailable,
            backyard: BurnWindow::NotAvailable,
            error: Some(error.into()),
        }
    }
}

/// Display urgency of a restriction level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyTier {
    Neutral,
    Normal,
    Caution,
    Elevated,
    Highest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestrictionKind {
    Extreme,
    High,
    Moderate,
    Low,
    Unknown,
}

impl RestrictionKind {
    /// Case-insensitive parse; anything unrecognised is `Unknown`
    pub fn parse(text: &str) -> Self {
        match text.trim().to_ascii_uppercase().as_str() {
            "EXTREME" => RestrictionKind::Extreme,
            "HIGH" => RestrictionKind::High,
            "MODERATE" => RestrictionKind::Moderate,
            "LOW" => RestrictionKind::Low,
            _ => RestrictionKind::Unknown,
        }
    }

    pub fn urgency(self) -> UrgencyTier {
        match self {
            RestrictionKind::Extreme => UrgencyTier::Highest,
            RestrictionKind::High => UrgencyTier::Elevated,
            RestrictionKind::Moderate => UrgencyTier::Caution,
            RestrictionKind::Low => UrgencyTier::Normal,
            RestrictionKind::Unknown => UrgencyTier::Neutral,
        }
    }
}

/// Public use restriction level with the text it was scraped from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionLevel {
    pub kind: RestrictionKind,
    pub text: String,
}

impl RestrictionLevel {
    /// Build from scraped text (trimmed, kept verbatim)
    pub fn from_text(text: &str) -> Self {
        let text = text.trim();
        Self {
            kind: RestrictionKind::parse(text),
            text: text.to_string(),
        }
    }

    /// Source reachable but the expected structure was missing
    pub fn not_available() -> Self {
        Self {
            kind: RestrictionKind::Unknown,
            text: NOT_AVAILABLE.to_string(),
        }
    }

    /// Source unreachable or unreadable
    pub fn error() -> Self {
        Self {
            kind: RestrictionKind::Unknown,
            text: FETCH_ERROR.to_string(),
        }
    }

    pub fn urgency(&self) -> UrgencyTier {
        self.kind.urgency()
    }
}

/// Status payload of a resolution cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DistrictStatus {
    /// Fetch dispatched, no answer yet
    Pending,
    Advisory(BurnAdvisory),
    Restriction(RestrictionLevel),
    /// No district, so nothing to fetch
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPhase {
    Idle,
    Resolving,
    Fetching,
    Settled,
}

/// Latest resolution state, as published to observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// Cycle sequence number this state belongs to
    pub sequence: u64,
    pub phase: ResolutionPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
    /// `None` when no district was found
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactInfo>,
    pub status: DistrictStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ResolutionResult {
    pub fn idle() -> Self {
        Self {
            sequence: 0,
            phase: ResolutionPhase::Idle,
            coordinate: None,
            district: None,
            contact: None,
            status: DistrictStatus::Unavailable,
            error: None,
            updated_at: Utc::now(),
        }
    }

    /// Urgency of the current restriction level, if the status is one
    pub fn urgency(&self) -> Option<UrgencyTier> {
        match &self.status {
            DistrictStatus::Restriction(level) => Some(level.urgency()),
            _ => None,
        }
    }
}

impl Default for ResolutionResult {
    fn default() -> Self {
        Self::idle()
    }
}
