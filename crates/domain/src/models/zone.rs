//! Danger zone domain model.

use serde::{Deserialize, Serialize};
use shared::Coordinate;

/// Crime-risk severity of a zone, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Alert radius in meters. Fixed per level, no overrides.
    pub const fn alert_radius_meters(self) -> f64 {
        match self {
            RiskLevel::Critical => 60_000.0,
            RiskLevel::High => 40_000.0,
            RiskLevel::Medium => 25_000.0,
            RiskLevel::Low => 15_000.0,
        }
    }

    /// Only high and critical zones ever open an escalation session.
    pub const fn triggers_escalation(self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    /// Parses a risk level, ignoring case and surrounding whitespace.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(RiskLevel::Low),
            "medium" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            "critical" => Some(RiskLevel::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named geographic danger area. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    #[serde(alias = "state")]
    pub name: String,
    pub location: Coordinate,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub total_incidents: u32,
}

impl Zone {
    pub fn new(
        name: impl Into<String>,
        location: Coordinate,
        risk_level: RiskLevel,
        total_incidents: u32,
    ) -> Self {
        Self {
            name: name.into(),
            location,
            risk_level,
            total_incidents,
        }
    }

    pub fn alert_radius_meters(&self) -> f64 {
        self.risk_level.alert_radius_meters()
    }
}

/// Sort order for zone listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneSort {
    /// Most incidents first.
    #[default]
    Incidents,
    /// Most severe first, then most incidents.
    Risk,
    Name,
}

/// Query parameters for listing zones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListZonesQuery {
    /// Only include zones at or above this level.
    #[serde(default)]
    pub min_risk: Option<RiskLevel>,
    #[serde(default)]
    pub sort: ZoneSort,
}

/// Response payload for a single zone.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneResponse {
    pub name: String,
    pub location: Coordinate,
    pub risk_level: RiskLevel,
    pub total_incidents: u32,
    pub alert_radius_meters: f64,
}

impl From<&Zone> for ZoneResponse {
    fn from(z: &Zone) -> Self {
        Self {
            name: z.name.clone(),
            location: z.location,
            risk_level: z.risk_level,
            total_incidents: z.total_incidents,
            alert_radius_meters: z.alert_radius_meters(),
        }
    }
}

/// Response for listing zones.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListZonesResponse {
    pub zones: Vec<ZoneResponse>,
    pub total: usize,
}
