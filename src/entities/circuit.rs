//! Circuit entity type

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::identity::{CircuitId, LocationId, ResourceKind};
use crate::entities::Resource;

/// Operational status of a circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum CircuitStatus {
    #[default]
    Active,
    Inactive,
}

impl std::fmt::Display for CircuitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitStatus::Active => write!(f, "active"),
            CircuitStatus::Inactive => write!(f, "inactive"),
        }
    }
}

impl std::str::FromStr for CircuitStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(CircuitStatus::Active),
            "inactive" => Ok(CircuitStatus::Inactive),
            _ => Err(format!("Unknown circuit status: {}", s)),
        }
    }
}

/// A network circuit terminated at a location. Belongs to exactly one
/// location at creation and never moves for the lifetime of this engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circuit {
    /// Unique identifier
    pub id: CircuitId,

    /// Terminating location
    pub location_id: LocationId,

    /// Carrier name (open set, e.g. "AT&T", "Lumen")
    pub carrier: String,

    /// Circuit type, e.g. "MPLS", "DIA", "Broadband"
    #[serde(rename = "type")]
    pub kind: String,

    /// Provisioned bandwidth, e.g. "100M", "1G"
    pub bandwidth: String,

    #[serde(default)]
    pub status: CircuitStatus,

    /// Non-negative monthly recurring cost
    pub monthly_cost: Decimal,
}

impl Resource for Circuit {
    const KIND: ResourceKind = ResourceKind::Circuit;
    type Id = CircuitId;

    fn id(&self) -> &CircuitId {
        &self.id
    }
}
