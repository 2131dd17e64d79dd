//! Location entity type

use serde::{Deserialize, Serialize};

use crate::core::identity::{CompanyId, LocationId, ResourceKind};
use crate::entities::Resource;

/// Location criticality rating. A fixed enumeration with no ordering beyond
/// display; the service stores the capitalized variant names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Criticality {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Criticality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Criticality::High => write!(f, "High"),
            Criticality::Medium => write!(f, "Medium"),
            Criticality::Low => write!(f, "Low"),
        }
    }
}

impl std::str::FromStr for Criticality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Criticality::High),
            "medium" => Ok(Criticality::Medium),
            "low" => Ok(Criticality::Low),
            _ => Err(format!("Unknown criticality: {}", s)),
        }
    }
}

/// A physical site owned by a company. The company reference is a
/// back-reference, not ownership; locations are fetched, never created here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    /// Unique identifier
    pub id: LocationId,

    /// Owning company
    pub company_id: CompanyId,

    /// Display name
    pub name: String,

    pub city: String,

    pub state: String,

    /// Criticality rating for display badges
    pub criticality: Criticality,
}

impl Resource for Location {
    const KIND: ResourceKind = ResourceKind::Location;
    type Id = LocationId;

    fn id(&self) -> &LocationId {
        &self.id
    }
}
