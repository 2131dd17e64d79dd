//! Typed identifiers for service-owned resources
//!
//! All ids are opaque strings minted by the backing data service. The engine
//! never parses structure out of them; the newtypes exist so a circuit id
//! cannot be handed to an API expecting a proposal id.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Resource kinds the engine synchronizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Customer company
    Company,
    /// Physical site owned by a company
    Location,
    /// Network circuit terminated at a location
    Circuit,
    /// Circuit proposal for a company
    Proposal,
    /// Proposal-circuit assignment record
    Assignment,
}

impl ResourceKind {
    /// Get the string representation of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Company => "company",
            ResourceKind::Location => "location",
            ResourceKind::Circuit => "circuit",
            ResourceKind::Proposal => "proposal",
            ResourceKind::Assignment => "assignment",
        }
    }

    /// Get all known kinds
    pub fn all() -> &'static [ResourceKind] {
        &[
            ResourceKind::Company,
            ResourceKind::Location,
            ResourceKind::Circuit,
            ResourceKind::Proposal,
            ResourceKind::Assignment,
        ]
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = KindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "company" => Ok(ResourceKind::Company),
            "location" => Ok(ResourceKind::Location),
            "circuit" => Ok(ResourceKind::Circuit),
            "proposal" => Ok(ResourceKind::Proposal),
            "assignment" => Ok(ResourceKind::Assignment),
            _ => Err(KindParseError::Unknown(s.to_string())),
        }
    }
}

/// Errors that can occur when parsing resource kinds
#[derive(Debug, Error)]
pub enum KindParseError {
    #[error("unknown resource kind: '{0}' (valid: company, location, circuit, proposal, assignment)")]
    Unknown(String),
}

/// Identifier of a company record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(String);

impl CompanyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a location record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

impl LocationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a circuit record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CircuitId(String);

impl CircuitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CircuitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a proposal record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(String);

impl ProposalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a proposal-circuit assignment. Distinct from the circuit id:
/// the same circuit assigned under two proposals yields two assignment ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentId(String);

impl AssignmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
