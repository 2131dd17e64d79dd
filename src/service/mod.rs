//! External data-service contract
//!
//! The engine consumes the backing store through this trait; it owns no wire
//! format of its own. Read methods take `&self` (idempotent), mutations take
//! `&mut self`. Error kinds map 1:1 onto the engine's propagation policy:
//! `Conflict`/`NotFound`/`LocationMismatch` surface to the caller,
//! `Unavailable` is retried at the fetch layer.

pub mod memory;

pub use memory::MemoryService;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::aggregate::DashboardStats;
use crate::core::identity::{
    AssignmentId, CircuitId, CompanyId, LocationId, ProposalId, ResourceKind,
};
use crate::entities::{Circuit, Company, Location, Proposal, ProposalCircuit};

/// Request body for creating an assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAssignment {
    pub proposal_id: ProposalId,
    pub circuit_id: CircuitId,
    pub location_id: LocationId,
}

/// Errors reported by a data service
#[derive(Debug, Error)]
pub enum ServiceError {
    /// An active assignment already exists for the (proposal, circuit) pair
    #[error("assignment already exists for proposal {proposal_id}, circuit {circuit_id}")]
    Conflict {
        proposal_id: ProposalId,
        circuit_id: CircuitId,
    },

    #[error("no {kind} record with id '{id}'")]
    NotFound { kind: ResourceKind, id: String },

    /// The requested assignment location contradicts the circuit's location
    #[error("assignment location {requested} does not match circuit {circuit_id} at {actual}")]
    LocationMismatch {
        circuit_id: CircuitId,
        requested: LocationId,
        actual: LocationId,
    },

    /// Transient transport or service failure; safe to retry
    #[error("service unavailable: {message}")]
    Unavailable { message: String },
}

/// The upstream collaborator the engine fetches from and mutates through
pub trait DataService {
    fn list_companies(&self) -> Result<Vec<Company>, ServiceError>;

    fn list_locations(&self) -> Result<Vec<Location>, ServiceError>;

    /// Circuits, optionally scoped to one location
    fn list_circuits(&self, location: Option<&LocationId>) -> Result<Vec<Circuit>, ServiceError>;

    /// A proposal with its full assignment collection embedded
    fn get_proposal(&self, id: &ProposalId) -> Result<Proposal, ServiceError>;

    fn create_proposal_circuit(
        &mut self,
        request: NewAssignment,
    ) -> Result<ProposalCircuit, ServiceError>;

    fn delete_proposal_circuit(&mut self, id: &AssignmentId) -> Result<(), ServiceError>;

    /// Server-computed dashboard counters for a filter scope
    fn dashboard_stats(
        &self,
        company: Option<&CompanyId>,
        location: Option<&LocationId>,
    ) -> Result<DashboardStats, ServiceError>;
}
