//! Engine error kinds and their propagation policy
//!
//! `Conflict`, `NotFound`, and `LocationMismatch` surface to the caller for
//! user-visible messaging. `ServiceUnavailable` is retried at the fetch layer
//! per the configured backoff. `StaleRead` is internal bookkeeping: a
//! completion that arrived for a superseded query is discarded and logged,
//! never shown to a user.

use thiserror::Error;

use crate::core::identity::{CircuitId, LocationId, ProposalId, ResourceKind};
use crate::service::ServiceError;

/// Errors produced by the synchronization engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Duplicate assignment attempted for a (proposal, circuit) pair
    #[error("circuit {circuit_id} is already proposed in proposal {proposal_id}")]
    Conflict {
        proposal_id: ProposalId,
        circuit_id: CircuitId,
    },

    /// Mutation or query against an id the backing store does not know
    #[error("no {kind} record with id '{id}'")]
    NotFound { kind: ResourceKind, id: String },

    /// The requested assignment location contradicts the circuit's location
    #[error("assignment location {requested} does not match circuit {circuit_id} at {actual}")]
    LocationMismatch {
        circuit_id: CircuitId,
        requested: LocationId,
        actual: LocationId,
    },

    /// Transient network or service failure
    #[error("data service unavailable: {0}")]
    ServiceUnavailable(String),

    /// A completion arrived for a superseded query and was discarded
    #[error("stale completion for query '{0}' discarded")]
    StaleRead(String),
}

impl From<ServiceError> for EngineError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Conflict {
                proposal_id,
                circuit_id,
            } => EngineError::Conflict {
                proposal_id,
                circuit_id,
            },
            ServiceError::NotFound { kind, id } => EngineError::NotFound { kind, id },
            ServiceError::LocationMismatch {
                circuit_id,
                requested,
                actual,
            } => EngineError::LocationMismatch {
                circuit_id,
                requested,
                actual,
            },
            ServiceError::Unavailable { message } => EngineError::ServiceUnavailable(message),
        }
    }
}
