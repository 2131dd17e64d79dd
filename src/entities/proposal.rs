//! Proposal and assignment entity types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::identity::{AssignmentId, CircuitId, CompanyId, LocationId, ProposalId, ResourceKind};
use crate::entities::{Circuit, Resource};

/// Snapshot of the circuit a proposal assignment references, embedded in the
/// assignment record by the data service. Refreshed on every proposal fetch;
/// the cost figure here is the canonical one for aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitSnapshot {
    pub carrier: String,

    #[serde(rename = "type")]
    pub kind: String,

    pub bandwidth: String,

    pub monthly_cost: Decimal,
}

impl From<&Circuit> for CircuitSnapshot {
    fn from(circuit: &Circuit) -> Self {
        Self {
            carrier: circuit.carrier.clone(),
            kind: circuit.kind.clone(),
            bandwidth: circuit.bandwidth.clone(),
            monthly_cost: circuit.monthly_cost,
        }
    }
}

/// One proposal-circuit assignment. The location is a denormalized copy of
/// the circuit's location so per-location views need no join; it must equal
/// the referenced circuit's location at assignment time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalCircuit {
    /// Assignment identity, distinct from the circuit id
    pub id: AssignmentId,

    pub proposal_id: ProposalId,

    pub circuit_id: CircuitId,

    pub location_id: LocationId,

    /// Embedded circuit snapshot for display and cost aggregation
    pub circuit: CircuitSnapshot,
}

impl Resource for ProposalCircuit {
    const KIND: ResourceKind = ResourceKind::Assignment;
    type Id = AssignmentId;

    fn id(&self) -> &AssignmentId {
        &self.id
    }
}

/// A circuit proposal for a company, as returned by the data service with
/// its full assignment collection embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    /// Unique identifier
    pub id: ProposalId,

    /// Company the proposal is developed for
    pub company_id: CompanyId,

    /// Display name
    pub name: String,

    /// Active assignments
    #[serde(default)]
    pub circuits: Vec<ProposalCircuit>,
}

/// The normalized proposal row held in the entity store. Assignments are
/// stored separately, keyed by assignment id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalRecord {
    pub id: ProposalId,

    pub company_id: CompanyId,

    pub name: String,
}

impl From<&Proposal> for ProposalRecord {
    fn from(proposal: &Proposal) -> Self {
        Self {
            id: proposal.id.clone(),
            company_id: proposal.company_id.clone(),
            name: proposal.name.clone(),
        }
    }
}

impl Resource for ProposalRecord {
    const KIND: ResourceKind = ResourceKind::Proposal;
    type Id = ProposalId;

    fn id(&self) -> &ProposalId {
        &self.id
    }
}
