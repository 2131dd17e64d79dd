//! In-memory reference backend
//!
//! Implements the full [`DataService`] contract against owned vectors:
//! (proposal, circuit) uniqueness and the assignment-location invariant are
//! enforced server-side, assignment ids are minted as ULIDs, and dashboard
//! stats are computed with the same rules as the pure aggregation engine.
//! Doubles as the test backend; fault injection fails the next N calls with
//! `Unavailable` so retry paths can be exercised.

use std::cell::Cell;

use serde::Deserialize;
use ulid::Ulid;

use crate::core::aggregate::{dashboard_rollup, DashboardStats};
use crate::core::identity::{AssignmentId, CompanyId, LocationId, ProposalId, ResourceKind};
use crate::core::store::EntityStore;
use crate::entities::{Circuit, CircuitSnapshot, Company, Location, Proposal, ProposalCircuit};
use crate::service::{DataService, NewAssignment, ServiceError};

/// Seed dataset accepted by [`MemoryService::from_json`]
#[derive(Debug, Default, Deserialize)]
struct Seed {
    #[serde(default)]
    companies: Vec<Company>,
    #[serde(default)]
    locations: Vec<Location>,
    #[serde(default)]
    circuits: Vec<Circuit>,
    #[serde(default)]
    proposals: Vec<Proposal>,
}

/// In-memory data service
#[derive(Debug, Default)]
pub struct MemoryService {
    companies: Vec<Company>,
    locations: Vec<Location>,
    circuits: Vec<Circuit>,
    proposals: Vec<Proposal>,
    /// Remaining calls to fail with `Unavailable`
    faults: Cell<u32>,
    /// Total service calls answered, for request-dedup assertions
    calls: Cell<usize>,
}

impl MemoryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a service from a JSON seed document with `companies`,
    /// `locations`, `circuits`, and `proposals` arrays (all optional).
    pub fn from_json(seed: &str) -> Result<Self, serde_json::Error> {
        let seed: Seed = serde_json::from_str(seed)?;
        Ok(Self {
            companies: seed.companies,
            locations: seed.locations,
            circuits: seed.circuits,
            proposals: seed.proposals,
            faults: Cell::new(0),
            calls: Cell::new(0),
        })
    }

    pub fn add_company(&mut self, company: Company) {
        self.companies.push(company);
    }

    pub fn add_location(&mut self, location: Location) {
        self.locations.push(location);
    }

    pub fn add_circuit(&mut self, circuit: Circuit) {
        self.circuits.push(circuit);
    }

    pub fn add_proposal(&mut self, proposal: Proposal) {
        self.proposals.push(proposal);
    }

    /// Fail the next `n` calls with `Unavailable`
    pub fn inject_faults(&self, n: u32) {
        self.faults.set(n);
    }

    /// Total calls answered (including injected failures)
    pub fn call_count(&self) -> usize {
        self.calls.get()
    }

    fn answer(&self) -> Result<(), ServiceError> {
        self.calls.set(self.calls.get() + 1);
        let remaining = self.faults.get();
        if remaining > 0 {
            self.faults.set(remaining - 1);
            return Err(ServiceError::Unavailable {
                message: "injected fault".to_string(),
            });
        }
        Ok(())
    }
}

impl DataService for MemoryService {
    fn list_companies(&self) -> Result<Vec<Company>, ServiceError> {
        self.answer()?;
        Ok(self.companies.clone())
    }

    fn list_locations(&self) -> Result<Vec<Location>, ServiceError> {
        self.answer()?;
        Ok(self.locations.clone())
    }

    fn list_circuits(&self, location: Option<&LocationId>) -> Result<Vec<Circuit>, ServiceError> {
        self.answer()?;
        Ok(self
            .circuits
            .iter()
            .filter(|c| match location {
                Some(wanted) => &c.location_id == wanted,
                None => true,
            })
            .cloned()
            .collect())
    }

    fn get_proposal(&self, id: &ProposalId) -> Result<Proposal, ServiceError> {
        self.answer()?;
        self.proposals
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound {
                kind: ResourceKind::Proposal,
                id: id.to_string(),
            })
    }

    fn create_proposal_circuit(
        &mut self,
        request: NewAssignment,
    ) -> Result<ProposalCircuit, ServiceError> {
        self.answer()?;

        let snapshot = {
            let circuit = self
                .circuits
                .iter()
                .find(|c| c.id == request.circuit_id)
                .ok_or_else(|| ServiceError::NotFound {
                    kind: ResourceKind::Circuit,
                    id: request.circuit_id.to_string(),
                })?;
            if circuit.location_id != request.location_id {
                return Err(ServiceError::LocationMismatch {
                    circuit_id: request.circuit_id.clone(),
                    requested: request.location_id.clone(),
                    actual: circuit.location_id.clone(),
                });
            }
            CircuitSnapshot::from(circuit)
        };

        let proposal = self
            .proposals
            .iter_mut()
            .find(|p| p.id == request.proposal_id)
            .ok_or_else(|| ServiceError::NotFound {
                kind: ResourceKind::Proposal,
                id: request.proposal_id.to_string(),
            })?;

        // uniqueness over (proposal, circuit) is enforced here, not trusted
        // to the caller's snapshot check
        if proposal
            .circuits
            .iter()
            .any(|pc| pc.circuit_id == request.circuit_id)
        {
            return Err(ServiceError::Conflict {
                proposal_id: request.proposal_id,
                circuit_id: request.circuit_id,
            });
        }

        let record = ProposalCircuit {
            id: AssignmentId::new(Ulid::new().to_string()),
            proposal_id: request.proposal_id,
            circuit_id: request.circuit_id,
            location_id: request.location_id,
            circuit: snapshot,
        };
        proposal.circuits.push(record.clone());
        Ok(record)
    }

    fn delete_proposal_circuit(&mut self, id: &AssignmentId) -> Result<(), ServiceError> {
        self.answer()?;
        for proposal in self.proposals.iter_mut() {
            if let Some(index) = proposal.circuits.iter().position(|pc| &pc.id == id) {
                proposal.circuits.remove(index);
                return Ok(());
            }
        }
        Err(ServiceError::NotFound {
            kind: ResourceKind::Assignment,
            id: id.to_string(),
        })
    }

    fn dashboard_stats(
        &self,
        company: Option<&CompanyId>,
        location: Option<&LocationId>,
    ) -> Result<DashboardStats, ServiceError> {
        self.answer()?;
        let mut store = EntityStore::new();
        store.merge_companies(self.companies.clone());
        store.merge_locations(self.locations.clone());
        store.merge_circuits(None, self.circuits.clone());
        Ok(dashboard_rollup(&store, company, location))
    }
}
