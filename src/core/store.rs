//! Normalized in-memory entity store
//!
//! One id-keyed map per resource kind, deduplicated across overlapping
//! queries. Merging a fetch result upserts its records (the most recent
//! successful fetch wins) and reconciles the fetched partition: records of
//! that kind inside the partition that the fresh result no longer contains
//! are removed, so scoped re-fetches cannot leave stale orphans behind.
//! Reconciliation never reaches outside the partition - there is no
//! full-store wipe.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::core::identity::{AssignmentId, CircuitId, CompanyId, LocationId, ProposalId};
use crate::entities::{
    Circuit, Company, Location, Proposal, ProposalCircuit, ProposalRecord, Resource,
};

/// The normalized entity store
#[derive(Debug, Default)]
pub struct EntityStore {
    companies: HashMap<CompanyId, Company>,
    locations: HashMap<LocationId, Location>,
    circuits: HashMap<CircuitId, Circuit>,
    proposals: HashMap<ProposalId, ProposalRecord>,
    assignments: HashMap<AssignmentId, ProposalCircuit>,
}

/// Upsert `records` into `map` and drop in-scope entries the fresh batch no
/// longer contains. `in_scope` delimits the partition the fetch covered.
fn reconcile<R, F>(map: &mut HashMap<R::Id, R>, records: Vec<R>, in_scope: F)
where
    R: Resource,
    F: Fn(&R) -> bool,
{
    let fresh: HashSet<R::Id> = records.iter().map(|r| r.id().clone()).collect();
    let before = map.len();
    map.retain(|id, existing| !in_scope(existing) || fresh.contains(id));
    let removed = before - map.len();
    for record in records {
        map.insert(record.id().clone(), record);
    }
    debug!(
        kind = R::KIND.as_str(),
        merged = fresh.len(),
        removed,
        "merged fetch result"
    );
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a full company list. The partition is the whole kind.
    pub fn merge_companies(&mut self, records: Vec<Company>) {
        reconcile(&mut self.companies, records, |_| true);
    }

    /// Merge a full location list. The partition is the whole kind.
    pub fn merge_locations(&mut self, records: Vec<Location>) {
        reconcile(&mut self.locations, records, |_| true);
    }

    /// Merge a circuit fetch result. `scope` is the location filter the fetch
    /// was issued with; reconciliation is limited to circuits terminating at
    /// that location. An unscoped fetch covers the whole kind.
    pub fn merge_circuits(&mut self, scope: Option<&LocationId>, records: Vec<Circuit>) {
        match scope {
            Some(location) => {
                reconcile(&mut self.circuits, records, |c| &c.location_id == location)
            }
            None => reconcile(&mut self.circuits, records, |_| true),
        }
    }

    /// Merge a proposal fetch result: upsert the proposal row and reconcile
    /// exactly that proposal's assignment set.
    pub fn merge_proposal(&mut self, proposal: Proposal) {
        let record = ProposalRecord::from(&proposal);
        let proposal_id = record.id.clone();
        self.proposals.insert(proposal_id.clone(), record);
        reconcile(&mut self.assignments, proposal.circuits, |a| {
            a.proposal_id == proposal_id
        });
    }

    pub fn company(&self, id: &CompanyId) -> Option<&Company> {
        self.companies.get(id)
    }

    pub fn location(&self, id: &LocationId) -> Option<&Location> {
        self.locations.get(id)
    }

    pub fn circuit(&self, id: &CircuitId) -> Option<&Circuit> {
        self.circuits.get(id)
    }

    pub fn proposal(&self, id: &ProposalId) -> Option<&ProposalRecord> {
        self.proposals.get(id)
    }

    pub fn assignment(&self, id: &AssignmentId) -> Option<&ProposalCircuit> {
        self.assignments.get(id)
    }

    pub fn companies(&self) -> impl Iterator<Item = &Company> {
        self.companies.values()
    }

    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.values()
    }

    pub fn circuits(&self) -> impl Iterator<Item = &Circuit> {
        self.circuits.values()
    }

    /// Circuits terminating at a location
    pub fn circuits_at<'a>(
        &'a self,
        location: &'a LocationId,
    ) -> impl Iterator<Item = &'a Circuit> + 'a {
        self.circuits
            .values()
            .filter(move |c| &c.location_id == location)
    }

    /// Active assignments belonging to a proposal
    pub fn assignments_for<'a>(
        &'a self,
        proposal: &'a ProposalId,
    ) -> impl Iterator<Item = &'a ProposalCircuit> + 'a {
        self.assignments
            .values()
            .filter(move |a| &a.proposal_id == proposal)
    }

    /// Look up the active assignment for a (proposal, circuit) pair, if any
    pub fn find_assignment(
        &self,
        proposal: &ProposalId,
        circuit: &CircuitId,
    ) -> Option<&ProposalCircuit> {
        self.assignments
            .values()
            .find(|a| &a.proposal_id == proposal && &a.circuit_id == circuit)
    }
}
