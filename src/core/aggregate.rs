//! Pure aggregation over store snapshots
//!
//! Everything here is a side-effect-free function of store contents plus a
//! (proposal, location-set) pair. Aggregates are derived, never stored: any
//! caller can recompute them at any time, so there are no counters that can
//! drift from the assignment set. Missing data (a location whose circuit
//! list has not loaded yet) aggregates to zero and recomputes once the fetch
//! lands; it is never a lookup failure.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::identity::{CircuitId, CompanyId, LocationId, ProposalId};
use crate::core::store::EntityStore;
use crate::entities::CircuitStatus;

/// Per-location derived view for one proposal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRollup {
    pub location_id: LocationId,

    /// Circuits at this location not yet assigned to the proposal
    pub available: usize,

    /// Assignments the proposal holds at this location
    pub proposed: usize,

    /// Sum of the proposal's assignment costs at this location
    pub monthly_cost: Decimal,
}

/// Proposal-wide totals across a location set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposalTotals {
    pub total_available: usize,
    pub total_proposed: usize,
    pub total_monthly_cost: Decimal,
}

/// Dashboard counters for a (company, location) filter scope. Computed
/// server-side by the data service; [`dashboard_rollup`] derives the same
/// figures from store contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_circuits: usize,
    pub active_circuits: usize,
    pub inactive_circuits: usize,
    pub total_monthly_cost: Decimal,
}

/// Compute one fully materialized rollup per requested location.
///
/// The assigned/available partition uses circuit-id set membership, so the
/// cost is O(circuits + assignments) rather than a nested scan per circuit.
pub fn location_rollups(
    store: &EntityStore,
    proposal: &ProposalId,
    locations: &[LocationId],
) -> Vec<LocationRollup> {
    let assigned: HashSet<&CircuitId> = store
        .assignments_for(proposal)
        .map(|a| &a.circuit_id)
        .collect();

    let mut per_location: HashMap<&LocationId, (usize, Decimal)> = HashMap::new();
    for assignment in store.assignments_for(proposal) {
        let entry = per_location
            .entry(&assignment.location_id)
            .or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 += assignment.circuit.monthly_cost;
    }

    locations
        .iter()
        .map(|location| {
            let available = store
                .circuits_at(location)
                .filter(|c| !assigned.contains(&c.id))
                .count();
            let (proposed, monthly_cost) = per_location
                .get(location)
                .copied()
                .unwrap_or((0, Decimal::ZERO));
            LocationRollup {
                location_id: location.clone(),
                available,
                proposed,
                monthly_cost,
            }
        })
        .collect()
}

/// Sum per-location rollups into proposal-wide totals
pub fn proposal_totals(rollups: &[LocationRollup]) -> ProposalTotals {
    let mut totals = ProposalTotals::default();
    for rollup in rollups {
        totals.total_available += rollup.available;
        totals.total_proposed += rollup.proposed;
        totals.total_monthly_cost += rollup.monthly_cost;
    }
    totals
}

/// Derive dashboard counters for a filter scope purely from store contents.
///
/// A company filter scopes to circuits at locations owned by that company; a
/// location filter narrows to that single location. Circuits whose location
/// record is not loaded fall outside any company scope.
pub fn dashboard_rollup(
    store: &EntityStore,
    company: Option<&CompanyId>,
    location: Option<&LocationId>,
) -> DashboardStats {
    let mut stats = DashboardStats::default();
    for circuit in store.circuits() {
        if let Some(wanted) = location {
            if &circuit.location_id != wanted {
                continue;
            }
        }
        if let Some(wanted) = company {
            match store.location(&circuit.location_id) {
                Some(loc) if &loc.company_id == wanted => {}
                _ => continue,
            }
        }
        stats.total_circuits += 1;
        match circuit.status {
            CircuitStatus::Active => stats.active_circuits += 1,
            CircuitStatus::Inactive => stats.inactive_circuits += 1,
        }
        stats.total_monthly_cost += circuit.monthly_cost;
    }
    stats
}
