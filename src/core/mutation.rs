//! Assignment mutations with precise cache invalidation
//!
//! Add/remove operations run against the external data service; the store's
//! copy of the result is only ever refreshed via re-fetch after the service
//! confirms the write (no optimistic local insertion that could diverge from
//! the authoritative state). On success, invalidation is scoped exactly to
//! the derived values the mutated assignment set feeds: the proposal's own
//! cached record and the circuit-list queries covering the affected
//! location. A blanket cache flush would force unrelated views to re-fetch
//! and is deliberately not offered.

use tracing::info;

use crate::core::cache::{QueryCache, QueryKey};
use crate::core::error::EngineError;
use crate::core::identity::{AssignmentId, CircuitId, LocationId, ProposalId, ResourceKind};
use crate::core::store::EntityStore;
use crate::entities::ProposalCircuit;
use crate::service::{DataService, NewAssignment};

/// A confirmed add: the created record plus the observed cache keys whose
/// re-fetch the invalidation scheduled.
#[derive(Debug)]
pub struct AddOutcome {
    pub record: ProposalCircuit,
    pub refetch: Vec<QueryKey>,
}

/// Create an assignment for (proposal, circuit) at `location`.
///
/// The duplicate check runs against the store snapshot before the write is
/// issued; a server-reported duplicate (a race under concurrent callers)
/// maps to the same `Conflict` kind. A location that contradicts the store's
/// copy of the circuit is rejected before the write.
pub fn add_assignment<S: DataService>(
    service: &mut S,
    store: &EntityStore,
    cache: &mut QueryCache,
    proposal_id: &ProposalId,
    circuit_id: &CircuitId,
    location_id: &LocationId,
) -> Result<AddOutcome, EngineError> {
    if store.find_assignment(proposal_id, circuit_id).is_some() {
        return Err(EngineError::Conflict {
            proposal_id: proposal_id.clone(),
            circuit_id: circuit_id.clone(),
        });
    }
    if let Some(circuit) = store.circuit(circuit_id) {
        if &circuit.location_id != location_id {
            return Err(EngineError::LocationMismatch {
                circuit_id: circuit_id.clone(),
                requested: location_id.clone(),
                actual: circuit.location_id.clone(),
            });
        }
    }

    let record = service.create_proposal_circuit(NewAssignment {
        proposal_id: proposal_id.clone(),
        circuit_id: circuit_id.clone(),
        location_id: location_id.clone(),
    })?;
    info!(
        proposal = %proposal_id,
        circuit = %circuit_id,
        location = %location_id,
        assignment = %record.id,
        "assignment created"
    );

    let refetch = invalidate_for(cache, proposal_id, location_id);
    Ok(AddOutcome { record, refetch })
}

/// Delete an assignment by id. Fails with `NotFound` when neither the store
/// nor the service knows the id.
pub fn remove_assignment<S: DataService>(
    service: &mut S,
    store: &EntityStore,
    cache: &mut QueryCache,
    assignment_id: &AssignmentId,
) -> Result<Vec<QueryKey>, EngineError> {
    let existing = store
        .assignment(assignment_id)
        .ok_or_else(|| EngineError::NotFound {
            kind: ResourceKind::Assignment,
            id: assignment_id.to_string(),
        })?;
    let proposal_id = existing.proposal_id.clone();
    let location_id = existing.location_id.clone();

    service.delete_proposal_circuit(assignment_id)?;
    info!(
        proposal = %proposal_id,
        location = %location_id,
        assignment = %assignment_id,
        "assignment removed"
    );

    Ok(invalidate_for(cache, &proposal_id, &location_id))
}

/// Invalidate exactly the entries whose derived values depend on the mutated
/// assignment set: the proposal's record and circuit lists covering the
/// affected location.
fn invalidate_for(
    cache: &mut QueryCache,
    proposal_id: &ProposalId,
    location_id: &LocationId,
) -> Vec<QueryKey> {
    cache.invalidate(|key| {
        matches!(key, QueryKey::Proposal(p) if p == proposal_id) || key.covers_location(location_id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::Freshness;
    use crate::core::identity::CompanyId;
    use crate::entities::{Circuit, CircuitStatus, Criticality, Location, Proposal};
    use crate::service::MemoryService;
    use rust_decimal::Decimal;

    fn service_with_hq() -> MemoryService {
        let mut service = MemoryService::new();
        service.add_company(crate::entities::Company {
            id: CompanyId::new("cmp-1"),
            name: "Globex".to_string(),
        });
        service.add_location(Location {
            id: LocationId::new("loc-hq"),
            company_id: CompanyId::new("cmp-1"),
            name: "HQ".to_string(),
            city: "Austin".to_string(),
            state: "TX".to_string(),
            criticality: Criticality::High,
        });
        service.add_circuit(Circuit {
            id: CircuitId::new("cir-a"),
            location_id: LocationId::new("loc-hq"),
            carrier: "Lumen".to_string(),
            kind: "MPLS".to_string(),
            bandwidth: "100M".to_string(),
            status: CircuitStatus::Active,
            monthly_cost: Decimal::new(100, 0),
        });
        service.add_proposal(Proposal {
            id: ProposalId::new("prop-1"),
            company_id: CompanyId::new("cmp-1"),
            name: "refresh".to_string(),
            circuits: vec![],
        });
        service
    }

    #[test]
    fn test_add_then_duplicate_conflicts() {
        let mut service = service_with_hq();
        let mut store = EntityStore::new();
        let mut cache = QueryCache::new();

        let outcome = add_assignment(
            &mut service,
            &store,
            &mut cache,
            &ProposalId::new("prop-1"),
            &CircuitId::new("cir-a"),
            &LocationId::new("loc-hq"),
        )
        .unwrap();
        assert_eq!(outcome.record.circuit_id, CircuitId::new("cir-a"));

        // re-fetch lands the confirmed state in the store
        store.merge_proposal(service.get_proposal(&ProposalId::new("prop-1")).unwrap());

        // pre-check against the snapshot catches the duplicate
        let err = add_assignment(
            &mut service,
            &store,
            &mut cache,
            &ProposalId::new("prop-1"),
            &CircuitId::new("cir-a"),
            &LocationId::new("loc-hq"),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Conflict { .. }));
    }

    #[test]
    fn test_server_duplicate_maps_to_conflict() {
        let mut service = service_with_hq();
        let store = EntityStore::new();
        let mut cache = QueryCache::new();

        add_assignment(
            &mut service,
            &store,
            &mut cache,
            &ProposalId::new("prop-1"),
            &CircuitId::new("cir-a"),
            &LocationId::new("loc-hq"),
        )
        .unwrap();

        // the store snapshot was never refreshed, so the pre-check passes
        // and the duplicate is only caught server-side
        let err = add_assignment(
            &mut service,
            &store,
            &mut cache,
            &ProposalId::new("prop-1"),
            &CircuitId::new("cir-a"),
            &LocationId::new("loc-hq"),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Conflict { .. }));
    }

    #[test]
    fn test_mismatched_location_is_rejected() {
        let mut service = service_with_hq();
        let mut store = EntityStore::new();
        let mut cache = QueryCache::new();
        store.merge_circuits(None, service.list_circuits(None).unwrap());

        let err = add_assignment(
            &mut service,
            &store,
            &mut cache,
            &ProposalId::new("prop-1"),
            &CircuitId::new("cir-a"),
            &LocationId::new("loc-elsewhere"),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::LocationMismatch { .. }));
    }

    #[test]
    fn test_invalidation_is_scoped() {
        let mut service = service_with_hq();
        let mut store = EntityStore::new();
        let mut cache = QueryCache::new();

        // warm three entries: the affected proposal, the affected location's
        // circuit list, and an unrelated location's circuit list
        let proposal_key = QueryKey::Proposal(ProposalId::new("prop-1"));
        let hq_key = QueryKey::circuits(Some(LocationId::new("loc-hq")));
        let other_key = QueryKey::circuits(Some(LocationId::new("loc-other")));

        let ticket = cache.begin_fetch(&proposal_key).unwrap();
        cache
            .complete(
                &mut store,
                ticket,
                crate::core::cache::FetchPayload::Proposal(
                    service.get_proposal(&ProposalId::new("prop-1")).unwrap(),
                ),
            )
            .unwrap();
        for key in [&hq_key, &other_key] {
            let ticket = cache.begin_fetch(key).unwrap();
            cache
                .complete(
                    &mut store,
                    ticket,
                    crate::core::cache::FetchPayload::Circuits(vec![]),
                )
                .unwrap();
        }

        add_assignment(
            &mut service,
            &store,
            &mut cache,
            &ProposalId::new("prop-1"),
            &CircuitId::new("cir-a"),
            &LocationId::new("loc-hq"),
        )
        .unwrap();

        assert_eq!(cache.status(&proposal_key).freshness, Freshness::Stale);
        assert_eq!(cache.status(&hq_key).freshness, Freshness::Stale);
        // the unrelated list keeps serving its cached result
        assert_eq!(cache.status(&other_key).freshness, Freshness::Fresh);
    }

    #[test]
    fn test_remove_unknown_assignment_is_not_found() {
        let mut service = service_with_hq();
        let store = EntityStore::new();
        let mut cache = QueryCache::new();

        let err = remove_assignment(
            &mut service,
            &store,
            &mut cache,
            &AssignmentId::new("pc-ghost"),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }
}
