//! Explicit query cache with canonical keys and versioned invalidation
//!
//! Every fetchable view has one canonical [`QueryKey`]; semantically
//! identical filters (an empty-string location vs. no location at all)
//! collapse to the same key, so identical requests share one cache entry and
//! one in-flight fetch. Entries carry a version that invalidation bumps: a
//! completion whose ticket was issued at an older version is discarded
//! instead of overwriting fresher state. Nothing expires implicitly - only
//! explicit invalidation marks entries stale.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::core::aggregate::DashboardStats;
use crate::core::error::EngineError;
use crate::core::identity::{CompanyId, LocationId, ProposalId};
use crate::core::store::EntityStore;
use crate::entities::{Circuit, Company, Location, Proposal, Resource};

/// Canonical cache key: resource kind plus normalized filter fields
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Companies,
    Locations,
    Circuits { location: Option<LocationId> },
    Proposal(ProposalId),
    Dashboard {
        company: Option<CompanyId>,
        location: Option<LocationId>,
    },
}

impl QueryKey {
    /// Canonical circuit-list key. An empty-string filter value means "all"
    /// and collapses to the unfiltered key.
    pub fn circuits(location: Option<LocationId>) -> Self {
        QueryKey::Circuits {
            location: location.filter(|l| !l.as_str().is_empty()),
        }
    }

    /// Canonical dashboard key with the same empty-string normalization
    pub fn dashboard(company: Option<CompanyId>, location: Option<LocationId>) -> Self {
        QueryKey::Dashboard {
            company: company.filter(|c| !c.as_str().is_empty()),
            location: location.filter(|l| !l.as_str().is_empty()),
        }
    }

    /// Whether this key is a circuit-list query whose scope covers circuits
    /// at `location` (the location-scoped list or the unscoped list).
    pub fn covers_location(&self, location: &LocationId) -> bool {
        match self {
            QueryKey::Circuits { location: None } => true,
            QueryKey::Circuits {
                location: Some(scoped),
            } => scoped == location,
            _ => false,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Companies => write!(f, "companies"),
            QueryKey::Locations => write!(f, "locations"),
            QueryKey::Circuits { location: None } => write!(f, "circuits"),
            QueryKey::Circuits {
                location: Some(loc),
            } => write!(f, "circuits?location={}", loc),
            QueryKey::Proposal(id) => write!(f, "proposal/{}", id),
            QueryKey::Dashboard { company, location } => {
                write!(f, "dashboard")?;
                if let Some(c) = company {
                    write!(f, "?company={}", c)?;
                }
                if let Some(l) = location {
                    write!(f, "{}location={}", if company.is_some() { "&" } else { "?" }, l)?;
                }
                Ok(())
            }
        }
    }
}

/// Freshness of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
    Missing,
}

/// Fetch result handed to [`QueryCache::complete`]
#[derive(Debug)]
pub enum FetchPayload {
    Companies(Vec<Company>),
    Locations(Vec<Location>),
    Circuits(Vec<Circuit>),
    Proposal(Proposal),
    Dashboard(DashboardStats),
}

/// Data recorded on a completed entry. Entity payloads are normalized into
/// the store; the entry keeps the result row ids. Dashboard results are
/// scalar and kept inline.
#[derive(Debug, Clone)]
pub enum QueryData {
    Ids(Vec<String>),
    Dashboard(DashboardStats),
}

/// Permission to run one fetch for a key, pinned to the entry version the
/// fetch started at.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    key: QueryKey,
    version: u64,
}

impl FetchTicket {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

/// Snapshot of an entry's state as seen by a consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStatus {
    pub freshness: Freshness,
    pub in_flight: bool,
    pub fetched_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct Entry {
    version: u64,
    freshness: Freshness,
    /// Version the in-flight fetch was ticketed at, if one is running
    in_flight: Option<u64>,
    data: Option<QueryData>,
    fetched_at: Option<DateTime<Utc>>,
    observed: bool,
}

impl Entry {
    fn new() -> Self {
        Self {
            version: 0,
            freshness: Freshness::Missing,
            in_flight: None,
            data: None,
            fetched_at: None,
            observed: false,
        }
    }
}

/// The query cache
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, Entry>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status for a key. Unknown keys read as missing.
    pub fn status(&self, key: &QueryKey) -> CacheStatus {
        match self.entries.get(key) {
            Some(entry) => CacheStatus {
                freshness: entry.freshness,
                in_flight: entry.in_flight.is_some(),
                fetched_at: entry.fetched_at,
            },
            None => CacheStatus {
                freshness: Freshness::Missing,
                in_flight: false,
                fetched_at: None,
            },
        }
    }

    /// Last completed data for a key, fresh or stale
    pub fn data(&self, key: &QueryKey) -> Option<&QueryData> {
        self.entries.get(key).and_then(|e| e.data.as_ref())
    }

    /// Mark a key as observed: invalidating it will schedule a re-fetch
    pub fn observe(&mut self, key: &QueryKey) {
        self.entries
            .entry(key.clone())
            .or_insert_with(Entry::new)
            .observed = true;
    }

    /// Drop the observation mark for a key
    pub fn release(&mut self, key: &QueryKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.observed = false;
        }
    }

    /// Begin a fetch for `key`. Returns `None` when a fetch is already in
    /// flight - concurrent identical requests share that one fetch instead
    /// of issuing duplicates.
    pub fn begin_fetch(&mut self, key: &QueryKey) -> Option<FetchTicket> {
        let entry = self.entries.entry(key.clone()).or_insert_with(Entry::new);
        if entry.in_flight.is_some() {
            debug!(%key, "fetch already in flight, sharing");
            return None;
        }
        entry.in_flight = Some(entry.version);
        Some(FetchTicket {
            key: key.clone(),
            version: entry.version,
        })
    }

    /// Apply a completed fetch: merge the payload into the store, record the
    /// result on the entry, mark it fresh.
    ///
    /// If the entry was invalidated after the ticket was issued, the result
    /// is out of date and is discarded as a [`EngineError::StaleRead`] - the
    /// caller logs it and moves on; it is never surfaced to a user.
    pub fn complete(
        &mut self,
        store: &mut EntityStore,
        ticket: FetchTicket,
        payload: FetchPayload,
    ) -> Result<(), EngineError> {
        let entry = self
            .entries
            .entry(ticket.key.clone())
            .or_insert_with(Entry::new);
        if entry.in_flight == Some(ticket.version) {
            entry.in_flight = None;
        }
        if entry.version != ticket.version {
            debug!(key = %ticket.key, "discarding stale completion");
            return Err(EngineError::StaleRead(ticket.key.to_string()));
        }

        let data = match (&ticket.key, payload) {
            (QueryKey::Companies, FetchPayload::Companies(records)) => {
                let ids = records.iter().map(|r| r.id().to_string()).collect();
                store.merge_companies(records);
                QueryData::Ids(ids)
            }
            (QueryKey::Locations, FetchPayload::Locations(records)) => {
                let ids = records.iter().map(|r| r.id().to_string()).collect();
                store.merge_locations(records);
                QueryData::Ids(ids)
            }
            (QueryKey::Circuits { location }, FetchPayload::Circuits(records)) => {
                let ids = records.iter().map(|r| r.id().to_string()).collect();
                store.merge_circuits(location.as_ref(), records);
                QueryData::Ids(ids)
            }
            (QueryKey::Proposal(_), FetchPayload::Proposal(proposal)) => {
                let id = proposal.id.to_string();
                store.merge_proposal(proposal);
                QueryData::Ids(vec![id])
            }
            (QueryKey::Dashboard { .. }, FetchPayload::Dashboard(stats)) => {
                QueryData::Dashboard(stats)
            }
            (key, _) => {
                warn!(%key, "completion payload does not match key, dropped");
                return Err(EngineError::StaleRead(key.to_string()));
            }
        };

        entry.data = Some(data);
        entry.freshness = Freshness::Fresh;
        entry.fetched_at = Some(Utc::now());
        debug!(key = %ticket.key, "fetch completed");
        Ok(())
    }

    /// Record a failed fetch: clears the in-flight marker, leaves any prior
    /// data untouched so consumers keep rendering the last good result.
    pub fn fail(&mut self, ticket: &FetchTicket) {
        if let Some(entry) = self.entries.get_mut(&ticket.key) {
            if entry.in_flight == Some(ticket.version) {
                entry.in_flight = None;
            }
        }
    }

    /// Mark entries matching `predicate` stale and bump their versions so
    /// any in-flight completions for them are discarded. Returns the
    /// observed keys so the caller can schedule re-fetches.
    pub fn invalidate<F>(&mut self, predicate: F) -> Vec<QueryKey>
    where
        F: Fn(&QueryKey) -> bool,
    {
        let mut refetch = Vec::new();
        for (key, entry) in self.entries.iter_mut() {
            if !predicate(key) {
                continue;
            }
            entry.version += 1;
            if entry.freshness == Freshness::Fresh {
                entry.freshness = Freshness::Stale;
            }
            debug!(%key, version = entry.version, "invalidated");
            if entry.observed {
                refetch.push(key.clone());
            }
        }
        refetch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::CircuitId;
    use crate::entities::CircuitStatus;
    use rust_decimal::Decimal;

    fn circuit(id: &str, location: &str) -> Circuit {
        Circuit {
            id: CircuitId::new(id),
            location_id: LocationId::new(location),
            carrier: "Lumen".to_string(),
            kind: "MPLS".to_string(),
            bandwidth: "100M".to_string(),
            status: CircuitStatus::Active,
            monthly_cost: Decimal::new(100, 0),
        }
    }

    #[test]
    fn test_empty_filter_collapses_to_unfiltered_key() {
        let blank = QueryKey::circuits(Some(LocationId::new("")));
        let none = QueryKey::circuits(None);
        assert_eq!(blank, none);

        let dashboard = QueryKey::dashboard(Some(CompanyId::new("")), Some(LocationId::new("")));
        assert_eq!(dashboard, QueryKey::dashboard(None, None));
    }

    #[test]
    fn test_begin_fetch_dedupes_in_flight_requests() {
        let mut cache = QueryCache::new();
        let key = QueryKey::Companies;

        let first = cache.begin_fetch(&key);
        assert!(first.is_some());
        // identical request before the first resolves: shared, no new ticket
        assert!(cache.begin_fetch(&key).is_none());

        let mut store = EntityStore::new();
        cache
            .complete(&mut store, first.unwrap(), FetchPayload::Companies(vec![]))
            .unwrap();
        // resolved: a new fetch may start
        assert!(cache.begin_fetch(&key).is_some());
    }

    #[test]
    fn test_complete_merges_and_marks_fresh() {
        let mut cache = QueryCache::new();
        let mut store = EntityStore::new();
        let key = QueryKey::circuits(Some(LocationId::new("loc-hq")));

        let ticket = cache.begin_fetch(&key).unwrap();
        cache
            .complete(
                &mut store,
                ticket,
                FetchPayload::Circuits(vec![circuit("cir-a", "loc-hq")]),
            )
            .unwrap();

        assert_eq!(cache.status(&key).freshness, Freshness::Fresh);
        assert!(!cache.status(&key).in_flight);
        assert!(store.circuit(&CircuitId::new("cir-a")).is_some());
        match cache.data(&key) {
            Some(QueryData::Ids(ids)) => assert_eq!(ids, &["cir-a".to_string()]),
            other => panic!("unexpected data: {:?}", other),
        }
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let mut cache = QueryCache::new();
        let mut store = EntityStore::new();
        let key = QueryKey::circuits(Some(LocationId::new("loc-hq")));

        // version 1 fetch starts
        let old_ticket = cache.begin_fetch(&key).unwrap();
        // key invalidated (version 2) before the fetch resolves
        cache.invalidate(|k| k == &key);

        let result = cache.complete(
            &mut store,
            old_ticket,
            FetchPayload::Circuits(vec![circuit("cir-zombie", "loc-hq")]),
        );
        assert!(matches!(result, Err(EngineError::StaleRead(_))));
        // the superseded result touched neither cache nor store
        assert_eq!(cache.status(&key).freshness, Freshness::Missing);
        assert!(store.circuit(&CircuitId::new("cir-zombie")).is_none());

        // and the next fetch proceeds at the new version
        let fresh_ticket = cache.begin_fetch(&key).unwrap();
        cache
            .complete(
                &mut store,
                fresh_ticket,
                FetchPayload::Circuits(vec![circuit("cir-a", "loc-hq")]),
            )
            .unwrap();
        assert_eq!(cache.status(&key).freshness, Freshness::Fresh);
    }

    #[test]
    fn test_invalidate_returns_observed_keys_only() {
        let mut cache = QueryCache::new();
        let mut store = EntityStore::new();
        let watched = QueryKey::Proposal(ProposalId::new("prop-1"));
        let ignored = QueryKey::Proposal(ProposalId::new("prop-2"));

        for key in [&watched, &ignored] {
            let ticket = cache.begin_fetch(key).unwrap();
            let proposal = Proposal {
                id: match key {
                    QueryKey::Proposal(id) => id.clone(),
                    _ => unreachable!(),
                },
                company_id: CompanyId::new("cmp-1"),
                name: "p".to_string(),
                circuits: vec![],
            };
            cache
                .complete(&mut store, ticket, FetchPayload::Proposal(proposal))
                .unwrap();
        }
        cache.observe(&watched);

        let refetch = cache.invalidate(|k| matches!(k, QueryKey::Proposal(_)));
        assert_eq!(refetch, vec![watched.clone()]);
        assert_eq!(cache.status(&watched).freshness, Freshness::Stale);
        assert_eq!(cache.status(&ignored).freshness, Freshness::Stale);
    }

    #[test]
    fn test_fail_clears_in_flight_and_keeps_data() {
        let mut cache = QueryCache::new();
        let mut store = EntityStore::new();
        let key = QueryKey::Companies;

        let ticket = cache.begin_fetch(&key).unwrap();
        cache
            .complete(&mut store, ticket, FetchPayload::Companies(vec![]))
            .unwrap();

        cache.invalidate(|k| k == &key);
        let retry = cache.begin_fetch(&key).unwrap();
        cache.fail(&retry);

        let status = cache.status(&key);
        assert!(!status.in_flight);
        assert_eq!(status.freshness, Freshness::Stale);
        assert!(cache.data(&key).is_some());
    }

    #[test]
    fn test_covers_location() {
        let hq = LocationId::new("loc-hq");
        assert!(QueryKey::circuits(None).covers_location(&hq));
        assert!(QueryKey::circuits(Some(hq.clone())).covers_location(&hq));
        assert!(!QueryKey::circuits(Some(LocationId::new("loc-br"))).covers_location(&hq));
        assert!(!QueryKey::Companies.covers_location(&hq));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(QueryKey::Companies.to_string(), "companies");
        assert_eq!(
            QueryKey::circuits(Some(LocationId::new("loc-hq"))).to_string(),
            "circuits?location=loc-hq"
        );
        assert_eq!(
            QueryKey::dashboard(Some(CompanyId::new("cmp-1")), None).to_string(),
            "dashboard?company=cmp-1"
        );
    }
}
