//! Engine façade wiring filters, cache, store, and service together
//!
//! One logical thread of control: a consumer asks for a view, the engine
//! consults the cache, issues any missing fetches against the data service,
//! merges results into the store, and derives the view with the pure
//! aggregation functions. Mutations run through the coordinator and the
//! observed keys its invalidation returns are re-fetched before the call
//! returns, so the next read already sees consistent aggregates.

use std::thread;

use tracing::{debug, warn};

use crate::core::aggregate::{
    location_rollups, proposal_totals, DashboardStats, LocationRollup, ProposalTotals,
};
use crate::core::cache::{FetchPayload, Freshness, QueryCache, QueryData, QueryKey};
use crate::core::config::EngineConfig;
use crate::core::error::EngineError;
use crate::core::filters::{FilterCascade, FilterOption};
use crate::core::identity::{AssignmentId, CircuitId, LocationId, ProposalId};
use crate::core::mutation;
use crate::core::store::EntityStore;
use crate::entities::ProposalCircuit;
use crate::service::DataService;

/// The synchronization engine
pub struct SyncEngine<S: DataService> {
    service: S,
    store: EntityStore,
    cache: QueryCache,
    filters: FilterCascade,
    config: EngineConfig,
}

impl<S: DataService> SyncEngine<S> {
    pub fn new(service: S) -> Self {
        Self::with_config(service, EngineConfig::default())
    }

    pub fn with_config(service: S, config: EngineConfig) -> Self {
        Self {
            service,
            store: EntityStore::new(),
            cache: QueryCache::new(),
            filters: FilterCascade::new(),
            config,
        }
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn filters(&self) -> &FilterCascade {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterCascade {
        &mut self.filters
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Direct access to the backing service, e.g. to model writes from
    /// other clients in tests
    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    /// Make `key` usable: serve the cached result if fresh, share an
    /// in-flight fetch, or issue the service call and merge the result.
    /// Marks the key observed so later invalidations schedule a re-fetch.
    pub fn ensure(&mut self, key: &QueryKey) -> Result<(), EngineError> {
        self.cache.observe(key);
        let status = self.cache.status(key);
        if status.freshness == Freshness::Fresh || status.in_flight {
            return Ok(());
        }
        let Some(ticket) = self.cache.begin_fetch(key) else {
            return Ok(());
        };
        match self.fetch_with_retry(key) {
            Ok(payload) => match self.cache.complete(&mut self.store, ticket, payload) {
                Ok(()) => Ok(()),
                // superseded mid-flight; the re-fetch scheduled by the
                // invalidation will bring the fresh result
                Err(EngineError::StaleRead(superseded)) => {
                    debug!(key = %superseded, "completion superseded");
                    Ok(())
                }
                Err(err) => Err(err),
            },
            Err(err) => {
                self.cache.fail(&ticket);
                Err(err)
            }
        }
    }

    /// Dispatch the service call for `key`, retrying transient failures per
    /// the configured backoff. Only `ServiceUnavailable` is retried.
    fn fetch_with_retry(&self, key: &QueryKey) -> Result<FetchPayload, EngineError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.dispatch(key) {
                Err(EngineError::ServiceUnavailable(message))
                    if attempt < self.config.retry.max_attempts =>
                {
                    let delay = self.config.retry.delay_for(attempt);
                    warn!(%key, attempt, ?delay, error = %message, "transient fetch failure, retrying");
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                }
                other => return other,
            }
        }
    }

    fn dispatch(&self, key: &QueryKey) -> Result<FetchPayload, EngineError> {
        Ok(match key {
            QueryKey::Companies => FetchPayload::Companies(self.service.list_companies()?),
            QueryKey::Locations => FetchPayload::Locations(self.service.list_locations()?),
            QueryKey::Circuits { location } => {
                FetchPayload::Circuits(self.service.list_circuits(location.as_ref())?)
            }
            QueryKey::Proposal(id) => FetchPayload::Proposal(self.service.get_proposal(id)?),
            QueryKey::Dashboard { company, location } => FetchPayload::Dashboard(
                self.service
                    .dashboard_stats(company.as_ref(), location.as_ref())?,
            ),
        })
    }

    /// Per-location rollups for `proposal` across the current filter scope.
    ///
    /// A failed circuit fetch for one location never blocks the others:
    /// that location renders zero-filled until a later re-fetch succeeds.
    pub fn proposal_view(
        &mut self,
        proposal: &ProposalId,
    ) -> Result<Vec<LocationRollup>, EngineError> {
        self.ensure(&QueryKey::Locations)?;
        self.ensure(&QueryKey::Proposal(proposal.clone()))?;

        let locations = self.filters.scope_locations(&self.store);
        for location in &locations {
            if let Err(err) = self.ensure(&QueryKey::circuits(Some(location.clone()))) {
                warn!(
                    location = %location,
                    error = %err,
                    "circuit fetch failed, rendering zeros until retry"
                );
            }
        }
        Ok(location_rollups(&self.store, proposal, &locations))
    }

    /// Proposal-wide totals over the current filter scope
    pub fn proposal_summary(&mut self, proposal: &ProposalId) -> Result<ProposalTotals, EngineError> {
        let rollups = self.proposal_view(proposal)?;
        Ok(proposal_totals(&rollups))
    }

    /// Dashboard counters for the current filter selection
    pub fn dashboard(&mut self) -> Result<DashboardStats, EngineError> {
        let key = QueryKey::dashboard(
            self.filters.company().cloned(),
            self.filters.location().cloned(),
        );
        self.ensure(&key)?;
        match self.cache.data(&key) {
            Some(QueryData::Dashboard(stats)) => Ok(stats.clone()),
            _ => Ok(DashboardStats::default()),
        }
    }

    /// Company filter options (never filtered by location)
    pub fn company_options(&mut self) -> Result<Vec<FilterOption>, EngineError> {
        self.ensure(&QueryKey::Companies)?;
        Ok(self.filters.company_options(&self.store))
    }

    /// Location filter options restricted by the company filter
    pub fn location_options(&mut self) -> Result<Vec<FilterOption>, EngineError> {
        self.ensure(&QueryKey::Companies)?;
        self.ensure(&QueryKey::Locations)?;
        Ok(self.filters.location_options(&self.store))
    }

    /// Assign a circuit to a proposal, then re-fetch the views the mutation
    /// invalidated so aggregates are consistent on return.
    pub fn add_circuit_to_proposal(
        &mut self,
        proposal_id: &ProposalId,
        circuit_id: &CircuitId,
        location_id: &LocationId,
    ) -> Result<ProposalCircuit, EngineError> {
        let outcome = mutation::add_assignment(
            &mut self.service,
            &self.store,
            &mut self.cache,
            proposal_id,
            circuit_id,
            location_id,
        )?;
        self.refetch(outcome.refetch)?;
        Ok(outcome.record)
    }

    /// Remove an assignment, then re-fetch the invalidated views
    pub fn remove_circuit_from_proposal(
        &mut self,
        assignment_id: &AssignmentId,
    ) -> Result<(), EngineError> {
        let refetch = mutation::remove_assignment(
            &mut self.service,
            &self.store,
            &mut self.cache,
            assignment_id,
        )?;
        self.refetch(refetch)
    }

    fn refetch(&mut self, keys: Vec<QueryKey>) -> Result<(), EngineError> {
        for key in keys {
            self.ensure(&key)?;
        }
        Ok(())
    }
}
