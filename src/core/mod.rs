//! Core engine components

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod filters;
pub mod identity;
pub mod mutation;
pub mod store;

pub use aggregate::{
    dashboard_rollup, location_rollups, proposal_totals, DashboardStats, LocationRollup,
    ProposalTotals,
};
pub use cache::{CacheStatus, FetchPayload, FetchTicket, Freshness, QueryCache, QueryData, QueryKey};
pub use config::{EngineConfig, RetryConfig};
pub use engine::SyncEngine;
pub use error::EngineError;
pub use filters::{FilterCascade, FilterOption};
pub use identity::{
    AssignmentId, CircuitId, CompanyId, KindParseError, LocationId, ProposalId, ResourceKind,
};
pub use mutation::{add_assignment, remove_assignment, AddOutcome};
pub use store::EntityStore;
