//! Entity type definitions
//!
//! The engine synchronizes the following service-owned entity types:
//!
//! - [`Company`] - customer companies owning locations
//! - [`Location`] - physical sites with a criticality rating
//! - [`Circuit`] - network circuits terminated at a location, with carrier,
//!   bandwidth, and monthly cost
//! - [`Proposal`] - a company's circuit proposal with its assignment set
//! - [`ProposalCircuit`] - one proposal-circuit assignment with an embedded
//!   circuit snapshot for display

pub mod circuit;
pub mod company;
pub mod location;
pub mod proposal;

pub use circuit::{Circuit, CircuitStatus};
pub use company::Company;
pub use location::{Criticality, Location};
pub use proposal::{CircuitSnapshot, Proposal, ProposalCircuit, ProposalRecord};

use crate::core::identity::ResourceKind;

/// Common trait for service-owned records held in the entity store
pub trait Resource {
    /// The resource kind this record belongs to
    const KIND: ResourceKind;

    /// Typed id used as the store key
    type Id: Clone + Eq + std::hash::Hash;

    /// Get the record's unique id
    fn id(&self) -> &Self::Id;
}
