//! Crate-level tests of the full displacement pipeline.
//!
//! - `integration.rs`: end-to-end scenarios against the reference [`World`]
//! - `determinism.rs`: repeated runs give identical results
//! - `properties.rs`: property-based checks of planner and resolver invariants
//! - `helpers.rs`: board and actor setup utilities
//!
//! [`World`]: crate::world::World

mod helpers;
mod properties;

pub use helpers::*;
