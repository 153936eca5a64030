//! Conflict resolver for planned displacement batches.
//!
//! The resolver runs after every request in a batch has been planned. It is
//! pure: it only reads and rewrites the batch it is given.
//!
//! # Passes
//!
//! 1. [`detect_end_point_conflicts`] groups requests by destination
//! 2. [`resolve_single_conflict`] keeps the highest-priority member of a group
//!    and cancels the rest
//! 3. [`generate_knockback_requests`] turns recorded collisions into Forced
//!    knockbacks for the struck actors
//!
//! # Invariants
//!
//! - Resolving never removes a request, it only marks losers Cancelled
//! - Ties are broken by batch order: the lowest index wins
//! - Detection order is by destination cell, so the pass is deterministic
//!
//! # Example
//!
//! ```
//! use gridmap::{GridCoord, GridMap};
//! use gridtactics_core::planner::plan_request;
//! use gridtactics_core::request::{DisplacementPriority, DisplacementRequest, ExecutionResult};
//! use gridtactics_core::resolver::resolve_all_conflicts;
//! use gridtactics_core::world::World;
//!
//! let mut world = World::new(GridMap::open(5, 5));
//! let a = world.spawn(GridCoord::new(0, 0)).unwrap();
//! let b = world.spawn(GridCoord::new(4, 4)).unwrap();
//! let target = GridCoord::new(2, 2);
//!
//! let mut batch = vec![
//!     DisplacementRequest::teleport(b, GridCoord::new(4, 4), target)
//!         .with_priority(DisplacementPriority::Passive),
//!     DisplacementRequest::teleport(a, GridCoord::new(0, 0), target),
//! ];
//! for request in &mut batch {
//!     let plan = plan_request(&world, request);
//!     request.apply_plan(plan);
//! }
//!
//! let conflicts = resolve_all_conflicts(&mut batch);
//! assert_eq!(conflicts.len(), 1);
//! assert_eq!(batch[0].execution_result, ExecutionResult::Cancelled);
//! assert_eq!(batch[1].actual_end, target);
//! ```

mod conflict;
mod knockback;

pub use conflict::{detect_end_point_conflicts, resolve_single_conflict};
pub use knockback::{generate_chain_knockbacks, generate_knockback_requests};

use gridmap::GridCoord;
use serde::{Deserialize, Serialize};

use crate::request::DisplacementRequest;

/// Kind of conflict between requests in one batch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConflictKind {
    /// Two or more requests end on the same cell
    SameDestination,
}

/// A group of requests competing for one cell.
///
/// Computed once per resolve pass and never stored on the requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// What the requests are competing over
    pub kind: ConflictKind,
    /// The contested cell
    pub cell: GridCoord,
    /// Batch indices of the involved requests, ascending
    pub involved: Vec<usize>,
}

/// Detects and resolves every destination conflict in `requests`.
///
/// Returns the conflicts that were resolved, in detection order.
pub fn resolve_all_conflicts(requests: &mut [DisplacementRequest]) -> Vec<Conflict> {
    let conflicts = detect_end_point_conflicts(requests);
    for conflict in &conflicts {
        resolve_single_conflict(requests, conflict);
    }
    conflicts
}
