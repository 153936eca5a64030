//! Path planner for straight-line, axis-aligned displacement.
//!
//! Every function here is pure with respect to game state: the board and actor
//! positions are read through a [`GridQuery`] and nothing is written. A
//! planner call returns a [`PathPlanResult`] status value and never fails.
//!
//! # Step Checks
//!
//! Each step towards the next cell is checked in a fixed order:
//!
//! 1. Bounds ([`GridQuery::is_cell_valid`])
//! 2. Static terrain ([`GridQuery::is_cell_walkable`])
//! 3. Occupancy ([`GridQuery::actor_at`], excluding the `ignore` actor)
//!
//! The first failing check names the [`BlockReason`].
//!
//! # Example
//!
//! ```
//! use gridmap::{GridCoord, GridMap};
//! use gridtactics_core::planner::plan_knockback;
//! use gridtactics_core::request::BlockReason;
//! use gridtactics_core::world::World;
//!
//! let world = World::new(GridMap::open(3, 1));
//! let result = plan_knockback(&world, GridCoord::new(0, 0), GridCoord::EAST, 5, None);
//!
//! // Partial knockback is still a success.
//! assert!(result.valid);
//! assert_eq!(result.path.len(), 3);
//! assert_eq!(result.block_reason, BlockReason::OutOfBounds);
//! ```

use gridmap::GridCoord;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::actor::ActorId;
use crate::query::GridQuery;
use crate::request::{
    BlockReason, CollisionInfo, DisplacementFlags, DisplacementKind, DisplacementRequest,
};

/// Output of one planner call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathPlanResult {
    /// True if at least one step was taken (or the teleport target is free)
    pub valid: bool,
    /// Cells walked, starting with the start cell; empty for degenerate input
    pub path: Vec<GridCoord>,
    /// Cell that stopped the walk
    pub blocked_at: Option<GridCoord>,
    /// Why the walk stopped
    pub block_reason: BlockReason,
    /// Actors struck, in walk order
    pub collisions: Vec<CollisionInfo>,
}

impl PathPlanResult {
    /// Invalid result with an empty path.
    #[must_use]
    pub fn rejected(reason: BlockReason) -> Self {
        Self {
            valid: false,
            path: Vec::new(),
            blocked_at: None,
            block_reason: reason,
            collisions: Vec::new(),
        }
    }

    /// Number of steps the path advances.
    #[must_use]
    pub fn steps_taken(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    fn block(&mut self, cell: GridCoord, reason: BlockReason) {
        self.blocked_at = Some(cell);
        self.block_reason = reason;
    }

    fn finish(mut self) -> Self {
        self.valid = self.path.len() > 1;
        self
    }
}

/// Classifies `cell` as a static obstruction, or `None` if terrain allows it.
fn static_obstruction(grid: &impl GridQuery, cell: GridCoord) -> Option<BlockReason> {
    if !grid.is_cell_valid(cell) {
        Some(BlockReason::OutOfBounds)
    } else if !grid.is_cell_walkable(cell) {
        Some(BlockReason::StaticObstacle)
    } else {
        None
    }
}

fn occupant(grid: &impl GridQuery, cell: GridCoord, ignore: Option<ActorId>) -> Option<ActorId> {
    grid.actor_at(cell).filter(|actor| Some(*actor) != ignore)
}

/// Plans a dash (or push) of up to `max_distance` cells along `direction`.
///
/// Flags:
///
/// - Without [`DisplacementFlags::CAN_COLLIDE`], an occupied cell blocks like
///   a wall.
/// - With it, the struck actor is recorded and a knockback of
///   `knockback_distance` from its cell is pre-validated. Under
///   [`DisplacementFlags::STOP_ON_COLLISION`] the dash enters the struck cell
///   only if that knockback is achievable, then stops. Otherwise the dash
///   passes through and keeps scanning.
///
/// A pass-through walk never ends on an occupied cell whose actor cannot be
/// knocked out of it; such trailing cells are trimmed.
#[must_use]
pub fn plan_dash(
    grid: &impl GridQuery,
    start: GridCoord,
    direction: GridCoord,
    max_distance: i32,
    flags: DisplacementFlags,
    knockback_distance: i32,
    ignore: Option<ActorId>,
) -> PathPlanResult {
    if max_distance <= 0 || !direction.is_axis_unit() {
        return PathPlanResult::rejected(BlockReason::InvalidPath);
    }

    let can_collide = flags.contains(DisplacementFlags::CAN_COLLIDE);
    let stop_on_collision = flags.contains(DisplacementFlags::STOP_ON_COLLISION);

    let mut result = PathPlanResult {
        path: vec![start],
        ..PathPlanResult::default()
    };
    // Cells entered while passing through an actor that cannot be pushed out.
    let mut stuck_cells: Vec<GridCoord> = Vec::new();
    let mut current = start;

    for step in 1..=max_distance.unsigned_abs() {
        let next = current + direction;

        if let Some(reason) = static_obstruction(grid, next) {
            trace!(%start, %next, step, ?reason, "dash blocked by terrain");
            result.block(next, reason);
            break;
        }

        if let Some(hit) = occupant(grid, next, ignore) {
            if !can_collide {
                trace!(%start, %next, step, %hit, "dash blocked by actor");
                result.block(next, BlockReason::AnotherActor);
                break;
            }

            let knockback_ok =
                plan_knockback(grid, next, direction, knockback_distance, Some(hit)).valid;
            result.collisions.push(CollisionInfo {
                hit_actor: hit,
                cell: next,
                step,
                continued_after: !stop_on_collision,
            });
            trace!(%start, %next, step, %hit, knockback_ok, "dash struck actor");

            if stop_on_collision {
                if knockback_ok {
                    result.path.push(next);
                }
                result.block(next, BlockReason::AnotherActor);
                break;
            }
            if !knockback_ok {
                stuck_cells.push(next);
            }
        }

        result.path.push(next);
        current = next;
    }

    while result.path.len() > 1
        && result
            .path
            .last()
            .is_some_and(|last| stuck_cells.contains(last))
    {
        result.path.pop();
    }

    result.finish()
}

/// Plans a knockback of up to `distance` cells along `direction`.
///
/// Any obstruction ends the walk at the last good cell. A struck actor is
/// recorded as a collision so chain reactions can find it. The result is
/// valid if at least one step was taken.
#[must_use]
pub fn plan_knockback(
    grid: &impl GridQuery,
    start: GridCoord,
    direction: GridCoord,
    distance: i32,
    ignore: Option<ActorId>,
) -> PathPlanResult {
    if distance <= 0 || !direction.is_axis_unit() {
        return PathPlanResult::rejected(BlockReason::InvalidPath);
    }

    let mut result = PathPlanResult {
        path: vec![start],
        ..PathPlanResult::default()
    };
    let mut current = start;

    for step in 1..=distance.unsigned_abs() {
        let next = current + direction;

        if let Some(reason) = static_obstruction(grid, next) {
            trace!(%start, %next, step, ?reason, "knockback blocked by terrain");
            result.block(next, reason);
            break;
        }
        if let Some(hit) = occupant(grid, next, ignore) {
            trace!(%start, %next, step, %hit, "knockback blocked by actor");
            result.collisions.push(CollisionInfo {
                hit_actor: hit,
                cell: next,
                step,
                continued_after: false,
            });
            result.block(next, BlockReason::AnotherActor);
            break;
        }

        result.path.push(next);
        current = next;
    }

    result.finish()
}

/// Plans a teleport, checking only the destination cell.
#[must_use]
pub fn plan_teleport(
    grid: &impl GridQuery,
    start: GridCoord,
    target: GridCoord,
    ignore: Option<ActorId>,
) -> PathPlanResult {
    if target == start {
        return PathPlanResult::rejected(BlockReason::InvalidPath);
    }

    let mut result = PathPlanResult {
        path: vec![start],
        ..PathPlanResult::default()
    };

    if let Some(reason) = static_obstruction(grid, target) {
        result.block(target, reason);
    } else if let Some(hit) = occupant(grid, target, ignore) {
        trace!(%start, %target, %hit, "teleport target occupied");
        result.block(target, BlockReason::AnotherActor);
    } else {
        result.path.push(target);
    }

    result.finish()
}

/// Dispatches a request to the planner for its kind.
///
/// The requester is always ignored by occupancy checks.
#[must_use]
pub fn plan_request(grid: &impl GridQuery, request: &DisplacementRequest) -> PathPlanResult {
    let ignore = Some(request.requester);
    match request.kind {
        DisplacementKind::Dash | DisplacementKind::Push => plan_dash(
            grid,
            request.start,
            request.direction,
            request.max_distance,
            request.flags,
            request.knockback_distance_on_hit,
            ignore,
        ),
        DisplacementKind::Knockback => plan_knockback(
            grid,
            request.start,
            request.direction,
            request.max_distance,
            ignore,
        ),
        DisplacementKind::Teleport => match request.target {
            Some(target) => plan_teleport(grid, request.start, target, ignore),
            None => PathPlanResult::rejected(BlockReason::InvalidPath),
        },
    }
}

/// Re-checks an already planned path against the current board.
///
/// A path needs at least two cells and every cell must be passable.
#[must_use]
pub fn validate_path(grid: &impl GridQuery, path: &[GridCoord], ignore: Option<ActorId>) -> bool {
    path.len() >= 2 && path.iter().all(|&cell| grid.is_cell_passable(cell, ignore))
}

/// True if `cell` is in bounds, walkable and free of actors other than `ignore`.
#[must_use]
pub fn is_grid_passable(grid: &impl GridQuery, cell: GridCoord, ignore: Option<ActorId>) -> bool {
    grid.is_cell_passable(cell, ignore)
}
