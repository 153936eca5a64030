//! Collaborator interfaces consumed by the displacement core.
//!
//! The core reads the board and actor positions through [`GridQuery`], hands
//! winning paths to a [`MovementExecutor`] and reports wall-crash penalties to
//! a [`DamageSink`]. It never owns actors; every query resolves an
//! [`ActorId`] afresh.
//!
//! # Read/Write Split
//!
//! The Plan phase only needs `&impl GridQuery`, which is `Sync`, so a batch can
//! be planned in parallel. Execution and damage require `&mut`, and only happen
//! in the sequential phases of the pipeline.
//!
//! [`World`](crate::world::World) implements all three traits and is the
//! reference collaborator used by tests and the scenario runner.

use glam::Vec3;
use gridmap::GridCoord;

use crate::actor::ActorId;

/// Occupancy and geometry provider.
pub trait GridQuery: Sync {
    /// True if `cell` lies inside the board.
    fn is_cell_valid(&self, cell: GridCoord) -> bool;

    /// True if the static terrain at `cell` can be stood on.
    fn is_cell_walkable(&self, cell: GridCoord) -> bool;

    /// Actor currently occupying `cell`, if any.
    fn actor_at(&self, cell: GridCoord) -> Option<ActorId>;

    /// Cell the actor currently occupies, or `None` for an unknown actor.
    fn current_cell(&self, actor: ActorId) -> Option<GridCoord>;

    /// World-space center of `cell`.
    fn cell_to_world(&self, cell: GridCoord) -> Vec3;

    /// Cell containing a world-space position.
    fn world_to_cell(&self, position: Vec3) -> GridCoord;

    /// In bounds, walkable, and free of every actor except `ignore`.
    fn is_cell_passable(&self, cell: GridCoord, ignore: Option<ActorId>) -> bool {
        if !self.is_cell_valid(cell) || !self.is_cell_walkable(cell) {
            return false;
        }
        match self.actor_at(cell) {
            Some(occupant) => Some(occupant) == ignore,
            None => true,
        }
    }
}

/// Animates actors along winning paths.
///
/// The core does not wait for completion or poll the result.
pub trait MovementExecutor {
    /// Starts moving `actor` along `path` over `duration` seconds.
    fn execute_path(&mut self, actor: ActorId, path: &[GridCoord], duration: f32);

    /// True while `actor` is still animating.
    fn is_moving(&self, actor: ActorId) -> bool;
}

/// Receives wall-crash damage.
pub trait DamageSink {
    /// Applies `amount` of damage to `actor`.
    fn apply_damage(&mut self, actor: ActorId, amount: f32);
}

/// Everything the pipeline needs from the game world.
pub trait DisplacementWorld: GridQuery + MovementExecutor + DamageSink {}

impl<T: GridQuery + MovementExecutor + DamageSink> DisplacementWorld for T {}
