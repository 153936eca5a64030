//! Reference in-memory world.
//!
//! [`World`] owns a [`GridMap`] and a set of actors and implements every
//! collaborator trait the displacement core consumes. Tests, benches and the
//! scenario runner drive the pipeline against it; a game embeds its own
//! collaborators instead.
//!
//! # Occupancy
//!
//! Actors are stored in a `BTreeMap` for deterministic iteration. A separate
//! cell→actor index answers [`GridQuery::actor_at`]. The index is updated the
//! moment a path is executed: the actor's logical cell jumps to the path end
//! while its world position is animated by [`World::advance`].
//!
//! # Example
//!
//! ```
//! use gridmap::{GridCoord, GridMap};
//! use gridtactics_core::query::{GridQuery, MovementExecutor};
//! use gridtactics_core::world::World;
//!
//! let mut world = World::new(GridMap::open(4, 4));
//! let hero = world.spawn(GridCoord::new(0, 0)).unwrap();
//!
//! world.execute_path(hero, &[GridCoord::new(0, 0), GridCoord::new(1, 0)], 0.5);
//! assert_eq!(world.current_cell(hero), Some(GridCoord::new(1, 0)));
//! assert!(world.is_moving(hero));
//!
//! world.advance(0.5);
//! assert!(!world.is_moving(hero));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

use glam::Vec3;
use gridmap::{hash_map_into, GridCoord, GridMap};
use tracing::{debug, warn};

use crate::actor::ActorId;
use crate::query::{DamageSink, GridQuery, MovementExecutor};

/// Hit points given to actors spawned without an explicit value.
pub const DEFAULT_ACTOR_HP: f32 = 100.0;

/// Timed movement along a path.
#[derive(Debug, Clone, PartialEq)]
struct Motion {
    waypoints: Vec<Vec3>,
    duration: f32,
    elapsed: f32,
}

impl Motion {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn sample(&self) -> Vec3 {
        let Some(&last) = self.waypoints.last() else {
            return Vec3::ZERO;
        };
        let segments = self.waypoints.len() - 1;
        if segments == 0 || self.duration <= 0.0 {
            return last;
        }
        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        let s = t * segments as f32;
        let index = (s.floor() as usize).min(segments - 1);
        let frac = s - index as f32;
        self.waypoints[index].lerp(self.waypoints[index + 1], frac)
    }

    fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// State of one actor on the board.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorState {
    /// Logical cell (authoritative for occupancy)
    pub cell: GridCoord,
    /// Rendered position in world units
    pub position: Vec3,
    /// Remaining hit points
    pub hp: f32,
    motion: Option<Motion>,
}

impl ActorState {
    /// True while a path animation is running.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.motion.is_some()
    }
}

/// In-memory board plus actors.
#[derive(Debug, Clone)]
pub struct World {
    map: GridMap,
    actors: BTreeMap<ActorId, ActorState>,
    occupancy: HashMap<GridCoord, ActorId>,
    next_id: u64,
}

impl World {
    /// Creates an empty world on `map`.
    #[must_use]
    pub fn new(map: GridMap) -> Self {
        Self {
            map,
            actors: BTreeMap::new(),
            occupancy: HashMap::new(),
            next_id: 1,
        }
    }

    /// The board.
    #[must_use]
    pub fn map(&self) -> &GridMap {
        &self.map
    }

    /// Mutable access to the board terrain.
    pub fn map_mut(&mut self) -> &mut GridMap {
        &mut self.map
    }

    /// Spawns an actor with default hit points on `cell`.
    ///
    /// Returns `None` if the cell is out of bounds, blocked or occupied.
    pub fn spawn(&mut self, cell: GridCoord) -> Option<ActorId> {
        let id = ActorId::new(self.next_id);
        self.spawn_with_id(id, cell, DEFAULT_ACTOR_HP)
    }

    /// Spawns an actor under a caller-chosen handle.
    ///
    /// Returns `None` if the handle is taken or the cell cannot be stood on.
    pub fn spawn_with_id(&mut self, id: ActorId, cell: GridCoord, hp: f32) -> Option<ActorId> {
        if self.actors.contains_key(&id) || !self.is_cell_passable(cell, None) {
            warn!(%id, %cell, "spawn rejected");
            return None;
        }
        let position = self.map.cell_to_world(cell);
        self.actors.insert(
            id,
            ActorState {
                cell,
                position,
                hp,
                motion: None,
            },
        );
        self.occupancy.insert(cell, id);
        self.next_id = self.next_id.max(id.as_u64() + 1);
        debug!(%id, %cell, hp, "actor spawned");
        Some(id)
    }

    /// Removes an actor, returning its final state.
    pub fn despawn(&mut self, id: ActorId) -> Option<ActorState> {
        let state = self.actors.remove(&id)?;
        if self.occupancy.get(&state.cell) == Some(&id) {
            self.occupancy.remove(&state.cell);
        }
        Some(state)
    }

    /// Looks up an actor.
    #[must_use]
    pub fn actor(&self, id: ActorId) -> Option<&ActorState> {
        self.actors.get(&id)
    }

    /// Remaining hit points of an actor.
    #[must_use]
    pub fn hp(&self, id: ActorId) -> Option<f32> {
        self.actors.get(&id).map(|a| a.hp)
    }

    /// Actor handles in ascending order.
    pub fn actor_ids(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.actors.keys().copied()
    }

    /// Number of actors on the board.
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Advances every running motion by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        for state in self.actors.values_mut() {
            let Some(motion) = state.motion.as_mut() else {
                continue;
            };
            motion.elapsed += dt;
            state.position = motion.sample();
            if motion.is_finished() {
                state.motion = None;
            }
        }
    }

    /// Cancels a running motion and snaps the actor onto its logical cell.
    pub fn stop_displacement(&mut self, id: ActorId) {
        let Some(state) = self.actors.get_mut(&id) else {
            return;
        };
        state.motion = None;
        state.position = self.map.cell_to_world(state.cell);
    }

    /// Deterministic hash of the board and every actor's cell and hit points.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        hash_map_into(&self.map, &mut hasher);
        for (id, state) in &self.actors {
            id.hash(&mut hasher);
            state.cell.hash(&mut hasher);
            state.hp.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }
}

impl GridQuery for World {
    fn is_cell_valid(&self, cell: GridCoord) -> bool {
        self.map.is_cell_valid(cell)
    }

    fn is_cell_walkable(&self, cell: GridCoord) -> bool {
        self.map.is_cell_walkable(cell)
    }

    fn actor_at(&self, cell: GridCoord) -> Option<ActorId> {
        self.occupancy.get(&cell).copied()
    }

    fn current_cell(&self, actor: ActorId) -> Option<GridCoord> {
        self.actors.get(&actor).map(|a| a.cell)
    }

    fn cell_to_world(&self, cell: GridCoord) -> Vec3 {
        self.map.cell_to_world(cell)
    }

    fn world_to_cell(&self, position: Vec3) -> GridCoord {
        self.map.world_to_cell(position)
    }
}

impl MovementExecutor for World {
    fn execute_path(&mut self, actor: ActorId, path: &[GridCoord], duration: f32) {
        let Some(&end) = path.last() else {
            return;
        };
        let waypoints: Vec<Vec3> = path.iter().map(|&c| self.map.cell_to_world(c)).collect();
        let Some(state) = self.actors.get_mut(&actor) else {
            warn!(%actor, "execute_path for unknown actor");
            return;
        };

        if self.occupancy.get(&state.cell) == Some(&actor) {
            self.occupancy.remove(&state.cell);
        }
        state.cell = end;
        self.occupancy.insert(end, actor);

        let motion = Motion {
            waypoints,
            duration,
            elapsed: 0.0,
        };
        if motion.is_finished() {
            state.position = motion.sample();
            state.motion = None;
        } else {
            state.motion = Some(motion);
        }
        debug!(%actor, %end, duration, "path executed");
    }

    fn is_moving(&self, actor: ActorId) -> bool {
        self.actors.get(&actor).is_some_and(ActorState::is_moving)
    }
}

impl DamageSink for World {
    fn apply_damage(&mut self, actor: ActorId, amount: f32) {
        if let Some(state) = self.actors.get_mut(&actor) {
            state.hp = (state.hp - amount).max(0.0);
            debug!(%actor, amount, hp = state.hp, "damage applied");
        }
    }
}
