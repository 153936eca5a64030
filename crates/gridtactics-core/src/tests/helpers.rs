//! Board and actor setup utilities for pipeline tests.

use gridmap::{CellType, GridCoord, GridMap};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::actor::ActorId;
use crate::config::ManagerConfig;
use crate::manager::GridManager;
use crate::query::GridQuery;
use crate::world::World;

/// Shorthand for a grid coordinate.
pub fn cell(x: i32, y: i32) -> GridCoord {
    GridCoord::new(x, y)
}

/// An all-walkable world of the given size.
pub fn open_world(width: i32, height: i32) -> World {
    World::new(GridMap::open(width, height))
}

/// A world with the listed cells blocked.
pub fn walled_world(width: i32, height: i32, walls: &[GridCoord]) -> World {
    let mut map = GridMap::open(width, height);
    for &wall in walls {
        map.set_cell(wall, CellType::Blocked);
    }
    World::new(map)
}

/// Spawns one actor per cell, in order.
///
/// # Panics
///
/// Panics if a cell cannot be stood on.
pub fn spawn_all(world: &mut World, cells: &[GridCoord]) -> Vec<ActorId> {
    cells
        .iter()
        .map(|&c| world.spawn(c).expect("spawn cell must be free"))
        .collect()
}

/// A manager whose chain recursion is bounded at `depth`.
///
/// # Panics
///
/// Panics if the config is rejected.
pub fn manager_with_depth(depth: u32) -> GridManager {
    GridManager::with_config(ManagerConfig {
        max_recursion_depth: depth,
        ..ManagerConfig::default()
    })
    .expect("valid config")
}

/// Current cell of every listed actor.
pub fn cells_of(world: &World, actors: &[ActorId]) -> Vec<Option<GridCoord>> {
    actors.iter().map(|&a| world.current_cell(a)).collect()
}

/// Asserts no two actors share a cell.
///
/// # Panics
///
/// Panics on the first shared cell.
pub fn assert_no_overlap(world: &World) {
    let mut seen = std::collections::HashSet::new();
    for id in world.actor_ids() {
        let c = world.current_cell(id).expect("listed actor has a cell");
        assert!(seen.insert(c), "two actors share cell {c}");
    }
}

const DIRECTIONS: [GridCoord; 4] = [
    GridCoord::EAST,
    GridCoord::WEST,
    GridCoord::NORTH,
    GridCoord::SOUTH,
];

/// A seeded skirmish: scattered walls, up to `actors` actors and one queued
/// request per actor.
///
/// Every request kind is represented. Two runs with the same seed build
/// identical worlds and queues.
///
/// # Panics
///
/// Panics if the generated requests are rejected, which cannot happen for
/// actors that were just spawned.
pub fn seeded_skirmish(seed: u64, size: i32, actors: usize) -> (World, GridManager) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut map = GridMap::open(size, size);
    map.scatter_obstacles(seed, 0.15, &[]);
    let mut world = World::new(map);

    let mut free: Vec<GridCoord> = world.map().walkable_cells().collect();
    let mut ids = Vec::new();
    for _ in 0..actors {
        if free.is_empty() {
            break;
        }
        let spot = free.swap_remove(rng.gen_range(0..free.len()));
        ids.extend(world.spawn(spot));
    }

    let mut manager = GridManager::with_config(ManagerConfig {
        chain_decay: 1.0,
        ..ManagerConfig::default()
    })
    .expect("valid config");
    for id in ids {
        let direction = DIRECTIONS[rng.gen_range(0..DIRECTIONS.len())];
        let distance = rng.gen_range(1..=5);
        let queued = match rng.gen_range(0..4) {
            0 => {
                let knockback = rng.gen_bool(0.7).then(|| rng.gen_range(1..=3));
                manager.request_dash(&world, id, direction, distance, knockback)
            }
            1 => {
                let chain = rng.gen_bool(0.5);
                manager.request_push(&world, id, direction, distance, rng.gen_range(1..=3), chain)
            }
            2 => {
                let target = cell(rng.gen_range(0..size), rng.gen_range(0..size));
                manager.request_teleport(&world, id, target)
            }
            _ => manager.request_knockback(&world, id, direction, distance),
        };
        queued.expect("spawned actor is on the board");
    }
    (world, manager)
}
