//! JSON scenario loading and execution.
//!
//! A scenario is a board, a set of actors and one batch of requests. Running
//! it drives a single [`GridManager::process_displacements`] pass over a fresh
//! [`World`] and captures everything needed to reproduce the result.

use anyhow::{bail, Context, Result};
use gridmap::{CellType, GridCoord, GridMap, GridMapData};
use gridtactics_core::world::DEFAULT_ACTOR_HP;
use gridtactics_core::{
    ActorId, DisplacementEvent, GridManager, GridQuery, ManagerConfig, PipelineOutcome, World,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

fn default_hp() -> f32 {
    DEFAULT_ACTOR_HP
}

/// An actor placed on the board before the batch runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSpec {
    /// Handle the actor is spawned under
    pub id: ActorId,
    /// Starting cell
    pub cell: GridCoord,
    /// Starting hit points
    #[serde(default = "default_hp")]
    pub hp: f32,
}

/// One queued request, expressed the way the manager's submission calls take it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestSpec {
    /// [`GridManager::request_dash`]
    Dash {
        actor: ActorId,
        direction: GridCoord,
        distance: i32,
        #[serde(default)]
        knockback_on_hit: Option<i32>,
    },
    /// [`GridManager::request_push`]
    Push {
        actor: ActorId,
        direction: GridCoord,
        distance: i32,
        knockback_on_hit: i32,
        #[serde(default)]
        chain: bool,
    },
    /// [`GridManager::request_teleport`]
    Teleport { actor: ActorId, target: GridCoord },
    /// [`GridManager::request_knockback`]
    Knockback {
        actor: ActorId,
        direction: GridCoord,
        distance: i32,
    },
}

/// A complete reproducible batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Board data; an empty cell list means an all-walkable board
    pub map: GridMapData,
    /// Cells blocked on top of `map`
    #[serde(default)]
    pub walls: Vec<GridCoord>,
    /// Actors, spawned in order
    pub actors: Vec<ActorSpec>,
    /// Requests, submitted in order
    #[serde(default)]
    pub requests: Vec<RequestSpec>,
    /// Pipeline settings
    #[serde(default)]
    pub config: ManagerConfig,
}

/// Final state of one actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorReport {
    pub id: ActorId,
    pub cell: Option<GridCoord>,
    pub hp: Option<f32>,
}

/// Everything a scenario run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub outcome: PipelineOutcome,
    pub events: Vec<DisplacementEvent>,
    pub actors: Vec<ActorReport>,
    pub state_hash: u64,
}

impl Scenario {
    /// Parses a scenario from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("scenario is not valid JSON")
    }

    fn build_map(&self) -> Result<GridMap> {
        let mut map = GridMap::from_data(self.map.clone()).context("invalid map data")?;
        if self.map.cells.is_empty() {
            for y in 0..map.height() {
                for x in 0..map.width() {
                    map.set_cell(GridCoord::new(x, y), CellType::Walkable);
                }
            }
        }
        for &wall in &self.walls {
            if !map.set_cell(wall, CellType::Blocked) {
                bail!("wall {wall} is off the board");
            }
        }
        Ok(map)
    }

    fn build_world(&self) -> Result<World> {
        let mut world = World::new(self.build_map()?);
        for spec in &self.actors {
            world
                .spawn_with_id(spec.id, spec.cell, spec.hp)
                .with_context(|| format!("cannot place actor {} on {}", spec.id, spec.cell))?;
        }
        Ok(world)
    }

    fn submit(&self, manager: &mut GridManager, world: &World) -> Result<()> {
        for (index, spec) in self.requests.iter().enumerate() {
            let queued = match *spec {
                RequestSpec::Dash {
                    actor,
                    direction,
                    distance,
                    knockback_on_hit,
                } => manager.request_dash(world, actor, direction, distance, knockback_on_hit),
                RequestSpec::Push {
                    actor,
                    direction,
                    distance,
                    knockback_on_hit,
                    chain,
                } => manager.request_push(
                    world,
                    actor,
                    direction,
                    distance,
                    knockback_on_hit,
                    chain,
                ),
                RequestSpec::Teleport { actor, target } => {
                    manager.request_teleport(world, actor, target)
                }
                RequestSpec::Knockback {
                    actor,
                    direction,
                    distance,
                } => manager.request_knockback(world, actor, direction, distance),
            };
            let id = queued.with_context(|| format!("request #{index} rejected"))?;
            debug!(%id, index, "request queued");
        }
        Ok(())
    }

    /// Runs the batch on a fresh world.
    pub fn run(&self) -> Result<Report> {
        let mut world = self.build_world()?;
        let mut manager =
            GridManager::with_config(self.config.clone()).context("invalid pipeline config")?;
        self.submit(&mut manager, &world)?;

        let outcome = manager.process_displacements(&mut world);
        let actors = self
            .actors
            .iter()
            .map(|spec| ActorReport {
                id: spec.id,
                cell: world.current_cell(spec.id),
                hp: world.hp(spec.id),
            })
            .collect();
        let state_hash = world.state_hash();
        info!(state_hash, executed = outcome.executed().count(), "scenario finished");

        Ok(Report {
            outcome,
            events: manager.take_events(),
            actors,
            state_hash,
        })
    }
}
