//! # Gridtactics Core
//!
//! Displacement resolution for a discrete-grid tactics game.
//!
//! Actors occupy integer cells and are moved by dashes, teleports, pushes and
//! knockbacks. This crate turns a batch of simultaneous displacement intents
//! into a conflict-free set of paths, including bounded knockback chain
//! reactions.
//!
//! ## Architecture
//!
//! - **Requests**: [`DisplacementRequest`] intent plus planned outcome
//! - **Planner**: pure straight-line path planning against a [`GridQuery`]
//! - **Resolver**: destination conflict arbitration and knockback synthesis
//! - **Manager**: [`GridManager`] runs Plan → Resolve → Execute and owns the
//!   reservation table
//! - **World**: [`World`], an in-memory reference collaborator
//!
//! The core never owns actors. Collaborators ([`GridQuery`],
//! [`MovementExecutor`], [`DamageSink`]) are passed into every call.
//!
//! ## Usage
//!
//! ```
//! use gridmap::{CellType, GridCoord, GridMap};
//! use gridtactics_core::{GridManager, GridQuery, World};
//!
//! let mut map = GridMap::open(8, 1);
//! map.set_cell(GridCoord::new(3, 0), CellType::Blocked);
//! let mut world = World::new(map);
//! let hero = world.spawn(GridCoord::new(0, 0)).unwrap();
//! let slime = world.spawn(GridCoord::new(2, 0)).unwrap();
//!
//! let mut manager = GridManager::new();
//! manager.request_dash(&world, hero, GridCoord::EAST, 4, Some(2)).unwrap();
//! manager.process_displacements(&mut world);
//!
//! // The slime is pinned against the wall, so the hero stops short of it
//! // and the slime takes crash damage.
//! assert_eq!(world.current_cell(hero), Some(GridCoord::new(1, 0)));
//! assert_eq!(world.current_cell(slime), Some(GridCoord::new(2, 0)));
//! assert!(world.hp(slime).unwrap() < 100.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub use gridmap;

pub mod actor;
pub mod config;
pub mod error;
pub mod event;
pub mod manager;
pub mod planner;
pub mod query;
pub mod request;
pub mod resolver;
pub mod world;

pub use actor::ActorId;
pub use config::ManagerConfig;
pub use error::{DisplacementError, DisplacementResult, StepError};
pub use event::{DisplacementEvent, EventLog};
pub use manager::{GridManager, PipelineOutcome};
pub use planner::PathPlanResult;
pub use query::{DamageSink, DisplacementWorld, GridQuery, MovementExecutor};
pub use request::{
    BlockReason, CollisionInfo, DisplacementFlags, DisplacementKind, DisplacementPriority,
    DisplacementRequest, ExecutionResult, RequestId,
};
pub use resolver::{Conflict, ConflictKind};
pub use world::World;

#[cfg(test)]
mod tests;
