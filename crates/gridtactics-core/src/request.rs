//! Displacement request model.
//!
//! A [`DisplacementRequest`] is one actor's intent to change cell. It carries an
//! immutable intent (kind, priority, start, direction or target, distance,
//! collision flags) and a mutable outcome that the Plan phase fills in (path,
//! actual end, collisions, block reason, execution result).
//!
//! # Lifecycle
//!
//! Requests are created on submission, live for a single
//! [`GridManager::process_displacements`](crate::manager::GridManager::process_displacements)
//! call (or one knockback sub-pass) and are discarded after Execute.
//!
//! # Invariants
//!
//! - Once planned, `path[0] == start`.
//! - `actual_end == *path.last()` once planned, and `actual_end == start` before.
//! - A `Cancelled` request has `actual_end == start` and `path == [start]`.
//!
//! # Example
//!
//! ```
//! use gridtactics_core::actor::ActorId;
//! use gridtactics_core::request::{DisplacementKind, DisplacementPriority, DisplacementRequest};
//! use gridmap::GridCoord;
//!
//! let dash = DisplacementRequest::dash(ActorId::new(1), GridCoord::new(0, 0), GridCoord::EAST, 3)
//!     .with_knockback_on_hit(2);
//!
//! assert_eq!(dash.kind, DisplacementKind::Dash);
//! assert_eq!(dash.priority, DisplacementPriority::Active);
//! assert!(dash.can_collide_with_actors());
//! assert_eq!(dash.path, vec![GridCoord::new(0, 0)]);
//! ```

use bitflags::bitflags;
use gridmap::GridCoord;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::actor::ActorId;
use crate::planner::PathPlanResult;

/// Default animation time for a dash, in seconds.
pub const DEFAULT_DASH_DURATION: f32 = 0.3;

/// Animation time for a knockback, in seconds.
pub const DEFAULT_KNOCKBACK_DURATION: f32 = 0.2;

/// Default fraction of knockback distance carried to the next actor in a chain.
pub const DEFAULT_CHAIN_DECAY: f32 = 0.5;

// =============================================================================
// Identification
// =============================================================================

/// Identifier assigned to a request on submission.
///
/// Used for tracing only; nothing in the pipeline depends on its value.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    /// Creates a request ID from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({})", self.0)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req#{}", self.0)
    }
}

// =============================================================================
// Intent enums
// =============================================================================

/// How the actor is being displaced.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplacementKind {
    /// Directional active move that may strike and push other actors.
    Dash,
    /// Forced move of a struck actor; stops on any obstruction.
    Knockback,
    /// Relocation validated only at the destination.
    Teleport,
    /// Planned like a dash; differs only in who issues it.
    Push,
}

impl DisplacementKind {
    /// True for kinds whose collisions produce knockbacks on the struck actor.
    #[must_use]
    pub const fn strikes_actors(self) -> bool {
        matches!(self, Self::Dash | Self::Push)
    }
}

impl fmt::Display for DisplacementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dash => write!(f, "Dash"),
            Self::Knockback => write!(f, "Knockback"),
            Self::Teleport => write!(f, "Teleport"),
            Self::Push => write!(f, "Push"),
        }
    }
}

/// Arbitration priority. Higher wins a destination conflict.
///
/// The discriminants are part of the model: `Passive = 0`, `Active = 10`,
/// `Forced = 20`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DisplacementPriority {
    /// Externally requested knockbacks and other passive moves
    Passive = 0,
    /// Dashes, teleports and other moves the actor chose
    Active = 10,
    /// Knockbacks generated by collisions
    Forced = 20,
}

impl DisplacementPriority {
    /// Numeric priority value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }
}

bitflags! {
    /// Collision behaviour of a request.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct DisplacementFlags: u8 {
        /// Occupied cells are struck rather than treated as walls.
        const CAN_COLLIDE = 1 << 0;
        /// Stop at the first struck actor instead of passing through.
        const STOP_ON_COLLISION = 1 << 1;
        /// Generated knockbacks keep propagating to the actors they hit.
        const CHAIN_KNOCKBACK = 1 << 2;
    }
}

/// Why a planned walk stopped early.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockReason {
    /// Nothing blocked the walk
    #[default]
    None,
    /// The next cell is outside the board
    OutOfBounds,
    /// The next cell is not walkable
    StaticObstacle,
    /// The next cell holds another actor
    AnotherActor,
    /// Non-positive distance or degenerate direction/target
    InvalidPath,
}

impl BlockReason {
    /// True for obstructions that hurt when an actor is slammed into them.
    #[must_use]
    pub const fn is_wall(self) -> bool {
        matches!(self, Self::OutOfBounds | Self::StaticObstacle)
    }
}

/// Final status of a request after the pipeline ran.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionResult {
    /// Planned path is valid (possibly partial for knockbacks)
    #[default]
    Success,
    /// Stopped before taking a step by an obstacle or actor
    Blocked,
    /// Lost a destination conflict
    Cancelled,
    /// Degenerate request (bad distance, direction or target)
    InvalidTarget,
    /// Could not take a step because the board ends
    OutOfBounds,
}

impl ExecutionResult {
    /// Status for a plan that was rejected for `reason`.
    #[must_use]
    pub const fn from_block_reason(reason: BlockReason) -> Self {
        match reason {
            BlockReason::OutOfBounds => Self::OutOfBounds,
            BlockReason::InvalidPath => Self::InvalidTarget,
            BlockReason::None | BlockReason::StaticObstacle | BlockReason::AnotherActor => {
                Self::Blocked
            }
        }
    }
}

/// One actor struck while planning a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionInfo {
    /// The struck actor
    pub hit_actor: ActorId,
    /// Cell the struck actor occupies
    pub cell: GridCoord,
    /// 1-based step of the walk at which the collision happened
    pub step: u32,
    /// True if the walk passed through the actor
    pub continued_after: bool,
}

// =============================================================================
// DisplacementRequest
// =============================================================================

/// One actor's displacement intent plus its planned outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplacementRequest {
    /// Tracing identifier (assigned on submission)
    pub id: RequestId,
    /// The moving actor
    pub requester: ActorId,
    /// Displacement kind
    pub kind: DisplacementKind,
    /// Conflict arbitration priority
    pub priority: DisplacementPriority,
    /// Cell the actor starts from
    pub start: GridCoord,
    /// Destination (teleport only)
    pub target: Option<GridCoord>,
    /// Unit axis direction (dash, push, knockback)
    pub direction: GridCoord,
    /// Maximum number of cells to travel
    pub max_distance: i32,
    /// Collision behaviour
    pub flags: DisplacementFlags,
    /// Distance a struck actor is knocked back
    pub knockback_distance_on_hit: i32,
    /// Fraction of the knockback distance carried down a chain
    pub chain_decay: f32,
    /// Animation time handed to the movement executor, in seconds
    pub execution_duration: f32,

    /// Planned path, first element is `start`
    pub path: Vec<GridCoord>,
    /// Last cell of the planned path
    pub actual_end: GridCoord,
    /// Actors struck along the path, in walk order
    pub collisions: Vec<CollisionInfo>,
    /// Why the walk stopped early
    pub block_reason: BlockReason,
    /// Final status
    pub execution_result: ExecutionResult,
    planned: bool,
}

impl DisplacementRequest {
    /// Creates an unplanned request with neutral defaults.
    #[must_use]
    pub fn new(requester: ActorId, kind: DisplacementKind, start: GridCoord) -> Self {
        Self {
            id: RequestId::default(),
            requester,
            kind,
            priority: DisplacementPriority::Active,
            start,
            target: None,
            direction: GridCoord::ZERO,
            max_distance: 1,
            flags: DisplacementFlags::STOP_ON_COLLISION,
            knockback_distance_on_hit: 0,
            chain_decay: DEFAULT_CHAIN_DECAY,
            execution_duration: DEFAULT_DASH_DURATION,
            path: vec![start],
            actual_end: start,
            collisions: Vec::new(),
            block_reason: BlockReason::None,
            execution_result: ExecutionResult::Success,
            planned: false,
        }
    }

    /// An active dash of up to `distance` cells along `direction`.
    #[must_use]
    pub fn dash(requester: ActorId, start: GridCoord, direction: GridCoord, distance: i32) -> Self {
        Self {
            direction,
            max_distance: distance,
            ..Self::new(requester, DisplacementKind::Dash, start)
        }
    }

    /// A push; planned exactly like a dash.
    #[must_use]
    pub fn push(requester: ActorId, start: GridCoord, direction: GridCoord, distance: i32) -> Self {
        Self {
            kind: DisplacementKind::Push,
            ..Self::dash(requester, start, direction, distance)
        }
    }

    /// An active teleport to `target`.
    #[must_use]
    pub fn teleport(requester: ActorId, start: GridCoord, target: GridCoord) -> Self {
        Self {
            target: Some(target),
            max_distance: i32::try_from(start.manhattan_distance(target)).unwrap_or(i32::MAX),
            ..Self::new(requester, DisplacementKind::Teleport, start)
        }
    }

    /// A knockback of up to `distance` cells along `direction`.
    #[must_use]
    pub fn knockback(
        requester: ActorId,
        start: GridCoord,
        direction: GridCoord,
        distance: i32,
    ) -> Self {
        Self {
            direction,
            max_distance: distance,
            priority: DisplacementPriority::Passive,
            flags: DisplacementFlags::empty(),
            execution_duration: DEFAULT_KNOCKBACK_DURATION,
            ..Self::new(requester, DisplacementKind::Knockback, start)
        }
    }

    /// Sets the arbitration priority.
    #[must_use]
    pub fn with_priority(mut self, priority: DisplacementPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Replaces the collision flags.
    #[must_use]
    pub fn with_flags(mut self, flags: DisplacementFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Enables collisions that knock struck actors back by `distance` cells.
    ///
    /// A distance of zero or less disables collisions again.
    #[must_use]
    pub fn with_knockback_on_hit(mut self, distance: i32) -> Self {
        self.knockback_distance_on_hit = distance;
        self.flags.set(DisplacementFlags::CAN_COLLIDE, distance > 0);
        self
    }

    /// Enables chain knockback with the given decay.
    #[must_use]
    pub fn with_chain(mut self, decay: f32) -> Self {
        self.flags.insert(DisplacementFlags::CHAIN_KNOCKBACK);
        self.chain_decay = decay;
        self
    }

    /// Sets the animation duration.
    #[must_use]
    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.execution_duration = seconds;
        self
    }

    /// True if struck actors are collided with instead of blocking.
    #[must_use]
    pub fn can_collide_with_actors(&self) -> bool {
        self.flags.contains(DisplacementFlags::CAN_COLLIDE)
    }

    /// True if the walk ends at the first struck actor.
    #[must_use]
    pub fn stop_on_collision(&self) -> bool {
        self.flags.contains(DisplacementFlags::STOP_ON_COLLISION)
    }

    /// True if knockbacks produced by this request keep chaining.
    #[must_use]
    pub fn chains_knockback(&self) -> bool {
        self.flags.contains(DisplacementFlags::CHAIN_KNOCKBACK)
    }

    /// True once the Plan phase has filled in the outcome.
    #[must_use]
    pub fn is_planned(&self) -> bool {
        self.planned
    }

    /// True if this request lost a conflict.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.execution_result == ExecutionResult::Cancelled
    }

    /// Cell this request ends on, for conflict grouping.
    ///
    /// `None` until planned and for cancelled requests, so an unplanned request
    /// is never confused with one that legitimately ends at the origin.
    #[must_use]
    pub fn destination(&self) -> Option<GridCoord> {
        if self.planned && !self.is_cancelled() {
            Some(self.actual_end)
        } else {
            None
        }
    }

    /// Number of cells the planned path advances.
    #[must_use]
    pub fn steps_taken(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// Manhattan distance between `start` and `actual_end`.
    #[must_use]
    pub fn move_distance(&self) -> u32 {
        self.start.manhattan_distance(self.actual_end)
    }

    /// True if the planner recorded at least one struck actor.
    #[must_use]
    pub fn has_collisions(&self) -> bool {
        !self.collisions.is_empty()
    }

    /// True if Execute should hand this request to the movement executor.
    #[must_use]
    pub fn should_execute(&self) -> bool {
        !self.is_cancelled() && self.actual_end != self.start
    }

    /// Copies a planner result into the outcome fields.
    ///
    /// An empty result path (rejected before any step) is normalized to
    /// `[start]` so the path invariant holds for every planned request.
    pub fn apply_plan(&mut self, result: PathPlanResult) {
        self.path = if result.path.is_empty() {
            vec![self.start]
        } else {
            result.path
        };
        self.actual_end = self.path.last().copied().unwrap_or(self.start);
        self.collisions = result.collisions;
        self.block_reason = result.block_reason;
        self.execution_result = if result.valid {
            ExecutionResult::Success
        } else {
            ExecutionResult::from_block_reason(result.block_reason)
        };
        self.planned = true;
    }

    /// Marks this request as the loser of a conflict.
    pub fn cancel(&mut self) {
        self.actual_end = self.start;
        self.path.clear();
        self.path.push(self.start);
        self.execution_result = ExecutionResult::Cancelled;
    }
}
