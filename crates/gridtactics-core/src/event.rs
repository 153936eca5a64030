//! Pipeline events for telemetry and replay.
//!
//! The [`GridManager`](crate::manager::GridManager) records what each pipeline
//! run did into an [`EventLog`]. Events do not feed back into resolution; they
//! exist so callers can drive effects (crash sounds, hit flashes) and so tests
//! can assert on the causal order of a run.
//!
//! The log is drained with `take_events()`, typically once per frame.

use gridmap::GridCoord;
use serde::{Deserialize, Serialize};

use crate::actor::ActorId;
use crate::request::{BlockReason, DisplacementKind, ExecutionResult, RequestId};

/// Something that happened during a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DisplacementEvent {
    /// A request was planned
    Planned {
        /// Request identifier
        request: RequestId,
        /// Moving actor
        actor: ActorId,
        /// Displacement kind
        kind: DisplacementKind,
        /// Planner verdict
        result: ExecutionResult,
        /// Last cell of the planned path
        end: GridCoord,
    },
    /// A destination conflict was arbitrated
    ConflictResolved {
        /// Contested cell
        cell: GridCoord,
        /// Actor that kept its path
        winner: ActorId,
        /// Actors whose requests were cancelled
        cancelled: Vec<ActorId>,
    },
    /// A collision produced a knockback
    KnockbackGenerated {
        /// Actor being knocked back
        actor: ActorId,
        /// Cell the knockback starts from
        from: GridCoord,
        /// Push direction
        direction: GridCoord,
        /// Requested distance in cells
        distance: i32,
        /// Chain generation, starting at 1
        depth: u32,
    },
    /// A knockback slammed an actor into a wall or the board edge
    WallCrash {
        /// Damaged actor
        actor: ActorId,
        /// Cell the actor came to rest on
        cell: GridCoord,
        /// Damage applied
        damage: f32,
        /// What stopped the actor
        reason: BlockReason,
    },
    /// A knockback beyond the recursion bound was discarded
    ChainDropped {
        /// Actor that would have been knocked back
        actor: ActorId,
        /// Generation the knockback belonged to
        depth: u32,
    },
    /// A winning path was handed to the movement executor
    Executed {
        /// Request identifier
        request: RequestId,
        /// Moving actor
        actor: ActorId,
        /// Final cell
        end: GridCoord,
        /// Number of cells advanced
        steps: usize,
    },
}

impl DisplacementEvent {
    /// The actor an event is primarily about.
    #[must_use]
    pub fn actor(&self) -> ActorId {
        match self {
            Self::Planned { actor, .. }
            | Self::KnockbackGenerated { actor, .. }
            | Self::WallCrash { actor, .. }
            | Self::ChainDropped { actor, .. }
            | Self::Executed { actor, .. } => *actor,
            Self::ConflictResolved { winner, .. } => *winner,
        }
    }
}

/// Append-only event log, drained by the owner.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<DisplacementEvent>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub fn push(&mut self, event: DisplacementEvent) {
        self.events.push(event);
    }

    /// Drains and returns all recorded events in recording order.
    pub fn take_events(&mut self) -> Vec<DisplacementEvent> {
        std::mem::take(&mut self.events)
    }

    /// Recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> &[DisplacementEvent] {
        &self.events
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if nothing has been recorded since the last drain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
