//! Error types for the displacement core.
//!
//! Planning and conflict resolution never fail; they report status values.
//! Errors only arise at the edges: submitting a request for an actor the world
//! does not know, loading a bad config, or a single-step move that cannot start.

use gridmap::GridCoord;
use thiserror::Error;

use crate::actor::ActorId;

/// Errors raised by request submission and configuration.
#[derive(Debug, Error)]
pub enum DisplacementError {
    /// The requester is not on the board; the request was skipped
    #[error("invalid request from {actor}: {reason}")]
    InvalidRequest {
        /// The actor that submitted the request
        actor: ActorId,
        /// What was wrong with it
        reason: &'static str,
    },

    /// A configuration value is out of range
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Config could not be parsed
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result alias for [`DisplacementError`].
pub type DisplacementResult<T> = Result<T, DisplacementError>;

/// Reasons a single-step move could not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StepError {
    /// The actor is not on the board
    #[error("{0} is not on the board")]
    UnknownActor(ActorId),

    /// The step direction is not a unit axis vector
    #[error("step direction {0} is not a unit axis vector")]
    InvalidDirection(GridCoord),

    /// Another step already holds the destination
    #[error("cell {cell} is reserved by {holder}")]
    Reserved {
        /// The contested cell
        cell: GridCoord,
        /// Current holder of the reservation
        holder: ActorId,
    },

    /// The destination is out of bounds or not walkable
    #[error("cell {0} is not walkable")]
    NotWalkable(GridCoord),

    /// Another actor stands on the destination
    #[error("cell {cell} is occupied by {occupant}")]
    Occupied {
        /// The contested cell
        cell: GridCoord,
        /// Actor standing there
        occupant: ActorId,
    },
}
