//! Actor handles.
//!
//! The displacement core never owns actors. It refers to them through
//! [`ActorId`], an opaque handle that the collaborators resolve on every query
//! (see [`GridQuery`](crate::query::GridQuery)). A handle can outlive the actor
//! it names; lookups for a despawned actor simply return `None`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, stable handle to an actor on the board.
///
/// `ActorId` is a newtype wrapper around `u64`. Handles are ordered by their
/// numeric value, which gives the reference [`World`](crate::world::World) a
/// deterministic iteration order.
///
/// # Example
///
/// ```
/// use gridtactics_core::actor::ActorId;
///
/// let hero = ActorId::new(1);
/// let slime = ActorId::new(2);
///
/// assert!(hero < slime);
/// assert_eq!(hero.as_u64(), 1);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(u64);

impl ActorId {
    /// Creates a handle from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this handle.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

impl From<u64> for ActorId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<ActorId> for u64 {
    fn from(id: ActorId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_id_ordering() {
        assert!(ActorId::new(1) < ActorId::new(2));
        assert_eq!(ActorId::from(7u64), ActorId::new(7));
        assert_eq!(u64::from(ActorId::new(9)), 9);
    }

    #[test]
    fn actor_id_formatting() {
        assert_eq!(format!("{:?}", ActorId::new(3)), "ActorId(3)");
        assert_eq!(ActorId::new(3).to_string(), "actor#3");
    }

    #[test]
    fn actor_id_serializes_transparently() {
        let json = serde_json::to_string(&ActorId::new(42)).unwrap();
        assert_eq!(json, "42");
        let back: ActorId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ActorId::new(42));
    }
}
