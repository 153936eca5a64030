//! Static terrain classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Terrain type of a single board cell.
///
/// Only [`CellType::Walkable`] cells can be entered. Anything outside the map
/// reports as [`CellType::Blocked`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    /// Open floor
    #[default]
    Walkable,
    /// Wall, pillar or any other static obstacle
    Blocked,
}

impl CellType {
    /// Returns true if an actor may stand on this cell.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::Walkable)
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Walkable => write!(f, "Walkable"),
            Self::Blocked => write!(f, "Blocked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_walkable() {
        assert!(CellType::default().is_walkable());
        assert!(!CellType::Blocked.is_walkable());
    }

    #[test]
    fn serializes_as_variant_name() {
        let json = serde_json::to_string(&CellType::Blocked).unwrap();
        assert_eq!(json, "\"Blocked\"");
    }
}
