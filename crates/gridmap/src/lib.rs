//! # Gridmap
//!
//! Discrete board substrate for grid tactics.
//!
//! Gridmap represents the playing field as a rectangle of integer cells. Each
//! cell is either walkable or blocked, and the map knows how large a cell is in
//! world units so callers can move between the logical grid and rendered space.
//!
//! - **Coordinates**: [`GridCoord`] with the direction math used by displacement
//! - **Cells**: [`CellType`] classification of static terrain
//! - **Maps**: [`GridMap`] bounds, walkability and grid/world conversion
//! - **Hashing**: [`hash_map`] for determinism checks
//!
//! ## Quick Start
//!
//! ```
//! use gridmap::{CellType, GridCoord, GridMap};
//!
//! let mut map = GridMap::open(8, 8);
//! map.set_cell(GridCoord::new(3, 0), CellType::Blocked);
//!
//! assert!(map.is_cell_valid(GridCoord::new(7, 7)));
//! assert!(!map.is_cell_valid(GridCoord::new(8, 0)));
//! assert!(!map.is_cell_walkable(GridCoord::new(3, 0)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cell;
pub mod error;
pub mod hash;
pub mod map;

pub use cell::CellType;
pub use error::{GridMapError, GridMapResult};
pub use hash::{hash_map, hash_map_into};
pub use map::{GridMap, GridMapData, DEFAULT_CELL_SIZE, MAX_CELLS};

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Integer cell position on the board.
///
/// Equality, ordering and hashing are by value. `x` grows east and `y` grows
/// north; the same type is used for unit direction vectors.
///
/// # Example
///
/// ```
/// use gridmap::GridCoord;
///
/// let start = GridCoord::new(1, 1);
/// let end = start + GridCoord::EAST * 3;
/// assert_eq!(end, GridCoord::new(4, 1));
/// assert_eq!((end - start).clamp_unit(), GridCoord::EAST);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridCoord {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl GridCoord {
    /// The origin cell.
    pub const ZERO: Self = Self::new(0, 0);
    /// Unit step towards +x.
    pub const EAST: Self = Self::new(1, 0);
    /// Unit step towards -x.
    pub const WEST: Self = Self::new(-1, 0);
    /// Unit step towards +y.
    pub const NORTH: Self = Self::new(0, 1);
    /// Unit step towards -y.
    pub const SOUTH: Self = Self::new(0, -1);

    /// Creates a coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Clamps each component to `[-1, 1]`.
    #[must_use]
    pub fn clamp_unit(self) -> Self {
        Self::new(self.x.clamp(-1, 1), self.y.clamp(-1, 1))
    }

    /// Component-wise sign.
    #[must_use]
    pub const fn signum(self) -> Self {
        Self::new(self.x.signum(), self.y.signum())
    }

    /// True for the four axis-aligned unit vectors.
    #[must_use]
    pub const fn is_axis_unit(self) -> bool {
        (self.x.abs() == 1 && self.y == 0) || (self.x == 0 && self.y.abs() == 1)
    }

    /// True for `(0, 0)`.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.x == 0 && self.y == 0
    }

    /// Manhattan distance in cells.
    #[must_use]
    pub const fn manhattan_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Returns the coordinate as a `glam` integer vector.
    #[must_use]
    pub const fn as_ivec2(self) -> IVec2 {
        IVec2::new(self.x, self.y)
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<IVec2> for GridCoord {
    fn from(v: IVec2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<GridCoord> for IVec2 {
    fn from(c: GridCoord) -> Self {
        c.as_ivec2()
    }
}

impl From<(i32, i32)> for GridCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl Add for GridCoord {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for GridCoord {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for GridCoord {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for GridCoord {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl Mul<i32> for GridCoord {
    type Output = Self;

    fn mul(self, rhs: i32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}
