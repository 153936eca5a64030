//! The board: bounds, terrain and grid/world geometry.
//!
//! A [`GridMap`] is a `width x height` rectangle of [`CellType`]s stored in
//! row-major order (`index = y * width + x`). Cell `(0, 0)` sits at the world
//! origin and each cell spans `cell_size` world units.
//!
//! # Loading
//!
//! Maps are authored as [`GridMapData`] (JSON). Loading is forgiving about the
//! cell list: missing cells become [`CellType::Blocked`] and surplus cells are
//! ignored, so a truncated asset can never open a hole in the level.
//!
//! ```
//! use gridmap::{CellType, GridCoord, GridMap};
//!
//! let map = GridMap::from_json(r#"{ "width": 2, "height": 2, "cells": ["Walkable", "Blocked"] }"#)
//!     .unwrap();
//!
//! assert!(map.is_cell_walkable(GridCoord::new(0, 0)));
//! assert!(!map.is_cell_walkable(GridCoord::new(1, 0)));
//! // Cells missing from the data default to blocked
//! assert_eq!(map.cell_type(GridCoord::new(1, 1)), CellType::Blocked);
//! ```

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::cell::CellType;
use crate::error::{GridMapError, GridMapResult};
use crate::GridCoord;

/// World units per cell when the map data does not say otherwise.
pub const DEFAULT_CELL_SIZE: f32 = 100.0;

/// Largest board, in cells, a map may hold.
pub const MAX_CELLS: usize = 1 << 24;

fn default_cell_size() -> f32 {
    DEFAULT_CELL_SIZE
}

/// Serialized map asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridMapData {
    /// Number of columns
    pub width: i32,
    /// Number of rows
    pub height: i32,
    /// World units per cell
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    /// Row-major cell list
    #[serde(default)]
    pub cells: Vec<CellType>,
}

/// Rectangular board of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridMap {
    width: i32,
    height: i32,
    cell_size: f32,
    cells: Vec<CellType>,
}

impl GridMap {
    /// Creates a fully walkable map with the default cell size.
    ///
    /// Non-positive dimensions produce an empty map on which every cell is
    /// out of bounds.
    ///
    /// Boards larger than [`MAX_CELLS`] are refused the same way.
    #[must_use]
    pub fn open(width: i32, height: i32) -> Self {
        let Some(count) = cell_count(width, height) else {
            tracing::warn!(width, height, "refusing oversized or empty board");
            return Self {
                width: 0,
                height: 0,
                cell_size: DEFAULT_CELL_SIZE,
                cells: Vec::new(),
            };
        };
        Self {
            width,
            height,
            cell_size: DEFAULT_CELL_SIZE,
            cells: vec![CellType::Walkable; count],
        }
    }

    /// Builds a map from its serialized form.
    ///
    /// # Errors
    ///
    /// Returns [`GridMapError::InvalidDimensions`] for non-positive dimensions
    /// or more than [`MAX_CELLS`] cells, and [`GridMapError::InvalidCellSize`]
    /// for a non-positive or non-finite cell size.
    pub fn from_data(data: GridMapData) -> GridMapResult<Self> {
        let expected =
            cell_count(data.width, data.height).ok_or(GridMapError::InvalidDimensions {
                width: data.width,
                height: data.height,
            })?;
        check_cell_size(data.cell_size)?;

        let mut cells = data.cells;
        if cells.len() < expected {
            tracing::warn!(
                provided = cells.len(),
                expected,
                "map data is short, filling missing cells as blocked"
            );
            cells.resize(expected, CellType::Blocked);
        } else if cells.len() > expected {
            tracing::warn!(
                provided = cells.len(),
                expected,
                "map data has surplus cells, ignoring the tail"
            );
            cells.truncate(expected);
        }

        tracing::debug!(width = data.width, height = data.height, "loaded grid map");

        Ok(Self {
            width: data.width,
            height: data.height,
            cell_size: data.cell_size,
            cells,
        })
    }

    /// Parses a JSON [`GridMapData`] and builds the map.
    ///
    /// # Errors
    ///
    /// Returns [`GridMapError::Parse`] for malformed JSON, otherwise the same
    /// errors as [`GridMap::from_data`].
    pub fn from_json(json: &str) -> GridMapResult<Self> {
        let data: GridMapData = serde_json::from_str(json)?;
        Self::from_data(data)
    }

    /// Returns the serialized form of this map.
    #[must_use]
    pub fn to_data(&self) -> GridMapData {
        GridMapData {
            width: self.width,
            height: self.height,
            cell_size: self.cell_size,
            cells: self.cells.clone(),
        }
    }

    /// Returns a copy of the map with a different cell size.
    ///
    /// # Errors
    ///
    /// Returns [`GridMapError::InvalidCellSize`] for a non-positive or
    /// non-finite cell size.
    pub fn with_cell_size(mut self, cell_size: f32) -> GridMapResult<Self> {
        check_cell_size(cell_size)?;
        self.cell_size = cell_size;
        Ok(self)
    }

    /// Number of columns.
    #[must_use]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// World units per cell.
    #[must_use]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Row-major view of all cells.
    #[must_use]
    pub fn cells(&self) -> &[CellType] {
        &self.cells
    }

    /// True if `cell` lies inside the board.
    #[must_use]
    pub fn is_cell_valid(&self, cell: GridCoord) -> bool {
        cell.x >= 0 && cell.x < self.width && cell.y >= 0 && cell.y < self.height
    }

    /// Terrain at `cell`; out-of-bounds cells are [`CellType::Blocked`].
    #[must_use]
    pub fn cell_type(&self, cell: GridCoord) -> CellType {
        self.index_of(cell)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(CellType::Blocked)
    }

    /// True if `cell` is in bounds and walkable.
    #[must_use]
    pub fn is_cell_walkable(&self, cell: GridCoord) -> bool {
        self.cell_type(cell).is_walkable()
    }

    /// Overwrites the terrain at `cell`.
    ///
    /// Returns false (and changes nothing) when `cell` is out of bounds.
    pub fn set_cell(&mut self, cell: GridCoord, cell_type: CellType) -> bool {
        match self.index_of(cell).and_then(|index| self.cells.get_mut(index)) {
            Some(slot) => {
                *slot = cell_type;
                true
            }
            None => false,
        }
    }

    /// World-space center of `cell` on the ground plane.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_to_world(&self, cell: GridCoord) -> Vec3 {
        Vec3::new(
            cell.x as f32 * self.cell_size,
            cell.y as f32 * self.cell_size,
            0.0,
        )
    }

    /// Nearest cell to a world position (height is ignored).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn world_to_cell(&self, position: Vec3) -> GridCoord {
        GridCoord::new(
            (position.x / self.cell_size).round() as i32,
            (position.y / self.cell_size).round() as i32,
        )
    }

    /// Iterates over every walkable cell in row-major order.
    pub fn walkable_cells(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.height)
            .flat_map(move |y| (0..self.width).map(move |x| GridCoord::new(x, y)))
            .filter(move |cell| self.is_cell_walkable(*cell))
    }

    /// Randomly blocks cells with probability `density`, leaving `keep_clear` open.
    ///
    /// The same seed always produces the same layout. `density` is clamped to
    /// `[0, 1]`. Cells that are already blocked stay blocked.
    pub fn scatter_obstacles(&mut self, seed: u64, density: f64, keep_clear: &[GridCoord]) {
        let density = if density.is_finite() {
            density.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        for y in 0..self.height {
            for x in 0..self.width {
                let cell = GridCoord::new(x, y);
                // Draw for every cell so the layout does not depend on keep_clear
                let blocked = rng.gen_bool(density);
                if blocked && !keep_clear.contains(&cell) {
                    self.set_cell(cell, CellType::Blocked);
                }
            }
        }
    }

    #[allow(clippy::cast_sign_loss)]
    fn index_of(&self, cell: GridCoord) -> Option<usize> {
        if self.is_cell_valid(cell) {
            Some(cell.y as usize * self.width as usize + cell.x as usize)
        } else {
            None
        }
    }
}

#[allow(clippy::cast_sign_loss)]
/// Cell count of a `width x height` board, or `None` if either side is not
/// positive or the board exceeds [`MAX_CELLS`].
fn cell_count(width: i32, height: i32) -> Option<usize> {
    if width <= 0 || height <= 0 {
        return None;
    }
    let width = usize::try_from(width).ok()?;
    let height = usize::try_from(height).ok()?;
    width.checked_mul(height).filter(|&count| count <= MAX_CELLS)
}

fn check_cell_size(cell_size: f32) -> GridMapResult<()> {
    if cell_size.is_finite() && cell_size > 0.0 {
        Ok(())
    } else {
        Err(GridMapError::InvalidCellSize(cell_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod bounds_tests {
        use super::*;

        #[test]
        fn open_map_bounds() {
            let map = GridMap::open(4, 3);
            assert!(map.is_cell_valid(GridCoord::new(0, 0)));
            assert!(map.is_cell_valid(GridCoord::new(3, 2)));
            assert!(!map.is_cell_valid(GridCoord::new(4, 0)));
            assert!(!map.is_cell_valid(GridCoord::new(0, 3)));
            assert!(!map.is_cell_valid(GridCoord::new(-1, 0)));
        }

        #[test]
        fn out_of_bounds_is_blocked() {
            let map = GridMap::open(2, 2);
            assert_eq!(map.cell_type(GridCoord::new(5, 5)), CellType::Blocked);
            assert!(!map.is_cell_walkable(GridCoord::new(-1, 1)));
        }

        #[test]
        fn set_cell_out_of_bounds_is_rejected() {
            let mut map = GridMap::open(2, 2);
            assert!(!map.set_cell(GridCoord::new(2, 0), CellType::Blocked));
            assert!(map.set_cell(GridCoord::new(1, 0), CellType::Blocked));
            assert!(!map.is_cell_walkable(GridCoord::new(1, 0)));
        }

        #[test]
        fn negative_dimensions_give_empty_map() {
            let map = GridMap::open(-3, 4);
            assert_eq!(map.width(), 0);
            assert!(!map.is_cell_valid(GridCoord::ZERO));
        }

        #[test]
        fn oversized_open_gives_empty_map() {
            let map = GridMap::open(i32::MAX, i32::MAX);
            assert_eq!((map.width(), map.height()), (0, 0));
            assert!(map.cells().is_empty());
        }
    }

    mod loading_tests {
        use super::*;

        #[test]
        fn short_data_fills_blocked() {
            let map = GridMap::from_data(GridMapData {
                width: 3,
                height: 1,
                cell_size: DEFAULT_CELL_SIZE,
                cells: vec![CellType::Walkable],
            })
            .unwrap();
            assert!(map.is_cell_walkable(GridCoord::new(0, 0)));
            assert!(!map.is_cell_walkable(GridCoord::new(1, 0)));
            assert!(!map.is_cell_walkable(GridCoord::new(2, 0)));
        }

        #[test]
        fn surplus_data_is_truncated() {
            let map = GridMap::from_data(GridMapData {
                width: 1,
                height: 1,
                cell_size: DEFAULT_CELL_SIZE,
                cells: vec![CellType::Walkable, CellType::Blocked, CellType::Blocked],
            })
            .unwrap();
            assert_eq!(map.cells().len(), 1);
        }

        #[test]
        fn zero_dimensions_rejected() {
            let err = GridMap::from_data(GridMapData {
                width: 0,
                height: 5,
                cell_size: DEFAULT_CELL_SIZE,
                cells: vec![],
            })
            .unwrap_err();
            assert!(matches!(err, GridMapError::InvalidDimensions { width: 0, height: 5 }));
        }

        #[test]
        fn bad_cell_size_rejected() {
            let err = GridMap::from_data(GridMapData {
                width: 1,
                height: 1,
                cell_size: -2.0,
                cells: vec![],
            })
            .unwrap_err();
            assert!(matches!(err, GridMapError::InvalidCellSize(_)));
        }

        #[test]
        fn oversized_dimensions_rejected() {
            let err = GridMap::from_json(r#"{ "width": 2147483647, "height": 2147483647 }"#)
                .unwrap_err();
            assert!(matches!(
                err,
                GridMapError::InvalidDimensions { width: i32::MAX, height: i32::MAX }
            ));

            let err = GridMap::from_json(r#"{ "width": 8192, "height": 4096 }"#).unwrap_err();
            assert!(matches!(err, GridMapError::InvalidDimensions { .. }));
        }

        #[test]
        fn largest_allowed_board_loads() {
            let map = GridMap::from_json(r#"{ "width": 4096, "height": 4096 }"#).unwrap();
            assert_eq!(map.cells().len(), MAX_CELLS);
        }

        #[test]
        fn malformed_json_rejected() {
            let err = GridMap::from_json("{ not json").unwrap_err();
            assert!(matches!(err, GridMapError::Parse(_)));
        }

        #[test]
        fn data_roundtrip_through_json() {
            let mut map = GridMap::open(3, 2);
            map.set_cell(GridCoord::new(2, 1), CellType::Blocked);
            let json = serde_json::to_string(&map.to_data()).unwrap();
            let loaded = GridMap::from_json(&json).unwrap();
            assert_eq!(loaded, map);
        }
    }

    mod geometry_tests {
        use super::*;

        #[test]
        fn cell_to_world_scales_by_cell_size() {
            let map = GridMap::open(10, 10);
            let world = map.cell_to_world(GridCoord::new(3, 4));
            assert!((world.x - 300.0).abs() < 0.0001);
            assert!((world.y - 400.0).abs() < 0.0001);
            assert!(world.z.abs() < 0.0001);
        }

        #[test]
        fn world_to_cell_rounds_to_nearest() {
            let map = GridMap::open(10, 10);
            assert_eq!(map.world_to_cell(Vec3::new(149.0, 51.0, 30.0)), GridCoord::new(1, 1));
            assert_eq!(map.world_to_cell(Vec3::new(-40.0, 0.0, 0.0)), GridCoord::new(0, 0));
        }

        #[test]
        fn custom_cell_size() {
            let map = GridMap::open(4, 4).with_cell_size(50.0).unwrap();
            assert_eq!(map.world_to_cell(Vec3::new(100.0, 150.0, 0.0)), GridCoord::new(2, 3));
        }

        #[test]
        fn unusable_cell_size_rejected() {
            for size in [0.0, -1.0, f32::NAN, f32::INFINITY] {
                let err = GridMap::open(2, 2).with_cell_size(size).unwrap_err();
                assert!(matches!(err, GridMapError::InvalidCellSize(_)));
            }
        }
    }

    mod scatter_tests {
        use super::*;

        #[test]
        fn same_seed_same_layout() {
            let mut a = GridMap::open(16, 16);
            let mut b = GridMap::open(16, 16);
            a.scatter_obstacles(7, 0.3, &[]);
            b.scatter_obstacles(7, 0.3, &[]);
            assert_eq!(a, b);
        }

        #[test]
        fn keep_clear_cells_stay_walkable() {
            let mut map = GridMap::open(8, 8);
            let clear = [GridCoord::new(0, 0), GridCoord::new(7, 7)];
            map.scatter_obstacles(3, 1.0, &clear);
            assert!(map.is_cell_walkable(clear[0]));
            assert!(map.is_cell_walkable(clear[1]));
            assert!(!map.is_cell_walkable(GridCoord::new(4, 4)));
        }

        #[test]
        fn zero_density_changes_nothing() {
            let mut map = GridMap::open(8, 8);
            map.scatter_obstacles(99, 0.0, &[]);
            assert_eq!(map.walkable_cells().count(), 64);
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn world_position_maps_back_to_its_cell(
                x in -500i32..500,
                y in -500i32..500,
                size in 1.0f32..256.0,
            ) {
                let map = GridMap::open(1, 1).with_cell_size(size).unwrap();
                let cell = GridCoord::new(x, y);
                prop_assert_eq!(map.world_to_cell(map.cell_to_world(cell)), cell);
            }

            #[test]
            fn walkable_cells_are_valid(seed in any::<u64>(), density in 0.0f64..1.0) {
                let mut map = GridMap::open(9, 7);
                map.scatter_obstacles(seed, density, &[]);
                for cell in map.walkable_cells() {
                    prop_assert!(map.is_cell_valid(cell));
                }
            }
        }
    }
}
