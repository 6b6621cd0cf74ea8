//! Occupancy grid and placement search for the sandbox.
//!
//! One cell per world unit. Structures occupy a square footprint centered on
//! their position; resource nodes block a single cell. The search walks
//! square rings outward from the anchor and returns the first center whose
//! footprint plus a one-cell apron is free, so neighbouring structures end up
//! at least three cells apart.

use foundry_core::kind::UnitKind;
use foundry_core::math::{Fixed, Vec2Fixed};
use foundry_core::snapshot::UnitId;

/// State of a cell in the occupancy grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    /// Free for building.
    #[default]
    Empty,
    /// Covered by a structure or a construction site.
    Occupied(UnitId),
    /// Covered by a resource node.
    Blocked,
}

/// Half-width of a structure's square footprint, in cells.
#[must_use]
pub const fn footprint_radius(kind: UnitKind) -> i32 {
    match kind {
        UnitKind::CommandCenter => 2,
        _ => 1,
    }
}

/// Grid for tracking structure placement.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl OccupancyGrid {
    /// Create a grid with all cells empty.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::Empty; (width as usize) * (height as usize)],
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some((y as usize) * (self.width as usize) + (x as usize))
    }

    /// Cell state at coordinates, `None` if out of bounds.
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        self.index(x, y).map(|i| self.cells[i])
    }

    fn set(&mut self, x: i32, y: i32, cell: Cell) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = cell;
        }
    }

    /// Whole-unit cell containing a world position.
    #[must_use]
    pub fn cell_of(position: Vec2Fixed) -> (i32, i32) {
        (position.x.to_num(), position.y.to_num())
    }

    /// Whether every cell of a footprint centered at `(x, y)` is free and on
    /// the map.
    #[must_use]
    pub fn is_area_free(&self, x: i32, y: i32, radius: i32) -> bool {
        (-radius..=radius).all(|dy| {
            (-radius..=radius).all(|dx| self.get(x + dx, y + dy) == Some(Cell::Empty))
        })
    }

    /// Mark a footprint as occupied.
    pub fn occupy(&mut self, x: i32, y: i32, radius: i32, id: UnitId) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                self.set(x + dx, y + dy, Cell::Occupied(id));
            }
        }
    }

    /// Mark a single cell as blocked.
    pub fn block(&mut self, x: i32, y: i32) {
        self.set(x, y, Cell::Blocked);
    }

    /// First free footprint center for `kind` within `max_distance` of `near`.
    #[must_use]
    pub fn search(&self, kind: UnitKind, near: Vec2Fixed, max_distance: Fixed) -> Option<Vec2Fixed> {
        let (cx, cy) = Self::cell_of(near);
        let apron = footprint_radius(kind) + 1;
        let max_ring: i32 = max_distance.to_num();
        let max_sq = max_distance.saturating_mul(max_distance);

        for ring in 0..=max_ring {
            for dy in -ring..=ring {
                for dx in -ring..=ring {
                    if dx.abs() != ring && dy.abs() != ring {
                        continue;
                    }
                    let candidate = Vec2Fixed::from_units(cx + dx, cy + dy);
                    if near.distance_squared(candidate) > max_sq {
                        continue;
                    }
                    if self.is_area_free(cx + dx, cy + dy, apron) {
                        return Some(candidate);
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occupy_marks_footprint() {
        let mut grid = OccupancyGrid::new(20, 20);
        grid.occupy(5, 5, 1, 9);
        assert_eq!(grid.get(4, 6), Some(Cell::Occupied(9)));
        assert_eq!(grid.get(7, 5), Some(Cell::Empty));
        assert!(!grid.is_area_free(6, 6, 1));
        assert!(grid.is_area_free(8, 8, 1));
    }

    #[test]
    fn test_edge_of_map_is_not_free() {
        let grid = OccupancyGrid::new(10, 10);
        assert!(!grid.is_area_free(0, 0, 1));
        assert!(grid.is_area_free(1, 1, 1));
    }

    #[test]
    fn test_search_skips_blocked_center() {
        let mut grid = OccupancyGrid::new(30, 30);
        grid.occupy(10, 10, 2, 1);
        let spot = grid
            .search(UnitKind::Barracks, Vec2Fixed::from_units(10, 10), Fixed::from_num(10))
            .unwrap();
        let (x, y) = OccupancyGrid::cell_of(spot);
        assert!(grid.is_area_free(x, y, 1));
        assert!((x - 10).abs() >= 4 || (y - 10).abs() >= 4);
    }

    #[test]
    fn test_search_gives_up_past_radius() {
        let mut grid = OccupancyGrid::new(12, 12);
        for y in 0..12 {
            for x in 0..12 {
                grid.block(x, y);
            }
        }
        assert_eq!(
            grid.search(UnitKind::SupplyDepot, Vec2Fixed::from_units(6, 6), Fixed::from_num(5)),
            None
        );
    }
}
