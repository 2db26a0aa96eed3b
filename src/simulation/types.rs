//! Core types for the traffic simulation
//!
//! Grid cells, world-space points and identifiers. None of these know
//! anything about rendering.

use std::fmt;

use super::config::TILE_SIZE;

/// A unique identifier for a vehicle
/// Assigned from a monotonically increasing counter, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VehicleId(pub usize);

/// An integer tile coordinate on the road grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// World-space center of this tile
    pub fn center(&self) -> WorldPos {
        WorldPos::new(
            (self.x as f32 + 0.5) * TILE_SIZE,
            (self.y as f32 + 0.5) * TILE_SIZE,
        )
    }

    /// The cell containing a world-space point
    pub fn containing(pos: WorldPos) -> Self {
        Self {
            x: (pos.x / TILE_SIZE).floor() as i32,
            y: (pos.y / TILE_SIZE).floor() as i32,
        }
    }

    /// The four orthogonal neighbours (no diagonals)
    pub fn neighbors4(&self) -> [Cell; 4] {
        [
            Cell::new(self.x + 1, self.y),
            Cell::new(self.x - 1, self.y),
            Cell::new(self.x, self.y + 1),
            Cell::new(self.x, self.y - 1),
        ]
    }

    /// Manhattan distance in cells
    pub fn manhattan(&self, other: &Cell) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// A 2D position in world units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldPos {
    pub x: f32,
    pub y: f32,
}

impl WorldPos {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &WorldPos) -> f32 {
        other.sub(self).length()
    }

    pub fn sub(&self, other: &WorldPos) -> WorldPos {
        WorldPos::new(self.x - other.x, self.y - other.y)
    }

    pub fn add_scaled(&self, dir: &WorldPos, amount: f32) -> WorldPos {
        WorldPos::new(self.x + dir.x * amount, self.y + dir.y * amount)
    }

    pub fn dot(&self, other: &WorldPos) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// 2D cross product, i.e. the signed lateral offset of `other` from
    /// the line through the origin along `self`
    pub fn cross(&self, other: &WorldPos) -> f32 {
        self.x * other.y - self.y * other.x
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn scale(&self, factor: f32) -> WorldPos {
        WorldPos::new(self.x * factor, self.y * factor)
    }

    /// Rotation in radians of this vector, measured from +x
    pub fn angle(&self) -> f32 {
        self.y.atan2(self.x)
    }
}

/// An RGB color for a vehicle body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// A destination together with the grid path that reaches it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub destination: Cell,
    pub path: Vec<Cell>,
}

impl Route {
    /// Cost used to rank routes: number of cells on the path.
    /// Only meaningful because every step is unit-cost and orthogonal.
    pub fn cost(&self) -> usize {
        self.path.len()
    }
}
