//! Editable road tile grid
//!
//! Owns the road flags, the search graph mirror handed to the pathfinder,
//! and the spawn/destination point sets that must sit on road tiles.

use anyhow::{bail, Result};
use indexmap::IndexSet;
use log::debug;
use petgraph::graphmap::UnGraphMap;

use super::types::Cell;

/// Rotating snapshot of spawn cells used for round-robin start selection
#[derive(Debug, Clone, Default)]
pub struct SpawnOrder {
    cells: Vec<Cell>,
    cursor: usize,
}

impl SpawnOrder {
    /// Replace the snapshot; the cursor restarts at the first cell
    pub fn rebuild<'a>(&mut self, cells: impl IntoIterator<Item = &'a Cell>) {
        self.cells = cells.into_iter().copied().collect();
        self.cursor = 0;
    }

    /// Next cell in rotation, or None when the snapshot is empty
    pub fn next_cell(&mut self) -> Option<Cell> {
        if self.cells.is_empty() {
            return None;
        }
        let cell = self.cells[self.cursor % self.cells.len()];
        self.cursor = (self.cursor + 1) % self.cells.len();
        Some(cell)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A W x H grid of road tiles.
///
/// `roads[y * width + x]` is `true` for road. The pathfinder never reads the
/// flags directly: it searches `network`, an undirected graph whose nodes are
/// exactly the road cells and whose edges join orthogonally adjacent roads.
/// Every mutation keeps both views in step.
#[derive(Debug, Clone)]
pub struct RoadGrid {
    width: i32,
    height: i32,
    roads: Vec<bool>,
    network: UnGraphMap<Cell, ()>,
    road_count: usize,
    spawn_points: IndexSet<Cell>,
    destination_points: IndexSet<Cell>,
    spawn_order: SpawnOrder,
}

impl RoadGrid {
    /// Create an empty grid. Zero, negative or overflowing dimensions are
    /// rejected.
    pub fn new(width: i32, height: i32) -> Result<Self> {
        if width <= 0 || height <= 0 {
            bail!("Grid dimensions must be positive, got {}x{}", width, height);
        }
        let Some(tiles) = width.checked_mul(height) else {
            bail!("Grid dimensions {}x{} are too large", width, height);
        };
        Ok(Self {
            width,
            height,
            roads: vec![false; tiles as usize],
            network: UnGraphMap::new(),
            road_count: 0,
            spawn_points: IndexSet::new(),
            destination_points: IndexSet::new(),
            spawn_order: SpawnOrder::default(),
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    fn index(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    /// Bounds-checked road membership
    pub fn is_road(&self, x: i32, y: i32) -> bool {
        self.in_bounds(x, y) && self.roads[self.index(x, y)]
    }

    /// Whether the search graph considers the cell traversable
    pub fn is_walkable(&self, cell: Cell) -> bool {
        self.network.contains_node(cell)
    }

    /// The search graph over road cells
    pub fn network(&self) -> &UnGraphMap<Cell, ()> {
        &self.network
    }

    /// Set or clear a road tile.
    ///
    /// Returns whether anything changed. Out-of-bounds and unchanged writes
    /// are no-ops. Clearing a tile also drops any spawn or destination
    /// registered on it.
    pub fn set_road(&mut self, x: i32, y: i32, present: bool) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let idx = self.index(x, y);
        if self.roads[idx] == present {
            return false;
        }
        self.roads[idx] = present;
        let cell = Cell::new(x, y);

        if present {
            self.road_count += 1;
            self.network.add_node(cell);
            for neighbor in cell.neighbors4() {
                if self.is_road(neighbor.x, neighbor.y) {
                    self.network.add_edge(cell, neighbor, ());
                }
            }
        } else {
            self.road_count -= 1;
            self.network.remove_node(cell);

            let had_spawn = self.spawn_points.shift_remove(&cell);
            if had_spawn {
                self.spawn_order.rebuild(&self.spawn_points);
            }
            let had_destination = self.destination_points.shift_remove(&cell);
            if had_spawn || had_destination {
                debug!("Dropped points on erased tile {}", cell);
            }
        }
        true
    }

    pub fn road_count(&self) -> usize {
        self.road_count
    }

    /// All road cells in row-major order
    pub fn road_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.roads
            .iter()
            .enumerate()
            .filter(|(_, is_road)| **is_road)
            .map(move |(idx, _)| {
                let idx = idx as i32;
                Cell::new(idx % self.width, idx / self.width)
            })
    }

    /// Add the spawn point if absent, remove it if present.
    /// Returns true when the point now exists.
    pub fn toggle_spawn(&mut self, cell: Cell) -> Result<bool> {
        let on_road = self.is_road(cell.x, cell.y);
        let added = toggle_point(&mut self.spawn_points, cell, on_road, "Spawn")?;
        self.spawn_order.rebuild(&self.spawn_points);
        Ok(added)
    }

    /// Add the destination point if absent, remove it if present.
    /// Returns true when the point now exists.
    pub fn toggle_destination(&mut self, cell: Cell) -> Result<bool> {
        let on_road = self.is_road(cell.x, cell.y);
        toggle_point(&mut self.destination_points, cell, on_road, "Destination")
    }

    pub fn spawn_points(&self) -> impl Iterator<Item = &Cell> {
        self.spawn_points.iter()
    }

    pub fn destination_points(&self) -> impl Iterator<Item = &Cell> {
        self.destination_points.iter()
    }

    pub fn spawn_count(&self) -> usize {
        self.spawn_points.len()
    }

    pub fn destination_count(&self) -> usize {
        self.destination_points.len()
    }

    pub fn is_spawn(&self, cell: &Cell) -> bool {
        self.spawn_points.contains(cell)
    }

    pub fn is_destination(&self, cell: &Cell) -> bool {
        self.destination_points.contains(cell)
    }

    /// Next spawn start in round-robin order
    pub fn next_spawn_start(&mut self) -> Option<Cell> {
        self.spawn_order.next_cell()
    }

    /// Remove every road and point
    pub fn clear(&mut self) {
        self.roads.fill(false);
        self.network.clear();
        self.road_count = 0;
        self.spawn_points.clear();
        self.destination_points.clear();
        self.spawn_order.rebuild(&self.spawn_points);
    }

    /// Lay out a cross of roads through the middle of the grid, spawns at
    /// the west and north ends and destinations at the east and south ends.
    pub fn seed_default_network(&mut self) {
        let mid_x = self.width / 2;
        let mid_y = self.height / 2;

        for x in 0..self.width {
            self.set_road(x, mid_y, true);
        }
        for y in 0..self.height {
            self.set_road(mid_x, y, true);
        }

        let west = Cell::new(0, mid_y);
        let north = Cell::new(mid_x, 0);
        let east = Cell::new(self.width - 1, mid_y);
        let south = Cell::new(mid_x, self.height - 1);

        for cell in [west, north] {
            if !self.spawn_points.contains(&cell) {
                // Every cell above was just painted as road, so this cannot fail
                let _ = self.toggle_spawn(cell);
            }
        }
        for cell in [east, south] {
            if !self.destination_points.contains(&cell) && !self.spawn_points.contains(&cell) {
                let _ = self.toggle_destination(cell);
            }
        }

        debug!(
            "Seeded default network: {} road tiles, {} spawns, {} destinations",
            self.road_count,
            self.spawn_points.len(),
            self.destination_points.len()
        );
    }
}

fn toggle_point(set: &mut IndexSet<Cell>, cell: Cell, on_road: bool, label: &str) -> Result<bool> {
    if set.shift_remove(&cell) {
        return Ok(false);
    }
    if !on_road {
        bail!("{} points must be placed on a road tile ({})", label, cell);
    }
    set.insert(cell);
    Ok(true)
}
