//! Grid pathfinding over the road network
//!
//! A* with a null heuristic over the road graph, fronted by a bounded
//! path cache, plus nearest-road snapping and best-destination selection.

use log::{debug, trace};
use ordered_float::OrderedFloat;
use petgraph::algo::astar;

use super::path_cache::{PathCache, PathKey};
use super::road_grid::RoadGrid;
use super::types::{Cell, Route, WorldPos};

pub struct Pathfinder {
    cache: PathCache,
}

impl Pathfinder {
    pub fn new(cache_capacity: usize) -> Self {
        Self {
            cache: PathCache::new(cache_capacity),
        }
    }

    pub fn cache(&self) -> &PathCache {
        &self.cache
    }

    /// Drop every cached path. Called on any road edit.
    pub fn invalidate(&mut self) {
        if !self.cache.is_empty() {
            debug!("Invalidating {} cached paths", self.cache.len());
        }
        self.cache.clear();
    }

    /// Shortest 4-directional path from `start` to `end`, both inclusive.
    ///
    /// Returns an empty path when the endpoints are equal, off-road, or in
    /// different components.
    pub fn find_path(&mut self, grid: &RoadGrid, start: Cell, end: Cell) -> Vec<Cell> {
        if start == end {
            return Vec::new();
        }

        let key = PathKey::new(start, end);
        if let Some(path) = self.cache.get(&key) {
            return path;
        }

        if !grid.is_walkable(start) || !grid.is_walkable(end) {
            return Vec::new();
        }

        let result = astar(
            grid.network(),
            start,
            |cell| cell == end,
            |_| 1u32,
            |_| 0, // Null heuristic = Dijkstra
        );

        let path = match result {
            Some((_, path)) => path,
            None => {
                trace!("No route {} -> {}", start, end);
                return Vec::new();
            }
        };

        if path.len() >= 2 {
            self.cache.put(key, &path);
        }
        path
    }

    /// Snap a world position onto the road network.
    ///
    /// If the containing tile is road it is returned directly. Otherwise
    /// Chebyshev rings of radius 1..=max_radius are scanned and the road
    /// tile whose center is closest to `position` on the first non-empty
    /// ring wins.
    pub fn snap_to_nearest_road(
        &self,
        grid: &RoadGrid,
        position: WorldPos,
        max_radius: i32,
    ) -> Option<Cell> {
        let origin = Cell::containing(position);
        if grid.is_road(origin.x, origin.y) {
            return Some(origin);
        }

        for radius in 1..=max_radius {
            let closest = ring(origin, radius)
                .filter(|cell| grid.is_road(cell.x, cell.y))
                .min_by_key(|cell| OrderedFloat(cell.center().distance(&position)));
            if closest.is_some() {
                return closest;
            }
        }
        None
    }

    /// Pick the reachable candidate destination with the shortest path.
    ///
    /// Each candidate is snapped to the network first and candidates that
    /// land on `start` are skipped. If no candidate is reachable the snapped
    /// fallback is tried once.
    pub fn select_best_path(
        &mut self,
        grid: &RoadGrid,
        start: Cell,
        candidates: &[Cell],
        fallback: Option<Cell>,
        snap_radius: i32,
    ) -> Option<Route> {
        let mut best: Option<Route> = None;

        for candidate in candidates {
            let Some(destination) = self.snap_to_nearest_road(grid, candidate.center(), snap_radius)
            else {
                continue;
            };
            if destination == start {
                continue;
            }
            let path = self.find_path(grid, start, destination);
            if path.len() < 2 {
                continue;
            }
            let route = Route { destination, path };
            if best.as_ref().is_none_or(|b| route.cost() < b.cost()) {
                best = Some(route);
            }
        }

        if best.is_some() {
            return best;
        }

        let destination = self.snap_to_nearest_road(grid, fallback?.center(), snap_radius)?;
        if destination == start {
            return None;
        }
        let path = self.find_path(grid, start, destination);
        if path.len() < 2 {
            return None;
        }
        debug!("Using fallback destination {} from {}", destination, start);
        Some(Route { destination, path })
    }
}

/// Cells at exactly Chebyshev distance `radius` from `center`
fn ring(center: Cell, radius: i32) -> impl Iterator<Item = Cell> {
    (-radius..=radius).flat_map(move |dy| {
        (-radius..=radius).filter_map(move |dx| {
            if dx.abs().max(dy.abs()) == radius {
                Some(Cell::new(center.x + dx, center.y + dy))
            } else {
                None
            }
        })
    })
}
