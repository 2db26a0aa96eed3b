//! Vehicle spawning, per-tick movement and path refresh
//!
//! Owns every live vehicle. Each tick rebuilds the spatial index, then
//! walks the vehicles newest-first: arrivals are snapped and advanced,
//! everyone else steers, applies the car-following rule and integrates.

use std::collections::BTreeMap;

use anyhow::Result;
use log::{debug, info};

use super::config::{SNAP_RADIUS, SPATIAL_CELL_SIZE};
use super::pathfinder::Pathfinder;
use super::render::{VehicleRenderer, VehicleVisual};
use super::road_grid::RoadGrid;
use super::spatial_index::SpatialIndex;
use super::types::{Cell, Route, VehicleId};
use super::vehicle::{desired_speed, Approach, Vehicle, VehicleParams, VehicleUpdateResult};

/// Lifetime counters for a traffic simulation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrafficStats {
    pub spawned: usize,
    pub arrived: usize,
    pub rerouted: usize,
    /// Removed because no route remained after an edit
    pub dropped: usize,
}

pub struct TrafficSim {
    vehicles: BTreeMap<VehicleId, Vehicle>,
    spatial: SpatialIndex,
    /// Scratch buffer for neighbour queries, reused across vehicles
    neighbor_buf: Vec<VehicleId>,
    next_id: usize,
    /// Seconds until deferred path refresh runs
    pending_refresh: Option<f32>,
    stats: TrafficStats,
}

impl Default for TrafficSim {
    fn default() -> Self {
        Self::new()
    }
}

impl TrafficSim {
    pub fn new() -> Self {
        Self {
            vehicles: BTreeMap::new(),
            spatial: SpatialIndex::new(SPATIAL_CELL_SIZE),
            neighbor_buf: Vec::new(),
            next_id: 0,
            pending_refresh: None,
            stats: TrafficStats::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(&id)
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    pub fn stats(&self) -> TrafficStats {
        self.stats
    }

    pub fn spatial_index(&self) -> &SpatialIndex {
        &self.spatial
    }

    pub fn refresh_pending(&self) -> bool {
        self.pending_refresh.is_some()
    }

    /// Create a vehicle on the first cell of `route` and register its visual
    pub fn spawn_vehicle(
        &mut self,
        route: Route,
        params: VehicleParams,
        renderer: &mut dyn VehicleRenderer,
    ) -> Result<VehicleId> {
        let id = VehicleId(self.next_id);
        let mut vehicle = Vehicle::new(id, route, params)?;
        self.next_id += 1;

        let handle = renderer.create(&VehicleVisual {
            position: vehicle.position,
            rotation: vehicle.rotation(),
            color: vehicle.color,
            width: vehicle.width,
            length: vehicle.length,
        });
        vehicle.render_handle = Some(handle);
        vehicle.bucket = self.spatial.insert(id, vehicle.position);

        debug!(
            "Spawned {:?} {} -> {} ({} cells, max speed {:.0})",
            id,
            vehicle.path[0],
            vehicle.destination,
            vehicle.path.len(),
            vehicle.max_speed
        );
        self.vehicles.insert(id, vehicle);
        self.stats.spawned += 1;
        Ok(id)
    }

    /// Remove a vehicle and clean up its spatial entry and visual
    pub fn remove_vehicle(
        &mut self,
        id: VehicleId,
        renderer: &mut dyn VehicleRenderer,
    ) -> Option<Vehicle> {
        let vehicle = self.vehicles.remove(&id)?;
        self.spatial.remove(id, Some(vehicle.bucket));
        if let Some(handle) = vehicle.render_handle {
            renderer.destroy(handle);
        }
        Some(vehicle)
    }

    /// Remove every vehicle. Returns how many were removed.
    pub fn clear(&mut self, renderer: &mut dyn VehicleRenderer) -> usize {
        let ids: Vec<VehicleId> = self.vehicles.keys().copied().collect();
        for id in &ids {
            self.remove_vehicle(*id, renderer);
        }
        ids.len()
    }

    /// (Re)start the coalescing timer for path refresh. Each call pushes
    /// the refresh out to `delay` seconds from now.
    pub fn schedule_path_refresh(&mut self, delay: f32) {
        self.pending_refresh = Some(delay.max(0.0));
    }

    /// Main simulation tick
    ///
    /// Returns the vehicles that left the simulation this tick and why.
    pub fn tick(
        &mut self,
        delta_secs: f32,
        grid: &RoadGrid,
        pathfinder: &mut Pathfinder,
        renderer: &mut dyn VehicleRenderer,
    ) -> Vec<(VehicleId, VehicleUpdateResult)> {
        let mut results = Vec::new();

        if let Some(remaining) = self.pending_refresh {
            let remaining = remaining - delta_secs;
            if remaining <= 0.0 {
                self.pending_refresh = None;
                results.extend(self.refresh_paths(grid, pathfinder, renderer));
            } else {
                self.pending_refresh = Some(remaining);
            }
        }

        self.spatial.rebuild(
            self.vehicles
                .values_mut()
                .map(|v| (v.id, v.position, &mut v.bucket)),
        );

        // Newest first, matching the removal-safe reverse walk
        let ids: Vec<VehicleId> = self.vehicles.keys().rev().copied().collect();
        for id in ids {
            let result = self.update_vehicle(id, delta_secs, renderer);
            if result != VehicleUpdateResult::Continue {
                results.push((id, result));
            }
        }

        results
    }

    fn update_vehicle(
        &mut self,
        id: VehicleId,
        delta_secs: f32,
        renderer: &mut dyn VehicleRenderer,
    ) -> VehicleUpdateResult {
        let approach = match self.vehicles.get_mut(&id) {
            Some(vehicle) => vehicle.approach(),
            None => return VehicleUpdateResult::Continue,
        };

        let remaining = match approach {
            Approach::Finished | Approach::Reached { finished: true } => {
                self.remove_vehicle(id, renderer);
                self.stats.arrived += 1;
                return VehicleUpdateResult::Arrived;
            }
            Approach::Reached { finished: false } => {
                // Resume moving next tick
                self.relocate(id);
                return VehicleUpdateResult::Continue;
            }
            Approach::Steering { distance } => distance,
        };

        let desired = {
            let Some(vehicle) = self.vehicles.get(&id) else {
                return VehicleUpdateResult::Continue;
            };
            self.spatial
                .neighbors(id, vehicle.position, &mut self.neighbor_buf);
            let neighbors = self
                .neighbor_buf
                .iter()
                .filter_map(|other| self.vehicles.get(other));
            desired_speed(vehicle, neighbors)
        };

        if let Some(vehicle) = self.vehicles.get_mut(&id) {
            vehicle.integrate(delta_secs, desired, remaining);
            if let Some(handle) = vehicle.render_handle {
                renderer.update(handle, vehicle.position, vehicle.rotation());
            }
        }
        self.relocate(id);
        VehicleUpdateResult::Continue
    }

    /// Move a vehicle's spatial entry if its coarse cell changed
    fn relocate(&mut self, id: VehicleId) {
        let Some(vehicle) = self.vehicles.get_mut(&id) else {
            return;
        };
        let key = self.spatial.bucket_key(vehicle.position);
        if key != vehicle.bucket {
            self.spatial.move_vehicle(id, vehicle.bucket, key);
            vehicle.bucket = key;
        }
    }

    /// Recompute every vehicle's route from where it currently is.
    ///
    /// The existing destination is tried first; if it is gone or
    /// unreachable the best registered destination point is used.
    /// Vehicles that cannot snap onto the network or find any route are
    /// removed.
    pub fn refresh_paths(
        &mut self,
        grid: &RoadGrid,
        pathfinder: &mut Pathfinder,
        renderer: &mut dyn VehicleRenderer,
    ) -> Vec<(VehicleId, VehicleUpdateResult)> {
        let destinations: Vec<Cell> = grid.destination_points().copied().collect();
        let ids: Vec<VehicleId> = self.vehicles.keys().copied().collect();
        let mut dropped = Vec::new();

        for id in ids {
            let Some(vehicle) = self.vehicles.get(&id) else {
                continue;
            };
            let (position, destination) = (vehicle.position, vehicle.destination);

            let route = pathfinder
                .snap_to_nearest_road(grid, position, SNAP_RADIUS)
                .and_then(|start| {
                    route_from(grid, pathfinder, start, destination, &destinations)
                });

            match route {
                Some(route) => {
                    if let Some(vehicle) = self.vehicles.get_mut(&id) {
                        vehicle.reroute(route);
                        self.stats.rerouted += 1;
                    }
                }
                None => {
                    debug!("{:?} has no route after network change, removing", id);
                    self.remove_vehicle(id, renderer);
                    self.stats.dropped += 1;
                    dropped.push((id, VehicleUpdateResult::Despawn));
                }
            }
        }

        if !dropped.is_empty() {
            info!("Path refresh removed {} unroutable vehicles", dropped.len());
        }
        dropped
    }
}

fn route_from(
    grid: &RoadGrid,
    pathfinder: &mut Pathfinder,
    start: Cell,
    destination: Cell,
    destinations: &[Cell],
) -> Option<Route> {
    if grid.is_road(destination.x, destination.y) {
        if start == destination {
            return Some(Route {
                destination,
                path: vec![start],
            });
        }
        let path = pathfinder.find_path(grid, start, destination);
        if path.len() >= 2 {
            return Some(Route { destination, path });
        }
    }
    pathfinder.select_best_path(grid, start, destinations, None, SNAP_RADIUS)
}
