//! Vehicle state, car-following and motion integration
//!
//! Standalone implementation that doesn't depend on any renderer.

use anyhow::{bail, Result};

use super::config::{
    ARRIVAL_THRESHOLD, FOLLOWING_BUFFER, FOLLOWING_SPEED_MARGIN, FOLLOWING_TIME_GAP,
    LANE_TOLERANCE, MIN_FOLLOWING_SPEED, SAFE_FOLLOWING_MULTIPLIER, SPEED_SMOOTHING_TAU,
};
use super::render::RenderHandle;
use super::spatial_index::BucketKey;
use super::types::{Cell, Rgb, Route, VehicleId, WorldPos};

/// Result of a vehicle update indicating what action should be taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleUpdateResult {
    Continue,
    /// Reached the last waypoint
    Arrived,
    /// Lost its route after a network edit
    Despawn,
}

/// Per-vehicle physical parameters chosen at spawn time
#[derive(Debug, Clone, Copy)]
pub struct VehicleParams {
    pub max_speed: f32,
    pub width: f32,
    pub length: f32,
    pub color: Rgb,
}

/// Outcome of checking a vehicle against its current target waypoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Approach {
    /// No waypoint left
    Finished,
    /// Snapped onto a waypoint this step; `finished` if it was the last
    Reached { finished: bool },
    /// Still travelling; distance to the target waypoint
    Steering { distance: f32 },
}

/// A vehicle in the traffic simulation
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    pub position: WorldPos,
    /// Unit vector the vehicle faces
    pub heading: WorldPos,
    pub speed: f32,
    pub target_speed: f32,
    pub max_speed: f32,
    pub width: f32,
    pub length: f32,
    pub color: Rgb,
    pub path: Vec<Cell>,
    pub waypoints: Vec<WorldPos>,
    /// Index into `waypoints` of the point being driven toward
    pub target_index: usize,
    pub destination: Cell,
    pub bucket: BucketKey,
    pub render_handle: Option<RenderHandle>,
}

impl Vehicle {
    /// Build a vehicle parked on the first cell of `route`, facing the
    /// second. Paths shorter than two cells are rejected.
    pub fn new(id: VehicleId, route: Route, params: VehicleParams) -> Result<Self> {
        if route.path.len() < 2 {
            bail!("Vehicle path needs at least two cells, got {}", route.path.len());
        }
        let waypoints: Vec<WorldPos> = route.path.iter().map(Cell::center).collect();
        let position = waypoints[0];
        let heading = unit_or_default(waypoints[1].sub(&position));

        Ok(Self {
            id,
            position,
            heading,
            speed: 0.0,
            target_speed: params.max_speed,
            max_speed: params.max_speed,
            width: params.width,
            length: params.length,
            color: params.color,
            path: route.path,
            waypoints,
            target_index: 1,
            destination: route.destination,
            bucket: (0, 0),
            render_handle: None,
        })
    }

    pub fn rotation(&self) -> f32 {
        self.heading.angle()
    }

    pub fn current_target(&self) -> Option<WorldPos> {
        self.waypoints.get(self.target_index).copied()
    }

    pub fn is_finished(&self) -> bool {
        self.target_index >= self.waypoints.len()
    }

    /// Check the target waypoint. Within the arrival threshold the vehicle
    /// snaps onto it and advances to the next one.
    pub fn approach(&mut self) -> Approach {
        let Some(target) = self.current_target() else {
            return Approach::Finished;
        };
        let to_target = target.sub(&self.position);
        let distance = to_target.length();

        if distance <= ARRIVAL_THRESHOLD {
            self.position = target;
            self.target_index += 1;
            return Approach::Reached {
                finished: self.is_finished(),
            };
        }

        self.heading = to_target.scale(1.0 / distance);
        Approach::Steering { distance }
    }

    /// Smooth speed toward `desired` and move along the heading, never
    /// past the target waypoint `remaining` units away.
    pub fn integrate(&mut self, delta_secs: f32, desired: f32, remaining: f32) {
        self.target_speed = desired;
        let blend = 1.0 - (-delta_secs / SPEED_SMOOTHING_TAU).exp();
        self.speed += (desired - self.speed) * blend;
        let step = (self.speed * delta_secs).min(remaining).max(0.0);
        self.position = self.position.add_scaled(&self.heading, step);
    }

    /// Replace the remaining route, keeping the current position as the
    /// first waypoint so the vehicle does not jump.
    pub fn reroute(&mut self, route: Route) {
        let mut waypoints = Vec::with_capacity(route.path.len().max(2));
        waypoints.push(self.position);
        waypoints.extend(route.path.iter().skip(1).map(Cell::center));
        if waypoints.len() < 2 {
            waypoints.push(route.destination.center());
        }
        self.waypoints = waypoints;
        self.path = route.path;
        self.destination = route.destination;
        self.target_index = 1;
    }
}

/// Desired speed for `vehicle` given the vehicles around it.
///
/// Only neighbours ahead (positive forward projection) and roughly in the
/// same lane (lateral offset within 0.9 x width) count. A neighbour closer
/// than the safe following distance caps the speed at 10 below its own
/// speed, never under 20.
pub fn desired_speed<'a>(vehicle: &Vehicle, neighbors: impl IntoIterator<Item = &'a Vehicle>) -> f32 {
    let safe_distance = (SAFE_FOLLOWING_MULTIPLIER * vehicle.length)
        .max(vehicle.speed * FOLLOWING_TIME_GAP + FOLLOWING_BUFFER);
    let lane_tolerance = LANE_TOLERANCE * vehicle.width;

    let mut desired = vehicle.max_speed;
    for other in neighbors {
        let offset = other.position.sub(&vehicle.position);
        let forward = offset.dot(&vehicle.heading);
        if forward <= 0.0 {
            continue;
        }
        if vehicle.heading.cross(&offset).abs() > lane_tolerance {
            continue;
        }
        if forward < safe_distance {
            let cap = (other.speed - FOLLOWING_SPEED_MARGIN).max(MIN_FOLLOWING_SPEED);
            desired = desired.min(cap);
        }
    }
    desired
}

fn unit_or_default(v: WorldPos) -> WorldPos {
    let len = v.length();
    if len > 0.0 {
        v.scale(1.0 / len)
    } else {
        WorldPos::new(1.0, 0.0)
    }
}
