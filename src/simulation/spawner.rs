//! Vehicle spawning: manual trigger and the auto-spawn timer

use anyhow::{bail, Context, Result};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use super::config::{
    SimConfig, CAR_LENGTH, CAR_WIDTH, MAX_SPAWN_INTERVAL, MIN_SPAWN_INTERVAL, SNAP_RADIUS,
};
use super::pathfinder::Pathfinder;
use super::render::VehicleRenderer;
use super::road_grid::RoadGrid;
use super::traffic::TrafficSim;
use super::types::{Cell, Rgb, VehicleId};
use super::vehicle::VehicleParams;

/// Body colors handed out to new vehicles
pub const VEHICLE_PALETTE: [Rgb; 6] = [
    Rgb(220, 60, 60),
    Rgb(60, 120, 220),
    Rgb(240, 190, 40),
    Rgb(70, 180, 90),
    Rgb(180, 90, 200),
    Rgb(240, 240, 240),
];

/// Outcome of one auto-spawn round
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRound {
    pub attempts: usize,
    pub spawned: Vec<VehicleId>,
    /// Last error seen, if every attempt of a round failed
    pub failure: Option<String>,
}

pub struct SpawnController {
    interval: f32,
    timer: f32,
    auto_spawn: bool,
    speed_range: (f32, f32),
    last_error: Option<String>,
    /// Optional seeded RNG for reproducible simulations
    rng: Option<StdRng>,
}

impl SpawnController {
    pub fn new(config: &SimConfig) -> Self {
        let low = config.min_max_speed.min(config.max_max_speed);
        let high = config.min_max_speed.max(config.max_max_speed);
        Self {
            interval: config
                .spawn_interval
                .clamp(MIN_SPAWN_INTERVAL, MAX_SPAWN_INTERVAL),
            timer: 0.0,
            auto_spawn: config.auto_spawn,
            speed_range: (low, high),
            last_error: None,
            rng: config.seed.map(StdRng::seed_from_u64),
        }
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    pub fn auto_spawn(&self) -> bool {
        self.auto_spawn
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn set_auto_spawn(&mut self, enabled: bool) {
        self.auto_spawn = enabled;
        self.timer = 0.0;
    }

    pub fn toggle_auto_spawn(&mut self) -> bool {
        self.set_auto_spawn(!self.auto_spawn);
        self.auto_spawn
    }

    /// Nudge the spawn interval, clamped to 0.5..=10 seconds
    pub fn adjust_interval(&mut self, delta: f32) -> f32 {
        self.interval = (self.interval + delta).clamp(MIN_SPAWN_INTERVAL, MAX_SPAWN_INTERVAL);
        self.interval
    }

    /// Get a random value in the given range, using seeded RNG if available
    fn random_range(&mut self, low: f32, high: f32) -> f32 {
        if high <= low {
            return low;
        }
        match &mut self.rng {
            Some(rng) => rng.random_range(low..high),
            None => rand::rng().random_range(low..high),
        }
    }

    /// Choose a random element from a slice, using seeded RNG if available
    fn choose_random<T: Copy>(&mut self, slice: &[T]) -> Option<T> {
        match &mut self.rng {
            Some(rng) => slice.choose(rng).copied(),
            None => slice.choose(&mut rand::rng()).copied(),
        }
    }

    fn vehicle_params(&mut self) -> VehicleParams {
        let (low, high) = self.speed_range;
        let max_speed = self.random_range(low, high);
        let color = self.choose_random(&VEHICLE_PALETTE).unwrap_or(VEHICLE_PALETTE[0]);
        VehicleParams {
            max_speed,
            width: CAR_WIDTH,
            length: CAR_LENGTH,
            color,
        }
    }

    /// Spawn a single vehicle.
    ///
    /// The start is the next spawn point in rotation, or any road tile if no
    /// spawn points exist. Destination points other than the start are the
    /// candidates; a random other road tile is the fallback.
    pub fn spawn_one(
        &mut self,
        grid: &mut RoadGrid,
        pathfinder: &mut Pathfinder,
        traffic: &mut TrafficSim,
        renderer: &mut dyn VehicleRenderer,
    ) -> Result<VehicleId> {
        let result = self.try_spawn(grid, pathfinder, traffic, renderer);
        match &result {
            Ok(_) => self.last_error = None,
            Err(e) => self.last_error = Some(e.to_string()),
        }
        result
    }

    fn try_spawn(
        &mut self,
        grid: &mut RoadGrid,
        pathfinder: &mut Pathfinder,
        traffic: &mut TrafficSim,
        renderer: &mut dyn VehicleRenderer,
    ) -> Result<VehicleId> {
        if grid.road_count() < 2 {
            bail!("Need at least two road tiles to spawn vehicles");
        }

        let road_cells: Vec<Cell> = grid.road_cells().collect();
        let start = match grid.next_spawn_start() {
            Some(cell) => cell,
            None => self
                .choose_random(&road_cells)
                .context("No road tile available as a spawn start")?,
        };

        let candidates: Vec<Cell> = grid
            .destination_points()
            .copied()
            .filter(|cell| *cell != start)
            .collect();
        let others: Vec<Cell> = road_cells.into_iter().filter(|cell| *cell != start).collect();
        let fallback = self.choose_random(&others);

        if candidates.is_empty() && fallback.is_none() {
            bail!("No destination differs from spawn {}", start);
        }

        let route = pathfinder
            .select_best_path(grid, start, &candidates, fallback, SNAP_RADIUS)
            .with_context(|| format!("No route from {} to any destination", start))?;

        let params = self.vehicle_params();
        traffic.spawn_vehicle(route, params, renderer)
    }

    /// Advance the auto-spawn timer. Each elapsed interval is one round of
    /// attempts, one per spawn point (at least one), so a long step can run
    /// several rounds. If every attempt of a round fails, the last error is
    /// reported and auto-spawn switches itself off.
    pub fn tick(
        &mut self,
        delta_secs: f32,
        grid: &mut RoadGrid,
        pathfinder: &mut Pathfinder,
        traffic: &mut TrafficSim,
        renderer: &mut dyn VehicleRenderer,
    ) -> Option<SpawnRound> {
        if !self.auto_spawn {
            return None;
        }
        self.timer += delta_secs;
        if self.timer < self.interval {
            return None;
        }

        let mut round = SpawnRound {
            attempts: 0,
            spawned: Vec::new(),
            failure: None,
        };
        while self.auto_spawn && self.timer >= self.interval {
            self.timer -= self.interval;

            let attempts = grid.spawn_count().max(1);
            let before = round.spawned.len();
            for _ in 0..attempts {
                match self.spawn_one(grid, pathfinder, traffic, renderer) {
                    Ok(id) => round.spawned.push(id),
                    Err(e) => debug!("Auto-spawn attempt failed: {:#}", e),
                }
            }
            round.attempts += attempts;

            if round.spawned.len() == before {
                let message = self
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "Auto-spawn failed".to_string());
                warn!("Auto-spawn disabled: {}", message);
                self.set_auto_spawn(false);
                round.failure = Some(message);
            }
        }

        Some(round)
    }
}
