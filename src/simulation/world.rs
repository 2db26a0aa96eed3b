//! Main simulation world that ties everything together
//!
//! This is the entry point input and HUD front-ends talk to: it owns the
//! grid, pathfinder, traffic and spawner, applies edits with the right
//! invalidation, and exposes a pull-style HUD snapshot.

use std::fmt;

use anyhow::Result;
use log::{debug, info};

use super::config::{
    SimConfig, MAX_BRUSH_SIZE, MIN_BRUSH_SIZE, POINT_EDIT_REFRESH_DELAY,
    ROAD_EDIT_REFRESH_DELAY, STATUS_TTL,
};
use super::pathfinder::Pathfinder;
use super::render::{HeadlessRenderer, VehicleRenderer};
use super::road_grid::RoadGrid;
use super::spawner::SpawnController;
use super::traffic::TrafficSim;
use super::types::{Cell, VehicleId};
use super::vehicle::VehicleUpdateResult;

/// What a paint action does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Road,
    Erase,
    Spawn,
    Destination,
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tool::Road => "Road",
            Tool::Erase => "Erase",
            Tool::Spawn => "Spawn",
            Tool::Destination => "Destination",
        };
        f.write_str(name)
    }
}

/// Everything a HUD shows, read on demand
#[derive(Debug, Clone, PartialEq)]
pub struct HudSnapshot {
    pub tool: Tool,
    pub brush_size: u8,
    pub road_tiles: usize,
    pub spawn_points: usize,
    pub destination_points: usize,
    pub vehicles: usize,
    pub auto_spawn: bool,
    pub spawn_interval: f32,
    pub status: Option<String>,
}

impl fmt::Display for HudSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tool: {} | Brush: {}", self.tool, self.brush_size)?;
        writeln!(
            f,
            "Roads: {} | Spawns: {} | Destinations: {} | Vehicles: {}",
            self.road_tiles, self.spawn_points, self.destination_points, self.vehicles
        )?;
        write!(
            f,
            "Auto-spawn: {} every {:.1}s",
            if self.auto_spawn { "on" } else { "off" },
            self.spawn_interval
        )?;
        if let Some(status) = &self.status {
            write!(f, "\n{}", status)?;
        }
        Ok(())
    }
}

/// Transient status text with a remaining lifetime
#[derive(Debug, Clone)]
struct Status {
    message: String,
    remaining: f32,
}

/// The main simulation world
///
/// Subsystems are read-only from outside; edits go through the methods
/// below, which invalidate paths and schedule refreshes.
pub struct SimWorld {
    grid: RoadGrid,
    pathfinder: Pathfinder,
    traffic: TrafficSim,
    spawner: SpawnController,
    renderer: Box<dyn VehicleRenderer>,
    tool: Tool,
    brush_size: u8,
    status: Option<Status>,
    needs_redraw: bool,
    /// Simulation time
    pub time: f32,
}

impl SimWorld {
    fn new_internal(config: &SimConfig, renderer: Box<dyn VehicleRenderer>) -> Result<Self> {
        Ok(Self {
            grid: RoadGrid::new(config.width, config.height)?,
            pathfinder: Pathfinder::new(config.path_cache_capacity),
            traffic: TrafficSim::new(),
            spawner: SpawnController::new(config),
            renderer,
            tool: Tool::default(),
            brush_size: MIN_BRUSH_SIZE,
            status: None,
            needs_redraw: true,
            time: 0.0,
        })
    }

    /// A session with the default cross-shaped network, ready to run
    pub fn new(config: &SimConfig) -> Result<Self> {
        let mut world = Self::blank(config)?;
        world.grid.seed_default_network();
        Ok(world)
    }

    /// A session with an empty grid
    pub fn blank(config: &SimConfig) -> Result<Self> {
        Self::new_internal(config, Box::new(HeadlessRenderer::new()))
    }

    /// A session with an empty grid that reports vehicles to `renderer`
    pub fn with_renderer(config: &SimConfig, renderer: Box<dyn VehicleRenderer>) -> Result<Self> {
        Self::new_internal(config, renderer)
    }

    pub fn grid(&self) -> &RoadGrid {
        &self.grid
    }

    pub fn pathfinder(&self) -> &Pathfinder {
        &self.pathfinder
    }

    pub fn traffic(&self) -> &TrafficSim {
        &self.traffic
    }

    pub fn spawner(&self) -> &SpawnController {
        &self.spawner
    }

    fn set_status(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!("Status: {}", message);
        self.status = Some(Status {
            message,
            remaining: STATUS_TTL,
        });
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.message.as_str())
    }

    /// Returns true once after any change that needs tiles or markers redrawn
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    fn network_changed(&mut self) {
        self.pathfinder.invalidate();
        self.traffic.schedule_path_refresh(ROAD_EDIT_REFRESH_DELAY);
        self.needs_redraw = true;
    }

    fn points_changed(&mut self) {
        self.traffic.schedule_path_refresh(POINT_EDIT_REFRESH_DELAY);
        self.needs_redraw = true;
    }

    /// Set one road tile. Returns whether the grid changed.
    pub fn set_road(&mut self, cell: Cell, present: bool) -> bool {
        let changed = self.grid.set_road(cell.x, cell.y, present);
        if changed {
            self.network_changed();
        }
        changed
    }

    /// Cells covered by the brush when painting at `center`
    pub fn brush_cells(&self, center: Cell) -> Vec<Cell> {
        let size = i32::from(self.brush_size);
        let low = -(size - 1) / 2;
        let high = size / 2;
        (low..=high)
            .flat_map(|dy| (low..=high).map(move |dx| Cell::new(center.x + dx, center.y + dy)))
            .collect()
    }

    /// Apply the current tool at `cell`.
    ///
    /// Road paints `value` over the brush area and Erase clears it; Spawn
    /// and Destination toggle the point under the cursor when `value` is
    /// true. Returns whether anything changed.
    pub fn paint(&mut self, cell: Cell, value: bool) -> bool {
        match self.tool {
            Tool::Road | Tool::Erase => {
                let present = self.tool == Tool::Road && value;
                let mut changed = 0;
                for target in self.brush_cells(cell) {
                    if self.grid.set_road(target.x, target.y, present) {
                        changed += 1;
                    }
                }
                if changed > 0 {
                    self.network_changed();
                }
                changed > 0
            }
            Tool::Spawn if value => self.toggle_spawn(cell),
            Tool::Destination if value => self.toggle_destination(cell),
            Tool::Spawn | Tool::Destination => false,
        }
    }

    /// Toggle a spawn point. Off-road placement is rejected with a status.
    pub fn toggle_spawn(&mut self, cell: Cell) -> bool {
        match self.grid.toggle_spawn(cell) {
            Ok(added) => {
                self.set_status(if added {
                    format!("Spawn point added at {}", cell)
                } else {
                    format!("Spawn point removed at {}", cell)
                });
                self.points_changed();
                true
            }
            Err(e) => {
                self.set_status(e.to_string());
                false
            }
        }
    }

    /// Toggle a destination point. Off-road placement is rejected with a status.
    pub fn toggle_destination(&mut self, cell: Cell) -> bool {
        match self.grid.toggle_destination(cell) {
            Ok(added) => {
                self.set_status(if added {
                    format!("Destination added at {}", cell)
                } else {
                    format!("Destination removed at {}", cell)
                });
                self.points_changed();
                true
            }
            Err(e) => {
                self.set_status(e.to_string());
                false
            }
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    pub fn brush_size(&self) -> u8 {
        self.brush_size
    }

    /// Grow or shrink the brush, clamped to 1..=4
    pub fn adjust_brush(&mut self, delta: i32) -> u8 {
        let size = (i32::from(self.brush_size) + delta)
            .clamp(i32::from(MIN_BRUSH_SIZE), i32::from(MAX_BRUSH_SIZE));
        self.brush_size = size as u8;
        self.brush_size
    }

    pub fn adjust_spawn_interval(&mut self, delta: f32) -> f32 {
        let interval = self.spawner.adjust_interval(delta);
        self.set_status(format!("Spawn interval {:.1}s", interval));
        interval
    }

    pub fn toggle_auto_spawn(&mut self) -> bool {
        let enabled = self.spawner.toggle_auto_spawn();
        self.set_status(if enabled {
            "Auto-spawn on"
        } else {
            "Auto-spawn off"
        });
        enabled
    }

    /// Remove every vehicle
    pub fn clear_vehicles(&mut self) -> usize {
        let removed = self.traffic.clear(self.renderer.as_mut());
        self.set_status(format!("Cleared {} vehicles", removed));
        removed
    }

    /// Wipe the grid and vehicles and lay down the default network again
    pub fn reset_network(&mut self) {
        self.traffic.clear(self.renderer.as_mut());
        self.grid.clear();
        self.grid.seed_default_network();
        self.network_changed();
        self.set_status("Network reset");
        info!("Network reset: {} road tiles", self.grid.road_count());
    }

    /// Spawn one vehicle on demand. Failures become the status message.
    pub fn spawn_one_vehicle(&mut self) -> Option<VehicleId> {
        let result = self.spawner.spawn_one(
            &mut self.grid,
            &mut self.pathfinder,
            &mut self.traffic,
            self.renderer.as_mut(),
        );
        match result {
            Ok(id) => Some(id),
            Err(e) => {
                self.set_status(e.to_string());
                None
            }
        }
    }

    /// Main simulation tick
    pub fn tick(&mut self, delta_secs: f32) -> Vec<(VehicleId, VehicleUpdateResult)> {
        self.time += delta_secs;

        if let Some(status) = &mut self.status {
            status.remaining -= delta_secs;
            if status.remaining <= 0.0 {
                self.status = None;
            }
        }

        let round = self.spawner.tick(
            delta_secs,
            &mut self.grid,
            &mut self.pathfinder,
            &mut self.traffic,
            self.renderer.as_mut(),
        );
        if let Some(message) = round.and_then(|r| r.failure) {
            self.set_status(message);
        }

        self.traffic.tick(
            delta_secs,
            &self.grid,
            &mut self.pathfinder,
            self.renderer.as_mut(),
        )
    }

    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot {
            tool: self.tool,
            brush_size: self.brush_size,
            road_tiles: self.grid.road_count(),
            spawn_points: self.grid.spawn_count(),
            destination_points: self.grid.destination_count(),
            vehicles: self.traffic.len(),
            auto_spawn: self.spawner.auto_spawn(),
            spawn_interval: self.spawner.interval(),
            status: self.status().map(str::to_string),
        }
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        println!("=== Traffic Simulation Summary ===");
        println!("Time: {:.2}s", self.time);
        println!("{}", self.hud());
        let stats = self.traffic.stats();
        println!(
            "Spawned: {} | Arrived: {} | Rerouted: {} | Dropped: {}",
            stats.spawned, stats.arrived, stats.rerouted, stats.dropped
        );

        if !self.traffic.is_empty() {
            println!("--- Active Vehicles ---");
            for vehicle in self.traffic.vehicles() {
                println!(
                    "  Vehicle {}: speed={:.1}/{:.1}, position=({:.1}, {:.1}), waypoint {}/{} -> {}",
                    vehicle.id.0,
                    vehicle.speed,
                    vehicle.max_speed,
                    vehicle.position.x,
                    vehicle.position.y,
                    vehicle.target_index,
                    vehicle.waypoints.len(),
                    vehicle.destination
                );
            }
        }
    }

    /// Render the grid as text, one character per tile
    pub fn render_map(&self) -> String {
        let width = self.grid.width() as usize;
        let height = self.grid.height() as usize;
        let mut rows = vec![vec![' '; width]; height];

        for cell in self.grid.road_cells() {
            rows[cell.y as usize][cell.x as usize] = '.';
        }
        for cell in self.grid.spawn_points() {
            rows[cell.y as usize][cell.x as usize] = 'S';
        }
        for cell in self.grid.destination_points() {
            rows[cell.y as usize][cell.x as usize] = 'D';
        }
        for vehicle in self.traffic.vehicles() {
            let cell = Cell::containing(vehicle.position);
            if self.grid.in_bounds(cell.x, cell.y) {
                rows[cell.y as usize][cell.x as usize] = 'C';
            }
        }

        let mut out = String::with_capacity((width + 3) * (height + 2));
        let border = "-".repeat(width);
        out.push('+');
        out.push_str(&border);
        out.push_str("+\n");
        for row in &rows {
            out.push('|');
            out.extend(row.iter());
            out.push_str("|\n");
        }
        out.push('+');
        out.push_str(&border);
        out.push('+');
        out
    }

    /// Draw a visual map of the world in the terminal
    pub fn draw_map(&self) {
        println!("\n=== World Map ===");
        println!("Legend: .=Road, S=Spawn, D=Destination, C=Vehicle");
        println!();
        println!("{}", self.render_map());
        println!();
    }
}
