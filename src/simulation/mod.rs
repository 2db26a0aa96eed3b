//! Standalone traffic simulation module
//!
//! All road-network and vehicle logic lives here and runs without any
//! graphics. Front-ends drive it through `SimWorld` and draw vehicles by
//! implementing `VehicleRenderer`.

mod config;
mod path_cache;
mod pathfinder;
mod render;
mod road_grid;
mod spatial_index;
mod spawner;
mod traffic;
mod types;
mod vehicle;
mod world;

// Re-export public types for external use
pub use config::{
    SimConfig, ARRIVAL_THRESHOLD, CAR_LENGTH, CAR_WIDTH, FOLLOWING_BUFFER, FOLLOWING_SPEED_MARGIN,
    FOLLOWING_TIME_GAP, LANE_TOLERANCE, MAX_BRUSH_SIZE, MAX_SPAWN_INTERVAL, MIN_BRUSH_SIZE,
    MIN_FOLLOWING_SPEED, MIN_SPAWN_INTERVAL, PATH_CACHE_CAPACITY, POINT_EDIT_REFRESH_DELAY,
    ROAD_EDIT_REFRESH_DELAY, SAFE_FOLLOWING_MULTIPLIER, SNAP_RADIUS, SPATIAL_CELL_SIZE,
    SPAWN_INTERVAL_STEP, SPEED_SMOOTHING_TAU, STATUS_TTL, TILE_SIZE,
};
pub use path_cache::{PathCache, PathKey};
pub use pathfinder::Pathfinder;
pub use render::{HeadlessRenderer, RenderHandle, VehicleRenderer, VehicleVisual};
pub use road_grid::{RoadGrid, SpawnOrder};
pub use spatial_index::{BucketKey, SpatialIndex};
pub use spawner::{SpawnController, SpawnRound, VEHICLE_PALETTE};
pub use traffic::{TrafficSim, TrafficStats};
pub use types::{Cell, Rgb, Route, VehicleId, WorldPos};
pub use vehicle::{desired_speed, Approach, Vehicle, VehicleParams, VehicleUpdateResult};
pub use world::{HudSnapshot, SimWorld, Tool};
