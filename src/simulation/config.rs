//! Simulation constants and the runtime configuration

/// Side length of one road tile in world units
pub const TILE_SIZE: f32 = 32.0;

/// Spatial hash bucket size; three tiles keeps the largest safe following
/// distance inside the 3x3 bucket neighbourhood
pub const SPATIAL_CELL_SIZE: f32 = TILE_SIZE * 3.0;

/// Maximum number of cached (start, end) paths
pub const PATH_CACHE_CAPACITY: usize = 512;

/// Distance at which a vehicle counts as having reached a waypoint
pub const ARRIVAL_THRESHOLD: f32 = 2.0;

/// Time constant for exponential speed smoothing, in seconds
pub const SPEED_SMOOTHING_TAU: f32 = 0.4;

/// Vehicle body length in world units
pub const CAR_LENGTH: f32 = 18.0;

/// Vehicle body width in world units
pub const CAR_WIDTH: f32 = 10.0;

/// Safe following distance multiplier for the vehicle length
pub const SAFE_FOLLOWING_MULTIPLIER: f32 = 1.5;

/// Seconds of headway added to the safe following distance per unit of speed
pub const FOLLOWING_TIME_GAP: f32 = 0.6;

/// Constant buffer added to the speed-dependent following distance
pub const FOLLOWING_BUFFER: f32 = 20.0;

/// Vehicles never throttle below this speed because of a vehicle ahead
pub const MIN_FOLLOWING_SPEED: f32 = 20.0;

/// How much slower than a blocking vehicle ahead a follower aims to go
pub const FOLLOWING_SPEED_MARGIN: f32 = 10.0;

/// Lateral tolerance (fraction of width) for "same lane"
pub const LANE_TOLERANCE: f32 = 0.9;

/// Ring radius used when snapping vehicles and destinations onto the network
pub const SNAP_RADIUS: i32 = 4;

/// Refresh delay after a road tile edit
pub const ROAD_EDIT_REFRESH_DELAY: f32 = 0.25;

/// Refresh delay after a spawn or destination edit
pub const POINT_EDIT_REFRESH_DELAY: f32 = 0.1;

/// How long a status message stays visible, in simulated seconds
pub const STATUS_TTL: f32 = 3.0;

pub const MIN_BRUSH_SIZE: u8 = 1;
pub const MAX_BRUSH_SIZE: u8 = 4;

pub const MIN_SPAWN_INTERVAL: f32 = 0.5;
pub const MAX_SPAWN_INTERVAL: f32 = 10.0;
pub const SPAWN_INTERVAL_STEP: f32 = 0.5;

/// Runtime configuration for a simulation session
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Grid width in tiles
    pub width: i32,
    /// Grid height in tiles
    pub height: i32,
    /// Seconds between auto-spawn rounds
    pub spawn_interval: f32,
    /// Whether the auto-spawn timer starts enabled
    pub auto_spawn: bool,
    /// Range that each vehicle's max speed is drawn from
    pub min_max_speed: f32,
    pub max_max_speed: f32,
    /// Optional seed for reproducible runs
    pub seed: Option<u64>,
    /// Bounded path cache size
    pub path_cache_capacity: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 32,
            height: 20,
            spawn_interval: 2.0,
            auto_spawn: true,
            min_max_speed: 60.0,
            max_max_speed: 100.0,
            seed: None,
            path_cache_capacity: PATH_CACHE_CAPACITY,
        }
    }
}
