//! End-to-end session behaviour: editing, spawning, HUD and refresh

use std::cell::RefCell;
use std::rc::Rc;

use tile_traffic::simulation::{
    Cell, RenderHandle, SimConfig, SimWorld, Tool, VehicleRenderer, VehicleVisual, WorldPos,
    MAX_SPAWN_INTERVAL, MIN_SPAWN_INTERVAL, SPAWN_INTERVAL_STEP,
};

fn corridor_config() -> SimConfig {
    SimConfig {
        width: 10,
        height: 1,
        auto_spawn: false,
        seed: Some(7),
        ..SimConfig::default()
    }
}

/// 10x1 road with a spawn at the west end and a destination at the east end
fn corridor_world() -> SimWorld {
    let mut world = SimWorld::blank(&corridor_config()).unwrap();
    for x in 0..10 {
        assert!(world.set_road(Cell::new(x, 0), true));
    }
    assert!(world.toggle_spawn(Cell::new(0, 0)));
    assert!(world.toggle_destination(Cell::new(9, 0)));
    world
}

#[derive(Default)]
struct Calls {
    created: usize,
    destroyed: usize,
}

struct SharedRenderer(Rc<RefCell<Calls>>);

impl VehicleRenderer for SharedRenderer {
    fn create(&mut self, _visual: &VehicleVisual) -> RenderHandle {
        let mut calls = self.0.borrow_mut();
        calls.created += 1;
        RenderHandle(calls.created as u64)
    }

    fn update(&mut self, _handle: RenderHandle, _position: WorldPos, _rotation: f32) {}

    fn destroy(&mut self, _handle: RenderHandle) {
        self.0.borrow_mut().destroyed += 1;
    }
}

#[test]
fn test_corridor_journey_completes() {
    let mut world = corridor_world();
    let before = world.hud().vehicles;

    let id = world.spawn_one_vehicle().expect("spawn should succeed");
    let vehicle = world.traffic().vehicle(id).unwrap();
    let expected: Vec<Cell> = (0..10).map(|x| Cell::new(x, 0)).collect();
    assert_eq!(vehicle.path, expected);
    assert_eq!(vehicle.destination, Cell::new(9, 0));
    assert_eq!(world.hud().vehicles, before + 1);

    for _ in 0..2000 {
        world.tick(0.05);
        if world.traffic().is_empty() {
            break;
        }
    }

    assert_eq!(world.hud().vehicles, before);
    assert_eq!(world.traffic().stats().arrived, 1);
    assert_eq!(world.traffic().stats().dropped, 0);
}

#[test]
fn test_cut_corridor_removes_vehicle() {
    let mut world = corridor_world();
    let id = world.spawn_one_vehicle().unwrap();
    world.tick(0.05);
    world.tick(0.05);

    assert!(world.set_road(Cell::new(5, 0), false));
    assert!(world.pathfinder().cache().is_empty());

    for _ in 0..10 {
        world.tick(0.05);
        if let Some(vehicle) = world.traffic().vehicle(id) {
            assert_ne!(Cell::containing(vehicle.position), Cell::new(5, 0));
        }
    }

    assert!(world.traffic().vehicle(id).is_none());
    assert_eq!(world.traffic().stats().dropped, 1);
    assert_eq!(world.hud().vehicles, 0);
}

#[test]
fn test_any_road_edit_clears_cache() {
    let config = SimConfig {
        width: 10,
        height: 2,
        auto_spawn: false,
        seed: Some(1),
        ..SimConfig::default()
    };
    let mut world = SimWorld::blank(&config).unwrap();
    for x in 0..10 {
        world.set_road(Cell::new(x, 0), true);
    }
    world.toggle_spawn(Cell::new(0, 0));
    world.toggle_destination(Cell::new(9, 0));
    world.spawn_one_vehicle().unwrap();
    assert!(!world.pathfinder().cache().is_empty());

    // Far from the cached route
    world.set_road(Cell::new(0, 1), true);
    assert!(world.pathfinder().cache().is_empty());
}

#[test]
fn test_session_edits_schedule_refresh() {
    let mut world = corridor_world();
    world.spawn_one_vehicle().unwrap();
    world.tick(0.2);
    assert!(!world.traffic().refresh_pending());
    assert!(!world.pathfinder().cache().is_empty());

    world.paint(Cell::new(4, 0), false);
    assert!(!world.grid().is_road(4, 0));
    assert!(world.pathfinder().cache().is_empty());
    assert!(world.traffic().refresh_pending());
}

#[test]
fn test_spawn_needs_two_roads() {
    let mut world = SimWorld::blank(&corridor_config()).unwrap();
    world.set_road(Cell::new(0, 0), true);

    assert!(world.spawn_one_vehicle().is_none());
    assert!(world.status().unwrap().contains("at least two road tiles"));
    assert_eq!(world.hud().vehicles, 0);
}

#[test]
fn test_spawn_without_points_uses_random_roads() {
    let mut world = SimWorld::blank(&corridor_config()).unwrap();
    for x in 0..10 {
        world.set_road(Cell::new(x, 0), true);
    }

    let id = world.spawn_one_vehicle().expect("any two roads are enough");
    let vehicle = world.traffic().vehicle(id).unwrap();
    assert!(vehicle.path.len() >= 2);
    assert_ne!(vehicle.path[0], vehicle.destination);
}

#[test]
fn test_failed_auto_spawn_disables_itself() {
    let config = SimConfig {
        width: 8,
        height: 8,
        auto_spawn: true,
        spawn_interval: 0.5,
        ..SimConfig::default()
    };
    let mut world = SimWorld::blank(&config).unwrap();
    assert!(world.hud().auto_spawn);

    for _ in 0..12 {
        world.tick(0.05);
    }

    let hud = world.hud();
    assert!(!hud.auto_spawn);
    assert!(hud.status.is_some());
    assert_eq!(hud.vehicles, 0);
}

#[test]
fn test_auto_spawn_tries_every_spawn_point() {
    let config = SimConfig {
        seed: Some(11),
        spawn_interval: 1.0,
        ..SimConfig::default()
    };
    let mut world = SimWorld::new(&config).unwrap();
    assert_eq!(world.grid().spawn_count(), 2);

    for _ in 0..21 {
        world.tick(0.05);
    }

    assert_eq!(world.traffic().stats().spawned, 2);
    assert!(world.hud().auto_spawn);
}

#[test]
fn test_long_step_runs_every_elapsed_round() {
    let config = SimConfig {
        seed: Some(4),
        spawn_interval: 0.5,
        ..SimConfig::default()
    };
    let mut world = SimWorld::new(&config).unwrap();

    // Three whole intervals, two spawn points each
    world.tick(1.6);
    assert_eq!(world.traffic().stats().spawned, 6);

    // 0.1s carried over plus 0.5s is one more round
    world.tick(0.5);
    assert_eq!(world.traffic().stats().spawned, 8);
}

#[test]
fn test_long_step_stops_after_failed_round() {
    let config = SimConfig {
        width: 8,
        height: 8,
        spawn_interval: 0.5,
        ..SimConfig::default()
    };
    let mut world = SimWorld::blank(&config).unwrap();

    world.tick(5.0);
    assert!(!world.hud().auto_spawn);
    assert_eq!(world.traffic().stats().spawned, 0);
    assert!(world.status().unwrap().contains("at least two road tiles"));
}

#[test]
fn test_invalid_placement_is_rejected() {
    let config = SimConfig {
        width: 6,
        height: 6,
        auto_spawn: false,
        ..SimConfig::default()
    };
    let mut world = SimWorld::blank(&config).unwrap();
    world.set_road(Cell::new(1, 1), true);

    assert!(!world.toggle_spawn(Cell::new(3, 3)));
    assert!(world.status().unwrap().contains("must be placed on a road"));
    assert!(!world.toggle_destination(Cell::new(4, 4)));
    assert_eq!(world.grid().spawn_count(), 0);
    assert_eq!(world.grid().destination_count(), 0);
}

#[test]
fn test_erase_tool_drops_points() {
    let config = SimConfig {
        auto_spawn: false,
        ..SimConfig::default()
    };
    let mut world = SimWorld::new(&config).unwrap();
    let west = Cell::new(0, config.height / 2);
    assert!(world.grid().is_spawn(&west));

    world.set_tool(Tool::Erase);
    assert!(world.paint(west, true));

    assert!(!world.grid().is_road(west.x, west.y));
    assert!(!world.grid().is_spawn(&west));
    assert_eq!(world.hud().spawn_points, 1);
}

#[test]
fn test_brush_paints_square() {
    let config = SimConfig {
        width: 10,
        height: 10,
        auto_spawn: false,
        ..SimConfig::default()
    };
    let mut world = SimWorld::blank(&config).unwrap();

    assert_eq!(world.adjust_brush(1), 2);
    assert!(world.paint(Cell::new(3, 3), true));
    assert_eq!(world.grid().road_count(), 4);
    for (x, y) in [(3, 3), (4, 3), (3, 4), (4, 4)] {
        assert!(world.grid().is_road(x, y));
    }

    // Road tool with value=false clears
    assert!(world.paint(Cell::new(3, 3), false));
    assert_eq!(world.grid().road_count(), 0);

    // Brush at the edge only touches in-bounds cells
    world.adjust_brush(2);
    assert!(world.paint(Cell::new(0, 0), true));
    assert_eq!(world.grid().road_count(), 9);
}

#[test]
fn test_point_tools_toggle() {
    let config = SimConfig {
        width: 5,
        height: 1,
        auto_spawn: false,
        ..SimConfig::default()
    };
    let mut world = SimWorld::blank(&config).unwrap();
    world.paint(Cell::new(0, 0), true);
    world.paint(Cell::new(4, 0), true);

    world.set_tool(Tool::Spawn);
    assert!(world.paint(Cell::new(0, 0), true));
    assert!(!world.paint(Cell::new(0, 0), false), "value=false does nothing");
    world.set_tool(Tool::Destination);
    assert!(world.paint(Cell::new(4, 0), true));

    let hud = world.hud();
    assert_eq!(hud.tool, Tool::Destination);
    assert_eq!(hud.spawn_points, 1);
    assert_eq!(hud.destination_points, 1);
    assert!(world.traffic().refresh_pending());
}

#[test]
fn test_brush_and_interval_clamps() {
    let mut world = SimWorld::blank(&corridor_config()).unwrap();

    assert_eq!(world.adjust_brush(10), 4);
    assert_eq!(world.adjust_brush(-10), 1);

    assert_eq!(world.adjust_spawn_interval(100.0), MAX_SPAWN_INTERVAL);
    assert_eq!(world.adjust_spawn_interval(-100.0), MIN_SPAWN_INTERVAL);
    assert_eq!(
        world.adjust_spawn_interval(SPAWN_INTERVAL_STEP),
        MIN_SPAWN_INTERVAL + SPAWN_INTERVAL_STEP
    );
}

#[test]
fn test_clear_and_reset() {
    let config = SimConfig {
        auto_spawn: false,
        seed: Some(5),
        ..SimConfig::default()
    };
    let mut world = SimWorld::new(&config).unwrap();
    let default_roads = world.grid().road_count();
    assert_eq!(default_roads, (config.width + config.height - 1) as usize);

    world.spawn_one_vehicle().unwrap();
    world.spawn_one_vehicle().unwrap();
    assert_eq!(world.clear_vehicles(), 2);
    assert!(world.traffic().is_empty());

    world.set_tool(Tool::Road);
    world.paint(Cell::new(1, 1), true);
    world.spawn_one_vehicle().unwrap();
    world.reset_network();

    assert!(world.traffic().is_empty());
    assert_eq!(world.grid().road_count(), default_roads);
    assert!(!world.grid().is_road(1, 1));
    assert_eq!(world.hud().spawn_points, 2);
    assert_eq!(world.hud().destination_points, 2);
}

#[test]
fn test_redraw_flag() {
    let config = SimConfig {
        auto_spawn: false,
        ..SimConfig::default()
    };
    let mut world = SimWorld::new(&config).unwrap();
    assert!(world.take_redraw_request());
    assert!(!world.take_redraw_request());

    world.tick(0.05);
    assert!(!world.take_redraw_request(), "ticks alone do not redraw tiles");

    world.set_road(Cell::new(1, 1), true);
    assert!(world.take_redraw_request());
}

#[test]
fn test_status_expires() {
    let mut world = SimWorld::blank(&corridor_config()).unwrap();
    world.toggle_spawn(Cell::new(3, 0));
    assert!(world.status().is_some());

    for _ in 0..80 {
        world.tick(0.05);
    }
    assert!(world.status().is_none());
}

#[test]
fn test_renderer_sees_full_lifecycle() {
    let calls = Rc::new(RefCell::new(Calls::default()));
    let mut world =
        SimWorld::with_renderer(&corridor_config(), Box::new(SharedRenderer(calls.clone())))
            .unwrap();
    for x in 0..10 {
        world.set_road(Cell::new(x, 0), true);
    }
    world.toggle_spawn(Cell::new(0, 0));
    world.toggle_destination(Cell::new(9, 0));

    world.spawn_one_vehicle().unwrap();
    world.spawn_one_vehicle().unwrap();
    assert_eq!(calls.borrow().created, 2);

    world.clear_vehicles();
    assert_eq!(calls.borrow().destroyed, 2);
}

#[test]
fn test_hud_and_map_render() {
    let mut world = corridor_world();
    world.spawn_one_vehicle().unwrap();

    let hud = world.hud().to_string();
    assert!(hud.contains("Roads: 10"));
    assert!(hud.contains("Vehicles: 1"));
    assert!(hud.contains("Auto-spawn: off"));

    let map = world.render_map();
    assert!(map.contains("|C........D|"));
}
