//! Boundary to whatever draws vehicles
//!
//! The simulation only pushes to the renderer; it never reads back.

use log::trace;

use super::types::{Rgb, WorldPos};

/// Opaque handle issued by a renderer for one vehicle visual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderHandle(pub u64);

/// Everything a renderer needs to create a vehicle visual
#[derive(Debug, Clone, Copy)]
pub struct VehicleVisual {
    pub position: WorldPos,
    pub rotation: f32,
    pub color: Rgb,
    pub width: f32,
    pub length: f32,
}

pub trait VehicleRenderer {
    fn create(&mut self, visual: &VehicleVisual) -> RenderHandle;
    fn update(&mut self, handle: RenderHandle, position: WorldPos, rotation: f32);
    fn destroy(&mut self, handle: RenderHandle);
}

/// Renderer for headless runs: hands out handles and tracks how many are live
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    next_handle: u64,
    live: usize,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live
    }
}

impl VehicleRenderer for HeadlessRenderer {
    fn create(&mut self, visual: &VehicleVisual) -> RenderHandle {
        let handle = RenderHandle(self.next_handle);
        self.next_handle += 1;
        self.live += 1;
        trace!(
            "create {:?} at ({:.1}, {:.1})",
            handle,
            visual.position.x,
            visual.position.y
        );
        handle
    }

    fn update(&mut self, _handle: RenderHandle, _position: WorldPos, _rotation: f32) {}

    fn destroy(&mut self, handle: RenderHandle) {
        self.live = self.live.saturating_sub(1);
        trace!("destroy {:?}", handle);
    }
}
