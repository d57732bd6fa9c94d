use glam::Vec3;

use super::navigation::{FrameContext, NavigationController, NavigationMode, SurfaceSize, Viewport};
use super::orbit_controls::OrbitControls;

/// Orbit around a pivot with damped rotate, pan and zoom.
pub struct OrbitController {
    controls: OrbitControls,
    surface: SurfaceSize,
}

impl OrbitController {
    pub fn new(surface: SurfaceSize) -> Self {
        Self {
            controls: OrbitControls::new(),
            surface,
        }
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }
}

impl NavigationController for OrbitController {
    fn mode(&self) -> NavigationMode {
        NavigationMode::Orbit
    }

    fn enter(&mut self, _viewport: &mut Viewport) {
        self.controls.enabled = true;
    }

    fn update(&mut self, frame: &mut FrameContext<'_>) {
        let camera = &mut frame.viewport.camera;
        self.controls.handle_input(frame.input, camera, self.surface.height as f32);
        self.controls.update(camera);
    }

    fn leave(&mut self, _viewport: &mut Viewport) {
        self.controls.enabled = false;
        self.controls.stop();
    }

    fn rebind_surface(&mut self, surface: SurfaceSize) {
        self.surface = surface;
    }

    fn set_target(&mut self, target: Vec3) {
        self.controls.target = target;
    }
}
