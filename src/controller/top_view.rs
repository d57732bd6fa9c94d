use std::f32::consts::PI;

use glam::Vec3;

use super::navigation::{FrameContext, NavigationController, NavigationMode, SurfaceSize, Viewport};
use super::orbit_controls::OrbitControls;

/// Length of the fly-over into the overhead view, in seconds.
pub const TRANSITION_DURATION: f32 = 1.0;
/// Where the camera ends up.
pub const OVERHEAD_POSITION: Vec3 = Vec3::new(0.0, 20.0, 0.0);
/// Polar limit of a controller that has not been entered yet.
pub const IDLE_MAX_POLAR: f32 = 0.01;
/// Polar limit once the overhead view is reached.
pub const LOCKED_MAX_POLAR: f32 = 0.1;

/// Cubic smoothstep, `3p² - 2p³`.
pub fn smoothstep(p: f32) -> f32 {
    let p = p.clamp(0.0, 1.0);
    3.0 * p * p - 2.0 * p * p * p
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    elapsed: f32,
    start_position: Vec3,
    start_target: Vec3,
    end_target: Vec3,
}

/// Locked top-down view reached through an eased transition.
///
/// Orbit input is ignored until the transition finishes; afterwards the
/// polar angle stays near vertical while panning and zoom remain available.
pub struct TopViewController {
    controls: OrbitControls,
    surface: SurfaceSize,
    transition: Option<Transition>,
}

impl TopViewController {
    pub fn new(surface: SurfaceSize) -> Self {
        let mut controls = OrbitControls::new();
        controls.max_polar_angle = IDLE_MAX_POLAR;
        Self { controls, surface, transition: None }
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    fn advance_transition(&mut self, dt: f32, viewport: &mut Viewport) {
        let Some(transition) = self.transition.as_mut() else {
            return;
        };
        transition.elapsed += dt;
        let progress = (transition.elapsed / TRANSITION_DURATION).min(1.0);
        let ease = smoothstep(progress);

        let camera = &mut viewport.camera;
        camera.eye = transition.start_position.lerp(OVERHEAD_POSITION, ease);
        self.controls.target = transition.start_target.lerp(transition.end_target, ease);
        camera.set_look_at(self.controls.target);

        if progress >= 1.0 {
            self.transition = None;
            self.controls.min_polar_angle = 0.0;
            self.controls.max_polar_angle = LOCKED_MAX_POLAR;
        }
    }
}

impl NavigationController for TopViewController {
    fn mode(&self) -> NavigationMode {
        NavigationMode::TopView
    }

    fn enter(&mut self, viewport: &mut Viewport) {
        self.controls.enabled = true;
        self.controls.stop();

        let camera = &viewport.camera;
        let direction = camera.forward();
        self.transition = Some(Transition {
            elapsed: 0.0,
            start_position: camera.eye,
            start_target: camera.eye + direction,
            end_target: Vec3::new(direction.x, 0.0, direction.z),
        });
        self.controls.min_polar_angle = 0.0;
        self.controls.max_polar_angle = PI;
    }

    fn update(&mut self, frame: &mut FrameContext<'_>) {
        if self.transition.is_some() {
            self.advance_transition(frame.dt, frame.viewport);
            return;
        }
        let camera = &mut frame.viewport.camera;
        self.controls.handle_input(frame.input, camera, self.surface.height as f32);
        self.controls.update(camera);
    }

    fn leave(&mut self, _viewport: &mut Viewport) {
        self.controls.enabled = false;
        self.controls.stop();
        self.transition = None;
    }

    fn rebind_surface(&mut self, surface: SurfaceSize) {
        self.surface = surface;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::input::{InputState, KeyBindings};
    use crate::model::{Camera, DoorRegistry};
    use crate::options::NavigationOptions;

    fn run(top: &mut TopViewController, viewport: &mut Viewport, dt: f32) {
        let input = InputState::new();
        let bindings = KeyBindings::default();
        let options = NavigationOptions::default();
        let mut doors = DoorRegistry::new();
        top.update(&mut FrameContext {
            dt,
            input: &input,
            bindings: &bindings,
            options: &options,
            viewport,
            doors: &mut doors,
        });
    }

    #[test]
    fn smoothstep_endpoints_and_midpoint() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(1.0), 1.0);
        assert_eq!(smoothstep(0.5), 0.5);
        assert_eq!(smoothstep(2.0), 1.0);
    }

    #[test]
    fn new_controller_is_idle_and_near_vertical() {
        let top = TopViewController::new(SurfaceSize::new(640, 480));
        assert!(!top.is_animating());
        assert!(!top.controls().enabled);
        assert_eq!(top.controls().max_polar_angle, IDLE_MAX_POLAR);
        assert_eq!(top.controls().min_polar_angle, 0.0);
    }

    #[test]
    fn transition_ends_overhead_and_locks_polar() {
        let mut camera = Camera::new(800, 600);
        camera.eye = Vec3::new(4.0, 1.5, 4.0);
        camera.look_along(Vec3::new(-1.0, 0.0, 0.0));
        let mut viewport = Viewport::new(camera, SurfaceSize::new(800, 600));

        let mut top = TopViewController::new(viewport.surface);
        top.enter(&mut viewport);
        assert!(top.is_animating());
        assert_eq!(top.controls().max_polar_angle, PI);

        run(&mut top, &mut viewport, 0.5);
        let halfway = viewport.camera.eye;
        assert!(halfway.distance(Vec3::new(4.0, 1.5, 4.0).lerp(OVERHEAD_POSITION, 0.5)) < 1e-4);
        assert!(top.is_animating());

        run(&mut top, &mut viewport, 0.6);
        assert!(!top.is_animating());
        assert!(viewport.camera.eye.distance(OVERHEAD_POSITION) < 1e-4);
        assert!(top.controls().target.distance(Vec3::new(-1.0, 0.0, 0.0)) < 1e-4);
        assert_eq!(top.controls().max_polar_angle, LOCKED_MAX_POLAR);

        // Settled orbit updates stay within the locked polar range
        run(&mut top, &mut viewport, 0.016);
        let offset = viewport.camera.eye - top.controls().target;
        assert!((offset.y / offset.length()).acos() <= LOCKED_MAX_POLAR + 1e-4);
    }

    #[test]
    fn leaving_mid_transition_cancels_it() {
        let mut viewport = Viewport::new(Camera::new(800, 600), SurfaceSize::new(800, 600));
        let mut top = TopViewController::new(viewport.surface);
        top.enter(&mut viewport);
        run(&mut top, &mut viewport, 0.2);
        top.leave(&mut viewport);
        assert!(!top.is_animating());
        assert!(!top.controls().enabled);
    }
}
