use std::sync::Arc;

use glam::{Quat, Vec3};
use tracing::{info, warn};

use super::fly::FlyController;
use super::input::{InputEvent, InputState};
use super::navigation::{
    CursorRequest, FrameContext, ModeSwitch, NavigationController, NavigationMode, SurfaceSize, Viewport,
};
use super::orbit::OrbitController;
use super::third_person::ThirdPersonController;
use super::top_view::TopViewController;
use crate::model::{AvatarState, Camera, DoorRegistry, SceneDescription, StaticCollisionMesh};
use crate::options::Options;

/// Upper bound on a single frame step, in seconds.
pub const MAX_FRAME_DT: f32 = 0.1;

/// Per-frame snapshot for UI mirroring.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationStatus {
    pub mode: NavigationMode,
    /// Door interaction prompt, only in third-person mode.
    pub prompt: Option<&'static str>,
    pub avatar_position: Option<Vec3>,
    pub avatar_orientation: Option<Quat>,
    pub camera_position: Vec3,
    pub camera_direction: Vec3,
}

/// Round to two decimals for display.
pub fn display_rounded(v: Vec3) -> Vec3 {
    (v * 100.0).round() / 100.0
}

/// Locomotion core: owns input, the mode switch, doors and the camera, and
/// runs them in a fixed order once per frame.
pub struct FrameLoop {
    pub input: InputState,
    pub options: Options,
    pub doors: DoorRegistry,
    viewport: Viewport,
    modes: ModeSwitch,
    collider: Option<Arc<StaticCollisionMesh>>,
    status: NavigationStatus,
}

/// One controller per navigation mode.
pub fn standard_controllers(surface: SurfaceSize) -> Vec<Box<dyn NavigationController>> {
    vec![
        Box::new(FlyController::new()),
        Box::new(OrbitController::new(surface)),
        Box::new(ThirdPersonController::new()),
        Box::new(TopViewController::new(surface)),
    ]
}

impl FrameLoop {
    pub fn new(options: Options, surface: SurfaceSize) -> Self {
        let mut camera = Camera::new(surface.width, surface.height);
        camera.fov_y = options.camera.fov_y_degrees.to_radians();
        camera.z_near = options.camera.z_near;
        camera.z_far = options.camera.z_far;
        camera.eye = options.camera.position();
        camera.set_look_at(Vec3::ZERO);
        let mut viewport = Viewport::new(camera, surface);

        let modes = ModeSwitch::new(standard_controllers(surface), options.navigation.initial_mode, &mut viewport);

        let status = NavigationStatus {
            mode: modes.mode(),
            prompt: None,
            avatar_position: None,
            avatar_orientation: None,
            camera_position: viewport.camera.eye,
            camera_direction: viewport.camera.forward(),
        };

        Self {
            input: InputState::new(),
            options,
            doors: DoorRegistry::new(),
            viewport,
            modes,
            collider: None,
            status,
        }
    }

    /// Register the scene's doors, build its collider and place the avatar.
    pub fn load_scene(&mut self, scene: &SceneDescription) {
        self.doors.clear();
        for node in scene.door_nodes() {
            self.doors.add_door(&node, &scene.clips);
        }
        info!(doors = self.doors.len(), triangles = scene.triangle_count(), "scene loaded");

        match StaticCollisionMesh::from_scene_meshes(&scene.meshes) {
            Some(mesh) => self.set_collider(Arc::new(mesh)),
            None => warn!("scene has no static collision geometry"),
        }
        self.set_character(AvatarState::new(scene.spawn));
    }

    /// Publish the static collider to every consumer.
    pub fn set_collider(&mut self, collider: Arc<StaticCollisionMesh>) {
        info!(triangles = collider.triangles().len(), "collider published");
        self.modes.set_collider(&collider);
        self.collider = Some(collider);
    }

    pub fn collider(&self) -> Option<&Arc<StaticCollisionMesh>> {
        self.collider.as_ref()
    }

    pub fn set_character(&mut self, avatar: AvatarState) {
        self.modes.set_character(avatar, &self.viewport.camera);
    }

    pub fn avatar(&self) -> Option<&AvatarState> {
        self.modes.controller(NavigationMode::ThirdPerson).and_then(|c| c.avatar())
    }

    pub fn mode(&self) -> NavigationMode {
        self.modes.mode()
    }

    pub fn set_mode(&mut self, mode: NavigationMode) -> bool {
        self.modes.set_mode(mode, &mut self.viewport)
    }

    pub fn set_pointer_locked(&mut self, locked: bool) {
        self.modes.set_pointer_locked(locked, &mut self.viewport);
    }

    pub fn is_pointer_locked(&self) -> bool {
        self.modes.active().is_cursor_locked()
    }

    pub fn set_orbit_target(&mut self, target: Vec3) {
        if let Some(orbit) = self.modes.controller_mut(NavigationMode::Orbit) {
            orbit.set_target(target);
        }
    }

    /// Feed a device event. The release-cursor key also drops capture.
    pub fn handle_event(&mut self, event: &InputEvent) {
        if let InputEvent::KeyDown(code) = event {
            if *code == self.options.keybindings.release_cursor {
                self.set_pointer_locked(false);
            }
        }
        self.input.process_event(event);
    }

    pub fn camera(&self) -> &Camera {
        &self.viewport.camera
    }

    pub fn set_camera_position(&mut self, position: Vec3) {
        self.viewport.camera.eye = position;
    }

    /// Look along `direction`. Ignored in orbit mode and for a zero vector.
    pub fn set_camera_direction(&mut self, direction: Vec3) {
        if self.mode() == NavigationMode::Orbit || direction.length_squared() == 0.0 {
            return;
        }
        self.viewport.camera.look_along(direction);
    }

    pub fn camera_direction(&self) -> Vec3 {
        self.viewport.camera.forward()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let surface = SurfaceSize::new(width, height);
        self.viewport.resize(surface);
        self.modes.rebind_surface(surface);
    }

    /// Pending cursor capture change for the platform layer.
    pub fn take_cursor_request(&mut self) -> Option<CursorRequest> {
        self.viewport.take_cursor_request()
    }

    pub fn status(&self) -> &NavigationStatus {
        &self.status
    }

    /// Run one frame: door animations, the active controller (which drives
    /// collision, door carving, commit and the camera rig), the status
    /// snapshot, then clearing of edge-triggered input.
    pub fn tick(&mut self, dt: f32) -> &NavigationStatus {
        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };

        self.doors.advance(dt);

        let mut frame = FrameContext {
            dt,
            input: &self.input,
            bindings: &self.options.keybindings,
            options: &self.options.navigation,
            viewport: &mut self.viewport,
            doors: &mut self.doors,
        };
        self.modes.update(&mut frame);

        self.refresh_status();
        self.input.update();
        &self.status
    }

    fn refresh_status(&mut self) {
        let mode = self.modes.mode();
        let avatar = self.avatar().copied();
        self.status = NavigationStatus {
            mode,
            prompt: if mode == NavigationMode::ThirdPerson { self.doors.prompt() } else { None },
            avatar_position: avatar.map(|a| a.position),
            avatar_orientation: avatar.map(|a| a.orientation),
            camera_position: self.viewport.camera.eye,
            camera_direction: self.viewport.camera.forward(),
        };
    }

    /// Leave the active mode and release every controller.
    pub fn dispose(&mut self) {
        self.modes.dispose(&mut self.viewport);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_loop(mode: NavigationMode) -> FrameLoop {
        let mut options = Options::default();
        options.navigation.initial_mode = mode;
        FrameLoop::new(options, SurfaceSize::new(800, 600))
    }

    #[test]
    fn starts_in_configured_mode_with_stored_camera() {
        let fl = frame_loop(NavigationMode::Orbit);
        assert_eq!(fl.mode(), NavigationMode::Orbit);
        assert_eq!(fl.camera().eye, Vec3::ONE);
        assert_eq!(fl.status().mode, NavigationMode::Orbit);
    }

    #[test]
    fn camera_direction_is_ignored_in_orbit_and_for_zero() {
        let mut fl = frame_loop(NavigationMode::Orbit);
        let before = fl.camera_direction();
        fl.set_camera_direction(Vec3::X);
        assert_eq!(fl.camera_direction(), before);

        fl.set_mode(NavigationMode::Fly);
        fl.set_camera_direction(Vec3::ZERO);
        assert_eq!(fl.camera_direction(), before);
        fl.set_camera_direction(Vec3::X);
        assert!(fl.camera_direction().distance(Vec3::X) < 1e-5);
    }

    #[test]
    fn oversized_steps_are_clamped() {
        let mut fl = frame_loop(NavigationMode::Fly);
        fl.handle_event(&InputEvent::KeyDown("KeyW".into()));
        fl.set_camera_direction(-Vec3::Z);
        let start = fl.camera().eye;
        fl.tick(10.0);
        // One 0.1 s step at move speed 20: velocity 2, displacement 0.2
        assert!((fl.camera().eye.distance(start) - 0.2).abs() < 1e-4);
    }

    #[test]
    fn release_key_drops_capture() {
        let mut fl = frame_loop(NavigationMode::Fly);
        assert!(fl.is_pointer_locked());
        assert_eq!(fl.take_cursor_request(), Some(CursorRequest::Capture));
        fl.handle_event(&InputEvent::KeyDown("Escape".into()));
        assert!(!fl.is_pointer_locked());
        assert_eq!(fl.take_cursor_request(), Some(CursorRequest::Release));
    }

    #[test]
    fn resize_keeps_capture_and_fly_keeps_moving() {
        let mut fl = frame_loop(NavigationMode::Fly);
        assert_eq!(fl.take_cursor_request(), Some(CursorRequest::Capture));

        fl.resize(1024, 768);
        assert!(fl.is_pointer_locked());
        assert_eq!(fl.take_cursor_request(), None);

        fl.set_camera_direction(-Vec3::Z);
        fl.handle_event(&InputEvent::KeyDown("KeyW".into()));
        let start = fl.camera().eye;
        for _ in 0..30 {
            fl.tick(1.0 / 60.0);
        }
        assert!(fl.camera().eye.z < start.z - 0.1, "{}", fl.camera().eye);
    }

    #[test]
    fn resize_keeps_third_person_capture() {
        let mut fl = frame_loop(NavigationMode::ThirdPerson);
        fl.set_pointer_locked(true);
        let _ = fl.take_cursor_request();
        fl.resize(1024, 768);
        assert!(fl.is_pointer_locked());
        assert_eq!(fl.take_cursor_request(), None);
    }

    #[test]
    fn edge_state_is_cleared_after_tick() {
        let mut fl = frame_loop(NavigationMode::Orbit);
        fl.handle_event(&InputEvent::KeyDown("KeyF".into()));
        assert!(fl.input.is_key_down("KeyF"));
        fl.tick(0.016);
        assert!(!fl.input.is_key_down("KeyF"));
        assert!(fl.input.is_key_pressed("KeyF"));
    }

    #[test]
    fn rounding_for_display() {
        assert_eq!(display_rounded(Vec3::new(1.234, -0.006, 2.0)), Vec3::new(1.23, -0.01, 2.0));
    }
}
