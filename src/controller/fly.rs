use glam::Vec3;

use super::input::MouseButton;
use super::navigation::{FrameContext, NavigationController, NavigationMode, SurfaceSize, Viewport};

/// Velocity decay rate, per second.
pub const FLY_DAMPING: f32 = 5.0;
pub const FLY_LOOK_SENSITIVITY: f32 = 0.002;

/// Free six-axis flight with mouse-look while the cursor is captured.
#[derive(Debug, Default)]
pub struct FlyController {
    velocity: Vec3,
    locked: bool,
}

impl FlyController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }
}

impl NavigationController for FlyController {
    fn mode(&self) -> NavigationMode {
        NavigationMode::Fly
    }

    fn enter(&mut self, viewport: &mut Viewport) {
        self.set_cursor_locked(true, viewport);
    }

    fn update(&mut self, frame: &mut FrameContext<'_>) {
        if !self.locked {
            if frame.input.is_mouse_button_down(MouseButton::Left) {
                self.set_cursor_locked(true, frame.viewport);
            }
            return;
        }

        let dt = frame.dt;
        let camera = &mut frame.viewport.camera;

        let look = frame.input.mouse_delta();
        camera.yaw += look.x * FLY_LOOK_SENSITIVITY;
        camera.pitch -= look.y * FLY_LOOK_SENSITIVITY;
        camera.look_along(camera.forward());

        self.velocity *= (-FLY_DAMPING * dt).exp();

        let intent = frame.input.fly_input(frame.bindings);
        if let Some(intent) = intent.try_normalize() {
            let forward = camera.forward();
            let right = forward.cross(Vec3::Y).normalize_or_zero();
            let mut direction = forward * intent.z + right * intent.x;
            direction.y += intent.y;
            if let Some(direction) = direction.try_normalize() {
                self.velocity += direction * frame.options.move_speed * dt;
            }
        }

        camera.eye += self.velocity * dt;
    }

    fn leave(&mut self, viewport: &mut Viewport) {
        self.set_cursor_locked(false, viewport);
    }

    fn rebind_surface(&mut self, _surface: SurfaceSize) {}

    fn set_cursor_locked(&mut self, locked: bool, viewport: &mut Viewport) {
        self.locked = locked;
        if locked {
            viewport.request_cursor_capture();
        } else {
            viewport.release_cursor();
        }
    }

    fn is_cursor_locked(&self) -> bool {
        self.locked
    }
}
