//! Third-person avatar locomotion.
//!
//! Per frame: read planar intent relative to the camera, accelerate and
//! turn the avatar, apply friction, push the motion delta out of static
//! geometry and closed doors, commit it, then update the camera rig and the
//! door proximity scan.

use std::sync::Arc;

use glam::Quat;
use tracing::info;

use super::follow_camera::CameraRig;
use super::input::MouseButton;
use super::navigation::{FrameContext, NavigationController, NavigationMode, SurfaceSize, Viewport};
use super::physics::{CollisionResolver, PLAYER_RADIUS};
use crate::model::{AvatarState, Camera, StaticCollisionMesh};

/// Velocity decay rate, per second.
pub const FRICTION: f32 = 4.0;
/// Fraction of the way the avatar turns toward its heading each frame.
pub const TURN_BLEND: f32 = 0.2;

pub struct ThirdPersonController {
    avatar: Option<AvatarState>,
    rig: CameraRig,
    resolver: CollisionResolver,
    collider: Option<Arc<StaticCollisionMesh>>,
    locked: bool,
}

impl Default for ThirdPersonController {
    fn default() -> Self {
        Self::new()
    }
}

impl ThirdPersonController {
    pub fn new() -> Self {
        Self {
            avatar: None,
            rig: CameraRig::new(),
            resolver: CollisionResolver::new(),
            collider: None,
            locked: false,
        }
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    fn handle_input(&mut self, frame: &mut FrameContext<'_>) {
        let input = frame.input;

        if !self.locked && input.is_mouse_button_down(MouseButton::Left) {
            self.set_cursor_locked(true, frame.viewport);
        }
        if self.locked {
            self.rig.look(input.mouse_delta());
            self.rig.zoom(input.wheel_delta());
        }

        let Some(avatar) = self.avatar.as_mut() else {
            return;
        };

        if input.is_key_down(&frame.bindings.interact) {
            frame.doors.interact();
        }

        let camera = &frame.viewport.camera;
        let mut forward = camera.forward();
        forward.y = 0.0;
        let forward = forward.normalize_or_zero();
        let right = forward.cross(camera.up).normalize_or_zero();

        let intent = input.movement_input(frame.bindings);
        let direction = forward * intent.z + right * intent.x;
        if let Some(direction) = direction.try_normalize() {
            avatar.velocity += direction * frame.options.move_speed * frame.dt;

            let heading = Quat::from_rotation_y(direction.x.atan2(direction.z));
            // Per-frame blend, so turning speed follows the frame rate
            avatar.orientation = avatar.orientation.slerp(heading, TURN_BLEND).normalize();
        }
    }

    fn update_avatar(&mut self, frame: &mut FrameContext<'_>) {
        let Some(avatar) = self.avatar.as_mut() else {
            return;
        };
        let dt = frame.dt;

        avatar.velocity += avatar.velocity * ((-FRICTION * dt).exp() - 1.0);
        let mut delta = avatar.velocity * dt;

        if frame.options.collision_enabled {
            if let Some(collider) = self.collider.as_deref() {
                self.resolver.resolve(collider, avatar.position, &mut delta);
                frame.doors.carve(avatar.position, PLAYER_RADIUS, &mut delta);
            }
        }

        avatar.position += delta;
    }
}

impl NavigationController for ThirdPersonController {
    fn mode(&self) -> NavigationMode {
        NavigationMode::ThirdPerson
    }

    fn enter(&mut self, viewport: &mut Viewport) {
        if let Some(avatar) = &self.avatar {
            self.rig.sync_with_camera(&viewport.camera, avatar.position);
        }
    }

    fn update(&mut self, frame: &mut FrameContext<'_>) {
        self.handle_input(frame);
        self.update_avatar(frame);

        let Some(avatar) = &self.avatar else {
            return;
        };
        self.rig.update(frame.dt, avatar.position, &mut frame.viewport.camera);
        frame.doors.update(avatar.position);
    }

    fn leave(&mut self, viewport: &mut Viewport) {
        self.set_cursor_locked(false, viewport);
    }

    fn rebind_surface(&mut self, _surface: SurfaceSize) {}

    fn set_collider(&mut self, collider: Arc<StaticCollisionMesh>) {
        self.rig.set_collider(Arc::clone(&collider));
        self.collider = Some(collider);
    }

    fn set_character(&mut self, avatar: AvatarState, camera: &Camera) {
        info!(position = %avatar.position, "character assigned");
        self.rig.sync_with_camera(camera, avatar.position);
        self.avatar = Some(avatar);
    }

    fn avatar(&self) -> Option<&AvatarState> {
        self.avatar.as_ref()
    }

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
