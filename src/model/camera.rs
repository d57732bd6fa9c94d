use glam::{Mat4, Quat, Vec3};

/// Pitch limit, slightly less than π/2 to keep `look_at` away from the up-vector singularity.
pub const MAX_PITCH: f32 = 1.5533;

/// Rendered camera pose plus projection parameters.
///
/// Controllers write the pose; the renderer only reads it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        let mut camera = Self {
            eye: Vec3::ONE,
            yaw: 0.0,
            pitch: 0.0,
            up: Vec3::Y,
            fov_y: 45f32.to_radians(),
            aspect: 1.0,
            z_near: 0.1,
            z_far: 3000.0,
        };
        camera.set_aspect(width, height);
        camera.set_look_at(Vec3::ZERO);
        camera
    }

    pub fn forward(&self) -> Vec3 {
        let cy = self.yaw;
        let cp = self.pitch.clamp(-MAX_PITCH, MAX_PITCH);
        Vec3::new(cy.cos() * cp.cos(), cp.sin(), cy.sin() * cp.cos()).normalize()
    }

    /// Horizontal right vector, `forward × up`.
    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize_or_zero()
    }

    pub fn target(&self) -> Vec3 {
        self.eye + self.forward()
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target(), self.up)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Turn to face `target`. Ignored when `target` coincides with the eye.
    pub fn set_look_at(&mut self, target: Vec3) {
        self.look_along(target - self.eye);
    }

    /// Turn to face along `direction`. Ignored for a zero-length direction.
    pub fn look_along(&mut self, direction: Vec3) {
        let Some(dir) = direction.try_normalize() else {
            return;
        };
        // Straight up or down: heading is undefined, keep the current one
        if dir.x.abs() > 1e-6 || dir.z.abs() > 1e-6 {
            self.yaw = dir.z.atan2(dir.x);
        }
        self.pitch = dir.y.clamp(-1.0, 1.0).asin().clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// World orientation of the camera, looking down its local -Z.
    pub fn orientation(&self) -> Quat {
        Quat::from_mat4(&self.view().inverse())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_at_points_forward_at_target() {
        let mut camera = Camera::new(800, 600);
        camera.eye = Vec3::new(0.0, 2.0, 5.0);
        camera.set_look_at(Vec3::new(0.0, 2.0, 0.0));
        assert!(camera.forward().distance(-Vec3::Z) < 1e-5);
        assert!(camera.right().distance(Vec3::X) < 1e-5);
    }

    #[test]
    fn pitch_is_clamped_short_of_vertical() {
        let mut camera = Camera::new(800, 600);
        camera.look_along(-Vec3::Y);
        assert!(camera.pitch >= -MAX_PITCH);
        assert!(camera.forward().y < -0.99);
    }

    #[test]
    fn zero_direction_keeps_pose() {
        let mut camera = Camera::new(800, 600);
        let before = camera;
        camera.look_along(Vec3::ZERO);
        camera.set_look_at(camera.eye);
        assert_eq!(camera, before);
    }

    #[test]
    fn orientation_maps_minus_z_onto_forward() {
        let mut camera = Camera::new(800, 600);
        camera.look_along(Vec3::new(1.0, -0.5, 0.3));
        let looked = camera.orientation() * -Vec3::Z;
        assert!(looked.distance(camera.forward()) < 1e-4);
    }
}
