//! Spring-damped third-person camera rig.
//!
//! The rig orbits a point above the followed avatar. Mouse-look changes the
//! *target* angles, which the rendered angles chase with a dt-scaled blend.
//! The rendered radius is a mass-spring-damper pulled towards either the
//! user's desired radius or, when scene geometry blocks the view, a radius
//! just short of the obstruction.

use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::Arc;

use glam::{Vec2, Vec3};

use super::orbit_controls::spherical_to_cartesian;
use crate::model::{Camera, Ray, StaticCollisionMesh};

pub const TARGET_OFFSET: Vec3 = Vec3::new(0.0, 1.5, 0.0);
pub const LOOK_SENSITIVITY: f32 = 0.002;
pub const WHEEL_SENSITIVITY: f32 = 0.005;
pub const MIN_POLAR: f32 = 0.1;
pub const MAX_POLAR: f32 = PI - 0.1;
pub const MIN_RADIUS: f32 = 2.0;
pub const MAX_RADIUS: f32 = 20.0;
/// Rate of the exponential angle blend, per second.
pub const ANGLE_DAMPING: f32 = 25.0;
pub const SPRING_STIFFNESS: f32 = 100.0;
pub const SPRING_DAMPING: f32 = 20.0;
/// Gap kept between the camera and an occluding surface.
pub const OCCLUSION_MARGIN: f32 = 0.2;
/// Closest the camera gets to the target when occluded.
pub const MIN_OCCLUDED_RADIUS: f32 = 0.2;

#[derive(Debug, Clone)]
pub struct CameraRig {
    theta: f32,
    phi: f32,
    target_theta: f32,
    target_phi: f32,
    /// Radius the user asked for.
    radius: f32,
    current_radius: f32,
    radius_velocity: f32,
    pub target_offset: Vec3,
    collider: Option<Arc<StaticCollisionMesh>>,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            theta: 0.0,
            phi: FRAC_PI_2,
            target_theta: 0.0,
            target_phi: FRAC_PI_2,
            radius: 3.0,
            current_radius: 3.0,
            radius_velocity: 0.0,
            target_offset: TARGET_OFFSET,
            collider: None,
        }
    }
}

impl CameraRig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_collider(&mut self, collider: Arc<StaticCollisionMesh>) {
        self.collider = Some(collider);
    }

    pub fn theta(&self) -> f32 {
        self.theta
    }

    pub fn phi(&self) -> f32 {
        self.phi
    }

    pub fn target_angles(&self) -> (f32, f32) {
        (self.target_theta, self.target_phi)
    }

    pub fn desired_radius(&self) -> f32 {
        self.radius
    }

    pub fn current_radius(&self) -> f32 {
        self.current_radius
    }

    pub fn radius_velocity(&self) -> f32 {
        self.radius_velocity
    }

    /// Recompute angles and radius from the current camera pose around
    /// `followed`, so assigning a new target does not make the view jump.
    pub fn sync_with_camera(&mut self, camera: &Camera, followed: Vec3) {
        let offset = camera.eye - followed;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return;
        }
        self.radius = radius;
        self.current_radius = radius;
        self.radius_velocity = 0.0;
        self.theta = offset.x.atan2(offset.z);
        self.phi = (offset.y / radius).clamp(-1.0, 1.0).acos();
        self.target_theta = self.theta;
        self.target_phi = self.phi;
    }

    /// Mouse-look, in pixels of relative motion.
    pub fn look(&mut self, delta: Vec2) {
        self.target_theta -= delta.x * LOOK_SENSITIVITY;
        self.target_phi = (self.target_phi - delta.y * LOOK_SENSITIVITY).clamp(MIN_POLAR, MAX_POLAR);
    }

    pub fn zoom(&mut self, wheel_delta: f32) {
        self.radius = (self.radius + wheel_delta * WHEEL_SENSITIVITY).clamp(MIN_RADIUS, MAX_RADIUS);
    }

    /// Radius the spring pulls towards this frame: the desired radius, or
    /// the distance to the first obstruction minus a margin.
    pub fn occluded_radius(&self, target: Vec3) -> f32 {
        let Some(collider) = self.collider.as_deref() else {
            return self.radius;
        };
        let direction = spherical_to_cartesian(1.0, self.phi, self.theta);
        let Some(ray) = Ray::new(target, direction) else {
            return self.radius;
        };
        match collider.raycast(&ray, self.radius) {
            Some(hit) => (hit.distance - OCCLUSION_MARGIN).max(MIN_OCCLUDED_RADIUS),
            None => self.radius,
        }
    }

    /// Advance one frame and place `camera` looking at the followed point.
    pub fn update(&mut self, dt: f32, followed: Vec3, camera: &mut Camera) {
        let blend = 1.0 - (-ANGLE_DAMPING * dt).exp();
        self.theta += (self.target_theta - self.theta) * blend;
        self.phi += (self.target_phi - self.phi) * blend;

        let target = followed + self.target_offset;
        let target_radius = self.occluded_radius(target);
        self.step_spring(target_radius, dt);

        camera.eye = target + spherical_to_cartesian(self.current_radius, self.phi, self.theta);
        camera.set_look_at(target);
    }

    /// Explicit Euler step of the radius spring.
    pub fn step_spring(&mut self, target_radius: f32, dt: f32) {
        let force = -SPRING_STIFFNESS * (self.current_radius - target_radius) - SPRING_DAMPING * self.radius_velocity;
        self.radius_velocity += force * dt;
        self.current_radius += self.radius_velocity * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::scene::cuboid;

    #[test]
    fn spring_converges_to_desired_radius() {
        let mut rig = CameraRig::new();
        rig.zoom(1000.0); // desired 8
        let desired = rig.desired_radius();
        assert!((desired - 8.0).abs() < 1e-5);
        for _ in 0..2000 {
            rig.step_spring(desired, 1.0 / 240.0);
        }
        assert!((rig.current_radius() - desired).abs() < 1e-3);
        assert!(rig.radius_velocity().abs() < 1e-3);
    }

    #[test]
    fn look_clamps_polar_angle() {
        let mut rig = CameraRig::new();
        rig.look(Vec2::new(0.0, 10_000.0));
        assert_eq!(rig.target_angles().1, MIN_POLAR);
        rig.look(Vec2::new(0.0, -10_000.0));
        assert_eq!(rig.target_angles().1, MAX_POLAR);
        rig.look(Vec2::new(500.0, 0.0));
        assert!((rig.target_angles().0 + 1.0).abs() < 1e-6);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut rig = CameraRig::new();
        rig.zoom(-10_000.0);
        assert_eq!(rig.desired_radius(), MIN_RADIUS);
        rig.zoom(100_000.0);
        assert_eq!(rig.desired_radius(), MAX_RADIUS);
    }

    #[test]
    fn angles_blend_towards_target() {
        let mut rig = CameraRig::new();
        let mut camera = Camera::new(800, 600);
        rig.look(Vec2::new(-500.0, 0.0)); // target theta = 1
        rig.update(0.016, Vec3::ZERO, &mut camera);
        let expected = 1.0 - (-25.0f32 * 0.016).exp();
        assert!((rig.theta() - expected).abs() < 1e-5);
        for _ in 0..200 {
            rig.update(0.016, Vec3::ZERO, &mut camera);
        }
        assert!((rig.theta() - 1.0).abs() < 1e-4);
        // Always looking at the target point
        let to_target = (TARGET_OFFSET - camera.eye).normalize();
        assert!(camera.forward().distance(to_target) < 1e-3);
    }

    #[test]
    fn wall_behind_avatar_pulls_camera_in() {
        // Wall 1.5 m behind the target along +Z (theta = 0, phi = π/2 looks along +Z)
        let wall = cuboid(Vec3::new(-5.0, 0.0, 1.5), Vec3::new(5.0, 3.0, 1.7));
        let mut rig = CameraRig::new();
        rig.set_collider(Arc::new(StaticCollisionMesh::new(wall).unwrap()));

        let target = Vec3::ZERO + TARGET_OFFSET;
        assert!((rig.occluded_radius(target) - 1.3).abs() < 1e-4);

        let mut camera = Camera::new(800, 600);
        for _ in 0..600 {
            rig.update(1.0 / 120.0, Vec3::ZERO, &mut camera);
        }
        assert!((rig.current_radius() - 1.3).abs() < 1e-2);
        assert!(camera.eye.z < 1.5);
    }

    #[test]
    fn hugging_a_wall_keeps_minimum_radius() {
        let wall = cuboid(Vec3::new(-5.0, 0.0, 0.1), Vec3::new(5.0, 3.0, 0.3));
        let mut rig = CameraRig::new();
        rig.set_collider(Arc::new(StaticCollisionMesh::new(wall).unwrap()));
        assert_eq!(rig.occluded_radius(TARGET_OFFSET), MIN_OCCLUDED_RADIUS);
    }

    #[test]
    fn sync_reads_pose_around_followed_point() {
        let mut rig = CameraRig::new();
        let mut camera = Camera::new(800, 600);
        camera.eye = Vec3::new(3.0, 4.0, 0.0);
        rig.sync_with_camera(&camera, Vec3::ZERO);
        assert!((rig.desired_radius() - 5.0).abs() < 1e-5);
        assert!((rig.theta() - FRAC_PI_2).abs() < 1e-5);
        assert!((rig.phi() - (4.0f32 / 5.0).acos()).abs() < 1e-5);
        assert_eq!(rig.target_angles(), (rig.theta(), rig.phi()));
    }
}
