use glam::Vec3;

use crate::model::{Aabb, ShapeCast, StaticCollisionMesh, Triangle};

/// Radius of the avatar's collision sphere.
pub const PLAYER_RADIUS: f32 = 0.15;
/// Height of the sphere center above the avatar's feet.
pub const CENTER_OFFSET: f32 = 0.2;
/// Push-out passes per resolve; enough for interior corners to settle.
pub const RELAXATION_ITERATIONS: usize = 5;

/// Sphere-vs-mesh push-out for the third-person avatar.
///
/// Penalty based and stateless between frames. Push directions have their
/// vertical component removed so the avatar never gets lifted or sunk by
/// walls; this assumes box-like interiors rather than sloped terrain.
#[derive(Debug, Clone, Copy)]
pub struct CollisionResolver {
    pub radius: f32,
    pub center_offset: f32,
    pub iterations: usize,
}

impl Default for CollisionResolver {
    fn default() -> Self {
        Self {
            radius: PLAYER_RADIUS,
            center_offset: CENTER_OFFSET,
            iterations: RELAXATION_ITERATIONS,
        }
    }
}

impl CollisionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adjust `delta` in place so the sphere at `position + delta` stops penetrating `mesh`.
    pub fn resolve(&self, mesh: &StaticCollisionMesh, position: Vec3, delta: &mut Vec3) {
        let offset = Vec3::Y * self.center_offset;
        let current_center = position + offset;
        let mut push = SpherePush {
            center: current_center + *delta,
            radius: self.radius,
        };

        for _ in 0..self.iterations {
            mesh.shapecast(&mut push);
        }

        *delta = push.center - position - offset;
    }
}

/// Shapecast visitor moving its own sphere out of every triangle it touches.
struct SpherePush {
    center: Vec3,
    radius: f32,
}

impl ShapeCast for SpherePush {
    fn intersects_bounds(&self, bounds: &Aabb) -> bool {
        bounds.distance_to_point(self.center) < self.radius
    }

    fn intersects_triangle(&mut self, triangle: &Triangle) {
        let closest = triangle.closest_point(self.center);
        let distance = closest.distance(self.center);
        if distance >= self.radius {
            return;
        }
        // Center exactly on the surface has no push direction
        let Some(normal) = (self.center - closest).try_normalize() else {
            return;
        };
        let push = Vec3::new(normal.x, 0.0, normal.z);
        self.center += push * (self.radius - distance);
    }
}
