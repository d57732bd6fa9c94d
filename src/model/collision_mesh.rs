//! Static collision geometry: an immutable triangle soup indexed by a
//! bounding volume hierarchy.
//!
//! The mesh is built once after scene geometry is available and then only
//! ever read, by the avatar collision resolver and by the follow camera's
//! occlusion probe in the same frame. Consumers hold it behind an `Arc`.

use glam::Vec3;
use tracing::info;

use super::geometry::{Aabb, Ray, Triangle};
use super::scene::SceneMesh;

/// Maximum number of triangles stored in a leaf.
const LEAF_SIZE: usize = 4;

/// Node of the hierarchy. Leaves index into the mesh's triangle list.
#[derive(Debug, Clone)]
pub enum BvhNode {
    Leaf {
        bounds: Aabb,
        triangles: Vec<u32>,
    },
    Internal {
        bounds: Aabb,
        left: Box<BvhNode>,
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    pub fn bounds(&self) -> &Aabb {
        match self {
            BvhNode::Leaf { bounds, .. } => bounds,
            BvhNode::Internal { bounds, .. } => bounds,
        }
    }

    fn count(&self) -> usize {
        match self {
            BvhNode::Leaf { .. } => 1,
            BvhNode::Internal { left, right, .. } => 1 + left.count() + right.count(),
        }
    }
}

/// Visitor driven by [`StaticCollisionMesh::shapecast`].
///
/// Bounds are asked first; subtrees whose bounds are rejected are skipped
/// entirely. A visitor may change its own query shape while visiting
/// triangles, later bounds tests see the updated shape.
pub trait ShapeCast {
    fn intersects_bounds(&self, bounds: &Aabb) -> bool;
    fn intersects_triangle(&mut self, triangle: &Triangle);
}

/// Nearest ray hit against the mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub distance: f32,
    pub point: Vec3,
    pub triangle: u32,
}

/// Immutable triangle soup with a precomputed BVH.
#[derive(Debug, Clone)]
pub struct StaticCollisionMesh {
    triangles: Vec<Triangle>,
    root: BvhNode,
}

impl StaticCollisionMesh {
    /// Build the hierarchy over `triangles`. `None` for an empty soup.
    pub fn new(triangles: Vec<Triangle>) -> Option<Self> {
        if triangles.is_empty() {
            return None;
        }
        let indices: Vec<u32> = (0..triangles.len() as u32).collect();
        let root = Self::build_recursive(&triangles, indices);
        let mesh = Self { triangles, root };
        info!(
            triangles = mesh.triangles.len(),
            nodes = mesh.root.count(),
            "built static collision mesh"
        );
        Some(mesh)
    }

    /// Merge scene meshes into one world-space soup.
    ///
    /// Door leaves (any mesh below a node named `Door`) and glass panes
    /// (mesh name ends in `Glass`) are not part of the static collider:
    /// doors collide through the door registry, glass is walk-through.
    pub fn from_scene_meshes(meshes: &[SceneMesh]) -> Option<Self> {
        let mut triangles = Vec::new();
        for mesh in meshes {
            if mesh.has_ancestor("Door") || mesh.name.ends_with("Glass") {
                continue;
            }
            triangles.extend(mesh.world_triangles());
        }
        Self::new(triangles)
    }

    fn build_recursive(triangles: &[Triangle], mut indices: Vec<u32>) -> BvhNode {
        let mut bounds = Aabb::EMPTY;
        for &i in &indices {
            bounds.expand(&triangles[i as usize].bounds());
        }

        if indices.len() <= LEAF_SIZE {
            return BvhNode::Leaf { bounds, triangles: indices };
        }

        // Median split along the axis where centroids are most spread out
        let mut centroid_bounds = Aabb::EMPTY;
        for &i in &indices {
            centroid_bounds.expand_point(triangles[i as usize].centroid());
        }
        let extent = centroid_bounds.size();
        let axis = if extent.x >= extent.y && extent.x >= extent.z {
            0
        } else if extent.y >= extent.z {
            1
        } else {
            2
        };

        indices.sort_by(|&a, &b| {
            let ca = triangles[a as usize].centroid()[axis];
            let cb = triangles[b as usize].centroid()[axis];
            ca.total_cmp(&cb)
        });

        let right_indices = indices.split_off(indices.len() / 2);
        let left = Self::build_recursive(triangles, indices);
        let right = Self::build_recursive(triangles, right_indices);

        BvhNode::Internal {
            bounds,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn root(&self) -> &BvhNode {
        &self.root
    }

    pub fn bounds(&self) -> &Aabb {
        self.root.bounds()
    }

    /// Depth-first traversal, pruning by `visitor.intersects_bounds`.
    pub fn shapecast<V: ShapeCast>(&self, visitor: &mut V) {
        let mut stack: Vec<&BvhNode> = vec![&self.root];
        while let Some(node) = stack.pop() {
            if !visitor.intersects_bounds(node.bounds()) {
                continue;
            }
            match node {
                BvhNode::Leaf { triangles, .. } => {
                    for &i in triangles {
                        visitor.intersects_triangle(&self.triangles[i as usize]);
                    }
                }
                BvhNode::Internal { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
    }

    /// Closest triangle hit along `ray` no farther than `max_distance`.
    pub fn raycast(&self, ray: &Ray, max_distance: f32) -> Option<RayHit> {
        let mut best: Option<RayHit> = None;
        let mut stack: Vec<&BvhNode> = vec![&self.root];
        while let Some(node) = stack.pop() {
            let limit = best.map_or(max_distance, |hit| hit.distance);
            if node.bounds().ray_entry(ray, limit).is_none() {
                continue;
            }
            match node {
                BvhNode::Leaf { triangles, .. } => {
                    for &i in triangles {
                        let Some(t) = self.triangles[i as usize].ray_intersection(ray) else {
                            continue;
                        };
                        let limit = best.map_or(max_distance, |hit| hit.distance);
                        if t <= limit {
                            best = Some(RayHit { distance: t, point: ray.at(t), triangle: i });
                        }
                    }
                }
                BvhNode::Internal { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    /// Unit quads tiled along X, `count` of them, each as two triangles at z = 0.
    fn wall_strip(count: usize) -> Vec<Triangle> {
        let mut tris = Vec::new();
        for i in 0..count {
            let x = i as f32;
            let (p0, p1, p2, p3) = (
                Vec3::new(x, 0.0, 0.0),
                Vec3::new(x + 1.0, 0.0, 0.0),
                Vec3::new(x + 1.0, 1.0, 0.0),
                Vec3::new(x, 1.0, 0.0),
            );
            tris.push(Triangle::new(p0, p1, p2));
            tris.push(Triangle::new(p0, p2, p3));
        }
        tris
    }

    struct CountNear {
        center: Vec3,
        radius: f32,
        hits: usize,
    }

    impl ShapeCast for CountNear {
        fn intersects_bounds(&self, bounds: &Aabb) -> bool {
            bounds.distance_to_point(self.center) < self.radius
        }
        fn intersects_triangle(&mut self, triangle: &Triangle) {
            if triangle.closest_point(self.center).distance(self.center) < self.radius {
                self.hits += 1;
            }
        }
    }

    #[test]
    fn empty_soup_has_no_mesh() {
        assert!(StaticCollisionMesh::new(Vec::new()).is_none());
    }

    #[test]
    fn shapecast_matches_brute_force() {
        let mesh = StaticCollisionMesh::new(wall_strip(32)).unwrap();
        assert!(matches!(mesh.root(), BvhNode::Internal { .. }));

        for probe in [Vec3::new(3.5, 0.5, 0.1), Vec3::new(10.0, 0.5, 0.05), Vec3::new(40.0, 0.5, 0.0)] {
            let mut visitor = CountNear { center: probe, radius: 0.3, hits: 0 };
            mesh.shapecast(&mut visitor);
            let brute = mesh
                .triangles()
                .iter()
                .filter(|t| t.closest_point(probe).distance(probe) < 0.3)
                .count();
            assert_eq!(visitor.hits, brute);
        }
    }

    #[test]
    fn raycast_returns_nearest_hit() {
        let mut tris = wall_strip(4);
        // Second wall further along +Z
        tris.extend(wall_strip(4).iter().map(|t| t.transformed(&Mat4::from_translation(Vec3::Z * 3.0))));
        let mesh = StaticCollisionMesh::new(tris).unwrap();

        let ray = Ray::new(Vec3::new(1.3, 0.6, -2.0), Vec3::Z).unwrap();
        let hit = mesh.raycast(&ray, 10.0).unwrap();
        assert!((hit.distance - 2.0).abs() < 1e-5);

        assert!(mesh.raycast(&ray, 1.5).is_none());
    }

    #[test]
    fn doors_and_glass_are_left_out() {
        let quad = |name: &str, path: &[&str]| SceneMesh {
            name: name.to_string(),
            ancestors: path.iter().map(|s| s.to_string()).collect(),
            transform: Mat4::IDENTITY,
            triangles: wall_strip(1),
        };
        let meshes = vec![
            quad("Wall", &["House"]),
            quad("KitchenDoor", &["House", "Door"]),
            quad("WindowGlass", &["House"]),
        ];
        let mesh = StaticCollisionMesh::from_scene_meshes(&meshes).unwrap();
        assert_eq!(mesh.triangles().len(), 2);

        let only_doors = vec![quad("FrontDoor", &["Door"])];
        assert!(StaticCollisionMesh::from_scene_meshes(&only_doors).is_none());
    }
}
