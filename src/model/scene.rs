//! Flattened scene content: named meshes with their node path, door nodes
//! and animation clips, plus the built-in demo house.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};

use super::animation::AnimationClip;
use super::door::open_clip_name;
use super::geometry::{Aabb, Triangle};

/// Name of the container node whose children are interactable doors.
pub const DOOR_CONTAINER: &str = "Door";

/// One mesh of the scene graph with triangles in its local space.
#[derive(Debug, Clone)]
pub struct SceneMesh {
    pub name: String,
    /// Node names from the scene root down to the mesh's parent.
    pub ancestors: Vec<String>,
    pub transform: Mat4,
    pub triangles: Vec<Triangle>,
}

impl SceneMesh {
    pub fn has_ancestor(&self, name: &str) -> bool {
        self.ancestors.iter().any(|a| a == name)
    }

    pub fn parent(&self) -> Option<&str> {
        self.ancestors.last().map(String::as_str)
    }

    pub fn world_triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.triangles.iter().map(|t| t.transformed(&self.transform))
    }

    pub fn local_bounds(&self) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for t in &self.triangles {
            bounds.expand(&t.bounds());
        }
        bounds
    }
}

/// A direct child of the door container.
#[derive(Debug, Clone, PartialEq)]
pub struct DoorNode {
    pub name: String,
    /// Rest transform; the hinge sits at the local origin.
    pub transform: Mat4,
    pub local_bounds: Aabb,
}

#[derive(Debug, Clone, Default)]
pub struct SceneDescription {
    pub meshes: Vec<SceneMesh>,
    pub clips: Vec<AnimationClip>,
    /// Where the third-person avatar is placed on load.
    pub spawn: Vec3,
}

impl SceneDescription {
    pub fn door_nodes(&self) -> Vec<DoorNode> {
        self.meshes
            .iter()
            .filter(|m| m.parent() == Some(DOOR_CONTAINER))
            .map(|m| DoorNode {
                name: m.name.clone(),
                transform: m.transform,
                local_bounds: m.local_bounds(),
            })
            .collect()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.triangles.len()).sum()
    }

    /// Two-room house: 12 x 10 m footprint, a front door in the south
    /// wall, a hall door in the dividing wall, a clipless pantry door and
    /// a glazed window on the east side.
    pub fn demo_house() -> Self {
        let mut meshes = Vec::new();
        let mut push = |name: &str, path: &[&str], transform: Mat4, triangles: Vec<Triangle>| {
            meshes.push(SceneMesh {
                name: name.to_string(),
                ancestors: path.iter().map(|s| s.to_string()).collect(),
                transform,
                triangles,
            });
        };
        let house = ["House"];
        let id = Mat4::IDENTITY;
        let (h, t) = (2.6, 0.2);

        push("Floor", &house, id, cuboid(Vec3::new(-6.0, -0.1, -5.0), Vec3::new(6.0, 0.0, 5.0)));

        push("NorthWall", &house, id, cuboid(Vec3::new(-6.0, 0.0, -5.0), Vec3::new(6.0, h, -5.0 + t)));
        push("WestWall", &house, id, cuboid(Vec3::new(-6.0, 0.0, -4.8), Vec3::new(-6.0 + t, h, 4.8)));

        // South wall with the front door gap at x in [-3.5, -2.5]
        push("SouthWallWest", &house, id, cuboid(Vec3::new(-6.0, 0.0, 5.0 - t), Vec3::new(-3.5, h, 5.0)));
        push("SouthWallEast", &house, id, cuboid(Vec3::new(-2.5, 0.0, 5.0 - t), Vec3::new(6.0, h, 5.0)));
        push("SouthLintel", &house, id, cuboid(Vec3::new(-3.5, 2.2, 5.0 - t), Vec3::new(-2.5, h, 5.0)));

        // East wall with a window opening at z in [-1, 1], y in [0.9, 2.0]
        push("EastWallNorth", &house, id, cuboid(Vec3::new(6.0 - t, 0.0, -4.8), Vec3::new(6.0, h, -1.0)));
        push("EastWallSouth", &house, id, cuboid(Vec3::new(6.0 - t, 0.0, 1.0), Vec3::new(6.0, h, 4.8)));
        push("EastSill", &house, id, cuboid(Vec3::new(6.0 - t, 0.0, -1.0), Vec3::new(6.0, 0.9, 1.0)));
        push("EastHeader", &house, id, cuboid(Vec3::new(6.0 - t, 2.0, -1.0), Vec3::new(6.0, h, 1.0)));
        push("WindowGlass", &house, id, cuboid(Vec3::new(5.88, 0.9, -1.0), Vec3::new(5.92, 2.0, 1.0)));

        // Dividing wall with the hall doorway at z in [-0.5, 0.5]
        push("InnerWallNorth", &house, id, cuboid(Vec3::new(-0.1, 0.0, -4.8), Vec3::new(0.1, h, -0.5)));
        push("InnerWallSouth", &house, id, cuboid(Vec3::new(-0.1, 0.0, 0.5), Vec3::new(0.1, h, 4.8)));
        push("InnerLintel", &house, id, cuboid(Vec3::new(-0.1, 2.2, -0.5), Vec3::new(0.1, h, 0.5)));

        // Door leaves span +X from the hinge at their local origin
        let leaf = || cuboid(Vec3::new(0.0, 0.0, -0.04), Vec3::new(1.0, 2.1, 0.04));
        let doors = ["House", DOOR_CONTAINER];
        push("FrontDoor", &doors, Mat4::from_translation(Vec3::new(-3.5, 0.0, 4.9)), leaf());
        push(
            "HallDoor",
            &doors,
            Mat4::from_translation(Vec3::new(0.0, 0.0, -0.5)) * Mat4::from_rotation_y(-FRAC_PI_2),
            leaf(),
        );
        push("PantryDoor", &doors, Mat4::from_translation(Vec3::new(3.0, 0.0, -4.7)), leaf());

        let clips = vec![
            AnimationClip::swing(open_clip_name("FrontDoor"), -FRAC_PI_2, 1.0),
            AnimationClip::swing(open_clip_name("HallDoor"), -FRAC_PI_2, 1.0),
        ];

        Self {
            meshes,
            clips,
            spawn: Vec3::new(-3.0, 0.0, 2.0),
        }
    }
}

/// Closed box as 12 triangles.
pub fn cuboid(min: Vec3, max: Vec3) -> Vec<Triangle> {
    let c = |x: f32, y: f32, z: f32| Vec3::new(x, y, z);
    let (a, b) = (min, max);
    let corners = [
        c(a.x, a.y, a.z),
        c(b.x, a.y, a.z),
        c(b.x, b.y, a.z),
        c(a.x, b.y, a.z),
        c(a.x, a.y, b.z),
        c(b.x, a.y, b.z),
        c(b.x, b.y, b.z),
        c(a.x, b.y, b.z),
    ];
    const FACES: [[usize; 4]; 6] = [
        [0, 3, 2, 1], // -Z
        [4, 5, 6, 7], // +Z
        [0, 4, 7, 3], // -X
        [1, 2, 6, 5], // +X
        [0, 1, 5, 4], // -Y
        [3, 7, 6, 2], // +Y
    ];
    let mut triangles = Vec::with_capacity(12);
    for [i, j, k, l] in FACES {
        triangles.push(Triangle::new(corners[i], corners[j], corners[k]));
        triangles.push(Triangle::new(corners[i], corners[k], corners[l]));
    }
    triangles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuboid_is_closed_box() {
        let tris = cuboid(Vec3::ZERO, Vec3::new(2.0, 1.0, 3.0));
        assert_eq!(tris.len(), 12);
        let bounds = Aabb::from_points(tris.iter().flat_map(|t| [t.a, t.b, t.c]));
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::new(2.0, 1.0, 3.0));
    }

    #[test]
    fn demo_house_doors() {
        let scene = SceneDescription::demo_house();
        let names: Vec<_> = scene.door_nodes().into_iter().map(|d| d.name).collect();
        assert_eq!(names, ["FrontDoor", "HallDoor", "PantryDoor"]);
        assert!(scene.clips.iter().any(|c| c.name == "FrontDoorOpen"));
        assert!(!scene.clips.iter().any(|c| c.name == "PantryDoorOpen"));
    }

    #[test]
    fn hall_door_closes_the_doorway() {
        let scene = SceneDescription::demo_house();
        let hall = scene.door_nodes().into_iter().find(|d| d.name == "HallDoor").unwrap();
        let world = hall.local_bounds.transformed(&hall.transform);
        assert!((world.min.z + 0.5).abs() < 1e-4 && (world.max.z - 0.5).abs() < 1e-4);
        assert!(world.size().x < 0.1);
    }
}
