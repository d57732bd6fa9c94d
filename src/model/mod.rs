// MODEL: scene data, collision geometry and navigation state
pub mod geometry;
pub mod collision_mesh;
pub mod animation;
pub mod avatar;
pub mod door;
pub mod camera;
pub mod scene;

pub use geometry::{Aabb, Ray, Triangle};
pub use collision_mesh::{BvhNode, RayHit, ShapeCast, StaticCollisionMesh};
pub use animation::{AnimationClip, ClipAction, Keyframe};
pub use avatar::{AvatarState, Gait, GaitBlend};
pub use door::{Door, DoorRegistry};
pub use camera::Camera;
pub use scene::{DoorNode, SceneDescription, SceneMesh};
