//! Interactable doors: proximity detection, animated open/close and
//! axis-aligned collision carving of the avatar's movement delta.

use glam::{Mat4, Vec3};
use tracing::{debug, info, warn};

use super::animation::{AnimationClip, ClipAction};
use super::geometry::Aabb;
use super::scene::DoorNode;

/// Avatar-to-door distance below which a door can be interacted with.
pub const INTERACTION_DISTANCE: f32 = 2.0;
/// Height of the avatar footprint box used for door collision.
pub const FOOTPRINT_HEIGHT: f32 = 2.0;

const PROMPT_OPEN: &str = "Press F to open the door";
const PROMPT_CLOSE: &str = "Press F to close the door";

/// Clip name a door node is paired with: `"<nodeName>Open"`.
pub fn open_clip_name(node_name: &str) -> String {
    format!("{node_name}Open")
}

pub struct Door {
    name: String,
    rest_transform: Mat4,
    local_bounds: Aabb,
    action: Option<ClipAction>,
    world_bounds: Aabb,
    pub is_open: bool,
}

impl Door {
    /// Pair `node` with its `"<name>Open"` clip. Without one the door never opens.
    pub fn new(node: &DoorNode, clips: &[AnimationClip]) -> Self {
        let clip_name = open_clip_name(&node.name);
        let action = clips
            .iter()
            .find(|clip| clip.name == clip_name)
            .map(|clip| ClipAction::new(clip.clone()));
        if action.is_none() {
            warn!(door = %node.name, clip = %clip_name, "door animation clip not found");
        }

        let mut door = Self {
            name: node.name.clone(),
            rest_transform: node.transform,
            local_bounds: node.local_bounds,
            action,
            world_bounds: Aabb::EMPTY,
            is_open: false,
        };
        door.refresh_bounds();
        door
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_animation(&self) -> bool {
        self.action.is_some()
    }

    pub fn action(&self) -> Option<&ClipAction> {
        self.action.as_ref()
    }

    pub fn is_animating(&self) -> bool {
        self.action.as_ref().is_some_and(ClipAction::is_running)
    }

    /// Rest transform composed with the current animation pose.
    pub fn world_transform(&self) -> Mat4 {
        match &self.action {
            Some(action) => self.rest_transform * action.pose(),
            None => self.rest_transform,
        }
    }

    /// World position of the node origin (the hinge).
    pub fn anchor(&self) -> Vec3 {
        self.world_transform().transform_point3(Vec3::ZERO)
    }

    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.anchor().distance(point)
    }

    pub fn local_bounds(&self) -> &Aabb {
        &self.local_bounds
    }

    /// World bounds as of the last [`Door::refresh_bounds`].
    pub fn world_bounds(&self) -> &Aabb {
        &self.world_bounds
    }

    /// Recompute world bounds from the current (possibly animated) pose.
    pub fn refresh_bounds(&mut self) -> Aabb {
        self.world_bounds = self.local_bounds.transformed(&self.world_transform());
        self.world_bounds
    }

    /// Toggle open/closed. Playback continues from the current frame in the
    /// new direction, so a half-open door reverses smoothly.
    pub fn interact(&mut self) -> bool {
        let Some(action) = self.action.as_mut() else {
            return false;
        };
        self.is_open = !self.is_open;
        action.set_paused(false);
        action.set_time_scale(if self.is_open { 1.0 } else { -1.0 });
        action.play();
        info!(door = %self.name, open = self.is_open, "door toggled");
        true
    }

    pub fn advance(&mut self, dt: f32) {
        if let Some(action) = self.action.as_mut() {
            action.update(dt);
        }
    }
}

/// All doors of the loaded scene plus the current interaction target.
#[derive(Default)]
pub struct DoorRegistry {
    doors: Vec<Door>,
    active: Option<usize>,
    prompt: Option<&'static str>,
}

impl DoorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a door node. A node already registered under the same name is ignored.
    pub fn add_door(&mut self, node: &DoorNode, clips: &[AnimationClip]) {
        if self.doors.iter().any(|d| d.name == node.name) {
            return;
        }
        let door = Door::new(node, clips);
        debug!(door = %door.name, animated = door.has_animation(), "door registered");
        self.doors.push(door);
    }

    /// Drop every door, e.g. when the scene is unloaded.
    pub fn clear(&mut self) {
        self.doors.clear();
        self.active = None;
        self.prompt = None;
    }

    pub fn doors(&self) -> &[Door] {
        &self.doors
    }

    pub fn len(&self) -> usize {
        self.doors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doors.is_empty()
    }

    pub fn door(&self, name: &str) -> Option<&Door> {
        self.doors.iter().find(|d| d.name == name)
    }

    pub fn door_mut(&mut self, name: &str) -> Option<&mut Door> {
        self.doors.iter_mut().find(|d| d.name == name)
    }

    /// Tick every door animation.
    pub fn advance(&mut self, dt: f32) {
        for door in &mut self.doors {
            door.advance(dt);
        }
    }

    /// Pick the nearest door within [`INTERACTION_DISTANCE`] of `player_position`.
    pub fn update(&mut self, player_position: Vec3) {
        let mut closest = None;
        let mut min_distance = f32::INFINITY;
        for (i, door) in self.doors.iter().enumerate() {
            let distance = door.distance_to(player_position);
            if distance < INTERACTION_DISTANCE && distance < min_distance {
                min_distance = distance;
                closest = Some(i);
            }
        }

        self.active = closest;
        self.prompt = closest.map(|i| if self.doors[i].is_open { PROMPT_CLOSE } else { PROMPT_OPEN });
    }

    pub fn active_door(&self) -> Option<&Door> {
        self.active.map(|i| &self.doors[i])
    }

    /// Interaction prompt text, `None` when no door is in reach.
    pub fn prompt(&self) -> Option<&'static str> {
        self.prompt
    }

    /// Toggle the active door, if any. Returns whether a door reacted.
    pub fn interact(&mut self) -> bool {
        match self.active {
            Some(i) => self.doors[i].interact(),
            None => false,
        }
    }

    /// Push `delta` out of every closed, resting door.
    ///
    /// The avatar is a vertical box of half-width `radius` and height
    /// [`FOOTPRINT_HEIGHT`] standing at `player_position + delta`. On overlap
    /// the delta is corrected along the horizontal axis of least overlap.
    pub fn carve(&mut self, player_position: Vec3, radius: f32, delta: &mut Vec3) {
        for door in &mut self.doors {
            if door.is_open || door.is_animating() {
                continue;
            }
            let door_box = door.refresh_bounds();

            let center = player_position + *delta;
            let player_box = Aabb::new(
                Vec3::new(center.x - radius, center.y, center.z - radius),
                Vec3::new(center.x + radius, center.y + FOOTPRINT_HEIGHT, center.z + radius),
            );
            if !door_box.intersects(&player_box) {
                continue;
            }

            let overlap = door_box.intersection(&player_box).size();
            let door_center = door_box.center();
            if overlap.x < overlap.z {
                if center.x < door_center.x {
                    delta.x -= overlap.x;
                } else {
                    delta.x += overlap.x;
                }
            } else if center.z < door_center.z {
                delta.z -= overlap.z;
            } else {
                delta.z += overlap.z;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    /// 1 m wide, 2.1 m tall door slab spanning +X from its hinge at `at`.
    fn node(name: &str, at: Vec3) -> DoorNode {
        DoorNode {
            name: name.to_string(),
            transform: Mat4::from_translation(at),
            local_bounds: Aabb::new(Vec3::new(0.0, 0.0, -0.04), Vec3::new(1.0, 2.1, 0.04)),
        }
    }

    fn registry_with(nodes: &[DoorNode]) -> DoorRegistry {
        let clips: Vec<_> = nodes
            .iter()
            .map(|n| AnimationClip::swing(open_clip_name(&n.name), -FRAC_PI_2, 1.0))
            .collect();
        let mut registry = DoorRegistry::new();
        for n in nodes {
            registry.add_door(n, &clips);
        }
        registry
    }

    #[test]
    fn nearest_door_in_reach_becomes_active() {
        let mut registry = registry_with(&[
            node("Far", Vec3::new(3.0, 0.0, 0.0)),
            node("Near", Vec3::new(1.0, 0.0, 0.0)),
            node("Mid", Vec3::new(0.0, 0.0, 1.5)),
        ]);
        registry.update(Vec3::ZERO);
        assert_eq!(registry.active_door().map(Door::name), Some("Near"));
        assert_eq!(registry.prompt(), Some(PROMPT_OPEN));
    }

    #[test]
    fn no_door_in_reach_hides_prompt() {
        let mut registry = registry_with(&[
            node("A", Vec3::new(2.5, 0.0, 0.0)),
            node("B", Vec3::new(-2.5, 0.0, 0.0)),
            node("C", Vec3::new(0.0, 0.0, 2.5)),
        ]);
        registry.update(Vec3::ZERO);
        assert!(registry.active_door().is_none());
        assert!(registry.prompt().is_none());
        assert!(!registry.interact());
    }

    #[test]
    fn interact_toggles_and_reverses_playback() {
        let mut registry = registry_with(&[node("Front", Vec3::new(1.0, 0.0, 0.0))]);
        registry.update(Vec3::ZERO);

        assert!(registry.interact());
        let door = registry.door("Front").unwrap();
        assert!(door.is_open);
        assert_eq!(door.action().unwrap().time_scale(), 1.0);
        assert!(door.is_animating());

        registry.advance(2.0);
        registry.update(Vec3::ZERO);
        assert!(!registry.door("Front").unwrap().is_animating());
        assert_eq!(registry.prompt(), Some(PROMPT_CLOSE));

        assert!(registry.interact());
        let door = registry.door("Front").unwrap();
        assert!(!door.is_open);
        assert_eq!(door.action().unwrap().time_scale(), -1.0);
        assert!(door.is_animating());
    }

    #[test]
    fn missing_clip_leaves_door_inert_but_solid() {
        let mut registry = DoorRegistry::new();
        registry.add_door(&node("Pantry", Vec3::new(0.0, 0.0, 0.5)), &[]);
        registry.update(Vec3::new(0.5, 0.0, 0.0));
        assert!(registry.active_door().is_some());
        assert!(!registry.interact());
        assert!(!registry.door("Pantry").unwrap().is_open);

        // Walking into it from -Z is still blocked
        let mut delta = Vec3::new(0.0, 0.0, 0.1);
        registry.carve(Vec3::new(0.5, 0.0, 0.3), 0.15, &mut delta);
        assert!(delta.z < 0.1);
    }

    #[test]
    fn duplicate_nodes_are_ignored() {
        let mut registry = registry_with(&[node("Front", Vec3::ZERO)]);
        registry.add_door(&node("Front", Vec3::ONE), &[]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn carve_pushes_back_along_smaller_overlap() {
        let mut registry = registry_with(&[node("Front", Vec3::new(0.0, 0.0, 0.0))]);
        // Door slab occupies x 0..1, z -0.04..0.04; approach from -Z
        let position = Vec3::new(0.5, 0.0, -0.3);
        let mut delta = Vec3::new(0.0, 0.0, 0.2);
        registry.carve(position, 0.15, &mut delta);
        // Footprint z -0.25..0.05 covers the whole 0.08 slab; x overlap is 0.3
        assert!((delta.z - (0.2 - 0.08)).abs() < 1e-5, "{delta}");
        assert_eq!(delta.x, 0.0);
        assert!((position + delta).z < 0.0, "pushed past the door centre");
    }

    #[test]
    fn open_door_does_not_collide() {
        let mut registry = registry_with(&[node("Front", Vec3::ZERO)]);
        registry.update(Vec3::new(0.5, 0.0, -0.5));
        registry.interact();
        registry.advance(5.0);

        let mut delta = Vec3::new(0.0, 0.0, 0.2);
        registry.carve(Vec3::new(0.5, 0.0, -0.3), 0.15, &mut delta);
        assert_eq!(delta, Vec3::new(0.0, 0.0, 0.2));
    }

    #[test]
    fn open_pose_moves_world_bounds() {
        let mut registry = registry_with(&[node("Front", Vec3::ZERO)]);
        let closed = *registry.door("Front").unwrap().world_bounds();
        registry.update(Vec3::new(0.5, 0.0, -0.5));
        registry.interact();
        registry.advance(5.0);
        let door = registry.door_mut("Front").unwrap();
        let open = door.refresh_bounds();
        assert!(closed.size().x > 0.9);
        assert!(open.size().z > 0.9 && open.size().x < 0.1);
    }
}
