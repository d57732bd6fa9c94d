use glam::{Quat, Vec3};

/// Speed above which the avatar visual switches from the idle to the walk clip.
pub const WALK_SPEED_THRESHOLD: f32 = 1.0;
/// Cross-fade time between idle and walk clips, in seconds.
pub const GAIT_FADE: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gait {
    Idle,
    Walk,
}

/// Position, velocity and heading of the third-person avatar.
///
/// `position` is the feet position. `velocity` persists across frames
/// and is only ever damped, never reset by the frame loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvatarState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub orientation: Quat,
}

impl AvatarState {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            orientation: Quat::IDENTITY,
        }
    }

    pub fn gait(&self) -> Gait {
        if self.velocity.length() > WALK_SPEED_THRESHOLD {
            Gait::Walk
        } else {
            Gait::Idle
        }
    }

    /// Heading around world up, in radians, as `atan2(forward.x, forward.z)`.
    pub fn heading(&self) -> f32 {
        let forward = self.orientation * Vec3::Z;
        forward.x.atan2(forward.z)
    }
}

impl Default for AvatarState {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

/// Idle/walk cross-fade weight for the avatar visual.
///
/// `walk_weight` is 0 for pure idle and 1 for pure walk; a gait change
/// fades linearly over [`GAIT_FADE`] seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GaitBlend {
    walk_weight: f32,
}

impl GaitBlend {
    pub fn walk_weight(&self) -> f32 {
        self.walk_weight
    }

    pub fn update(&mut self, gait: Gait, dt: f32) {
        let target = match gait {
            Gait::Idle => 0.0,
            Gait::Walk => 1.0,
        };
        let step = (dt / GAIT_FADE).max(0.0);
        self.walk_weight = if self.walk_weight < target {
            (self.walk_weight + step).min(target)
        } else {
            (self.walk_weight - step).max(target)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gait_follows_speed() {
        let mut avatar = AvatarState::new(Vec3::ZERO);
        assert_eq!(avatar.gait(), Gait::Idle);
        avatar.velocity = Vec3::new(0.0, 0.0, 1.5);
        assert_eq!(avatar.gait(), Gait::Walk);
    }

    #[test]
    fn gait_change_fades_over_a_fifth_of_a_second() {
        let mut blend = GaitBlend::default();
        blend.update(Gait::Walk, 0.1);
        assert!((blend.walk_weight() - 0.5).abs() < 1e-5);
        blend.update(Gait::Walk, 0.3);
        assert_eq!(blend.walk_weight(), 1.0);
        blend.update(Gait::Idle, 0.05);
        assert!((blend.walk_weight() - 0.75).abs() < 1e-5);
    }

    #[test]
    fn heading_matches_orientation() {
        let mut avatar = AvatarState::default();
        avatar.orientation = Quat::from_rotation_y(0.7);
        assert!((avatar.heading() - 0.7).abs() < 1e-5);
    }
}
