//! Keyframed node animation and a play-once clip action.
//!
//! `ClipAction` mirrors what a scene animation mixer does for door clips:
//! playing once, clamping on the last frame, and reversing in place when
//! the time scale flips sign.

use glam::{Mat4, Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub time: f32,
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Keyframe {
    pub fn new(time: f32, translation: Vec3, rotation: Quat) -> Self {
        Self { time, translation, rotation }
    }
}

/// Named clip animating one node relative to its rest transform.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    /// Sorted by time.
    pub keyframes: Vec<Keyframe>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, mut keyframes: Vec<Keyframe>) -> Self {
        keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
        let duration = keyframes.last().map_or(0.0, |k| k.time);
        Self { name: name.into(), duration, keyframes }
    }

    /// Hinge swing: rotate about the node's local Y axis from 0 to `angle` over `duration`.
    pub fn swing(name: impl Into<String>, angle: f32, duration: f32) -> Self {
        Self::new(
            name,
            vec![
                Keyframe::new(0.0, Vec3::ZERO, Quat::IDENTITY),
                Keyframe::new(duration, Vec3::ZERO, Quat::from_rotation_y(angle)),
            ],
        )
    }

    /// Local pose at `time`, clamped to the clip range.
    pub fn sample(&self, time: f32) -> Mat4 {
        let (first, last) = match (self.keyframes.first(), self.keyframes.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return Mat4::IDENTITY,
        };
        if time <= first.time {
            return Mat4::from_rotation_translation(first.rotation, first.translation);
        }
        if time >= last.time {
            return Mat4::from_rotation_translation(last.rotation, last.translation);
        }

        let next = self.keyframes.iter().position(|k| k.time > time).unwrap_or(self.keyframes.len() - 1);
        let (a, b) = (&self.keyframes[next - 1], &self.keyframes[next]);
        let span = b.time - a.time;
        let t = if span > 0.0 { (time - a.time) / span } else { 1.0 };
        Mat4::from_rotation_translation(
            a.rotation.slerp(b.rotation, t),
            a.translation.lerp(b.translation, t),
        )
    }
}

/// Playback state of one clip: loop once, clamp when finished.
#[derive(Debug, Clone)]
pub struct ClipAction {
    clip: AnimationClip,
    time: f32,
    time_scale: f32,
    paused: bool,
    active: bool,
}

impl ClipAction {
    pub fn new(clip: AnimationClip) -> Self {
        Self {
            clip,
            time: 0.0,
            time_scale: 1.0,
            paused: false,
            active: false,
        }
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Schedule the action. Does not rewind: playing from the current time.
    pub fn play(&mut self) {
        self.active = true;
    }

    pub fn stop(&mut self) {
        self.active = false;
        self.paused = false;
        self.time = 0.0;
    }

    pub fn is_running(&self) -> bool {
        self.active && !self.paused && self.time_scale != 0.0
    }

    /// Advance by `dt` seconds. On reaching either end the time clamps and the action pauses.
    pub fn update(&mut self, dt: f32) {
        if !self.is_running() {
            return;
        }
        self.time += dt * self.time_scale;
        if self.time >= self.clip.duration && self.time_scale > 0.0 {
            self.time = self.clip.duration;
            self.paused = true;
        } else if self.time <= 0.0 && self.time_scale < 0.0 {
            self.time = 0.0;
            self.paused = true;
        }
    }

    pub fn pose(&self) -> Mat4 {
        self.clip.sample(self.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn idle_action_is_not_running() {
        let action = ClipAction::new(AnimationClip::swing("DoorOpen", FRAC_PI_2, 1.0));
        assert!(!action.is_running());
        assert_eq!(action.pose(), Mat4::IDENTITY);
    }

    #[test]
    fn plays_once_and_clamps() {
        let mut action = ClipAction::new(AnimationClip::swing("DoorOpen", FRAC_PI_2, 1.0));
        action.play();
        action.update(0.4);
        assert!(action.is_running());
        assert!((action.time() - 0.4).abs() < 1e-6);

        action.update(5.0);
        assert!(!action.is_running());
        assert_eq!(action.time(), 1.0);
    }

    #[test]
    fn reversal_continues_from_current_time() {
        let mut action = ClipAction::new(AnimationClip::swing("DoorOpen", FRAC_PI_2, 1.0));
        action.play();
        action.update(0.6);

        action.set_time_scale(-1.0);
        action.set_paused(false);
        action.play();
        action.update(0.2);
        assert!((action.time() - 0.4).abs() < 1e-6);

        action.update(1.0);
        assert_eq!(action.time(), 0.0);
        assert!(!action.is_running());
    }

    #[test]
    fn sample_interpolates_rotation() {
        let clip = AnimationClip::swing("DoorOpen", FRAC_PI_2, 2.0);
        let mid = clip.sample(1.0);
        let turned = mid.transform_vector3(Vec3::X);
        let expected = Quat::from_rotation_y(FRAC_PI_2 * 0.5) * Vec3::X;
        assert!(turned.distance(expected) < 1e-5);
    }
}
