//! Damped orbit-around-target interaction, shared by the Orbit and TopView modes.
//!
//! Left drag rotates, right drag pans, the wheel dollies. Input is turned
//! into spherical and pan deltas which [`OrbitControls::update`] applies a
//! `damping_factor` fraction of per call, decaying the remainder.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use super::input::{InputState, MouseButton};
use crate::model::Camera;

const EPS: f32 = 1e-6;

#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enabled: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub enable_pan: bool,
    /// Pan in the view plane instead of the ground plane.
    pub screen_space_panning: bool,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub min_distance: f32,
    pub max_distance: f32,

    delta_theta: f32,
    delta_phi: f32,
    pan_offset: Vec3,
    scale: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enabled: false,
            damping_factor: 0.08,
            rotate_speed: 0.35,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            enable_pan: true,
            screen_space_panning: true,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            delta_theta: 0.0,
            delta_phi: 0.0,
            pan_offset: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

impl OrbitControls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Wheel delta in browser units; positive moves away from the target.
    pub fn dolly(&mut self, wheel_delta: f32) {
        if wheel_delta == 0.0 {
            return;
        }
        let step = 0.95f32.powf(self.zoom_speed * (wheel_delta * 0.01).abs());
        if wheel_delta > 0.0 {
            self.scale /= step;
        } else {
            self.scale *= step;
        }
    }

    /// Pan by a screen-space pixel offset.
    pub fn pan(&mut self, dx: f32, dy: f32, camera: &Camera, viewport_height: f32) {
        let distance = (camera.eye - self.target).length() * (camera.fov_y * 0.5).tan();
        let left = 2.0 * dx * distance / viewport_height * self.pan_speed;
        let up = 2.0 * dy * distance / viewport_height * self.pan_speed;

        self.pan_offset -= camera.right() * left;
        let up_axis = if self.screen_space_panning {
            camera.right().cross(camera.forward())
        } else {
            camera.up.cross(camera.right()).normalize_or_zero()
        };
        self.pan_offset += up_axis * up;
    }

    /// Turn this frame's mouse input into pending rotation, pan and zoom.
    pub fn handle_input(&mut self, input: &InputState, camera: &Camera, viewport_height: f32) {
        if !self.enabled {
            return;
        }
        let delta = input.mouse_delta();
        if input.is_mouse_button_pressed(MouseButton::Left) {
            self.rotate_left(TAU * delta.x / viewport_height * self.rotate_speed);
            self.rotate_up(TAU * delta.y / viewport_height * self.rotate_speed);
        } else if self.enable_pan && input.is_mouse_button_pressed(MouseButton::Right) {
            self.pan(delta.x, delta.y, camera, viewport_height);
        }
        self.dolly(input.wheel_delta());
    }

    /// Apply one damped step of the pending deltas and place the camera.
    pub fn update(&mut self, camera: &mut Camera) {
        let offset = camera.eye - self.target;
        let mut radius = offset.length();
        let (mut theta, mut phi) = if radius > EPS {
            (offset.x.atan2(offset.z), (offset.y / radius).clamp(-1.0, 1.0).acos())
        } else {
            (0.0, 0.0)
        };

        theta += self.delta_theta * self.damping_factor;
        phi += self.delta_phi * self.damping_factor;
        phi = phi.clamp(self.min_polar_angle, self.max_polar_angle).clamp(EPS, PI - EPS);

        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.target += self.pan_offset * self.damping_factor;

        camera.eye = self.target + spherical_to_cartesian(radius, phi, theta);
        camera.set_look_at(self.target);

        let decay = 1.0 - self.damping_factor;
        self.delta_theta *= decay;
        self.delta_phi *= decay;
        self.pan_offset *= decay;
        self.scale = 1.0;
    }

    /// Drop any pending motion.
    pub fn stop(&mut self) {
        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.pan_offset = Vec3::ZERO;
        self.scale = 1.0;
    }
}

/// Y-up spherical coordinates: `phi` from +Y, `theta` around Y from +Z.
pub fn spherical_to_cartesian(radius: f32, phi: f32, theta: f32) -> Vec3 {
    let sin_phi = phi.sin();
    Vec3::new(radius * sin_phi * theta.sin(), radius * phi.cos(), radius * sin_phi * theta.cos())
}
