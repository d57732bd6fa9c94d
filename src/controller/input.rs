/// Platform-agnostic input aggregation
///
/// Device events arrive asynchronously through [`InputState::process_event`];
/// controllers poll the accumulated state once per frame, and the frame loop
/// calls [`InputState::update`] after every controller has read it.
use std::collections::HashSet;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Platform-independent input events. Keys are physical key codes
/// (`"KeyW"`, `"ArrowUp"`, `"Space"`, `"ShiftLeft"`, ...).
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown(String),
    KeyUp(String),

    /// Relative motion, reported whether or not the cursor is captured.
    MouseMove { dx: f32, dy: f32 },
    CursorMoved { x: f32, y: f32 },
    MouseButton { button: MouseButton, is_down: bool },
    /// Positive is scrolling down / towards the user.
    MouseWheel { delta_y: f32 },

    FocusLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Frame-stable input snapshot: level-triggered sets, edge-triggered sets
/// and per-frame accumulators.
#[derive(Debug, Default)]
pub struct InputState {
    keys: HashSet<String>,
    keys_down: HashSet<String>,
    buttons: HashSet<MouseButton>,
    buttons_down: HashSet<MouseButton>,
    mouse_position: Vec2,
    mouse_delta: Vec2,
    wheel_delta: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process an input event and update state
    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(code) => {
                // Auto-repeat does not count as a new press
                if !self.keys.contains(code) {
                    self.keys_down.insert(code.clone());
                }
                self.keys.insert(code.clone());
            }
            InputEvent::KeyUp(code) => {
                self.keys.remove(code.as_str());
            }
            InputEvent::MouseMove { dx, dy } => {
                self.mouse_delta += Vec2::new(*dx, *dy);
            }
            InputEvent::CursorMoved { x, y } => {
                self.mouse_position = Vec2::new(*x, *y);
            }
            InputEvent::MouseButton { button, is_down: true } => {
                if !self.buttons.contains(button) {
                    self.buttons_down.insert(*button);
                }
                self.buttons.insert(*button);
            }
            InputEvent::MouseButton { button, is_down: false } => {
                self.buttons.remove(button);
            }
            InputEvent::MouseWheel { delta_y } => {
                self.wheel_delta += delta_y;
            }
            InputEvent::FocusLost => {
                self.clear_keys();
            }
        }
    }

    /// Held right now.
    pub fn is_key_pressed(&self, code: &str) -> bool {
        self.keys.contains(code)
    }

    /// Went down since the last [`InputState::update`].
    pub fn is_key_down(&self, code: &str) -> bool {
        self.keys_down.contains(code)
    }

    pub fn is_mouse_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    pub fn is_mouse_button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    pub fn wheel_delta(&self) -> f32 {
        self.wheel_delta
    }

    /// Planar intent: `x` is right minus left, `z` is forward minus backward.
    pub fn movement_input(&self, bindings: &KeyBindings) -> Vec3 {
        let x = axis(self.any_pressed(&bindings.right_keys()), self.any_pressed(&bindings.left_keys()));
        let z = axis(self.any_pressed(&bindings.forward_keys()), self.any_pressed(&bindings.backward_keys()));
        Vec3::new(x, 0.0, z)
    }

    /// Six-way intent: [`InputState::movement_input`] plus `y` as up minus down.
    pub fn fly_input(&self, bindings: &KeyBindings) -> Vec3 {
        let mut intent = self.movement_input(bindings);
        intent.y = axis(self.any_pressed(&bindings.up_keys()), self.any_pressed(&bindings.down_keys()));
        intent
    }

    /// Clear edge-triggered sets and per-frame accumulators. Call once per frame.
    pub fn update(&mut self) {
        self.keys_down.clear();
        self.buttons_down.clear();
        self.mouse_delta = Vec2::ZERO;
        self.wheel_delta = 0.0;
    }

    pub fn clear_keys(&mut self) {
        self.keys.clear();
        self.buttons.clear();
    }

    fn any_pressed(&self, codes: &[&str]) -> bool {
        codes.iter().any(|code| self.is_key_pressed(code))
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    positive as i32 as f32 - negative as i32 as f32
}

/// Key mapping configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub forward: String,
    pub backward: String,
    pub left: String,
    pub right: String,
    pub up: String,
    pub down: String,
    pub interact: String,
    pub release_cursor: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: "KeyW".to_string(),
            backward: "KeyS".to_string(),
            left: "KeyA".to_string(),
            right: "KeyD".to_string(),
            up: "Space".to_string(),
            down: "ShiftLeft".to_string(),
            interact: "KeyF".to_string(),
            release_cursor: "Escape".to_string(),
        }
    }
}

impl KeyBindings {
    // Arrow keys always alias the planar bindings, and both shift keys mean down

    fn forward_keys(&self) -> [&str; 2] {
        [&self.forward, "ArrowUp"]
    }

    fn backward_keys(&self) -> [&str; 2] {
        [&self.backward, "ArrowDown"]
    }

    fn left_keys(&self) -> [&str; 2] {
        [&self.left, "ArrowLeft"]
    }

    fn right_keys(&self) -> [&str; 2] {
        [&self.right, "ArrowRight"]
    }

    fn up_keys(&self) -> [&str; 1] {
        [&self.up]
    }

    fn down_keys(&self) -> [&str; 3] {
        [&self.down, "ShiftLeft", "ShiftRight"]
    }
}

#[cfg(all(feature = "native", not(target_arch = "wasm32")))]
pub mod native {
    //! Translation from winit events.
    use super::*;
    use winit::event::{DeviceEvent, ElementState, MouseScrollDelta, WindowEvent};
    use winit::keyboard::PhysicalKey;

    /// Pixels per wheel line, matching what browsers report for `deltaY`.
    const LINE_HEIGHT: f32 = 100.0;

    pub fn window_event_to_input(event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return None;
                };
                let code = format!("{code:?}");
                Some(match event.state {
                    ElementState::Pressed => InputEvent::KeyDown(code),
                    ElementState::Released => InputEvent::KeyUp(code),
                })
            }
            WindowEvent::CursorMoved { position, .. } => Some(InputEvent::CursorMoved {
                x: position.x as f32,
                y: position.y as f32,
            }),
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    winit::event::MouseButton::Left => MouseButton::Left,
                    winit::event::MouseButton::Right => MouseButton::Right,
                    winit::event::MouseButton::Middle => MouseButton::Middle,
                    _ => return None,
                };
                Some(InputEvent::MouseButton {
                    button,
                    is_down: *state == ElementState::Pressed,
                })
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y * LINE_HEIGHT,
                    MouseScrollDelta::PixelDelta(p) => -p.y as f32,
                };
                Some(InputEvent::MouseWheel { delta_y })
            }
            WindowEvent::Focused(false) => Some(InputEvent::FocusLost),
            _ => None,
        }
    }

    pub fn device_event_to_input(event: &DeviceEvent) -> Option<InputEvent> {
        match event {
            DeviceEvent::MouseMotion { delta: (dx, dy) } => Some(InputEvent::MouseMove {
                dx: *dx as f32,
                dy: *dy as f32,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: &str, down: bool) -> InputEvent {
        if down {
            InputEvent::KeyDown(code.to_string())
        } else {
            InputEvent::KeyUp(code.to_string())
        }
    }

    #[test]
    fn tap_within_one_frame_is_seen_once() {
        let mut input = InputState::new();
        input.process_event(&key("KeyF", true));
        input.process_event(&key("KeyF", false));
        assert!(input.is_key_down("KeyF"));
        assert!(!input.is_key_pressed("KeyF"));

        input.update();
        assert!(!input.is_key_down("KeyF"));
    }

    #[test]
    fn auto_repeat_is_not_an_edge() {
        let mut input = InputState::new();
        input.process_event(&key("KeyW", true));
        input.update();
        input.process_event(&key("KeyW", true));
        assert!(input.is_key_pressed("KeyW"));
        assert!(!input.is_key_down("KeyW"));
    }

    #[test]
    fn movement_axes_and_aliases() {
        let bindings = KeyBindings::default();
        let mut input = InputState::new();
        input.process_event(&key("ArrowUp", true));
        input.process_event(&key("KeyD", true));
        assert_eq!(input.movement_input(&bindings), Vec3::new(1.0, 0.0, 1.0));

        input.process_event(&key("KeyA", true));
        input.process_event(&key("ShiftRight", true));
        assert_eq!(input.fly_input(&bindings), Vec3::new(0.0, -1.0, 1.0));
    }

    #[test]
    fn deltas_accumulate_until_update() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::MouseMove { dx: 3.0, dy: -1.0 });
        input.process_event(&InputEvent::MouseMove { dx: 2.0, dy: 4.0 });
        input.process_event(&InputEvent::MouseWheel { delta_y: 100.0 });
        input.process_event(&InputEvent::MouseWheel { delta_y: 20.0 });
        assert_eq!(input.mouse_delta(), Vec2::new(5.0, 3.0));
        assert_eq!(input.wheel_delta(), 120.0);

        input.update();
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
        assert_eq!(input.wheel_delta(), 0.0);
    }

    #[test]
    fn buttons_have_edges_and_focus_loss_releases_everything() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::MouseButton { button: MouseButton::Left, is_down: true });
        input.process_event(&key("KeyW", true));
        assert!(input.is_mouse_button_down(MouseButton::Left));
        input.update();
        assert!(input.is_mouse_button_pressed(MouseButton::Left));
        assert!(!input.is_mouse_button_down(MouseButton::Left));

        input.process_event(&InputEvent::FocusLost);
        assert!(!input.is_mouse_button_pressed(MouseButton::Left));
        assert!(!input.is_key_pressed("KeyW"));
    }
}
