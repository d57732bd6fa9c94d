//! Navigation modes, the controller lifecycle contract and the mode switch.

use std::fmt;
use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::input::{InputState, KeyBindings};
use crate::model::{AvatarState, Camera, DoorRegistry, StaticCollisionMesh};
use crate::options::NavigationOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationMode {
    #[default]
    Fly,
    Orbit,
    ThirdPerson,
    TopView,
}

impl NavigationMode {
    pub const ALL: [NavigationMode; 4] = [
        NavigationMode::Fly,
        NavigationMode::Orbit,
        NavigationMode::ThirdPerson,
        NavigationMode::TopView,
    ];

    pub fn label(self) -> &'static str {
        match self {
            NavigationMode::Fly => "Fly",
            NavigationMode::Orbit => "Orbit",
            NavigationMode::ThirdPerson => "Third person",
            NavigationMode::TopView => "Top view",
        }
    }
}

impl fmt::Display for NavigationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Size of the surface the controllers are attached to, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width: width.max(1), height: height.max(1) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorRequest {
    Capture,
    Release,
}

/// What the controllers may touch outside themselves: the rendered camera
/// and cursor-capture requests for the platform layer.
#[derive(Debug, Clone)]
pub struct Viewport {
    pub camera: Camera,
    pub surface: SurfaceSize,
    cursor_request: Option<CursorRequest>,
}

impl Viewport {
    pub fn new(camera: Camera, surface: SurfaceSize) -> Self {
        Self { camera, surface, cursor_request: None }
    }

    pub fn request_cursor_capture(&mut self) {
        self.cursor_request = Some(CursorRequest::Capture);
    }

    pub fn release_cursor(&mut self) {
        self.cursor_request = Some(CursorRequest::Release);
    }

    /// Latest pending request, consumed by the platform layer.
    pub fn take_cursor_request(&mut self) -> Option<CursorRequest> {
        self.cursor_request.take()
    }

    pub fn resize(&mut self, surface: SurfaceSize) {
        self.surface = surface;
        self.camera.set_aspect(surface.width, surface.height);
    }
}

/// Everything the active controller reads or writes during one frame.
pub struct FrameContext<'a> {
    pub dt: f32,
    pub input: &'a InputState,
    pub bindings: &'a KeyBindings,
    pub options: &'a NavigationOptions,
    pub viewport: &'a mut Viewport,
    pub doors: &'a mut DoorRegistry,
}

/// Lifecycle contract shared by every navigation mode.
///
/// `enter` and `leave` are always called in strict alternation by the
/// [`ModeSwitch`]; whatever `enter` acquires (cursor capture above all)
/// `leave` must release. `dispose` is explicit, there is no `Drop` hook.
pub trait NavigationController {
    fn mode(&self) -> NavigationMode;
    fn enter(&mut self, viewport: &mut Viewport);
    fn update(&mut self, frame: &mut FrameContext<'_>);
    fn leave(&mut self, viewport: &mut Viewport);
    fn dispose(&mut self) {}
    /// Attach to a new rendering surface, keeping mode-local state.
    fn rebind_surface(&mut self, surface: SurfaceSize);

    fn set_collider(&mut self, _collider: Arc<StaticCollisionMesh>) {}
    fn set_character(&mut self, _avatar: AvatarState, _camera: &Camera) {}
    fn avatar(&self) -> Option<&AvatarState> {
        None
    }
    /// Capture or release the cursor. Only modes with mouse-look react.
    fn set_cursor_locked(&mut self, _locked: bool, _viewport: &mut Viewport) {}
    fn is_cursor_locked(&self) -> bool {
        false
    }
    /// Pivot point for orbiting modes.
    fn set_target(&mut self, _target: Vec3) {}
}

/// Owns one controller per mode; exactly one of them is active.
pub struct ModeSwitch {
    controllers: Vec<Box<dyn NavigationController>>,
    active: usize,
}

impl ModeSwitch {
    /// Take ownership of `controllers` and enter the one for `initial`,
    /// or the first one if none handles it.
    ///
    /// # Panics
    /// If `controllers` is empty.
    pub fn new(
        controllers: Vec<Box<dyn NavigationController>>,
        initial: NavigationMode,
        viewport: &mut Viewport,
    ) -> Self {
        assert!(!controllers.is_empty(), "mode switch needs at least one controller");
        let active = controllers.iter().position(|c| c.mode() == initial).unwrap_or_else(|| {
            warn!(mode = %initial, "no controller for initial navigation mode");
            0
        });
        let mut switch = Self { controllers, active };
        switch.controllers[active].enter(viewport);
        info!(mode = %switch.mode(), "navigation mode entered");
        switch
    }

    pub fn mode(&self) -> NavigationMode {
        self.controllers[self.active].mode()
    }

    pub fn active(&self) -> &dyn NavigationController {
        self.controllers[self.active].as_ref()
    }

    pub fn controller(&self, mode: NavigationMode) -> Option<&dyn NavigationController> {
        self.controllers.iter().find(|c| c.mode() == mode).map(|c| c.as_ref())
    }

    pub fn controller_mut(&mut self, mode: NavigationMode) -> Option<&mut (dyn NavigationController + 'static)> {
        self.controllers.iter_mut().find(|c| c.mode() == mode).map(|c| c.as_mut())
    }

    /// Leave the current mode and enter `mode`. Requesting the active mode
    /// is a no-op; so is a mode nobody handles. Returns whether a switch happened.
    pub fn set_mode(&mut self, mode: NavigationMode, viewport: &mut Viewport) -> bool {
        if self.mode() == mode {
            return false;
        }
        let Some(next) = self.controllers.iter().position(|c| c.mode() == mode) else {
            debug!(mode = %mode, "no controller for navigation mode");
            return false;
        };
        let previous = self.mode();
        self.controllers[self.active].leave(viewport);
        self.active = next;
        self.controllers[self.active].enter(viewport);
        info!(from = %previous, to = %mode, "navigation mode switched");
        true
    }

    pub fn update(&mut self, frame: &mut FrameContext<'_>) {
        self.controllers[self.active].update(frame);
    }

    /// Forward a capture/release request to the active controller.
    pub fn set_pointer_locked(&mut self, locked: bool, viewport: &mut Viewport) {
        let active = &mut self.controllers[self.active];
        if matches!(active.mode(), NavigationMode::Fly | NavigationMode::ThirdPerson) {
            active.set_cursor_locked(locked, viewport);
        }
    }

    pub fn set_collider(&mut self, collider: &Arc<StaticCollisionMesh>) {
        for controller in &mut self.controllers {
            controller.set_collider(Arc::clone(collider));
        }
    }

    pub fn set_character(&mut self, avatar: AvatarState, camera: &Camera) {
        for controller in &mut self.controllers {
            controller.set_character(avatar, camera);
        }
    }

    pub fn rebind_surface(&mut self, surface: SurfaceSize) {
        for controller in &mut self.controllers {
            controller.rebind_surface(surface);
        }
    }

    /// Leave the active mode and dispose every controller.
    pub fn dispose(&mut self, viewport: &mut Viewport) {
        self.controllers[self.active].leave(viewport);
        for controller in &mut self.controllers {
            controller.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<(NavigationMode, &'static str)>>>;

    struct Recorder {
        mode: NavigationMode,
        log: Log,
        locked: bool,
    }

    impl NavigationController for Recorder {
        fn mode(&self) -> NavigationMode {
            self.mode
        }
        fn enter(&mut self, _viewport: &mut Viewport) {
            self.log.borrow_mut().push((self.mode, "enter"));
        }
        fn update(&mut self, _frame: &mut FrameContext<'_>) {
            self.log.borrow_mut().push((self.mode, "update"));
        }
        fn leave(&mut self, _viewport: &mut Viewport) {
            self.log.borrow_mut().push((self.mode, "leave"));
        }
        fn rebind_surface(&mut self, _surface: SurfaceSize) {}
        fn set_cursor_locked(&mut self, locked: bool, _viewport: &mut Viewport) {
            self.locked = locked;
        }
        fn is_cursor_locked(&self) -> bool {
            self.locked
        }
    }

    fn switch(initial: NavigationMode) -> (ModeSwitch, Viewport, Log) {
        let log: Log = Rc::default();
        let controllers = NavigationMode::ALL
            .into_iter()
            .map(|mode| Box::new(Recorder { mode, log: log.clone(), locked: false }) as Box<dyn NavigationController>)
            .collect();
        let mut viewport = Viewport::new(Camera::new(800, 600), SurfaceSize::new(800, 600));
        let switch = ModeSwitch::new(controllers, initial, &mut viewport);
        (switch, viewport, log)
    }

    fn tick(switch: &mut ModeSwitch, viewport: &mut Viewport) {
        let input = InputState::new();
        let bindings = KeyBindings::default();
        let options = NavigationOptions::default();
        let mut doors = DoorRegistry::new();
        let mut frame = FrameContext {
            dt: 0.016,
            input: &input,
            bindings: &bindings,
            options: &options,
            viewport,
            doors: &mut doors,
        };
        switch.update(&mut frame);
    }

    #[test]
    fn enter_and_leave_alternate_per_controller() {
        use NavigationMode::*;
        let (mut switch, mut viewport, log) = switch(Fly);
        for mode in [Orbit, Orbit, ThirdPerson, Fly, TopView, TopView, Fly, ThirdPerson] {
            switch.set_mode(mode, &mut viewport);
            tick(&mut switch, &mut viewport);
        }

        let log = log.borrow();
        for mode in NavigationMode::ALL {
            let calls: Vec<_> = log
                .iter()
                .filter(|(m, call)| *m == mode && *call != "update")
                .map(|(_, call)| *call)
                .collect();
            for (i, call) in calls.iter().enumerate() {
                assert_eq!(*call, if i % 2 == 0 { "enter" } else { "leave" }, "{mode:?}: {calls:?}");
            }
        }
        assert_eq!(switch.mode(), ThirdPerson);
    }

    #[test]
    fn only_active_controller_is_updated() {
        let (mut switch, mut viewport, log) = switch(NavigationMode::Orbit);
        tick(&mut switch, &mut viewport);
        switch.set_mode(NavigationMode::TopView, &mut viewport);
        tick(&mut switch, &mut viewport);

        let updates: Vec<_> = log.borrow().iter().filter(|(_, c)| *c == "update").map(|(m, _)| *m).collect();
        assert_eq!(updates, [NavigationMode::Orbit, NavigationMode::TopView]);
    }

    #[test]
    fn repeated_request_is_noop() {
        let (mut switch, mut viewport, log) = switch(NavigationMode::Fly);
        assert!(!switch.set_mode(NavigationMode::Fly, &mut viewport));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn pointer_lock_only_reaches_mouse_look_modes() {
        let (mut switch, mut viewport, _log) = switch(NavigationMode::Orbit);
        switch.set_pointer_locked(true, &mut viewport);
        assert!(!switch.active().is_cursor_locked());

        switch.set_mode(NavigationMode::ThirdPerson, &mut viewport);
        switch.set_pointer_locked(true, &mut viewport);
        assert!(switch.active().is_cursor_locked());
        // Orbit's own state was never touched
        assert!(!switch.controller(NavigationMode::Orbit).unwrap().is_cursor_locked());
    }

    #[test]
    fn mode_names_round_trip_as_snake_case() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            mode: NavigationMode,
        }
        let text = toml::to_string(&Wrapper { mode: NavigationMode::TopView }).unwrap();
        assert!(text.contains("\"top_view\""));
        let back: Wrapper = toml::from_str("mode = \"third_person\"").unwrap();
        assert_eq!(back.mode, NavigationMode::ThirdPerson);
    }
}
