// CONTROLLER: input aggregation, navigation modes, collision and the frame loop
pub mod input;
pub mod navigation;
pub mod physics;
pub mod orbit_controls;
pub mod follow_camera;
pub mod fly;
pub mod orbit;
pub mod top_view;
pub mod third_person;
pub mod frame_loop;

pub use input::{InputEvent, InputState, KeyBindings, MouseButton};
pub use navigation::{
    CursorRequest, FrameContext, ModeSwitch, NavigationController, NavigationMode, SurfaceSize, Viewport,
};
pub use physics::CollisionResolver;
pub use orbit_controls::OrbitControls;
pub use follow_camera::CameraRig;
pub use fly::FlyController;
pub use orbit::OrbitController;
pub use top_view::TopViewController;
pub use third_person::ThirdPersonController;
pub use frame_loop::{display_rounded, FrameLoop, NavigationStatus};
