//! Locomotion core for exploring a static 3D scene: fly, orbit,
//! third-person and top-view navigation over a BVH collider, with
//! animated doors and a spring-damped follow camera.
//!
//! The core is windowing-agnostic. [`controller::FrameLoop`] takes
//! [`controller::InputEvent`]s and a frame delta and updates a
//! [`model::Camera`]; the `native` feature adds a winit/wgpu viewer in
//! [`view`] and the `roam` binary.

pub mod logging;
pub mod error;
pub mod options;

// MVC Architecture
pub mod model;
pub mod controller;
#[cfg(all(feature = "native", not(target_arch = "wasm32")))]
pub mod view;

pub use controller::{FrameLoop, InputEvent, NavigationMode, NavigationStatus};
pub use error::{Result, RoamError};
pub use model::{SceneDescription, StaticCollisionMesh};
pub use options::Options;
