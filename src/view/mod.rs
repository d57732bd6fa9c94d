// VIEW: Rendering and HUD (native only)
pub mod gpu_init;
pub mod mesh;
pub mod render;
pub mod ui;

pub use gpu_init::GpuContext;
pub use mesh::{Mesh, MeshBuffer, Vertex};
pub use render::SceneRenderer;
pub use ui::{build_ui, UiActions};
