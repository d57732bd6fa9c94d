//! Crate error type. Only setup paths (options I/O, window and GPU
//! initialization) are fallible; per-frame navigation never errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoamError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse options: {0}")]
    OptionsParse(#[from] toml::de::Error),

    #[error("failed to serialize options: {0}")]
    OptionsSerialize(#[from] toml::ser::Error),

    #[cfg(feature = "native")]
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[cfg(feature = "native")]
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[cfg(feature = "native")]
    #[error("failed to open GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[cfg(all(feature = "native", not(target_arch = "wasm32")))]
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

pub type Result<T> = std::result::Result<T, RoamError>;
