//! Runtime options with TOML file support.
//!
//! Every struct uses `#[serde(default)]` so a file that only overrides
//! `[navigation]` still loads. `navigation.move_speed` and
//! `navigation.collision_enabled` are read by the frame loop every frame and
//! may be changed while running.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::controller::input::KeyBindings;
use crate::controller::navigation::NavigationMode;
use crate::error::{Result, RoamError};

/// Environment variable naming an options file for the viewer.
pub const CONFIG_ENV: &str = "ROAM_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub navigation: NavigationOptions,
    pub camera: CameraOptions,
    pub keybindings: KeyBindings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationOptions {
    /// Acceleration applied per second of held movement input.
    pub move_speed: f32,
    pub collision_enabled: bool,
    pub initial_mode: NavigationMode,
    /// Draw the static collider as a wireframe overlay.
    pub show_collision_mesh: bool,
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self {
            move_speed: 20.0,
            collision_enabled: true,
            initial_mode: NavigationMode::Fly,
            show_collision_mesh: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraOptions {
    pub fov_y_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    /// Initial eye position.
    pub position: [f32; 3],
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            z_near: 0.1,
            z_far: 3000.0,
            position: [1.0, 1.0, 1.0],
        }
    }
}

impl CameraOptions {
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

impl Options {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(RoamError::OptionsParse)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let options = Self::from_toml_str(&content)?;
        info!(path = %path.display(), "loaded options");
        Ok(options)
    }

    /// Options from the file named by [`CONFIG_ENV`], or defaults when unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    /// Save options to a TOML file (pretty-printed), creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        info!(path = %path.display(), "saved options");
        Ok(())
    }
}
