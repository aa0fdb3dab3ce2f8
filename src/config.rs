use crate::render::BackendKind;
use crate::render::material::DEFAULT_MATERIAL;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Written into exported file headers.
    pub app_name: String,
    pub default_point_radius: f32,
    pub default_material: String,
    /// Recompute the scene length scale and bounds after each registration.
    pub auto_scene_extents: bool,
    /// Length scale used while the scene has no measurable extent.
    pub initial_length_scale: f32,
    pub backend: BackendKind,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            app_name: "cloudscope".to_string(),
            default_point_radius: 0.005,
            default_material: DEFAULT_MATERIAL.to_string(),
            auto_scene_extents: true,
            initial_length_scale: 1.0,
            backend: BackendKind::Headless,
        }
    }
}

impl SceneConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.default_point_radius.is_finite() && self.default_point_radius >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "default_point_radius must be a non-negative number, got {}",
                self.default_point_radius
            )));
        }
        if !(self.initial_length_scale.is_finite() && self.initial_length_scale > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "initial_length_scale must be positive, got {}",
                self.initial_length_scale
            )));
        }
        if crate::render::material::material(&self.default_material).is_none() {
            return Err(ConfigError::Invalid(format!(
                "unknown default_material '{}'",
                self.default_material
            )));
        }
        Ok(())
    }
}
