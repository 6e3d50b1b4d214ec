use crate::catalog::{CatalogEndpoint, CatalogRequest, DEFAULT_BASE_URL};
use crate::render::DEFAULT_HOVER_SCALE;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Session settings. Every field has a default, so a partial file is fine.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct KitConfig {
    /// Resolution tier requested from the catalog, e.g. "1k".
    pub resolution_tier: String,
    /// Uniform scale applied to the hovered object.
    pub hover_scale: f32,
    pub camera_fov_y_deg: f32,
    pub catalog_base_url: String,
    pub user_agent: String,
}

impl Default for KitConfig {
    fn default() -> Self {
        Self {
            resolution_tier: "1k".to_string(),
            hover_scale: DEFAULT_HOVER_SCALE,
            camera_fov_y_deg: 60.0,
            catalog_base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: "havenkit".to_string(),
        }
    }
}

impl KitConfig {
    pub fn validate(&self) -> Result<()> {
        if self.resolution_tier.trim().is_empty() {
            return Err(ConfigError::Invalid("resolution_tier is empty".to_string()));
        }
        if !(self.hover_scale.is_finite() && self.hover_scale > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "hover_scale must be positive, got {}",
                self.hover_scale
            )));
        }
        if !(self.camera_fov_y_deg > 0.0 && self.camera_fov_y_deg < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "camera_fov_y_deg must be in (0, 180), got {}",
                self.camera_fov_y_deg
            )));
        }
        Ok(())
    }

    /// Request for `endpoint` against the configured catalog.
    pub fn catalog_request(&self, endpoint: &CatalogEndpoint) -> CatalogRequest {
        endpoint.request(&self.catalog_base_url, &self.user_agent)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: KitConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

pub fn save_config_to_file(config: &KitConfig, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_config_from_file(path: &Path) -> Result<KitConfig> {
    let json = std::fs::read_to_string(path)?;
    KitConfig::from_json_str(&json)
}
