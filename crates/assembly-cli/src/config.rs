//! Configuration loading

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use assembly_scene::PlayerSettings;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// GraphQL endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Base URL that model paths and the session check are resolved against
    #[serde(default = "default_asset_base")]
    pub asset_base: String,
    /// Admin bearer token for protected requests
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            asset_base: default_asset_base(),
            token: None,
        }
    }
}

impl ServiceConfig {
    pub fn session_url(&self) -> String {
        format!("{}/auth/token/me", self.asset_base.trim_end_matches('/'))
    }

    /// Model paths are server-relative; absolute URLs pass through
    pub fn asset_url(&self, model_path: &str) -> String {
        if model_path.starts_with("http://") || model_path.starts_with("https://") {
            return model_path.to_string();
        }
        format!(
            "{}/{}",
            self.asset_base.trim_end_matches('/'),
            model_path.trim_start_matches('/')
        )
    }
}

fn default_endpoint() -> String {
    "http://localhost:8000/graphql".to_string()
}

fn default_asset_base() -> String {
    "http://localhost:8000".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_focus_duration")]
    pub focus_duration_ms: u64,
    /// Camera distance as a multiple of the focused mesh's largest dimension
    #[serde(default = "default_distance_factor")]
    pub distance_factor: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            focus_duration_ms: default_focus_duration(),
            distance_factor: default_distance_factor(),
        }
    }
}

fn default_focus_duration() -> u64 {
    750
}

fn default_distance_factor() -> f32 {
    2.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Vertical field of view in degrees
    #[serde(default = "default_fov")]
    pub fov: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self { fov: default_fov() }
    }
}

fn default_fov() -> f32 {
    75.0
}

impl Config {
    pub fn player_settings(&self) -> PlayerSettings {
        PlayerSettings {
            focus_duration: Duration::from_millis(self.playback.focus_duration_ms),
            distance_factor: self.playback.distance_factor,
        }
    }
}

/// Load configuration from file, or defaults when the file does not exist
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}
