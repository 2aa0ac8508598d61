//! Application configuration, read from JSON.
//!
//! Every field has a default, so `{}` is a valid configuration file.

use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Terminal window title.
    pub title: String,
    pub target_fps: u32,
    /// Logic ticks per second.
    pub target_tps: u32,
    /// Start with the debug overlay visible.
    pub debug_overlay: bool,
    /// JSON node description to build the scene from.
    pub layout: Option<String>,
    /// Run without a terminal, discarding output. Useful for smoke runs.
    pub headless: bool,
    /// Headless surface size.
    pub width: u16,
    pub height: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "drawable".to_string(),
            target_fps: 60,
            target_tps: 60,
            debug_overlay: false,
            layout: None,
            headless: false,
            width: 80,
            height: 24,
        }
    }
}

impl AppConfig {
    pub fn from_json(source: &str) -> Result<Self, String> {
        let config: AppConfig =
            serde_json::from_str(source).map_err(|e| format!("Invalid config: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        Self::from_json(&source)
    }

    fn validate(&self) -> Result<(), String> {
        if self.target_fps == 0 || self.target_tps == 0 {
            return Err("target_fps and target_tps must be positive".to_string());
        }
        Ok(())
    }
}
