use crate::color::Theme;
use crate::error::{FlowError, Result};
use crate::settings::FlowSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current config file format
pub const CONFIG_VERSION: u32 = 1;

/// Complete application configuration for export/import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version field for future compatibility
    pub version: u32,
    /// Renderer tuning
    pub settings: FlowSettings,
    /// Background theme
    #[serde(default)]
    pub theme: Theme,
    /// Canvas pixels per braille dot
    #[serde(default = "default_scale")]
    pub scale: u32,
    /// Ticks run per displayed frame
    #[serde(default = "default_ticks_per_frame")]
    pub ticks_per_frame: usize,
}

fn default_scale() -> u32 {
    4
}

fn default_ticks_per_frame() -> usize {
    1
}

impl AppConfig {
    /// Export config to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("saved config to {}", path.display());
        Ok(())
    }

    /// Import config from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        if config.version > CONFIG_VERSION {
            return Err(FlowError::Config(format!(
                "config version {} is newer than supported version {}",
                config.version, CONFIG_VERSION
            )));
        }
        log::info!("loaded config from {}", path.display());
        Ok(Self {
            settings: config.settings.sanitized(),
            scale: config.scale.clamp(1, 16),
            ticks_per_frame: config.ticks_per_frame.clamp(1, 8),
            ..config
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            settings: FlowSettings::default(),
            theme: Theme::default(),
            scale: default_scale(),
            ticks_per_frame: default_ticks_per_frame(),
        }
    }
}
