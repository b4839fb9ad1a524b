use crate::color::Theme;
use crate::error::{FlowError, Result};
use crate::field::FieldParams;
use crate::settings::{FlowSettings, SpawnRanges};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A named set of renderer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub description: String,
    pub settings: FlowSettings,
    #[serde(default)]
    pub theme: Theme,
}

impl Preset {
    pub fn new(name: impl Into<String>, description: impl Into<String>, settings: FlowSettings, theme: Theme) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            settings,
            theme,
        }
    }
}

/// Built-in presets that ship with the app
pub fn builtin_presets() -> Vec<Preset> {
    vec![
        Preset::new(
            "Aurora",
            "Teal-to-violet ribbons drifting slowly (default)",
            FlowSettings::default(),
            Theme::Dark,
        ),
        Preset::new(
            "Ember",
            "Warm short-lived sparks on a dark sky",
            FlowSettings {
                spawn: SpawnRanges {
                    lifetime_min: 120,
                    lifetime_span: 180,
                    hue_base: 0.0,
                    hue_span: 50.0,
                    ..Default::default()
                },
                hue_shift: 20.0,
                time_step: 2.0,
                ..Default::default()
            },
            Theme::Dark,
        ),
        Preset::new(
            "Glacier",
            "Cold, slow, wide strokes on a light background",
            FlowSettings {
                spawn: SpawnRanges {
                    hue_base: 190.0,
                    hue_span: 30.0,
                    size_base: 1.2,
                    size_span: 1.5,
                    ..Default::default()
                },
                field: FieldParams {
                    base_speed: 0.3,
                    speed_gain: 0.4,
                    ..Default::default()
                },
                head_lightness: 0.45,
                tail_lightness: 0.4,
                fade_alpha: 0.06,
                ..Default::default()
            },
            Theme::Light,
        ),
        Preset::new(
            "Storm",
            "Dense, fast turbulence",
            FlowSettings {
                max_density: 160,
                area_per_particle: 8_000,
                field: FieldParams {
                    freq_x: 0.0061,
                    freq_y: 0.0057,
                    freq_xy: 0.0029,
                    base_speed: 1.2,
                    speed_gain: 1.1,
                    ..Default::default()
                },
                time_step: 3.0,
                fade_alpha: 0.2,
                ..Default::default()
            },
            Theme::Dark,
        ),
        Preset::new(
            "Drift",
            "Sparse long trails that linger",
            FlowSettings {
                max_density: 30,
                area_per_particle: 30_000,
                trail_length: 10.0,
                fade_alpha: 0.03,
                spawn: SpawnRanges {
                    lifetime_min: 1200,
                    lifetime_span: 800,
                    ..Default::default()
                },
                ..Default::default()
            },
            Theme::Dark,
        ),
    ]
}

/// Replace characters that are unsafe in file names
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Manager for loading and saving presets
pub struct PresetManager {
    /// Built-in presets
    pub builtin: Vec<Preset>,
    /// User-created presets loaded from disk
    pub user: Vec<Preset>,
    dir: Option<PathBuf>,
}

impl Default for PresetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetManager {
    /// Built-ins plus user presets from the config directory
    pub fn new() -> Self {
        Self::with_dir(Self::default_dir())
    }

    /// Built-ins plus user presets from `dir` (None = built-ins only)
    pub fn with_dir(dir: Option<PathBuf>) -> Self {
        let mut manager = Self {
            builtin: builtin_presets(),
            user: Vec::new(),
            dir,
        };
        manager.load_user_presets();
        manager
    }

    /// Default presets directory path
    fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("flow-field").join("presets"))
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Load user presets from disk, skipping files that fail to parse
    fn load_user_presets(&mut self) {
        let Some(dir) = &self.dir else { return };
        let Ok(entries) = fs::read_dir(dir) else { return };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(FlowError::from)
                .and_then(|content| Ok(serde_json::from_str::<Preset>(&content)?))
            {
                Ok(preset) => self.user.push(preset),
                Err(err) => log::warn!("skipping preset {}: {}", path.display(), err),
            }
        }
        self.user.sort_by(|a, b| a.name.cmp(&b.name));
    }

    /// Save a preset to disk, replacing a user preset of the same name
    pub fn save_preset(&mut self, preset: Preset) -> Result<PathBuf> {
        let dir = self
            .dir
            .clone()
            .ok_or_else(|| FlowError::Config("could not determine config directory".into()))?;
        if self.builtin.iter().any(|p| p.name.eq_ignore_ascii_case(&preset.name)) {
            return Err(FlowError::Config(format!(
                "'{}' is a built-in preset name",
                preset.name
            )));
        }

        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}.json", sanitize_filename(&preset.name)));
        fs::write(&path, serde_json::to_string_pretty(&preset)?)?;
        log::info!("saved preset '{}' to {}", preset.name, path.display());

        self.user.retain(|p| p.name != preset.name);
        self.user.push(preset);
        Ok(path)
    }

    /// Delete a user preset
    pub fn delete_preset(&mut self, name: &str) -> Result<()> {
        let dir = self
            .dir
            .clone()
            .ok_or_else(|| FlowError::Config("could not determine config directory".into()))?;
        let before = self.user.len();
        self.user.retain(|p| p.name != name);
        if self.user.len() == before {
            return Err(FlowError::Config(format!("no user preset named '{}'", name)));
        }

        let path = dir.join(format!("{}.json", sanitize_filename(name)));
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// Get all presets (builtin + user)
    pub fn all_presets(&self) -> impl Iterator<Item = &Preset> {
        self.builtin.iter().chain(self.user.iter())
    }

    /// Find a preset by name (case-insensitive)
    pub fn find(&self, name: &str) -> Option<&Preset> {
        self.all_presets().find(|p| p.name.eq_ignore_ascii_case(name))
    }
}
