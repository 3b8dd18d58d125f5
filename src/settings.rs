//! Tool settings with persistence
//!
//! Settings live in `~/.config/marrow/settings.toml` unless `--config` names
//! another file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use marrow_anim::AnimationConfig;
use marrow_core::TimeConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// All settings the `marrow` tool reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarrowSettings {
    pub time: TimeConfig,
    pub animation: AnimationConfig,
}

impl MarrowSettings {
    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("marrow").join("settings.toml"))
    }

    /// Load from an explicit file. A file the user named must exist and parse.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Load from the default location, or return defaults if missing or broken.
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            warn!("Could not determine config directory");
            return Self::default();
        };

        if !path.exists() {
            info!("No settings file found, using defaults");
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("{:#}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save settings to disk
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marrow_anim::BlendMode;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            "[animation]\nblend_mode = \"decomposed\"\nmax_bones = 64\n",
        )
        .unwrap();

        let settings = MarrowSettings::load_from(&path).unwrap();
        assert_eq!(settings.animation.blend_mode, BlendMode::Decomposed);
        assert_eq!(settings.animation.max_bones, 64);
        assert_eq!(settings.animation.default_cross_fade, 0.25);
        assert_eq!(settings.time.time_scale, 1.0);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");
        let mut settings = MarrowSettings::default();
        settings.time.max_delta_time = 0.1;
        settings.save_to(&path).unwrap();

        let loaded = MarrowSettings::load_from(&path).unwrap();
        assert_eq!(loaded.time.max_delta_time, 0.1);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(MarrowSettings::load_from(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[animation\n").unwrap();
        assert!(MarrowSettings::load_from(&path).is_err());
    }
}
