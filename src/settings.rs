//! Persistent renderer settings.
//!
//! Stored as JSON under the platform config directory. Loading is
//! forgiving: a missing or unreadable file yields defaults, unknown
//! fields are ignored and missing fields filled in, so settings from
//! older versions keep working.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::util::{Error, Result};

const APP_DIR: &str = "glint";
const SETTINGS_FILE: &str = "settings.json";

/// Renderer settings that persist between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub samples_per_pixel: u32,
    pub max_bounces: u32,
    pub firefly_clamp: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            samples_per_pixel: 1,
            max_bounces: 8,
            firefly_clamp: true,
        }
    }
}

impl RenderSettings {
    /// Settings file path under the platform config directory.
    fn path() -> Result<PathBuf> {
        let mut p = dirs::config_dir().ok_or(Error::NoConfigDir)?;
        p.push(APP_DIR);
        std::fs::create_dir_all(&p)?;
        p.push(SETTINGS_FILE);
        Ok(p)
    }

    /// Load from the default location, falling back to defaults on any
    /// failure.
    pub fn load() -> Self {
        match Self::path().and_then(|p| Self::load_from(&p)) {
            Ok(settings) => settings,
            Err(err) => {
                log::debug!("settings not loaded ({err}), using defaults");
                Self::default()
            }
        }
    }

    /// Load and validate from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::SettingsNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let mut settings: Self = serde_json::from_str(&text)?;
        settings.sanitize();
        Ok(settings)
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Save to an explicit path as pretty JSON.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Clamp out-of-range values from hand-edited files.
    fn sanitize(&mut self) {
        self.samples_per_pixel = self.samples_per_pixel.clamp(1, 64);
        self.max_bounces = self.max_bounces.clamp(1, 64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = RenderSettings::default();
        settings.samples_per_pixel = 4;
        settings.max_bounces = 12;
        settings.firefly_clamp = false;
        settings.save_to(&path).unwrap();

        let loaded = RenderSettings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_file_is_typed_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let err = RenderSettings::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::SettingsNotFound(_)));
    }

    #[test]
    fn test_malformed_json_is_error_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(RenderSettings::load_from(&path).is_err());
    }

    #[test]
    fn test_unknown_and_missing_fields_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"max_bounces": 3, "some_future_field": true}"#).unwrap();

        let loaded = RenderSettings::load_from(&path).unwrap();
        assert_eq!(loaded.max_bounces, 3);
        assert_eq!(
            loaded.samples_per_pixel,
            RenderSettings::default().samples_per_pixel
        );
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"samples_per_pixel": 0, "max_bounces": 9999}"#).unwrap();

        let loaded = RenderSettings::load_from(&path).unwrap();
        assert_eq!(loaded.samples_per_pixel, 1);
        assert_eq!(loaded.max_bounces, 64);
    }
}
