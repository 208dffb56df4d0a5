use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::storage::{JsonFileStorage, STORAGE_PATH_ENV};

const MAX_DRAG_ACTIVATION_DISTANCE: u16 = 10;
const DEFAULT_DRAG_ACTIVATION_DISTANCE: u16 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Overrides where the board record is written.
    pub storage_path: Option<PathBuf>,
    /// Cells the pointer must travel with the button held before a drag starts.
    pub drag_activation_distance: u16,
    pub confirm_column_delete: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_path: None,
            drag_activation_distance: DEFAULT_DRAG_ACTIVATION_DISTANCE,
            confirm_column_delete: true,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("taskflow");
        path.push("settings.toml");
        Some(path)
    }

    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) => {
                warn!("failed to read settings '{}': {}", path.display(), error);
                return Self::default();
            }
        };

        match toml::from_str::<Self>(&contents) {
            Ok(mut settings) => {
                settings.validate();
                settings
            }
            Err(error) => {
                warn!("failed to parse settings '{}': {}", path.display(), error);
                Self::default()
            }
        }
    }

    pub fn save_to_path(&self, path: &Path) -> anyhow::Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow!("invalid settings config path"))?;
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory '{}'", parent.display()))?;

        let mut validated = self.clone();
        validated.validate();
        let contents =
            toml::to_string_pretty(&validated).context("failed to serialize settings to TOML")?;

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, contents)
            .with_context(|| format!("failed to write '{}'", tmp_path.display()))?;
        fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to move settings into '{}'", path.display()))?;

        Ok(())
    }

    /// Resolves the board record location: explicit flag, then the
    /// environment, then settings, then the platform data directory.
    pub fn resolve_storage_path(&self, cli_override: Option<&Path>) -> anyhow::Result<PathBuf> {
        if let Some(path) = cli_override {
            return Ok(path.to_path_buf());
        }
        if let Some(path) = std::env::var_os(STORAGE_PATH_ENV).filter(|value| !value.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        if let Some(path) = self.storage_path.as_ref() {
            return Ok(path.clone());
        }
        JsonFileStorage::default_path()
    }

    fn validate(&mut self) {
        if self.drag_activation_distance > MAX_DRAG_ACTIVATION_DISTANCE {
            warn!(
                "drag_activation_distance {} is too large; clamping to {}",
                self.drag_activation_distance, MAX_DRAG_ACTIVATION_DISTANCE
            );
            self.drag_activation_distance = MAX_DRAG_ACTIVATION_DISTANCE;
        }
        if self
            .storage_path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            self.storage_path = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_file(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("taskflow").join("settings.toml")
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.storage_path, None);
        assert_eq!(settings.drag_activation_distance, 1);
        assert!(settings.confirm_column_delete);
    }

    #[test]
    fn test_load_missing_file() {
        let temp = tempfile::tempdir().expect("temp dir");
        assert_eq!(Settings::load_from_path(&settings_file(&temp)), Settings::default());
    }

    #[test]
    fn test_load_malformed_toml() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = settings_file(&temp);
        fs::create_dir_all(path.parent().expect("parent")).expect("config dir");
        fs::write(&path, "drag_activation_distance = [oops").expect("write settings");

        assert_eq!(Settings::load_from_path(&path), Settings::default());
    }

    #[test]
    fn test_load_partial_toml() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = settings_file(&temp);
        fs::create_dir_all(path.parent().expect("parent")).expect("config dir");
        fs::write(&path, "confirm_column_delete = false").expect("write settings");

        let settings = Settings::load_from_path(&path);
        assert!(!settings.confirm_column_delete);
        assert_eq!(settings.drag_activation_distance, DEFAULT_DRAG_ACTIVATION_DISTANCE);
        assert_eq!(settings.storage_path, None);
    }

    #[test]
    fn test_save_and_load_roundtrip() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = settings_file(&temp);
        let expected = Settings {
            storage_path: Some(temp.path().join("board.json")),
            drag_activation_distance: 3,
            confirm_column_delete: false,
        };

        expected.save_to_path(&path)?;

        assert_eq!(Settings::load_from_path(&path), expected);
        Ok(())
    }

    #[test]
    fn test_validate_clamps_drag_distance() {
        let mut settings = Settings {
            drag_activation_distance: 400,
            storage_path: Some(PathBuf::new()),
            ..Settings::default()
        };
        settings.validate();
        assert_eq!(settings.drag_activation_distance, MAX_DRAG_ACTIVATION_DISTANCE);
        assert_eq!(settings.storage_path, None);
    }

    #[test]
    fn test_cli_override_wins() -> anyhow::Result<()> {
        let settings = Settings {
            storage_path: Some(PathBuf::from("/from/settings.json")),
            ..Settings::default()
        };
        let resolved = settings.resolve_storage_path(Some(Path::new("/from/flag.json")))?;
        assert_eq!(resolved, PathBuf::from("/from/flag.json"));
        Ok(())
    }
}
