use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PacerError;
use crate::phase::PhaseSequence;

/// User-configurable pacing parameters.
///
/// The engine takes an immutable snapshot of these at session start, so
/// edits made while a session runs (or sits paused) only affect future
/// sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub inhale_secs: f64,
    pub hold_high_secs: f64,
    pub exhale_secs: f64,
    pub hold_low_secs: f64,
    pub session_minutes: u64,
    /// Audible cue on phase transitions.
    pub cue_on: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            inhale_secs: 4.0,
            hold_high_secs: 4.0,
            exhale_secs: 4.0,
            hold_low_secs: 4.0,
            session_minutes: 10,
            cue_on: true,
        }
    }
}

impl Settings {
    /// Build the validated phase sequence these settings describe.
    pub fn sequence(&self) -> Result<PhaseSequence, PacerError> {
        PhaseSequence::from_durations(
            self.inhale_secs,
            self.hold_high_secs,
            self.exhale_secs,
            self.hold_low_secs,
        )
    }

    pub fn total_secs(&self) -> f64 {
        (self.session_minutes * 60) as f64
    }
}

pub trait SettingsStore {
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "pacer") {
            pd.config_dir().join("settings.json")
        } else {
            PathBuf::from("pacer_settings.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileSettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Settings {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(settings) = serde_json::from_slice::<Settings>(&bytes) {
                return settings;
            }
        }
        Settings::default()
    }

    fn save(&self, settings: &Settings) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(settings).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = FileSettingsStore::with_path(&path);
        let settings = Settings::default();
        store.save(&settings).unwrap();
        let loaded = store.load();
        assert_eq!(settings, loaded);
    }

    #[test]
    fn save_and_load_custom_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = FileSettingsStore::with_path(&path);
        let settings = Settings {
            inhale_secs: 5.5,
            hold_high_secs: 0.0,
            exhale_secs: 7.0,
            hold_low_secs: 2.0,
            session_minutes: 20,
            cue_on: false,
        };
        store.save(&settings).unwrap();
        let loaded = store.load();
        assert_eq!(settings, loaded);
    }

    #[test]
    fn missing_or_corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = FileSettingsStore::with_path(&path);
        assert_eq!(store.load(), Settings::default());

        fs::write(&path, b"not json").unwrap();
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn default_settings_form_a_valid_session() {
        let settings = Settings::default();
        assert!(settings.sequence().is_ok());
        assert_eq!(settings.total_secs(), 600.0);
    }
}
