use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::tracker::{Threshold, DEFAULT_THRESHOLD_PERCENT};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSettings {
    /// Minimum confidence as a percentage in [0, 100].
    pub threshold_percent: f64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            threshold_percent: DEFAULT_THRESHOLD_PERCENT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserSettings {
    tracker: TrackerSettings,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            tracker: TrackerSettings::default(),
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn tracker(&self) -> TrackerSettings {
        self.data.read().unwrap().tracker.clone()
    }

    /// The configured threshold, validated; unusable values fall back to
    /// the 80% default.
    pub fn threshold(&self) -> Threshold {
        Threshold::from_percent(self.tracker().threshold_percent)
    }

    pub fn update_tracker(&self, settings: TrackerSettings) -> Result<()> {
        {
            let mut guard = self.data.write().unwrap();
            guard.tracker = settings;
            self.persist(&guard)?;
        }
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir().join(format!("posetrack-settings-{}.json", Uuid::new_v4()))
    }

    #[test]
    fn missing_file_yields_defaults() {
        let store = SettingsStore::new(scratch_path()).unwrap();
        assert_eq!(store.tracker().threshold_percent, 80.0);
        assert_eq!(store.threshold(), Threshold::from_percent(80.0));
    }

    #[test]
    fn updates_persist_and_reload() {
        let path = scratch_path();
        let store = SettingsStore::new(path.clone()).unwrap();
        store
            .update_tracker(TrackerSettings {
                threshold_percent: 65.0,
            })
            .unwrap();

        let reloaded = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(reloaded.tracker().threshold_percent, 65.0);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn out_of_range_threshold_falls_back_to_default() {
        let path = scratch_path();
        let store = SettingsStore::new(path.clone()).unwrap();
        store
            .update_tracker(TrackerSettings {
                threshold_percent: 250.0,
            })
            .unwrap();
        assert_eq!(store.threshold(), Threshold::from_percent(80.0));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn corrupt_settings_file_falls_back_to_defaults() {
        let path = scratch_path();
        fs::write(&path, "not json").unwrap();
        let store = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(store.tracker().threshold_percent, 80.0);
        let _ = fs::remove_file(path);
    }
}
