//! Persisted per-target toggle preference.
//!
//! Remembers whether the panel was enabled for a target so the toggle can be
//! restored when the panel reopens. Backed by a small JSON file; a missing or
//! corrupt file simply yields defaults.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct TargetPrefs {
    #[serde(default)]
    enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PrefsFile {
    #[serde(default)]
    targets: HashMap<String, TargetPrefs>,
}

/// File-backed map of target id to enabled flag.
pub struct PrefStore {
    path: PathBuf,
    file: Mutex<PrefsFile>,
}

impl PrefStore {
    /// Loads preferences from `path`, falling back to defaults when the file
    /// is missing or unreadable.
    pub fn load(path: PathBuf) -> Self {
        let file = fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();
        Self {
            path,
            file: Mutex::new(file),
        }
    }

    /// Returns the remembered toggle state for a target, defaulting to off.
    pub fn enabled(&self, target_id: &str) -> bool {
        self.file
            .lock()
            .targets
            .get(target_id)
            .map(|prefs| prefs.enabled)
            .unwrap_or(false)
    }

    /// Records the toggle state for a target and persists immediately.
    /// Write failures are logged, not propagated; losing a preference is
    /// not worth failing the toggle.
    pub fn set_enabled(&self, target_id: &str, enabled: bool) {
        let serialized = {
            let mut file = self.file.lock();
            file.targets
                .entry(target_id.to_string())
                .or_default()
                .enabled = enabled;
            serde_json::to_string_pretty(&*file)
        };

        match serialized {
            Ok(json) => {
                if let Err(err) = fs::write(&self.path, json) {
                    tracing::warn!(path = %self.path.display(), error = %err, "failed to persist preferences");
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize preferences");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_defaults_to_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let store = PrefStore::load(dir.path().join("prefs.json"));
        assert!(!store.enabled("tab-1"));
    }

    #[test]
    fn toggle_state_round_trips_through_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let store = PrefStore::load(path.clone());
        store.set_enabled("tab-1", true);
        store.set_enabled("tab-2", false);

        let reloaded = PrefStore::load(path);
        assert!(reloaded.enabled("tab-1"));
        assert!(!reloaded.enabled("tab-2"));
        assert!(!reloaded.enabled("tab-3"));
    }

    #[test]
    fn corrupt_file_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "not json{").unwrap();

        let store = PrefStore::load(path);
        assert!(!store.enabled("tab-1"));
    }
}
