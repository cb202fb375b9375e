//! Persisted user settings behind an injected store
//!
//! Values are stored as strings; [`Setting`] keys carry the type and default
//! so callers get typed reads without knowing the storage format.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Raw key-value storage
pub trait SettingsStore {
    fn get_raw(&self, key: &str) -> Option<String>;
    fn set_raw(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str) -> bool;
}

/// Typed key with a default
#[derive(Debug, Clone, Copy)]
pub struct Setting<T> {
    pub name: &'static str,
    pub default: T,
}

impl<T> Setting<T> {
    pub const fn new(name: &'static str, default: T) -> Self {
        Self { name, default }
    }
}

/// Typed access on top of any store
pub trait SettingsExt: SettingsStore {
    /// Stored value, or the default when missing or unparsable
    fn get<T: FromStr + Clone>(&self, setting: &Setting<T>) -> T {
        match self.get_raw(setting.name) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!(
                    "Setting '{}' has unreadable value '{}', using default",
                    setting.name,
                    raw
                );
                setting.default.clone()
            }),
            None => setting.default.clone(),
        }
    }

    fn set<T: ToString>(&mut self, setting: &Setting<T>, value: T) {
        self.set_raw(setting.name, value.to_string());
    }

    fn reset<T>(&mut self, setting: &Setting<T>) -> bool {
        self.remove(setting.name)
    }
}

impl<S: SettingsStore + ?Sized> SettingsExt for S {}

#[derive(Debug, Default, Clone)]
pub struct MemorySettingsStore {
    values: BTreeMap<String, String>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_raw(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }
}

/// Settings persisted as a RON map
#[derive(Debug)]
pub struct RonSettingsStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl RonSettingsStore {
    /// Open the store, starting empty when the file does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            ron::from_str(&contents)
                .with_context(|| format!("Failed to parse settings in {}", path.display()))?
        } else {
            log::debug!("No settings at {}, starting empty", path.display());
            BTreeMap::new()
        };

        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = ron::ser::to_string_pretty(&self.values, ron::ser::PrettyConfig::default())
            .context("Failed to serialize settings")?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))?;
        log::debug!("Saved {} settings to {}", self.values.len(), self.path.display());
        Ok(())
    }
}

impl SettingsStore for RonSettingsStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_raw(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MUSIC: Setting<bool> = Setting::new("audio.music", true);
    const VOLUME: Setting<f32> = Setting::new("audio.volume", 0.8);
    const SEED: Setting<u64> = Setting::new("world.last_seed", 0);

    #[test]
    fn test_defaults_when_missing() {
        let store = MemorySettingsStore::new();
        assert!(store.get(&MUSIC));
        assert_eq!(store.get(&VOLUME), 0.8);
        assert_eq!(store.get(&SEED), 0);
    }

    #[test]
    fn test_typed_set_and_get() {
        let mut store = MemorySettingsStore::new();
        store.set(&MUSIC, false);
        store.set(&VOLUME, 0.25);
        store.set(&SEED, 987654321);

        assert!(!store.get(&MUSIC));
        assert_eq!(store.get(&VOLUME), 0.25);
        assert_eq!(store.get(&SEED), 987654321);
    }

    #[test]
    fn test_unparsable_value_falls_back() {
        let mut store = MemorySettingsStore::new();
        store.set_raw("audio.volume", "loud".to_string());
        assert_eq!(store.get(&VOLUME), 0.8);
    }

    #[test]
    fn test_reset_removes_value() {
        let mut store = MemorySettingsStore::new();
        store.set(&VOLUME, 0.1);
        assert!(store.reset(&VOLUME));
        assert!(!store.reset(&VOLUME));
        assert_eq!(store.get(&VOLUME), 0.8);
    }

    #[test]
    fn test_ron_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.ron");

        let mut store = RonSettingsStore::open(&path).unwrap();
        store.set(&MUSIC, false);
        store.set(&SEED, 42);
        store.save().unwrap();

        let reopened = RonSettingsStore::open(&path).unwrap();
        assert!(!reopened.get(&MUSIC));
        assert_eq!(reopened.get(&SEED), 42);
        assert_eq!(reopened.get(&VOLUME), 0.8);
    }

    #[test]
    fn test_ron_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.ron");
        std::fs::write(&path, "not ron {").unwrap();
        assert!(RonSettingsStore::open(&path).is_err());
    }
}
