//! Client-only user preferences.
//!
//! `PreferenceStore` is a flat string-to-string map persisted as a JSON file,
//! the terminal counterpart of browser local storage. Values are stored as
//! strings (`"true"`, `"large"`) and decoded by `UserPreferences::load`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::InsightsError;

pub const DARK_MODE_KEY: &str = "darkMode";
pub const FONT_SIZE_KEY: &str = "fontSize";
pub const SHOW_CHARTS_KEY: &str = "showCharts";
pub const SHOW_FOLLOW_UP_KEY: &str = "showFollowUp";

// ============================================================================
// PreferenceStore
// ============================================================================

#[derive(Debug)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
    values: BTreeMap<String, String>,
}

impl PreferenceStore {
    /// Open the store at `path`. A missing or empty file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, InsightsError> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                InsightsError::Preferences(format!("{}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path: Some(path),
            values,
        })
    }

    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set one key and write the whole store through to disk.
    pub fn set(&mut self, key: &str, value: impl ToString) -> Result<(), InsightsError> {
        self.values.insert(key.to_string(), value.to_string());
        self.persist()
    }

    pub fn clear(&mut self) -> Result<(), InsightsError> {
        self.values.clear();
        self.persist()
    }

    fn persist(&self) -> Result<(), InsightsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.values)
            .map_err(|e| InsightsError::Preferences(e.to_string()))?;

        // Write to a sibling file and rename so a crash never leaves half a file.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

// ============================================================================
// UserPreferences
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontSize::Small => "small",
            FontSize::Medium => "medium",
            FontSize::Large => "large",
        }
    }
}

impl fmt::Display for FontSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FontSize {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "small" => Ok(FontSize::Small),
            "medium" => Ok(FontSize::Medium),
            "large" => Ok(FontSize::Large),
            other => Err(InsightsError::Validation(format!(
                "unknown font size '{}' (expected small, medium or large)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserPreferences {
    pub dark_mode: bool,
    pub font_size: FontSize,
    pub show_charts: bool,
    pub show_follow_up: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            dark_mode: false,
            font_size: FontSize::Medium,
            show_charts: true,
            show_follow_up: true,
        }
    }
}

impl UserPreferences {
    /// Dark mode is opt-in; charts and follow-ups are opt-out.
    pub fn load(store: &PreferenceStore) -> Self {
        Self {
            dark_mode: store.get(DARK_MODE_KEY) == Some("true"),
            font_size: store
                .get(FONT_SIZE_KEY)
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            show_charts: store.get(SHOW_CHARTS_KEY) != Some("false"),
            show_follow_up: store.get(SHOW_FOLLOW_UP_KEY) != Some("false"),
        }
    }

    pub fn save(&self, store: &mut PreferenceStore) -> Result<(), InsightsError> {
        store.set(DARK_MODE_KEY, self.dark_mode)?;
        store.set(FONT_SIZE_KEY, self.font_size)?;
        store.set(SHOW_CHARTS_KEY, self.show_charts)?;
        store.set(SHOW_FOLLOW_UP_KEY, self.show_follow_up)
    }

    /// Flip dark mode and persist only that key.
    pub fn toggle_dark_mode(&mut self, store: &mut PreferenceStore) -> Result<bool, InsightsError> {
        self.dark_mode = !self.dark_mode;
        store.set(DARK_MODE_KEY, self.dark_mode)?;
        Ok(self.dark_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_yields_defaults() {
        let store = PreferenceStore::in_memory();
        assert_eq!(UserPreferences::load(&store), UserPreferences::default());
    }

    #[test]
    fn test_load_rules_match_string_encoding() {
        let mut store = PreferenceStore::in_memory();
        store.set(DARK_MODE_KEY, "yes").unwrap();
        store.set(FONT_SIZE_KEY, "huge").unwrap();
        store.set(SHOW_CHARTS_KEY, "0").unwrap();
        store.set(SHOW_FOLLOW_UP_KEY, "false").unwrap();

        let prefs = UserPreferences::load(&store);
        // Only the literal "true" enables dark mode, only "false" disables the rest.
        assert!(!prefs.dark_mode);
        assert_eq!(prefs.font_size, FontSize::Medium);
        assert!(prefs.show_charts);
        assert!(!prefs.show_follow_up);
    }

    #[test]
    fn test_toggle_dark_mode_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        let mut store = PreferenceStore::open(&path).unwrap();
        let mut prefs = UserPreferences::load(&store);
        assert!(prefs.toggle_dark_mode(&mut store).unwrap());

        let reopened = PreferenceStore::open(&path).unwrap();
        assert_eq!(reopened.get(DARK_MODE_KEY), Some("true"));
        assert_eq!(reopened.get(FONT_SIZE_KEY), None, "toggle writes only darkMode");
        assert_eq!(UserPreferences::load(&reopened), prefs);
    }

    #[test]
    fn test_save_writes_every_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        let mut store = PreferenceStore::open(&path).unwrap();

        let prefs = UserPreferences {
            dark_mode: true,
            font_size: FontSize::Large,
            show_charts: false,
            show_follow_up: true,
        };
        prefs.save(&mut store).unwrap();

        let reopened = PreferenceStore::open(&path).unwrap();
        assert_eq!(reopened.get(FONT_SIZE_KEY), Some("large"));
        assert_eq!(reopened.get(SHOW_CHARTS_KEY), Some("false"));
        assert_eq!(UserPreferences::load(&reopened), prefs);
    }

    #[test]
    fn test_clear_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        let mut store = PreferenceStore::open(&path).unwrap();
        store.set(DARK_MODE_KEY, true).unwrap();
        store.clear().unwrap();

        let reopened = PreferenceStore::open(&path).unwrap();
        assert_eq!(reopened.get(DARK_MODE_KEY), None);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = PreferenceStore::open(&path).unwrap_err();
        assert!(matches!(err, InsightsError::Preferences(_)));
    }
}
