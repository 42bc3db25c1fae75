use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{FrontError, Result};

pub const KEY_SITE_THEME: &str = "site-theme";
pub const KEY_CUSTOM_CSS: &str = "custom-css";
pub const KEY_SHADING: &str = "shading-enabled";
pub const KEY_EXPORT_AS_ZIP: &str = "export-as-zip";

pub const DEFAULT_SITE_THEME: &str = "auto";

/// Selectable site themes as `(value, label)`.
pub const SITE_THEMES: &[(&str, &str)] = &[
    ("auto", "Sync with System"),
    ("theme-light", "Light"),
    ("theme-dark", "Dark"),
    ("theme-clangen-dark", "ClanGen Dark (Partially Complete)"),
    ("theme-custom", "Custom Theme"),
];

pub fn site_theme_label(value: &str) -> Option<&'static str> {
    SITE_THEMES
        .iter()
        .find(|(candidate, _)| *candidate == value)
        .map(|(_, label)| *label)
}

/// String key/value storage with local-storage semantics.
pub trait PreferenceStore: Send {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    items: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl PreferenceStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.items.remove(key);
        Ok(())
    }
}

/// A single JSON object on disk, rewritten on every mutation.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl JsonFileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let items = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw).map_err(|err| {
                    FrontError::Storage(format!("{} is not a preference file: {err}", path.display()))
                })?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, items })
    }

    fn flush(&self) -> Result<()> {
        let raw = serde_json::to_string_pretty(&self.items)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl PreferenceStore for JsonFileStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        if self.items.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Site-only settings edited on the settings screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePreferences {
    pub site_theme: String,
    pub custom_css: String,
    pub shading: bool,
    pub export_as_zip: bool,
}

impl Default for SitePreferences {
    fn default() -> Self {
        Self {
            site_theme: DEFAULT_SITE_THEME.to_string(),
            custom_css: String::new(),
            shading: false,
            export_as_zip: false,
        }
    }
}

/// Owner of the preference store. Reads fall back to defaults; nothing is
/// validated.
pub struct Preferences {
    store: Box<dyn PreferenceStore>,
}

impl Preferences {
    pub fn new<S>(store: S) -> Self
    where
        S: PreferenceStore + 'static,
    {
        Self {
            store: Box::new(store),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    pub fn load(&self) -> SitePreferences {
        let site_theme = self
            .store
            .get_item(KEY_SITE_THEME)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_SITE_THEME.to_string());
        SitePreferences {
            site_theme,
            custom_css: self.store.get_item(KEY_CUSTOM_CSS).unwrap_or_default(),
            shading: self.store.get_item(KEY_SHADING).is_some(),
            export_as_zip: self.store.get_item(KEY_EXPORT_AS_ZIP).is_some(),
        }
    }

    pub fn save(&mut self, prefs: &SitePreferences) -> Result<()> {
        self.store.set_item(KEY_SITE_THEME, &prefs.site_theme)?;
        self.store.set_item(KEY_CUSTOM_CSS, &prefs.custom_css)?;
        self.write_flag(KEY_SHADING, prefs.shading)?;
        self.write_flag(KEY_EXPORT_AS_ZIP, prefs.export_as_zip)
    }

    /// Flags are stored by presence only.
    fn write_flag(&mut self, key: &str, enabled: bool) -> Result<()> {
        if enabled {
            self.store.set_item(key, "true")
        } else {
            self.store.remove_item(key)
        }
    }

    pub fn store(&self) -> &dyn PreferenceStore {
        self.store.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_yields_defaults() {
        let prefs = Preferences::in_memory();
        assert_eq!(prefs.load(), SitePreferences::default());
    }

    #[test]
    fn flags_are_presence_based() {
        let mut store = MemoryStore::new();
        store.set_item(KEY_SHADING, "false").unwrap();
        store.set_item(KEY_SITE_THEME, "").unwrap();
        let prefs = Preferences::new(store).load();
        assert!(prefs.shading);
        assert!(!prefs.export_as_zip);
        assert_eq!(prefs.site_theme, DEFAULT_SITE_THEME);
    }

    #[test]
    fn clearing_a_flag_removes_its_key() {
        let mut prefs = Preferences::in_memory();
        let mut site = SitePreferences {
            shading: true,
            export_as_zip: true,
            ..SitePreferences::default()
        };
        prefs.save(&site).unwrap();
        assert_eq!(prefs.store().get_item(KEY_SHADING).as_deref(), Some("true"));

        site.shading = false;
        prefs.save(&site).unwrap();
        assert!(prefs.store().get_item(KEY_SHADING).is_none());
        assert!(prefs.load().export_as_zip);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        {
            let mut prefs = Preferences::new(JsonFileStore::open(&path).unwrap());
            prefs
                .save(&SitePreferences {
                    site_theme: "theme-dark".into(),
                    custom_css: "body { color: red; }".into(),
                    shading: true,
                    export_as_zip: false,
                })
                .unwrap();
        }

        let reopened = Preferences::new(JsonFileStore::open(&path).unwrap()).load();
        assert_eq!(reopened.site_theme, "theme-dark");
        assert_eq!(reopened.custom_css, "body { color: red; }");
        assert!(reopened.shading);
        assert!(!reopened.export_as_zip);
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(matches!(err, FrontError::Storage(_)));
    }

    #[test]
    fn theme_labels_cover_custom() {
        assert_eq!(site_theme_label("theme-custom"), Some("Custom Theme"));
        assert_eq!(site_theme_label("neon"), None);
    }
}
