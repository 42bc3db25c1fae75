//! Site preferences persisted per device (theme, custom CSS, shading and
//! export format).
//!
//! The store is owned explicitly; there is no process-wide instance.

mod core;

pub use core::{
    DEFAULT_SITE_THEME, JsonFileStore, KEY_CUSTOM_CSS, KEY_EXPORT_AS_ZIP, KEY_SHADING,
    KEY_SITE_THEME, MemoryStore, PreferenceStore, Preferences, SITE_THEMES, SitePreferences,
    site_theme_label,
};
