use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;

use super::{Route, ScreenContext};
use crate::bridge::SimRuntime;
use crate::document::DocumentHost;
use crate::error::{FrontError, Result};
use crate::logging::{LogLevel, TARGET_SETTINGS, emit, json_kv, json_str};
use crate::metrics;
use crate::prefs::{Preferences, SitePreferences};
use crate::theme::ThemeEditor;

/// Game settings shown on the form, in display order. Anything else the
/// runtime reports is left off the form.
pub const SETTING_LABELS: &[(&str, &str)] = &[
    ("disasters", "Allow mass extinction events"),
    (
        "deputy",
        "Allow leaders to automatically choose a new deputy. The Warrior Code rules will be \
         taken into account when choosing a deputy.",
    ),
    (
        "12_moon_graduation",
        "Disable experience-based apprentice graduation.",
    ),
    (
        "retirement",
        "Cats will never retire due to a permanent condition",
    ),
    (
        "become_mediator",
        "Allow warriors and elders to choose to become mediators",
    ),
    (
        "affair",
        "Allow cats to breed with cats that aren't their mates",
    ),
    ("same sex birth", "Pregnancy ignores biology"),
    ("same sex adoption", "Increase same-sex adoption"),
    (
        "single parentage",
        "Allow cats to have kittens with an unknown second parent",
    ),
    (
        "romantic with former mentor",
        "Allow romantic interactions with former mentors",
    ),
    (
        "first cousin mates",
        "Allow first cousins to be mates and have romantic interactions",
    ),
];

pub const SHADING_LABEL: &str = "Enable shading for cat sprites";
pub const EXPORT_AS_ZIP_LABEL: &str = "Export save as .zip instead of .sav";
pub const CUSTOM_CSS_WARNING: &str = "Your custom CSS will be injected onto every page except \
for this one. For your safety, please only input CSS that you 100% trust.";

pub fn setting_label(key: &str) -> Option<&'static str> {
    SETTING_LABELS
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, label)| *label)
}

/// Keep only the settings the form knows how to label.
pub fn retain_known(all: BTreeMap<String, bool>) -> BTreeMap<String, bool> {
    all.into_iter()
        .filter(|(key, _)| setting_label(key).is_some())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingRow {
    pub key: &'static str,
    pub label: &'static str,
    pub checked: bool,
}

/// Settings screen: game flags owned by the runtime plus site preferences
/// owned by this device.
pub struct SettingsController {
    runtime: Arc<dyn SimRuntime>,
    ctx: ScreenContext,
    prefs: Preferences,
    settings: BTreeMap<String, bool>,
    site: SitePreferences,
    theme: ThemeEditor,
}

impl SettingsController {
    pub fn new(runtime: Arc<dyn SimRuntime>, prefs: Preferences, ctx: ScreenContext) -> Self {
        Self {
            runtime,
            ctx,
            prefs,
            settings: BTreeMap::new(),
            site: SitePreferences::default(),
            theme: ThemeEditor::new(),
        }
    }

    pub fn route(&self) -> Route {
        Route::Settings
    }

    /// Prepare the form. The live custom stylesheet is blanked while this
    /// page is shown so a broken stylesheet cannot hide the form itself.
    pub async fn mount(&mut self, document: &mut dyn DocumentHost) -> Result<()> {
        document.set_title(&self.ctx.page_title("Settings"));
        document.set_custom_css("");

        self.site = self.prefs.load();
        self.theme.seed_from(document);

        let fetched = self.runtime.get_settings().await;
        metrics::record(self.ctx.metrics.as_ref(), |m| m.record_fetch(fetched.is_ok()));
        let all = match fetched {
            Ok(all) => all,
            Err(err) => {
                emit(
                    self.ctx.logger.as_ref(),
                    LogLevel::Warn,
                    TARGET_SETTINGS,
                    "fetch_failed",
                    [json_str("error", err.to_string())],
                );
                return Err(err.into());
            }
        };

        let reported = all.len();
        self.settings = retain_known(all);
        emit(
            self.ctx.logger.as_ref(),
            LogLevel::Info,
            TARGET_SETTINGS,
            "settings_loaded",
            [
                json_kv("reported", json!(reported)),
                json_kv("shown", json!(self.settings.len())),
            ],
        );
        Ok(())
    }

    /// Flip a game setting locally. Returns the new value, or `None` for a key
    /// that is not on the form.
    pub fn toggle(&mut self, key: &str) -> Option<bool> {
        let value = self.settings.get_mut(key)?;
        *value = !*value;
        Some(*value)
    }

    pub fn settings(&self) -> &BTreeMap<String, bool> {
        &self.settings
    }

    pub fn rows(&self) -> Vec<SettingRow> {
        SETTING_LABELS
            .iter()
            .filter_map(|(key, label)| {
                self.settings.get(*key).map(|checked| SettingRow {
                    key: *key,
                    label: *label,
                    checked: *checked,
                })
            })
            .collect()
    }

    pub fn site(&self) -> &SitePreferences {
        &self.site
    }

    pub fn set_site_theme(&mut self, theme: impl Into<String>) {
        self.site.site_theme = theme.into();
    }

    pub fn set_custom_css(&mut self, css: impl Into<String>) {
        self.site.custom_css = css.into();
    }

    pub fn toggle_shading(&mut self) -> bool {
        self.site.shading = !self.site.shading;
        self.site.shading
    }

    pub fn toggle_export_as_zip(&mut self) -> bool {
        self.site.export_as_zip = !self.site.export_as_zip;
        self.site.export_as_zip
    }

    pub fn theme(&self) -> &ThemeEditor {
        &self.theme
    }

    pub fn theme_mut(&mut self) -> &mut ThemeEditor {
        &mut self.theme
    }

    pub fn theme_css(&self) -> String {
        self.theme.generate_css()
    }

    /// Push the whole game settings mapping, then persist the site
    /// preferences, apply the custom CSS and head home.
    ///
    /// If the runtime refuses, the user is alerted and nothing local is
    /// written; the form keeps its state so the save can be retried. A
    /// failed preference write is alerted the same way, though the runtime
    /// already holds the new game settings by then.
    pub async fn save(&mut self, document: &mut dyn DocumentHost) -> Result<Route> {
        if let Err(err) = self.runtime.set_settings(self.settings.clone()).await {
            return Err(self.save_failed("runtime", err.into()));
        }
        if let Err(err) = self.prefs.save(&self.site) {
            return Err(self.save_failed("preferences", err));
        }
        metrics::record(self.ctx.metrics.as_ref(), |m| m.record_save(true));
        document.set_custom_css(&self.site.custom_css);
        emit(
            self.ctx.logger.as_ref(),
            LogLevel::Info,
            TARGET_SETTINGS,
            "settings_saved",
            [
                json_kv("game_settings", json!(self.settings.len())),
                json_str("site_theme", self.site.site_theme.clone()),
            ],
        );
        Ok(Route::Home)
    }

    /// Put the stored custom CSS back on the page, dropping unsaved edits to
    /// it. Used when leaving this screen without saving.
    pub fn restore_custom_css(&self, document: &mut dyn DocumentHost) {
        document.set_custom_css(&self.prefs.load().custom_css);
    }

    fn save_failed(&self, stage: &str, err: FrontError) -> FrontError {
        metrics::record(self.ctx.metrics.as_ref(), |m| m.record_save(false));
        emit(
            self.ctx.logger.as_ref(),
            LogLevel::Error,
            TARGET_SETTINGS,
            "save_failed",
            [json_str("stage", stage), json_str("error", err.to_string())],
        );
        self.ctx
            .notifier
            .alert(&format!("Settings could not be saved: {err}"));
        err
    }
}
