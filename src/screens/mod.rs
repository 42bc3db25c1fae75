//! Screen controllers for the mediation and settings pages, plus the pieces
//! they share: routes, the screen phase, user notifications and diagnostics.

use std::sync::{Arc, Mutex};

use crate::logging::Logger;
use crate::metrics::SharedMetrics;

pub mod mediation;
pub mod picker;
pub mod settings;

pub use mediation::{
    ALLOW_ROMANTIC_LABEL, AttemptOutcome, CurrentPair, MEDIATION_INTRO, MediationController,
    MediationControls, MediationView, NO_MEDIATORS_NOTICE, PAIR_ALREADY_MEDIATED, PAIR_RULE,
    PickerSlot, ReadyView,
};
pub use picker::CatPicker;
pub use settings::{
    CUSTOM_CSS_WARNING, EXPORT_AS_ZIP_LABEL, SETTING_LABELS, SHADING_LABEL, SettingRow,
    SettingsController, retain_known, setting_label,
};

/// Destinations a screen can send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Mediate,
    Settings,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Mediate => "/mediate",
            Self::Settings => "/settings",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Mediate => "Mediate",
            Self::Settings => "Settings",
        }
    }

    /// Breadcrumb trail leading to this route.
    pub fn crumbs(self) -> Vec<Route> {
        match self {
            Self::Home => vec![Self::Home],
            other => vec![Self::Home, other],
        }
    }
}

/// Whether a screen is waiting for input or showing the result of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenPhase {
    #[default]
    Start,
    InProgress,
}

/// Blocking user notification (the browser's `alert`).
pub trait Notifier: Send + Sync {
    fn alert(&self, message: &str);
}

#[derive(Debug, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn alert(&self, _message: &str) {}
}

/// Keeps every alert so a driver (or a test) can show them later.
#[derive(Debug, Default, Clone)]
pub struct QueuedNotifier {
    alerts: Arc<Mutex<Vec<String>>>,
}

impl QueuedNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<String> {
        self.alerts
            .lock()
            .map(|mut guard| std::mem::take(&mut *guard))
            .unwrap_or_default()
    }
}

impl Notifier for QueuedNotifier {
    fn alert(&self, message: &str) {
        if let Ok(mut guard) = self.alerts.lock() {
            guard.push(message.to_string());
        }
    }
}

/// Collaborators every screen receives besides the runtime itself.
#[derive(Clone)]
pub struct ScreenContext {
    pub notifier: Arc<dyn Notifier>,
    pub logger: Option<Logger>,
    pub metrics: Option<SharedMetrics>,
    pub app_name: String,
    pub cats_per_page: usize,
}

impl Default for ScreenContext {
    fn default() -> Self {
        Self {
            notifier: Arc::new(NullNotifier),
            logger: None,
            metrics: None,
            app_name: crate::config::DEFAULT_APP_NAME.to_string(),
            cats_per_page: crate::config::DEFAULT_CATS_PER_PAGE,
        }
    }
}

impl ScreenContext {
    pub fn from_config(config: &crate::config::FrontConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            logger: None,
            metrics: None,
            app_name: config.app_name.clone(),
            cats_per_page: config.cats_per_page,
        }
    }

    pub fn with_logger(mut self, logger: Option<Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_metrics(mut self, metrics: SharedMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn page_title(&self, page: &str) -> String {
        format!("{page} | {}", self.app_name)
    }
}
