//! Front-end for the ClanGen simulator: the mediation and settings screens,
//! the custom theme editor, site preferences and the client for the
//! simulation runtime they talk to.
//!
//! Browser facilities are reached through small traits
//! ([`PreferenceStore`], [`DocumentHost`], [`Notifier`]) so the screens run
//! the same against an in-memory page or a terminal driver.

pub mod bridge;
pub mod config;
pub mod document;
pub mod driver;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod prefs;
pub mod render;
pub mod screens;
pub mod theme;

pub use bridge::{
    Cat, InMemorySim, LineClient, MediatedPair, MediationKind, MediationRequest, RuntimeError,
    RuntimeResult, SimRuntime,
};
pub use config::FrontConfig;
pub use document::{DocumentHost, MemoryDocument};
pub use driver::{CliDriver, CliDriverError};
pub use error::{FrontError, Result};
pub use logging::{LogEvent, LogFields, LogLevel, Logger, LoggingError, LoggingResult};
pub use metrics::{FrontMetrics, MetricSnapshot, SharedMetrics};
pub use prefs::{JsonFileStore, MemoryStore, PreferenceStore, Preferences, SitePreferences};
pub use render::{Panel, PanelRegistry, TextRenderer, display_width};
pub use screens::{
    MediationController, MediationView, Notifier, QueuedNotifier, Route, ScreenContext,
    ScreenPhase, SettingsController,
};
pub use theme::ThemeEditor;
