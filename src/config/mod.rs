use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{FrontError, Result};
use crate::logging::{FileSink, LogLevel, Logger};

pub const DEFAULT_APP_NAME: &str = "ClanGen Simulator";
pub const DEFAULT_CATS_PER_PAGE: usize = 16;

/// Configuration knobs for the front-end. Every field has a default so a
/// partial (or absent) config file is fine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FrontConfig {
    /// Suffix used for document titles (`"Settings | <app_name>"`).
    pub app_name: String,
    /// Page size of the cat pickers.
    pub cats_per_page: usize,
    /// JSON file backing the site preferences. `None` keeps them in memory.
    pub prefs_path: Option<PathBuf>,
    pub log: LogConfig,
    /// Program (and arguments) hosting the simulation runtime.
    pub runtime_command: Vec<String>,
}

impl Default for FrontConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            cats_per_page: DEFAULT_CATS_PER_PAGE,
            prefs_path: None,
            log: LogConfig::default(),
            runtime_command: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub path: Option<PathBuf>,
    /// File is truncated once it would exceed this size. Zero disables the cap.
    pub max_bytes: u64,
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_bytes: 1024 * 1024,
            level: "info".to_string(),
        }
    }
}

impl FrontConfig {
    /// Load from a JSON file; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.cats_per_page == 0 {
            return Err(FrontError::Config("cats_per_page must be positive".into()));
        }
        if LogLevel::parse(&self.log.level).is_none() {
            return Err(FrontError::Config(format!(
                "unknown log level `{}`",
                self.log.level
            )));
        }
        Ok(())
    }

    /// Build the file logger described by `log`, if a path is configured.
    pub fn build_logger(&self) -> Result<Option<Logger>> {
        let Some(path) = self.log.path.as_ref() else {
            return Ok(None);
        };
        let sink = FileSink::new(path, self.log.max_bytes)
            .map_err(|err| FrontError::Config(format!("log sink: {err}")))?;
        let level = LogLevel::parse(&self.log.level).unwrap_or(LogLevel::Info);
        Ok(Some(Logger::new(sink).with_min_level(level)))
    }
}
