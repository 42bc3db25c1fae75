use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::sync::{Arc, Mutex};

pub type SharedMetrics = Arc<Mutex<FrontMetrics>>;

/// Counters for the calls the screens make against the embedded runtime.
#[derive(Debug, Default, Clone)]
pub struct FrontMetrics {
    fetches: u64,
    fetch_failures: u64,
    attempts: u64,
    rejections: u64,
    settings_saves: u64,
    save_failures: u64,
}

impl FrontMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedMetrics {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn record_fetch(&mut self, ok: bool) {
        self.fetches = self.fetches.saturating_add(1);
        if !ok {
            self.fetch_failures = self.fetch_failures.saturating_add(1);
        }
    }

    pub fn record_attempt(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
    }

    pub fn record_rejection(&mut self) {
        self.rejections = self.rejections.saturating_add(1);
    }

    pub fn record_save(&mut self, ok: bool) {
        self.settings_saves = self.settings_saves.saturating_add(1);
        if !ok {
            self.save_failures = self.save_failures.saturating_add(1);
        }
    }

    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            fetches: self.fetches,
            fetch_failures: self.fetch_failures,
            attempts: self.attempts,
            rejections: self.rejections,
            settings_saves: self.settings_saves,
            save_failures: self.save_failures,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub fetches: u64,
    pub fetch_failures: u64,
    pub attempts: u64,
    pub rejections: u64,
    pub settings_saves: u64,
    pub save_failures: u64,
}

impl MetricSnapshot {
    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("fetches".to_string(), json!(self.fetches));
        map.insert("fetch_failures".to_string(), json!(self.fetch_failures));
        map.insert("attempts".to_string(), json!(self.attempts));
        map.insert("rejections".to_string(), json!(self.rejections));
        map.insert("settings_saves".to_string(), json!(self.settings_saves));
        map.insert("save_failures".to_string(), json!(self.save_failures));
        map
    }

    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "front_metrics", self.as_fields())
    }
}

/// Apply `update` to the shared counters if metrics are enabled.
pub fn record(metrics: Option<&SharedMetrics>, update: impl FnOnce(&mut FrontMetrics)) {
    if let Some(metrics) = metrics {
        if let Ok(mut guard) = metrics.lock() {
            update(&mut guard);
        }
    }
}
