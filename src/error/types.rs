use thiserror::Error;

use crate::bridge::RuntimeError;

/// Unified result type for the front-end crate.
pub type Result<T> = std::result::Result<T, FrontError>;

/// Errors surfaced by the screen controllers and their collaborators.
#[derive(Debug, Error)]
pub enum FrontError {
    #[error("runtime call failed: {0}")]
    Runtime(#[from] RuntimeError),
    #[error("mediation not possible: {0}")]
    NotEligible(String),
    #[error("theme property `{0}` is not editable")]
    UnknownThemeProperty(String),
    #[error("preference storage error: {0}")]
    Storage(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
