//! Boundary to the embedded simulation runtime.
//!
//! The screens only ever talk to [`SimRuntime`]; the simulation itself
//! (genetics, events, relationships) lives behind it. Two implementations ship
//! with the crate: [`InMemorySim`] for tests and the demo mode, and
//! [`LineClient`] which speaks newline-delimited JSON to a runtime hosted in
//! another process.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod memory;
pub mod wire;

pub use memory::InMemorySim;
pub use wire::LineClient;

pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuntimeError {
    /// The simulation refused the request; the message is meant for the user.
    #[error("{0}")]
    Rejected(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("runtime connection closed")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatName {
    pub display: String,
}

/// Read-only copy of a cat as reported by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cat {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: CatName,
    pub status: String,
}

impl Cat {
    pub fn new(id: impl Into<String>, name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: CatName {
                display: name.into(),
            },
            status: status.into(),
        }
    }

    pub fn display_name(&self) -> &str {
        &self.name.display
    }
}

/// Two cats already mediated this moon. Order carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediatedPair(pub String, pub String);

impl MediatedPair {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self(a.into(), b.into())
    }

    pub fn matches(&self, a: &str, b: &str) -> bool {
        (self.0 == a && self.1 == b) || (self.0 == b && self.1 == a)
    }
}

/// True when `a`/`b` appear together, in either order, in `pairs`.
pub fn have_mediated(a: &str, b: &str, pairs: &[MediatedPair]) -> bool {
    pairs.iter().any(|pair| pair.matches(a, b))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediationKind {
    Mediate,
    Sabotage,
}

impl MediationKind {
    pub fn is_sabotage(self) -> bool {
        matches!(self, Self::Sabotage)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Mediate => "mediate",
            Self::Sabotage => "sabotage",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediationRequest {
    pub mediator: String,
    pub cat1: String,
    pub cat2: String,
    pub sabotage: bool,
    pub allow_romantic: bool,
}

/// Query and command surface of the embedded runtime. Calls are request /
/// response; none of them are retried or timed out on this side.
#[async_trait]
pub trait SimRuntime: Send + Sync {
    async fn get_possible_mediators(&self) -> RuntimeResult<Vec<Cat>>;
    async fn get_possible_mediated(&self) -> RuntimeResult<Vec<Cat>>;
    async fn get_mediated_pairs(&self) -> RuntimeResult<Vec<MediatedPair>>;
    async fn mediate(&self, request: MediationRequest) -> RuntimeResult<String>;
    async fn get_settings(&self) -> RuntimeResult<BTreeMap<String, bool>>;
    async fn set_settings(&self, settings: BTreeMap<String, bool>) -> RuntimeResult<()>;
}
