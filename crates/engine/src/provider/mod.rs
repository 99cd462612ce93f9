//! Provider boundary: the uniform interface every step executes through.
//!
//! Modules:
//! - `catalog`: Startup-time table mapping provider identifiers to factories
//! - `noop`: Echoing provider for dry runs and tests
//! - `http`: Provider that posts resolved configurations to an HTTP endpoint
//! - `config`: Provider config file (`providers.yml`) loading

mod catalog;
mod config;
mod http;
mod noop;

pub use catalog::{ProviderCatalog, ProviderFactory};
pub use config::{HttpProviderConfig, ProvidersConfig};
pub use http::HttpProvider;
pub use noop::{NOOP_PROVIDER_ID, NoopProvider};

use serde_json::Value;
use thiserror::Error;

/// Executes named operations for one provider identifier.
///
/// Implementations are created once per provider identifier and shared by
/// every step bound to that provider.
pub trait ActionProvider: Send + Sync {
    /// Run `operation` with the resolved step configuration.
    fn invoke(&self, operation: &str, config: &Value) -> Result<Value, ActionError>;
}

/// A failed provider call.
///
/// Rendered as `message (status, name)`, with `-` standing in for a missing status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({}, {name})", .status_code.map(|code| code.to_string()).unwrap_or_else(|| "-".to_string()))]
pub struct ActionError {
    /// Human readable failure description.
    pub message: String,
    /// Status code reported by the backend, if any.
    pub status_code: Option<u16>,
    /// Short error class, e.g. `HttpError` or `TransportError`.
    pub name: String,
}

impl ActionError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
            name: name.into(),
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }
}
