//! Error types for building simulators

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while seeding a simulator
#[derive(Debug, Error)]
pub enum SimuError {
    /// Configuration store error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A configured value was rejected by the adapter
    #[error("adapter error: {0}")]
    Adapter(#[from] pa_types::PaError),

    /// A configured value could not be interpreted
    #[error("invalid value {value:?} at {path}")]
    InvalidValue { path: String, value: String },
}
