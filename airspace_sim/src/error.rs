//! Error types for the simulator.

use airspace_core::{SchemaError, StoreError};
use thiserror::Error;

/// Errors that can occur while bootstrapping or running the simulator.
#[derive(Debug, Error)]
pub enum SimError {
    /// The shared region could not be created or attached. Fatal.
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// A malformed bootstrap tuple or console line
    #[error("Invalid input at line {line}: {reason}")]
    InvalidInput { line: usize, reason: String },

    /// A configuration value out of range
    #[error("Invalid {name}: {reason}")]
    InvalidSetting { name: String, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    /// Creates an initialization error.
    pub fn initialization(msg: impl Into<String>) -> Self {
        Self::Initialization(msg.into())
    }

    /// Creates an invalid-setting error.
    pub fn invalid_setting(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid-input error.
    pub fn invalid_input(line: usize, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            line,
            reason: reason.into(),
        }
    }
}
