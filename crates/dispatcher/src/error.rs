//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Component lookup failed
    #[error("component '{name}' not found")]
    UnknownComponent { name: String },

    /// Component name already registered
    #[error("component '{name}' already registered")]
    DuplicateComponent { name: String },

    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Endpoint or sink error (from contract)
    #[error("contract error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    pub fn unknown_component(name: impl Into<String>) -> Self {
        Self::UnknownComponent { name: name.into() }
    }

    pub fn duplicate_component(name: impl Into<String>) -> Self {
        Self::DuplicateComponent { name: name.into() }
    }

    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
