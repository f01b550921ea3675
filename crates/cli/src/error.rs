//! Error types for CLI operations.

use contracts::ContractError;
use route_engine::RouteError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration location not found
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration loading, parsing, or validation error
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ContractError),

    /// Invalid combination of command-line arguments
    #[error("Invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// Route binding or scheduling error
    #[error("Route error: {0}")]
    Route(#[from] RouteError),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
