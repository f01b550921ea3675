//! Layered error definitions
//!
//! Categorized by source: config / endpoint / formatting / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Endpoint Errors =====
    /// Endpoint URI could not be parsed
    #[error("invalid endpoint '{uri}': {message}")]
    EndpointParse { uri: String, message: String },

    // ===== Formatting Errors =====
    /// A sink formatter rejected the event
    #[error("formatter '{formatter}' failed: {message}")]
    Formatting { formatter: String, message: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create endpoint parse error
    pub fn endpoint_parse(uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EndpointParse {
            uri: uri.into(),
            message: message.into(),
        }
    }

    /// Create formatting error
    pub fn formatting(formatter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Formatting {
            formatter: formatter.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
