//! EventSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for Sinks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ContractError;

/// One formatted line handed to a sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmittedLine {
    /// Route that produced the event
    pub route: String,

    /// Binding name (the `to` endpoint)
    pub sink: String,

    /// Logger name (endpoint path)
    pub logger: String,

    /// Tick counter of the event
    pub sequence: u64,

    /// Tick time of the event
    pub fired_at: DateTime<Utc>,

    /// Formatter output
    pub line: String,
}

/// Data output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(EventSink: Send)]
pub trait LocalEventSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Emit one formatted line
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn emit(&mut self, line: &EmittedLine) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
