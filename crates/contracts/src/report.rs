//! DispatchReport - Dispatcher output per tick

use serde::Serialize;

/// Result of delivering one event to one binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Formatted and emitted
    Delivered,
    /// Formatter returned an error, nothing emitted
    FormatFailed,
    /// Sink rejected the line
    EmitFailed,
    /// Sink did not finish within the dispatch timeout
    TimedOut,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::FormatFailed => "format_failed",
            Self::EmitFailed => "emit_failed",
            Self::TimedOut => "timed_out",
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Outcome for a single binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SinkOutcome {
    pub sink: String,
    pub status: DeliveryStatus,
}

/// Outcomes of one dispatch, in binding declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub sequence: u64,
    pub outcomes: Vec<SinkOutcome>,
}

impl DispatchReport {
    pub fn new(sequence: u64) -> Self {
        Self {
            sequence,
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, sink: impl Into<String>, status: DeliveryStatus) {
        self.outcomes.push(SinkOutcome {
            sink: sink.into(),
            status,
        });
    }

    pub fn delivered(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status.is_delivered())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.delivered()
    }
}
