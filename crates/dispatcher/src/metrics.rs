//! Sink metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::DeliveryStatus;

/// Metrics for a single binding
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Lines formatted and emitted
    write_count: AtomicU64,
    /// Formatter errors
    format_failure_count: AtomicU64,
    /// Sink emission errors
    failure_count: AtomicU64,
    /// Emissions that exceeded the dispatch timeout
    timeout_count: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one dispatch outcome
    pub fn record(&self, status: DeliveryStatus) {
        let counter = match status {
            DeliveryStatus::Delivered => &self.write_count,
            DeliveryStatus::FormatFailed => &self.format_failure_count,
            DeliveryStatus::EmitFailed => &self.failure_count,
            DeliveryStatus::TimedOut => &self.timeout_count,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total write count
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    /// Get formatter failure count
    pub fn format_failure_count(&self) -> u64 {
        self.format_failure_count.load(Ordering::Relaxed)
    }

    /// Get emission failure count
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Get timeout count
    pub fn timeout_count(&self) -> u64 {
        self.timeout_count.load(Ordering::Relaxed)
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            write_count: self.write_count(),
            format_failure_count: self.format_failure_count(),
            failure_count: self.failure_count(),
            timeout_count: self.timeout_count(),
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub write_count: u64,
    pub format_failure_count: u64,
    pub failure_count: u64,
    pub timeout_count: u64,
}

impl MetricsSnapshot {
    /// All outcomes that were not a delivery
    pub fn total_failures(&self) -> u64 {
        self.format_failure_count + self.failure_count + self.timeout_count
    }
}
