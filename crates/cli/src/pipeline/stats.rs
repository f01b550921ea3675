//! Run statistics and metrics.

use std::fmt;
use std::time::Duration;

use dispatcher::MetricsSnapshot;
use route_engine::RouteMetricsAggregator;

/// Why the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopReason {
    /// Every route reached its repeat count
    #[default]
    Completed,
    /// Ctrl+C or SIGTERM
    Signal,
    /// `--timeout` elapsed
    Timeout,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Completed => "completed",
            Self::Signal => "signal",
            Self::Timeout => "timeout",
        })
    }
}

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Number of routes that ran
    pub routes: usize,

    /// Number of sink bindings across all routes
    pub bindings: usize,

    /// Why the run ended
    pub stop_reason: StopReason,

    /// Total duration of the run
    pub duration: Duration,

    /// Tick and delivery statistics merged across routes
    pub metrics: RouteMetricsAggregator,

    /// Per-binding counters, in route then declaration order
    pub sinks: Vec<(String, MetricsSnapshot)>,
}

impl PipelineStats {
    /// Calculate tick throughput
    pub fn ticks_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.metrics.total_ticks as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     Route Statistics                         ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Stopped by: {}", self.stop_reason);
        println!("   ├─ Routes: {}", self.routes);
        println!("   ├─ Sink bindings: {}", self.bindings);
        println!("   └─ Ticks/s: {:.2}", self.ticks_per_sec());

        let summary = self.metrics.summary();

        println!("\n📈 Route Metrics");
        println!("   ├─ Ticks: {}", summary.total_ticks);
        println!("   ├─ Lines delivered: {}", summary.delivered);
        println!(
            "   ├─ Failed deliveries: {} ({:.2}%)",
            summary.failed, summary.failure_rate
        );
        println!("   └─ RandomValue: {}", summary.random_value);

        if !self.sinks.is_empty() {
            println!("\n📤 Sinks");
            for (i, (name, snapshot)) in self.sinks.iter().enumerate() {
                let prefix = if i == self.sinks.len() - 1 { "└─" } else { "├─" };
                println!(
                    "   {} {}: written={}, format_failed={}, emit_failed={}, timed_out={}",
                    prefix,
                    name,
                    snapshot.write_count,
                    snapshot.format_failure_count,
                    snapshot.failure_count,
                    snapshot.timeout_count
                );
            }
        }

        println!();
    }
}
