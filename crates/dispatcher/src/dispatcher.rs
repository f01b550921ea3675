//! SinkDispatcher - ordered delivery of one event to a route's bindings

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use contracts::{ContractError, DeliveryStatus, DispatchReport, Event, EventSink};
use tracing::{debug, info, instrument, warn};

use crate::binding::SinkBinding;
use crate::error::DispatcherError;
use crate::metrics::MetricsSnapshot;
use crate::registry::ComponentRegistry;

/// Delivers each event to every binding, in declaration order
///
/// A binding whose formatter or sink fails is skipped for that event
/// only; later bindings still receive it.
#[derive(Debug)]
pub struct SinkDispatcher {
    route_id: String,
    bindings: Vec<SinkBinding>,
    dispatch_timeout: Option<Duration>,
}

impl SinkDispatcher {
    pub fn new(route_id: impl Into<String>, bindings: Vec<SinkBinding>) -> Self {
        Self {
            route_id: route_id.into(),
            bindings,
            dispatch_timeout: None,
        }
    }

    /// Bound the time a single sink may take to accept a line
    pub fn with_dispatch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.dispatch_timeout = timeout;
        self
    }

    /// Bind every endpoint through the registry, keeping their order
    #[instrument(
        name = "dispatcher_from_endpoints",
        skip(registry, endpoints),
        fields(sink_count = endpoints.len())
    )]
    pub fn from_endpoints(
        route_id: &str,
        registry: &ComponentRegistry,
        endpoints: &[String],
    ) -> Result<Self, DispatcherError> {
        let bindings = endpoints
            .iter()
            .map(|uri| registry.bind(route_id, uri))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(route_id, bindings))
    }

    pub fn route_id(&self) -> &str {
        &self.route_id
    }

    pub fn bindings(&self) -> &[SinkBinding] {
        &self.bindings
    }

    pub fn dispatch_timeout(&self) -> Option<Duration> {
        self.dispatch_timeout
    }

    /// Get metrics for all bindings
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.bindings
            .iter()
            .map(|b| (b.name.clone(), b.metrics.snapshot()))
            .collect()
    }

    /// Deliver `event` to every binding
    ///
    /// Binding N+1 is not started until binding N has finished or failed.
    #[instrument(
        name = "dispatcher_dispatch",
        skip(self, event),
        fields(route = %self.route_id, sequence = event.sequence)
    )]
    pub async fn dispatch(&mut self, event: &Event) -> DispatchReport {
        let timeout = self.dispatch_timeout;
        let mut report = DispatchReport::new(event.sequence);

        for binding in &mut self.bindings {
            let status = deliver(binding, event, timeout).await;
            binding.metrics.record(status);
            report.push(binding.name.as_str(), status);
        }

        debug!(
            delivered = report.delivered(),
            failed = report.failed(),
            "Event dispatched"
        );
        report
    }

    /// Flush and close every sink
    #[instrument(name = "dispatcher_close", skip(self), fields(route = %self.route_id))]
    pub async fn close(&mut self) {
        for binding in &mut self.bindings {
            if let Err(e) = binding.sink.flush().await {
                warn!(sink = %binding.name, error = %e, "Flush failed");
            }
            if let Err(e) = binding.sink.close().await {
                warn!(sink = %binding.name, error = %e, "Close failed");
            }
        }
        info!(sinks = self.bindings.len(), "Sinks closed");
    }
}

async fn deliver(
    binding: &mut SinkBinding,
    event: &Event,
    timeout: Option<Duration>,
) -> DeliveryStatus {
    // a panicking formatter only fails its own binding
    let formatted = panic::catch_unwind(AssertUnwindSafe(|| binding.formatter.format(event)))
        .unwrap_or_else(|payload| {
            Err(ContractError::formatting(
                binding.formatter.describe(),
                format!("formatter panicked: {}", panic_message(payload)),
            ))
        });
    let line = match formatted {
        Ok(line) => line,
        Err(e) => {
            warn!(
                route = %binding.route,
                sink = %binding.name,
                sequence = event.sequence,
                error = %e,
                "Formatter failed, skipping sink for this event"
            );
            return DeliveryStatus::FormatFailed;
        }
    };

    let line = binding.emitted_line(event, line);
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, binding.sink.emit(&line)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    route = %binding.route,
                    sink = %binding.name,
                    sequence = event.sequence,
                    timeout_ms = limit.as_millis() as u64,
                    "Sink timed out, skipping for this event"
                );
                return DeliveryStatus::TimedOut;
            }
        },
        None => binding.sink.emit(&line).await,
    };

    match result {
        Ok(()) => DeliveryStatus::Delivered,
        Err(e) => {
            warn!(
                route = %binding.route,
                sink = %binding.name,
                sequence = event.sequence,
                error = %e,
                "Sink emit failed"
            );
            DeliveryStatus::EmitFailed
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        return (*msg).to_string();
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.clone();
    }
    "non-string panic payload".to_string()
}
