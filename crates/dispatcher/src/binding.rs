//! SinkBinding - one `to` endpoint of one route

use std::sync::Arc;

use contracts::{EmittedLine, Event, EventFormatter};

use crate::metrics::SinkMetrics;
use crate::sinks::AnySink;

/// A live sink plus the formatter that renders events for it
pub struct SinkBinding {
    pub(crate) name: String,
    pub(crate) route: String,
    pub(crate) component: String,
    pub(crate) logger: String,
    pub(crate) sink: AnySink,
    pub(crate) formatter: Arc<dyn EventFormatter>,
    pub(crate) metrics: Arc<SinkMetrics>,
}

impl SinkBinding {
    pub fn new(
        name: impl Into<String>,
        route: impl Into<String>,
        component: impl Into<String>,
        logger: impl Into<String>,
        sink: impl Into<AnySink>,
        formatter: Arc<dyn EventFormatter>,
    ) -> Self {
        Self {
            name: name.into(),
            route: route.into(),
            component: component.into(),
            logger: logger.into(),
            sink: sink.into(),
            formatter,
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    /// Override the formatter inherited from the component
    pub fn with_formatter(mut self, formatter: impl EventFormatter + 'static) -> Self {
        self.formatter = Arc::new(formatter);
        self
    }

    /// Endpoint as written in the route (`<component>:<logger>`)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn logger(&self) -> &str {
        &self.logger
    }

    pub fn formatter(&self) -> &Arc<dyn EventFormatter> {
        &self.formatter
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    pub(crate) fn emitted_line(&self, event: &Event, line: String) -> EmittedLine {
        EmittedLine {
            route: self.route.clone(),
            sink: self.name.clone(),
            logger: self.logger.clone(),
            sequence: event.sequence,
            fired_at: event.fired_at,
            line,
        }
    }
}

impl std::fmt::Debug for SinkBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkBinding")
            .field("name", &self.name)
            .field("route", &self.route)
            .field("formatter", &self.formatter.describe())
            .finish_non_exhaustive()
    }
}
