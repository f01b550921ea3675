//! LogSink - emits formatted lines via tracing

use contracts::{ContractError, EmittedLine, EventSink};
use tracing::{info, instrument};

/// Sink that writes each formatted line to the process log
pub struct LogSink {
    name: String,
    component: String,
}

impl LogSink {
    /// Create a new LogSink for a binding of `component`
    pub fn new(name: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            component: component.into(),
        }
    }
}

impl EventSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_emit",
        skip(self, line),
        fields(sink = %self.name, sequence = line.sequence)
    )]
    async fn emit(&mut self, line: &EmittedLine) -> Result<(), ContractError> {
        info!(
            component = %self.component,
            logger = %line.logger,
            route = %line.route,
            sequence = line.sequence,
            "{}",
            line.line
        );
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
