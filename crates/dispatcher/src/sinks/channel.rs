//! ChannelSink - forwards lines to an in-process receiver

use contracts::{ContractError, EmittedLine, EventSink};
use tokio::sync::mpsc;
use tracing::debug;

/// Sink that hands every line to an mpsc receiver
///
/// Sending waits for capacity; a dropped receiver is a write error.
pub struct ChannelSink {
    name: String,
    tx: mpsc::Sender<EmittedLine>,
}

impl ChannelSink {
    pub fn new(name: impl Into<String>, tx: mpsc::Sender<EmittedLine>) -> Self {
        Self {
            name: name.into(),
            tx,
        }
    }
}

impl EventSink for ChannelSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn emit(&mut self, line: &EmittedLine) -> Result<(), ContractError> {
        self.tx
            .send(line.clone())
            .await
            .map_err(|_| ContractError::sink_write(&self.name, "receiver dropped"))
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, "ChannelSink closed");
        Ok(())
    }
}
