//! Sink implementations
//!
//! Contains LogSink, FileSink, and ChannelSink, plus `AnySink` which lets a
//! dispatcher hold an ordered, mixed list of them.

mod channel;
mod file;
mod log;

pub use self::channel::ChannelSink;
pub use self::file::{FileFormat, FileSink, FileSinkConfig};
pub use self::log::LogSink;

use contracts::{ContractError, EmittedLine, EventSink};

/// Concrete sink behind a binding
pub enum AnySink {
    Log(LogSink),
    File(FileSink),
    Channel(ChannelSink),
}

impl EventSink for AnySink {
    fn name(&self) -> &str {
        match self {
            Self::Log(sink) => sink.name(),
            Self::File(sink) => sink.name(),
            Self::Channel(sink) => sink.name(),
        }
    }

    async fn emit(&mut self, line: &EmittedLine) -> Result<(), ContractError> {
        match self {
            Self::Log(sink) => sink.emit(line).await,
            Self::File(sink) => sink.emit(line).await,
            Self::Channel(sink) => sink.emit(line).await,
        }
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Log(sink) => sink.flush().await,
            Self::File(sink) => sink.flush().await,
            Self::Channel(sink) => sink.flush().await,
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Log(sink) => sink.close().await,
            Self::File(sink) => sink.close().await,
            Self::Channel(sink) => sink.close().await,
        }
    }
}

impl From<LogSink> for AnySink {
    fn from(sink: LogSink) -> Self {
        Self::Log(sink)
    }
}

impl From<FileSink> for AnySink {
    fn from(sink: FileSink) -> Self {
        Self::File(sink)
    }
}

impl From<ChannelSink> for AnySink {
    fn from(sink: ChannelSink) -> Self {
        Self::Channel(sink)
    }
}
