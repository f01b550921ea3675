//! FileSink - appends formatted lines to `<base_path>/<logger>.log`

use contracts::{ContractError, EmittedLine, EventSink};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, error, instrument};

/// Line encoding for FileSink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    /// The formatted line as is
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Configuration for FileSink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSinkConfig {
    /// Base output directory
    pub base_path: PathBuf,
    /// Line encoding
    pub format: FileFormat,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));

        let format = match params.get("format").map(String::as_str) {
            Some("text") | None => FileFormat::Text,
            Some("json") => FileFormat::Json,
            Some(other) => return Err(format!("unknown format '{}'", other)),
        };

        Ok(Self { base_path, format })
    }

    /// File a logger writes to
    pub fn path_for(&self, logger: &str) -> PathBuf {
        self.base_path.join(format!("{logger}.log"))
    }
}

/// Sink that appends lines to a per-logger file
pub struct FileSink {
    name: String,
    path: PathBuf,
    format: FileFormat,
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    /// Create a new FileSink for `logger`
    ///
    /// The directory is created eagerly, the file on first emit.
    pub fn new(
        name: impl Into<String>,
        logger: &str,
        config: &FileSinkConfig,
    ) -> std::io::Result<Self> {
        fs::create_dir_all(&config.base_path)?;

        Ok(Self {
            name: name.into(),
            path: config.path_for(logger),
            format: config.format,
            writer: None,
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn writer(&mut self) -> std::io::Result<&mut BufWriter<File>> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => BufWriter::new(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)?,
            ),
        };
        Ok(self.writer.insert(writer))
    }

    fn append(&mut self, line: &EmittedLine) -> std::io::Result<()> {
        let format = self.format;
        let writer = self.writer()?;
        match format {
            FileFormat::Text => writeln!(writer, "{}", line.line)?,
            FileFormat::Json => {
                serde_json::to_writer(&mut *writer, line)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
                writeln!(writer)?;
            }
        }
        writer.flush()
    }
}

impl EventSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_emit",
        skip(self, line),
        fields(sink = %self.name, sequence = line.sequence)
    )]
    async fn emit(&mut self, line: &EmittedLine) -> Result<(), ContractError> {
        self.append(line).map_err(|e| {
            error!(sink = %self.name, path = %self.path.display(), error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        if let Some(writer) = self.writer.as_mut() {
            writer
                .flush()
                .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        }
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.flush().await?;
        self.writer = None;
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}
