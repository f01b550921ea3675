//! # Dispatcher
//!
//! 事件分发模块。
//!
//! 负责：
//! - 组件注册表 (`log` 内置组件、别名、格式化器)
//! - 将路由的 `to` 端点绑定为 sink
//! - 按声明顺序逐个分发事件，单个 sink 失败不影响其余 sink

pub mod binding;
pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod sinks;

pub use binding::SinkBinding;
pub use contracts::{DispatchReport, EmittedLine, Event, EventFormatter, EventSink};
pub use dispatcher::SinkDispatcher;
pub use error::DispatcherError;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use registry::{Component, ComponentKind, ComponentRegistry};
pub use sinks::{AnySink, ChannelSink, FileFormat, FileSink, FileSinkConfig, LogSink};
