//! # Route Engine
//!
//! 定时路由引擎。
//!
//! 负责：
//! - 按周期触发 tick (`Ticker`)
//! - 设置常量消息体、注入随机 header
//! - 将事件按声明顺序交给 `SinkDispatcher`
//! - 路由生命周期 (Stopped / Running)
//!
//! ## 使用示例
//!
//! ```ignore
//! use route_engine::RouteEngine;
//!
//! let mut engine = RouteEngine::from_blueprint(&blueprint)?;
//! engine.start_all().await?;
//! tokio::signal::ctrl_c().await?;
//! engine.shutdown().await?;
//! ```

mod engine;
mod error;
mod processor;
mod route;
mod ticker;

pub use engine::RouteEngine;
pub use error::RouteError;
pub use processor::{BodySetter, RandomEnricher, RANDOM_MAX, RANDOM_MIN};
pub use route::{Route, RouteSpec, RouteState};
pub use ticker::Ticker;

pub use observability::RouteMetricsAggregator;
