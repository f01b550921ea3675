//! Pipeline orchestrator - builds the route engine and drives it to shutdown.

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::RouteBlueprint;
use route_engine::RouteEngine;
use tracing::{info, warn};

use super::{PipelineStats, StopReason};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated route configuration
    pub blueprint: RouteBlueprint,

    /// Run timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run every route until they finish, `shutdown` resolves, or the
    /// timeout elapses; then stop them and close their sinks
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let mut engine =
            RouteEngine::from_blueprint(blueprint).context("Failed to bind route sinks")?;
        let bindings = engine
            .routes()
            .iter()
            .map(|route| route.spec().to.len())
            .sum();

        info!(
            components = engine.registry().len(),
            routes = engine.routes().len(),
            bindings,
            "Routes bound"
        );

        engine
            .start_all()
            .await
            .context("Failed to start routes")?;

        let timeout = async {
            match self.config.timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending().await,
            }
        };

        let outcome = tokio::select! {
            result = engine.join_all() => result.map(|()| StopReason::Completed),
            _ = shutdown => {
                warn!("Received shutdown signal, stopping routes...");
                Ok(StopReason::Signal)
            }
            _ = timeout => {
                warn!(timeout_secs = self.config.timeout.map(|t| t.as_secs()), "Run timed out");
                Ok(StopReason::Timeout)
            }
        };

        // Shutdown
        info!("Shutting down routes...");
        let shutdown_result = engine.shutdown().await;
        let stop_reason = outcome.context("Route task failed")?;
        shutdown_result.context("Failed to stop routes")?;

        let sinks = engine
            .routes()
            .iter()
            .filter_map(|route| route.dispatcher())
            .flat_map(|dispatcher| dispatcher.metrics())
            .collect();

        let stats = PipelineStats {
            routes: engine.routes().len(),
            bindings,
            stop_reason,
            duration: start_time.elapsed(),
            metrics: engine.stats(),
            sinks,
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            ticks_per_sec = format!("{:.2}", stats.ticks_per_sec()),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};

    const ROUTES: &str = r#"
[[components]]
name = "lll"
alias_of = "log"
label = "aaa"

[[routes]]
id = "js"
from = "timer:js?period=1s&repeatCount=3"
body = "js"
seed = 5
to = ["log:js", "lll:js"]
"#;

    fn config(routes: &str, timeout: Option<Duration>) -> PipelineConfig {
        PipelineConfig {
            blueprint: ConfigLoader::load_from_str(routes, ConfigFormat::Toml).unwrap(),
            timeout,
            metrics_port: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_to_completion() {
        let stats = Pipeline::new(config(ROUTES, None))
            .run(std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.stop_reason, StopReason::Completed);
        assert_eq!(stats.metrics.total_ticks, 3);
        assert_eq!(stats.metrics.delivered, 6);
        assert_eq!(stats.sinks.len(), 2);
        assert_eq!(stats.sinks[1].0, "lll:js");
        assert_eq!(stats.sinks[1].1.write_count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_stops_unbounded_routes() {
        let routes = ROUTES.replace("&repeatCount=3", "");
        let stats = Pipeline::new(config(&routes, Some(Duration::from_millis(2500))))
            .run(std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.stop_reason, StopReason::Timeout);
        assert_eq!(stats.metrics.total_ticks, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_signal() {
        let routes = ROUTES.replace("&repeatCount=3", "");
        let stats = Pipeline::new(config(&routes, None))
            .run(tokio::time::sleep(Duration::from_millis(1500)))
            .await
            .unwrap();

        assert_eq!(stats.stop_reason, StopReason::Signal);
        assert_eq!(stats.metrics.total_ticks, 2);
    }
}
