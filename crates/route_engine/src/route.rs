//! Route - Ticker -> BodySetter -> RandomEnricher -> SinkDispatcher
//!
//! One tokio task per running route. Each tick is processed to completion
//! before the next one is awaited; stop is only observed between ticks.

use std::time::Duration;

use contracts::{Event, RouteConfig, TimerSpec};
use dispatcher::{ComponentRegistry, SinkDispatcher};
use observability::{
    record_dispatch_report, record_random_value, record_route_running, record_tick,
    RouteMetricsAggregator,
};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use crate::error::RouteError;
use crate::processor::{BodySetter, RandomEnricher};
use crate::ticker::Ticker;

/// Everything needed to run one route
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSpec {
    pub id: String,
    pub timer: TimerSpec,
    pub body: String,
    pub header: String,
    pub seed: Option<u64>,
    pub dispatch_timeout: Option<Duration>,
    pub to: Vec<String>,
}

impl RouteSpec {
    pub fn from_config(config: &RouteConfig) -> Result<Self, RouteError> {
        Ok(Self {
            id: config.id.clone(),
            timer: config.timer_spec()?,
            body: config.body.clone(),
            header: config.header.clone(),
            seed: config.seed,
            dispatch_timeout: config.dispatch_timeout(),
            to: config.to.clone(),
        })
    }
}

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteState {
    Stopped,
    Running,
}

/// State owned by the route task and handed back when it ends
struct RouteRun {
    dispatcher: SinkDispatcher,
    enricher: RandomEnricher,
    stats: RouteMetricsAggregator,
}

struct RunningRoute {
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<RouteRun>,
}

/// A configured route that can be started and stopped repeatedly
pub struct Route {
    spec: RouteSpec,
    idle: Option<(SinkDispatcher, RandomEnricher)>,
    running: Option<RunningRoute>,
    stats: RouteMetricsAggregator,
}

impl Route {
    /// Build a stopped route around an existing dispatcher
    pub fn new(spec: RouteSpec, dispatcher: SinkDispatcher) -> Self {
        let enricher = RandomEnricher::new(spec.header.as_str(), spec.seed);
        Self {
            spec,
            idle: Some((dispatcher, enricher)),
            running: None,
            stats: RouteMetricsAggregator::new(),
        }
    }

    /// Bind the route's `to` endpoints through the registry
    #[instrument(name = "route_from_config", skip_all, fields(route = %config.id))]
    pub fn from_config(
        config: &RouteConfig,
        registry: &ComponentRegistry,
    ) -> Result<Self, RouteError> {
        let spec = RouteSpec::from_config(config)?;
        let dispatcher = SinkDispatcher::from_endpoints(&spec.id, registry, &spec.to)?
            .with_dispatch_timeout(spec.dispatch_timeout);
        Ok(Self::new(spec, dispatcher))
    }

    /// Replace the enricher (e.g. to inject a seeded one)
    ///
    /// # Errors
    /// `AlreadyRunning` while the route runs; the task owns the enricher
    /// until it is stopped.
    pub fn set_enricher(&mut self, enricher: RandomEnricher) -> Result<(), RouteError> {
        if self.running.is_some() {
            return Err(RouteError::already_running(&self.spec.id));
        }
        let (_, current) = self.idle.as_mut().ok_or_else(|| {
            RouteError::task(&self.spec.id, "sink bindings were lost by a failed run")
        })?;
        *current = enricher;
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }

    pub fn spec(&self) -> &RouteSpec {
        &self.spec
    }

    pub fn state(&self) -> RouteState {
        if self.running.is_some() {
            RouteState::Running
        } else {
            RouteState::Stopped
        }
    }

    /// Statistics of every finished run
    pub fn stats(&self) -> &RouteMetricsAggregator {
        &self.stats
    }

    /// Dispatcher, available while the route is stopped
    pub fn dispatcher(&self) -> Option<&SinkDispatcher> {
        self.idle.as_ref().map(|(dispatcher, _)| dispatcher)
    }

    /// True when not running or when the task has ended on its own
    pub fn is_finished(&self) -> bool {
        self.running
            .as_ref()
            .is_none_or(|running| running.task.is_finished())
    }

    /// Stopped -> Running
    ///
    /// # Errors
    /// - `AlreadyRunning` if the route is running
    /// - `Scheduling` if the timer cannot be scheduled; the route stays stopped
    #[instrument(name = "route_start", skip(self), fields(route = %self.spec.id))]
    pub fn start(&mut self) -> Result<(), RouteError> {
        if self.running.is_some() {
            return Err(RouteError::already_running(&self.spec.id));
        }

        let ticker = Ticker::start(&self.spec.timer)?;
        let (dispatcher, enricher) = self.idle.take().ok_or_else(|| {
            RouteError::task(&self.spec.id, "sink bindings were lost by a failed run")
        })?;

        let (stop_tx, stop_rx) = oneshot::channel();
        let run = RouteRun {
            dispatcher,
            enricher,
            stats: RouteMetricsAggregator::new(),
        };
        let task = tokio::spawn(run_route(
            self.spec.id.clone(),
            ticker,
            BodySetter::new(self.spec.body.as_str()),
            run,
            stop_rx,
        ));

        self.running = Some(RunningRoute {
            stop_tx: Some(stop_tx),
            task,
        });
        record_route_running(&self.spec.id, true);
        info!(
            from = %self.spec.timer.name,
            period_ms = self.spec.timer.period.as_millis() as u64,
            sinks = ?self.spec.to,
            "Route started"
        );
        Ok(())
    }

    /// Running -> Stopped
    ///
    /// Cancels the ticker; a tick already being dispatched finishes first.
    /// No-op when already stopped.
    #[instrument(name = "route_stop", skip(self), fields(route = %self.spec.id))]
    pub async fn stop(&mut self) -> Result<(), RouteError> {
        if let Some(running) = self.running.as_mut() {
            if let Some(stop_tx) = running.stop_tx.take() {
                // the task may already have ended on its own
                let _ = stop_tx.send(());
            }
        }
        self.wait().await
    }

    /// Wait until the route ends on its own (`repeatCount` reached)
    ///
    /// Never returns for an unbounded timer unless `stop` is called from
    /// elsewhere. Cancel safe.
    pub async fn join(&mut self) -> Result<(), RouteError> {
        self.wait().await
    }

    /// Stop, then flush and close every sink
    ///
    /// Sinks still held by the route are closed even when stopping fails.
    pub async fn close(&mut self) -> Result<(), RouteError> {
        let stopped = self.stop().await;
        if let Some((dispatcher, _)) = self.idle.as_mut() {
            dispatcher.close().await;
        }
        stopped
    }

    async fn wait(&mut self) -> Result<(), RouteError> {
        let Some(running) = self.running.as_mut() else {
            return Ok(());
        };
        let result = (&mut running.task).await;
        self.running = None;
        record_route_running(&self.spec.id, false);

        let run = result.map_err(|e| RouteError::task(&self.spec.id, e.to_string()))?;
        self.stats.merge(&run.stats);
        info!(
            route = %self.spec.id,
            ticks = run.stats.total_ticks,
            delivered = run.stats.delivered,
            failed = run.stats.failed,
            "Route stopped"
        );
        self.idle = Some((run.dispatcher, run.enricher));
        Ok(())
    }
}

#[instrument(name = "route_run", skip_all, fields(route = %route_id))]
async fn run_route(
    route_id: String,
    mut ticker: Ticker,
    body: BodySetter,
    mut run: RouteRun,
    mut stop_rx: oneshot::Receiver<()>,
) -> RouteRun {
    loop {
        tokio::select! {
            biased;
            _ = &mut stop_rx => {
                debug!(ticks = ticker.fired(), "Stop requested");
                break;
            }
            next = ticker.next() => match next {
                Some(mut event) => process_tick(&route_id, &body, &mut run, &mut event).await,
                None => {
                    info!(ticks = ticker.fired(), "Repeat count reached");
                    break;
                }
            },
        }
    }
    run
}

async fn process_tick(route_id: &str, body: &BodySetter, run: &mut RouteRun, event: &mut Event) {
    body.apply(event);
    let value = run.enricher.apply(event);
    record_tick(route_id, event.sequence);
    record_random_value(route_id, value);

    let report = run.dispatcher.dispatch(event).await;
    record_dispatch_report(route_id, &report);
    run.stats.update(Some(value), &report);
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{EmittedLine, LabelFormatter, DEFAULT_RANDOM_HEADER};
    use dispatcher::Component;
    use tokio::sync::mpsc;

    fn registry(tx: mpsc::Sender<EmittedLine>) -> ComponentRegistry {
        let mut registry = ComponentRegistry::new();
        registry
            .put("capture", Component::channel(tx, "log"))
            .unwrap();
        registry
            .alias("capture", "aaa_sink")
            .unwrap()
            .set_formatter(LabelFormatter::new("aaa"));
        registry
    }

    fn config(from: &str) -> RouteConfig {
        RouteConfig {
            id: "js".into(),
            from: from.into(),
            body: "js".into(),
            header: DEFAULT_RANDOM_HEADER.into(),
            seed: Some(11),
            dispatch_timeout_ms: None,
            to: vec!["capture:js".into(), "aaa_sink:js".into()],
        }
    }

    fn drain(rx: &mut mpsc::Receiver<EmittedLine>) -> Vec<EmittedLine> {
        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
        lines
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_until_repeat_count() {
        let (tx, mut rx) = mpsc::channel(16);
        let registry = registry(tx);
        let mut route =
            Route::from_config(&config("timer:js?period=1s&repeatCount=3"), &registry).unwrap();

        route.start().unwrap();
        assert_eq!(route.state(), RouteState::Running);
        route.join().await.unwrap();
        assert_eq!(route.state(), RouteState::Stopped);

        let lines = drain(&mut rx);
        assert_eq!(lines.len(), 6);
        for (tick, pair) in lines.chunks(2).enumerate() {
            assert_eq!(pair[0].sink, "capture:js");
            assert_eq!(pair[1].sink, "aaa_sink:js");
            assert_eq!(pair[0].sequence, tick as u64 + 1);
            assert!(pair[0].line.starts_with("log - body=js, headers={RandomValue="));
            assert!(pair[1].line.starts_with("aaa - body=js, headers={RandomValue="));
        }
        assert_eq!(route.stats().total_ticks, 3);
        assert_eq!(route.stats().delivered, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_fails() {
        let (tx, _rx) = mpsc::channel(16);
        let registry = registry(tx);
        let mut route = Route::from_config(&config("timer:js?period=1s"), &registry).unwrap();

        route.start().unwrap();
        let err = route.start().unwrap_err();
        assert!(matches!(err, RouteError::AlreadyRunning { .. }), "got: {err}");
        route.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_when_stopped_is_noop() {
        let registry = ComponentRegistry::new();
        let mut route = Route::from_config(&config_log(), &registry).unwrap();
        route.stop().await.unwrap();
        route.stop().await.unwrap();
        assert_eq!(route.state(), RouteState::Stopped);
        assert!(route.is_finished());
    }

    fn config_log() -> RouteConfig {
        RouteConfig {
            to: vec!["log:js".into()],
            ..config("timer:js?period=1s")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_after_stop() {
        let (tx, mut rx) = mpsc::channel(64);
        let registry = registry(tx);
        let mut route = Route::from_config(&config("timer:js?period=1s"), &registry).unwrap();

        route.start().unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        route.stop().await.unwrap();
        assert_eq!(drain(&mut rx).len(), 6);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_builds_fresh_ticker() {
        let (tx, mut rx) = mpsc::channel(64);
        let registry = registry(tx);
        let mut route = Route::from_config(&config("timer:js?period=1s"), &registry).unwrap();

        route.start().unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        route.stop().await.unwrap();

        route.start().unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        route.stop().await.unwrap();

        let sequences: Vec<_> = drain(&mut rx)
            .iter()
            .filter(|line| line.sink == "capture:js")
            .map(|line| line.sequence)
            .collect();
        assert_eq!(sequences, [1, 2, 1]);
        assert_eq!(route.stats().total_ticks, 3);
    }

    #[tokio::test]
    async fn test_zero_period_does_not_start() {
        let registry = ComponentRegistry::new();
        let mut route = Route::from_config(
            &RouteConfig {
                from: "timer:js?period=0".into(),
                ..config_log()
            },
            &registry,
        )
        .unwrap();

        let err = route.start().unwrap_err();
        assert!(matches!(err, RouteError::Scheduling { .. }), "got: {err}");
        assert_eq!(route.state(), RouteState::Stopped);
        assert!(route.dispatcher().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_enricher() {
        async fn capture_lines(
            route: &mut Route,
            rx: &mut mpsc::Receiver<EmittedLine>,
        ) -> Vec<String> {
            route.start().unwrap();
            route.join().await.unwrap();
            drain(rx)
                .into_iter()
                .filter(|line| line.sink == "capture:js")
                .map(|line| line.line)
                .collect()
        }

        let from = "timer:js?period=1s&repeatCount=4";
        let (tx, mut rx) = mpsc::channel(16);
        let registry = registry(tx);

        let mut injected = Route::from_config(&config(from), &registry).unwrap();
        injected
            .set_enricher(RandomEnricher::from_seed(DEFAULT_RANDOM_HEADER, 5))
            .unwrap();
        let mut configured = Route::from_config(
            &RouteConfig {
                seed: Some(5),
                ..config(from)
            },
            &registry,
        )
        .unwrap();

        let expected = capture_lines(&mut configured, &mut rx).await;
        assert_eq!(expected.len(), 4);
        assert_eq!(capture_lines(&mut injected, &mut rx).await, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_enricher_while_running() {
        let (tx, _rx) = mpsc::channel(64);
        let registry = registry(tx);
        let mut route = Route::from_config(&config("timer:js?period=1s"), &registry).unwrap();

        route.start().unwrap();
        let err = route
            .set_enricher(RandomEnricher::from_seed(DEFAULT_RANDOM_HEADER, 5))
            .unwrap_err();
        assert!(matches!(err, RouteError::AlreadyRunning { .. }), "got: {err}");
        route.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_running_route() {
        let (tx, mut rx) = mpsc::channel(64);
        let registry = registry(tx);
        let mut route = Route::from_config(&config("timer:js?period=1s"), &registry).unwrap();

        route.start().unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        route.close().await.unwrap();

        assert_eq!(route.state(), RouteState::Stopped);
        assert!(route.dispatcher().is_some());
        assert_eq!(drain(&mut rx).len(), 4);
        assert_eq!(route.stats().total_ticks, 2);

        route.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_sink_component() {
        let registry = ComponentRegistry::new();
        let result = Route::from_config(&config("timer:js?period=1s"), &registry);
        assert!(matches!(result, Err(RouteError::Dispatcher(_))));
    }
}
