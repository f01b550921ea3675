//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 定时路由 e2e 测试 (暂停时钟, 无需真实等待)

#[cfg(test)]
mod contract_tests {
    use contracts::{Event, EventFormatter, LabelFormatter};

    #[test]
    fn test_label_formatter_snapshot() {
        let mut event = Event::new("js", 1, Default::default());
        event.body = "js".into();
        event.set_header("RandomValue", 42_i64);

        let line = LabelFormatter::new("aaa").format(&event).unwrap();
        assert_eq!(line, "aaa - body=js, headers={RandomValue=42}");
    }

    #[test]
    fn test_config_version() {
        assert_eq!(contracts::ConfigVersion::default(), contracts::ConfigVersion::V1);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        ContractError, EmittedLine, Event, LabelFormatter, RouteConfig, DEFAULT_RANDOM_HEADER,
    };
    use dispatcher::{Component, ComponentRegistry};
    use route_engine::{Route, RouteEngine, RouteState};
    use tokio::sync::mpsc;

    /// `log` then `aaa`, both forwarding into one channel
    fn capture_registry(tx: mpsc::Sender<EmittedLine>) -> ComponentRegistry {
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

    fn route_config(from: &str, to: &[&str]) -> RouteConfig {
        RouteConfig {
            id: "js".into(),
            from: from.into(),
            body: "js".into(),
            header: DEFAULT_RANDOM_HEADER.into(),
            seed: None,
            dispatch_timeout_ms: None,
            to: to.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn drain(rx: &mut mpsc::Receiver<EmittedLine>) -> Vec<EmittedLine> {
        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
        lines
    }

    fn random_value(line: &str) -> i64 {
        let marker = "RandomValue=";
        let start = line.find(marker).expect("RandomValue header rendered") + marker.len();
        line[start..].trim_end_matches('}').parse().unwrap()
    }

    /// period=1s, `log` + `aaa` (alias), 3 ticks -> 6 lines, 3 per sink
    #[tokio::test(start_paused = true)]
    async fn test_e2e_three_ticks_two_sinks() {
        let (tx, mut rx) = mpsc::channel(16);
        let registry = capture_registry(tx);
        let config = route_config(
            "timer:js?period=1s&repeatCount=3",
            &["capture:js", "aaa_sink:js"],
        );
        let mut route = Route::from_config(&config, &registry).unwrap();

        let started = tokio::time::Instant::now();
        route.start().unwrap();
        route.join().await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_secs(2));

        let lines = drain(&mut rx);
        assert_eq!(lines.len(), 6);

        let log: Vec<_> = lines.iter().filter(|l| l.sink == "capture:js").collect();
        let aaa: Vec<_> = lines.iter().filter(|l| l.sink == "aaa_sink:js").collect();
        assert_eq!(log.len(), 3);
        assert_eq!(aaa.len(), 3);

        for (tick, pair) in lines.chunks(2).enumerate() {
            let sequence = tick as u64 + 1;
            assert_eq!((pair[0].sequence, pair[1].sequence), (sequence, sequence));
            assert!(pair[0].line.starts_with("log - body=js, headers={RandomValue="));
            assert!(pair[1].line.starts_with("aaa - body=js, headers={RandomValue="));

            let value = random_value(&pair[0].line);
            assert!((1..=100).contains(&value), "got: {value}");
            // both sinks see the same event
            assert_eq!(value, random_value(&pair[1].line));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_e2e_no_ticks_after_stop_and_inflight_completes() {
        // capacity 1: the second sink of tick 1 blocks until the test reads
        let (tx, mut rx) = mpsc::channel(1);
        let registry = capture_registry(tx);
        let config = route_config("timer:js?period=1s", &["capture:js", "aaa_sink:js"]);
        let mut route = Route::from_config(&config, &registry).unwrap();

        route.start().unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let (stopped, lines) = tokio::join!(route.stop(), async {
            vec![rx.recv().await.unwrap(), rx.recv().await.unwrap()]
        });
        stopped.unwrap();
        assert_eq!(route.state(), RouteState::Stopped);
        assert_eq!(lines[0].sink, "capture:js");
        assert_eq!(lines[1].sink, "aaa_sink:js");
        assert_eq!(lines[1].sequence, 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(drain(&mut rx).is_empty());
        assert_eq!(route.stats().total_ticks, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_e2e_failing_sink_does_not_block_next() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut registry = capture_registry(tx.clone());
        registry
            .put(
                "broken",
                Component::new(
                    dispatcher::ComponentKind::Channel(tx),
                    |_: &Event| -> Result<String, ContractError> {
                        Err(ContractError::formatting("broken", "cannot render"))
                    },
                ),
            )
            .unwrap();

        let config = route_config(
            "timer:js?period=1s&repeatCount=2",
            &["broken:js", "aaa_sink:js"],
        );
        let mut route = Route::from_config(&config, &registry).unwrap();
        route.start().unwrap();
        route.join().await.unwrap();

        let lines = drain(&mut rx);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.line.starts_with("aaa - ")));
        assert_eq!(route.stats().failed, 2);
        assert_eq!(route.stats().sink_failures.get("broken:js"), Some(&2));

        let metrics = route.dispatcher().unwrap().metrics();
        assert_eq!(metrics[0].1.format_failure_count, 2);
        assert_eq!(metrics[1].1.write_count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_e2e_panicking_formatter_keeps_route_alive() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut registry = capture_registry(tx.clone());
        registry
            .put(
                "boom",
                Component::new(
                    dispatcher::ComponentKind::Channel(tx),
                    |_: &Event| -> Result<String, ContractError> { panic!("formatter bug") },
                ),
            )
            .unwrap();

        let config = route_config(
            "timer:js?period=1s&repeatCount=3",
            &["boom:js", "aaa_sink:js"],
        );
        let mut route = Route::from_config(&config, &registry).unwrap();
        route.start().unwrap();
        route.join().await.unwrap();

        let lines = drain(&mut rx);
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.sink == "aaa_sink:js"));
        assert_eq!(route.stats().total_ticks, 3);
        assert_eq!(route.stats().sink_failures.get("boom:js"), Some(&3));

        // bindings survive, so the route can run again
        route.start().unwrap();
        route.join().await.unwrap();
        assert_eq!(drain(&mut rx).len(), 3);
        assert_eq!(route.stats().total_ticks, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_e2e_seeded_runs_repeat() {
        async fn values(seed: u64) -> Vec<i64> {
            let (tx, mut rx) = mpsc::channel(16);
            let registry = capture_registry(tx);
            let config = RouteConfig {
                seed: Some(seed),
                ..route_config("timer:js?period=100ms&repeatCount=5", &["capture:js"])
            };
            let mut route = Route::from_config(&config, &registry).unwrap();
            route.start().unwrap();
            route.join().await.unwrap();
            drain(&mut rx).iter().map(|l| random_value(&l.line)).collect()
        }

        let first = values(42).await;
        assert_eq!(first.len(), 5);
        assert_eq!(first, values(42).await);
    }

    /// make and alias of a `file` component produce the same output
    #[tokio::test(start_paused = true)]
    async fn test_e2e_file_sinks_make_and_alias() {
        async fn run(secondary: &str) -> String {
            let dir = tempfile::tempdir().unwrap();
            let content = format!(
                r#"
[[components]]
name = "out"
kind = "file"
label = "log"
params = {{ base_path = '{base}' }}

[[components]]
name = "lll"
{secondary}
label = "aaa"

[[routes]]
id = "js"
from = "timer:js?period=1s&repeatCount=3"
body = "js"
seed = 7
to = ["out:js", "lll:js"]
"#,
                base = dir.path().display(),
                secondary = secondary.replace("BASE", &dir.path().display().to_string()),
            );
            let blueprint = ConfigLoader::load_from_str(&content, ConfigFormat::Toml).unwrap();

            let mut engine = RouteEngine::from_blueprint(&blueprint).unwrap();
            engine.start_all().await.unwrap();
            engine.join_all().await.unwrap();
            engine.shutdown().await.unwrap();

            std::fs::read_to_string(dir.path().join("js.log")).unwrap()
        }

        let aliased = run(r#"alias_of = "out""#).await;
        let made = run(
            r#"kind = "file"
params = { base_path = 'BASE' }"#,
        )
        .await;

        let lines: Vec<_> = aliased.lines().collect();
        assert_eq!(lines.len(), 6);
        for pair in lines.chunks(2) {
            assert!(pair[0].starts_with("log - body=js, headers={RandomValue="));
            assert!(pair[1].starts_with("aaa - body=js, headers={RandomValue="));
        }
        assert_eq!(aliased, made);
    }
}
