//! 路由指标收集模块
//!
//! 基于每个 tick 的随机值与 DispatchReport 收集和统计路由运行指标。

use std::collections::HashMap;

use contracts::DispatchReport;
use metrics::{counter, gauge, histogram};

/// 记录一次 tick
pub fn record_tick(route: &str, sequence: u64) {
    counter!("timer_route_ticks_total", "route" => route.to_string()).increment(1);
    gauge!("timer_route_last_sequence", "route" => route.to_string()).set(sequence as f64);
}

/// 记录注入的随机值
pub fn record_random_value(route: &str, value: i64) {
    histogram!("timer_route_random_value", "route" => route.to_string()).record(value as f64);
}

/// 从 DispatchReport 记录分发指标
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_dispatch_report;
///
/// let report = dispatcher.dispatch(&event).await;
/// record_dispatch_report("js", &report);
/// ```
pub fn record_dispatch_report(route: &str, report: &DispatchReport) {
    for outcome in &report.outcomes {
        counter!(
            "timer_route_dispatch_total",
            "route" => route.to_string(),
            "sink" => outcome.sink.clone(),
            "status" => outcome.status.as_str()
        )
        .increment(1);
    }

    if report.failed() > 0 {
        counter!("timer_route_ticks_with_failures_total", "route" => route.to_string())
            .increment(1);
    }
}

/// 记录路由运行状态 (1 = Running, 0 = Stopped)
pub fn record_route_running(route: &str, running: bool) {
    gauge!("timer_route_running", "route" => route.to_string())
        .set(if running { 1.0 } else { 0.0 });
}

/// 路由指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct RouteMetricsAggregator {
    /// 总 tick 数
    pub total_ticks: u64,

    /// 成功投递的行数
    pub delivered: u64,

    /// 失败 (格式化失败/写入失败/超时) 的投递数
    pub failed: u64,

    /// 至少一个 sink 失败的 tick 数
    pub ticks_with_failures: u64,

    /// 随机值统计
    pub random_stats: RunningStats,

    /// 各 sink 失败次数
    pub sink_failures: HashMap<String, u64>,
}

impl RouteMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, random_value: Option<i64>, report: &DispatchReport) {
        self.total_ticks += 1;
        self.delivered += report.delivered() as u64;
        self.failed += report.failed() as u64;

        if report.failed() > 0 {
            self.ticks_with_failures += 1;
            for outcome in report.outcomes.iter().filter(|o| !o.status.is_delivered()) {
                *self.sink_failures.entry(outcome.sink.clone()).or_insert(0) += 1;
            }
        }

        if let Some(value) = random_value {
            self.random_stats.push(value as f64);
        }
    }

    /// 合并另一个聚合器 (多路由汇总)
    pub fn merge(&mut self, other: &Self) {
        self.total_ticks += other.total_ticks;
        self.delivered += other.delivered;
        self.failed += other.failed;
        self.ticks_with_failures += other.ticks_with_failures;
        self.random_stats.merge(&other.random_stats);
        for (sink, count) in &other.sink_failures {
            *self.sink_failures.entry(sink.clone()).or_insert(0) += count;
        }
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        let attempts = self.delivered + self.failed;
        MetricsSummary {
            total_ticks: self.total_ticks,
            delivered: self.delivered,
            failed: self.failed,
            ticks_with_failures: self.ticks_with_failures,
            failure_rate: if attempts > 0 {
                self.failed as f64 / attempts as f64 * 100.0
            } else {
                0.0
            },
            random_value: StatsSummary::from(&self.random_stats),
            sink_failure_counts: self.sink_failures.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_ticks: u64,
    pub delivered: u64,
    pub failed: u64,
    pub ticks_with_failures: u64,
    pub failure_rate: f64,
    pub random_value: StatsSummary,
    pub sink_failure_counts: HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Route Metrics Summary ===")?;
        writeln!(f, "Total ticks: {}", self.total_ticks)?;
        writeln!(f, "Lines delivered: {}", self.delivered)?;
        writeln!(
            f,
            "Failed deliveries: {} ({:.2}%)",
            self.failed, self.failure_rate
        )?;
        writeln!(f, "Ticks with failures: {}", self.ticks_with_failures)?;
        writeln!(f, "Random value: {}", self.random_value)?;

        if !self.sink_failure_counts.is_empty() {
            let mut sinks: Vec<_> = self.sink_failure_counts.iter().collect();
            sinks.sort();
            writeln!(f, "Failures per sink:")?;
            for (sink, count) in sinks {
                writeln!(f, "  {}: {}", sink, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.0}, max={:.0}, mean={:.2}, std={:.2} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 合并另一组样本 (Chan 并行算法)
    pub fn merge(&mut self, other: &Self) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = other.clone();
            return;
        }

        let count = self.count + other.count;
        let delta = other.mean - self.mean;
        self.m2 += other.m2 + delta * delta * (self.count * other.count) as f64 / count as f64;
        self.mean += delta * other.count as f64 / count as f64;
        self.count = count;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}
