//! Ticker - one `Event` per timer period

use chrono::Utc;
use contracts::{Event, TimerSpec};
use tokio::runtime::Handle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::debug;

use crate::error::RouteError;

/// Periodic event source for a single route run
///
/// Not restartable: a route builds a fresh ticker every time it starts.
#[derive(Debug)]
pub struct Ticker {
    name: String,
    interval: Interval,
    repeat_count: u64,
    fired: u64,
}

impl Ticker {
    /// Schedule the timer
    ///
    /// The first tick fires after `spec.delay`, then every `spec.period`.
    ///
    /// # Errors
    /// `RouteError::Scheduling` when the period is zero or no tokio
    /// runtime is available to drive the timer.
    pub fn start(spec: &TimerSpec) -> Result<Self, RouteError> {
        if spec.period.is_zero() {
            return Err(RouteError::scheduling(&spec.name, "period must be > 0"));
        }
        Handle::try_current().map_err(|e| RouteError::scheduling(&spec.name, e.to_string()))?;

        let first_tick = Instant::now()
            .checked_add(spec.delay)
            .ok_or_else(|| RouteError::scheduling(&spec.name, "delay too large"))?;
        let mut interval = time::interval_at(first_tick, spec.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!(
            timer = %spec.name,
            period_ms = spec.period.as_millis() as u64,
            delay_ms = spec.delay.as_millis() as u64,
            repeat_count = spec.repeat_count,
            "Timer scheduled"
        );

        Ok(Self {
            name: spec.name.clone(),
            interval,
            repeat_count: spec.repeat_count,
            fired: 0,
        })
    }

    /// Ticks produced so far
    pub fn fired(&self) -> u64 {
        self.fired
    }

    pub fn is_exhausted(&self) -> bool {
        self.repeat_count > 0 && self.fired >= self.repeat_count
    }

    /// Wait for the next tick
    ///
    /// Returns `None` once `repeat_count` ticks have fired. Cancel safe.
    pub async fn next(&mut self) -> Option<Event> {
        if self.is_exhausted() {
            return None;
        }
        self.interval.tick().await;
        self.fired += 1;
        Some(Event::new(&self.name, self.fired, Utc::now()))
    }
}
