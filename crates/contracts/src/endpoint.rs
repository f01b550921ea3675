//! Endpoint URIs
//!
//! `scheme:path?key=value&key2=value2`. Routes start `from` a `timer`
//! endpoint and deliver `to` component endpoints (`<component>:<logger>`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::ContractError;

/// Scheme accepted by `from`
pub const TIMER_SCHEME: &str = "timer";

/// Parsed endpoint URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: String,
    pub path: String,
    pub params: BTreeMap<String, String>,
}

impl Endpoint {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

impl FromStr for Endpoint {
    type Err = ContractError;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = uri
            .split_once(':')
            .ok_or_else(|| ContractError::endpoint_parse(uri, "expected '<scheme>:<path>'"))?;

        if scheme.is_empty() {
            return Err(ContractError::endpoint_parse(uri, "scheme cannot be empty"));
        }
        if !scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(ContractError::endpoint_parse(
                uri,
                format!("invalid character in scheme '{scheme}'"),
            ));
        }

        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };

        if path.is_empty() {
            return Err(ContractError::endpoint_parse(uri, "path cannot be empty"));
        }

        let mut params = BTreeMap::new();
        for pair in query.into_iter().flat_map(|q| q.split('&')) {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                ContractError::endpoint_parse(uri, format!("parameter '{pair}' has no value"))
            })?;
            if params.insert(key.to_string(), value.to_string()).is_some() {
                return Err(ContractError::endpoint_parse(
                    uri,
                    format!("duplicate parameter '{key}'"),
                ));
            }
        }

        Ok(Self {
            scheme: scheme.to_string(),
            path: path.to_string(),
            params,
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scheme, self.path)?;
        for (idx, (key, value)) in self.params.iter().enumerate() {
            let sep = if idx == 0 { '?' } else { '&' };
            write!(f, "{sep}{key}={value}")?;
        }
        Ok(())
    }
}

/// Timer settings parsed from a `timer:` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSpec {
    /// Timer name (endpoint path)
    pub name: String,

    /// Interval between ticks
    pub period: Duration,

    /// Wait before the first tick
    #[serde(default)]
    pub delay: Duration,

    /// Stop after this many ticks (0 = unbounded)
    #[serde(default)]
    pub repeat_count: u64,
}

impl TimerSpec {
    /// Unbounded timer firing immediately, then every `period`
    pub fn new(name: impl Into<String>, period: Duration) -> Self {
        Self {
            name: name.into(),
            period,
            delay: Duration::ZERO,
            repeat_count: 0,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_repeat_count(mut self, repeat_count: u64) -> Self {
        self.repeat_count = repeat_count;
        self
    }

    /// Build from a parsed endpoint
    ///
    /// Accepted parameters: `period` (default 1s), `delay`, `repeatCount`.
    pub fn from_endpoint(endpoint: &Endpoint) -> Result<Self, ContractError> {
        let uri = endpoint.to_string();
        if endpoint.scheme != TIMER_SCHEME {
            return Err(ContractError::endpoint_parse(
                uri,
                format!("expected '{TIMER_SCHEME}' scheme, got '{}'", endpoint.scheme),
            ));
        }

        let mut spec = Self::new(&endpoint.path, Duration::from_secs(1));
        for (key, value) in &endpoint.params {
            match key.as_str() {
                "period" => spec.period = parse_duration(value)?,
                "delay" => spec.delay = parse_duration(value)?,
                "repeatCount" => {
                    spec.repeat_count = value.parse().map_err(|_| {
                        ContractError::endpoint_parse(
                            &uri,
                            format!("repeatCount must be a non-negative integer, got '{value}'"),
                        )
                    })?
                }
                other => {
                    return Err(ContractError::endpoint_parse(
                        &uri,
                        format!("unknown timer parameter '{other}'"),
                    ))
                }
            }
        }
        Ok(spec)
    }
}

impl FromStr for TimerSpec {
    type Err = ContractError;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        Self::from_endpoint(&uri.parse()?)
    }
}

/// Parse `250ms`, `1s`, `2m`, `1h`, or a bare number of milliseconds
pub fn parse_duration(value: &str) -> Result<Duration, ContractError> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);

    let amount: u64 = digits
        .parse()
        .map_err(|_| ContractError::config_parse(format!("invalid duration '{value}'")))?;

    let secs_per_unit = match unit {
        "" | "ms" => return Ok(Duration::from_millis(amount)),
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        other => {
            return Err(ContractError::config_parse(format!(
                "unknown duration unit '{other}' in '{value}'"
            )))
        }
    };
    amount
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| ContractError::config_parse(format!("duration too large: '{value}'")))
}
