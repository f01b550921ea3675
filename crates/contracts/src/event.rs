//! Event - the unit flowing through a route
//!
//! Created by the ticker, mutated by the body setter and the enricher,
//! read by the sinks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Header name written by the random enricher unless configured otherwise
pub const DEFAULT_RANDOM_HEADER: &str = "RandomValue";

/// A single header value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Int(i64),
    Text(String),
}

impl HeaderValue {
    /// Integer view of the value, if it is one
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for HeaderValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Event headers with unique keys
///
/// Keys are kept in ascending lexical order so the rendered form is
/// deterministic: `{a=1, b=two}`, or `{}` when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(BTreeMap<String, HeaderValue>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a header, returning the previous value
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<HeaderValue>,
    ) -> Option<HeaderValue> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &HeaderValue)> {
        self.0.iter()
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (idx, (name, value)) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str("}")
    }
}

impl<K: Into<String>, V: Into<HeaderValue>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Route event
///
/// `timer`, `sequence` and `fired_at` are tick properties, not headers,
/// so they never show up in the rendered header map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Name of the timer that fired
    pub timer: String,

    /// Tick counter, starting at 1
    pub sequence: u64,

    /// Wall-clock time of the tick
    pub fired_at: DateTime<Utc>,

    /// Payload
    pub body: String,

    /// Metadata
    pub headers: Headers,
}

impl Event {
    /// Create an event with an empty body and no headers
    pub fn new(timer: impl Into<String>, sequence: u64, fired_at: DateTime<Utc>) -> Self {
        Self {
            timer: timer.into(),
            sequence,
            fired_at,
            body: String::new(),
            headers: Headers::new(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<HeaderValue>) {
        self.headers.insert(name, value);
    }
}
