//! Per-tick processing steps: constant body, then random header

use std::fmt;

use contracts::Event;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Smallest value the enricher produces
pub const RANDOM_MIN: i64 = 1;

/// Largest value the enricher produces
pub const RANDOM_MAX: i64 = 100;

/// Sets every event's body to a fixed string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodySetter {
    body: String,
}

impl BodySetter {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn apply(&self, event: &mut Event) {
        event.body.clone_from(&self.body);
    }
}

/// Attaches a uniform random integer in `[RANDOM_MIN, RANDOM_MAX]` as a header
#[derive(Clone)]
pub struct RandomEnricher {
    header: String,
    seed: Option<u64>,
    rng: StdRng,
}

impl RandomEnricher {
    /// Deterministic sequence for a given seed
    pub fn from_seed(header: impl Into<String>, seed: u64) -> Self {
        Self {
            header: header.into(),
            seed: Some(seed),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded from the operating system
    pub fn from_entropy(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            seed: None,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn new(header: impl Into<String>, seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(header, seed),
            None => Self::from_entropy(header),
        }
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Draw a value and store it in the header, replacing any previous one
    pub fn apply(&mut self, event: &mut Event) -> i64 {
        let value = self.rng.random_range(RANDOM_MIN..=RANDOM_MAX);
        event.set_header(self.header.as_str(), value);
        value
    }
}

impl fmt::Debug for RandomEnricher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomEnricher")
            .field("header", &self.header)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}
