//! Named, timestamped samples exchanged between modules.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// One published value: `(key, timestamp, value)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSample {
    /// Sample key, unique within one batch.
    pub key: String,
    /// Simulated time the value was produced at (seconds).
    pub timestamp_s: f64,
    /// Scalar value.
    pub value: f64,
}

impl NamedSample {
    /// Create a new sample.
    pub fn new(key: impl Into<String>, timestamp_s: f64, value: f64) -> Self {
        Self {
            key: key.into(),
            timestamp_s,
            value,
        }
    }
}

/// Ordered batch of samples published by one module at one tick.
pub type SampleBatch = Vec<NamedSample>;

/// Find a sample by key. The first match wins.
pub fn find_sample<'a>(batch: &'a [NamedSample], key: &str) -> Option<&'a NamedSample> {
    batch.iter().find(|s| s.key == key)
}

/// First key that appears more than once in `batch`, if any.
pub fn first_duplicate_key(batch: &[NamedSample]) -> Option<&str> {
    let mut seen = HashSet::new();
    batch
        .iter()
        .map(|s| s.key.as_str())
        .find(|key| !seen.insert(*key))
}
