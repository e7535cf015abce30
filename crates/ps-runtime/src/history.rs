//! Bounded per-module record of published output batches.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ps_controls::{NamedSample, find_sample};

/// One published batch and the tick that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub tick: u64,
    pub samples: Arc<[NamedSample]>,
}

/// Ring buffer of [`HistoryEntry`] per module, oldest first.
///
/// When a module's buffer is full the oldest entry is dropped.
#[derive(Debug, Clone)]
pub struct OutputHistory {
    capacity: usize,
    entries: HashMap<String, VecDeque<HistoryEntry>>,
    order: Vec<String>,
}

impl OutputHistory {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record(&mut self, module: &str, tick: u64, samples: &[NamedSample]) {
        if !self.entries.contains_key(module) {
            self.order.push(module.to_string());
        }
        let capacity = self.capacity;
        let buffer = self.entries.entry(module.to_string()).or_default();
        if buffer.len() == capacity {
            buffer.pop_front();
        }
        buffer.push_back(HistoryEntry {
            tick,
            samples: samples.into(),
        });
    }

    /// Up to `n` most recent entries of `module`, oldest first.
    pub fn latest(&self, module: &str, n: usize) -> Vec<HistoryEntry> {
        let Some(buffer) = self.entries.get(module) else {
            return Vec::new();
        };
        let skip = buffer.len().saturating_sub(n);
        buffer.iter().skip(skip).cloned().collect()
    }

    /// All retained entries of `module`, oldest first.
    pub fn batches(&self, module: &str) -> Vec<HistoryEntry> {
        self.entries
            .get(module)
            .map(|buffer| buffer.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn last(&self, module: &str) -> Option<&HistoryEntry> {
        self.entries.get(module).and_then(|buffer| buffer.back())
    }

    /// `(timestamp_s, value)` of `key` across the retained batches of `module`.
    /// Batches lacking the key are skipped.
    pub fn series(&self, module: &str, key: &str) -> Vec<(f64, f64)> {
        let Some(buffer) = self.entries.get(module) else {
            return Vec::new();
        };
        buffer
            .iter()
            .filter_map(|entry| find_sample(&entry.samples, key))
            .map(|sample| (sample.timestamp_s, sample.value))
            .collect()
    }

    /// Modules in the order they first published.
    pub fn modules(&self) -> &[String] {
        &self.order
    }

    /// Number of retained entries for `module`.
    pub fn len(&self, module: &str) -> usize {
        self.entries.get(module).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(VecDeque::is_empty)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

/// Shared, lock-guarded [`OutputHistory`].
///
/// The scheduler writes once per tick after all modules ran, so readers only
/// ever see complete ticks.
#[derive(Debug, Clone)]
pub struct HistoryHandle(Arc<RwLock<OutputHistory>>);

impl HistoryHandle {
    pub fn new(capacity: usize) -> Self {
        Self(Arc::new(RwLock::new(OutputHistory::new(capacity))))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, OutputHistory> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, OutputHistory> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Owned copy of the current contents.
    pub fn snapshot(&self) -> OutputHistory {
        self.read().clone()
    }
}
