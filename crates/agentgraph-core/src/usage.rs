//! Access counters keyed by name (agent instantiations, document loads).

use dashmap::DashMap;
use std::sync::Arc;

/// Shared access counter. Clones share the same underlying store.
#[derive(Debug, Clone, Default)]
pub struct UsageTracker {
    counts: Arc<DashMap<String, u64>>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the counter for `key`, returning the new count.
    pub fn record(&self, key: &str) -> u64 {
        let mut entry = self.counts.entry(key.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    pub fn count(&self, key: &str) -> u64 {
        self.counts.get(key).map(|c| *c).unwrap_or(0)
    }

    /// All counters, sorted by key.
    pub fn snapshot(&self) -> Vec<(String, u64)> {
        let mut rows: Vec<_> = self
            .counts
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows
    }

    pub fn report(&self) -> String {
        let mut out = String::from("Usage Report:\n");
        for (key, count) in self.snapshot() {
            out.push_str(&format!("Node ID: {} - Access Count: {}\n", key, count));
        }
        out
    }

    pub fn reset(&self) {
        self.counts.clear();
    }
}
