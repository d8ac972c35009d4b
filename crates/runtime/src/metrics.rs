use std::collections::BTreeMap;

/// Counters for swallowed failures and resolution outcomes.
///
/// Sorted so snapshots are stable in logs and tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<String, u64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn inc_counter(&mut self, name: impl Into<String>, by: u64) {
        *self.counters.entry(name.into()).or_insert(0) += by;
    }

    pub fn incr(&mut self, name: &str) {
        self.inc_counter(name, 1);
    }

    /// Non-zero counters in name order.
    pub fn snapshot(&self) -> Vec<(String, u64)> {
        self.counters
            .iter()
            .filter(|(_, v)| **v > 0)
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }
}
