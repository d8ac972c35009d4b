//! Summaries of features the view has already seen, keyed by id.

use std::collections::{BTreeMap, VecDeque};

use foundation::bounds::LngLatBounds;
use foundation::ids::FeatureId;

use crate::trail::TrailSummary;

pub const DEFAULT_CAPACITY: usize = 512;

#[derive(Debug, Clone, PartialEq)]
pub struct CachedFeature {
    pub summary: TrailSummary,
    pub bounds: Option<LngLatBounds>,
}

/// Bounded, insertion-ordered cache. Re-inserting an id refreshes it; the
/// oldest entry is evicted once `capacity` is exceeded.
#[derive(Debug, Clone)]
pub struct FeatureCache {
    entries: BTreeMap<FeatureId, CachedFeature>,
    order: VecDeque<FeatureId>,
    capacity: usize,
}

impl Default for FeatureCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl FeatureCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn insert(&mut self, summary: TrailSummary, bounds: Option<LngLatBounds>) {
        let id = summary.id.clone();
        if self.entries.contains_key(&id) {
            self.order.retain(|x| x != &id);
        }
        self.order.push_back(id.clone());
        self.entries.insert(id, CachedFeature { summary, bounds });
        while self.order.len() > self.capacity {
            if let Some(old) = self.order.pop_front() {
                self.entries.remove(&old);
            }
        }
    }

    pub fn get(&self, id: &FeatureId) -> Option<&CachedFeature> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}
