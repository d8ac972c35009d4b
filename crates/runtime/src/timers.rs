use std::collections::BTreeMap;

use foundation::time::Time;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

/// One-shot timers driven by an explicit clock.
///
/// Nothing fires on its own: the owner calls [`TimerQueue::expire`] with the
/// current time and handles the returned ids.
#[derive(Debug)]
pub struct TimerQueue {
    next_id: u64,
    deadlines: BTreeMap<TimerId, Time>,
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self {
            next_id: 1,
            deadlines: BTreeMap::new(),
        }
    }
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: Time) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.deadlines.insert(id, deadline);
        id
    }

    /// Returns `true` if the timer was still armed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.deadlines.remove(&id).is_some()
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id)
    }

    /// Removes and returns every timer due at `now`, earliest deadline first
    /// (ties broken by id).
    pub fn expire(&mut self, now: Time) -> Vec<TimerId> {
        let mut due: Vec<(TimerId, Time)> = self
            .deadlines
            .iter()
            .filter(|(_, d)| now.is_at_or_after(**d))
            .map(|(id, d)| (*id, *d))
            .collect();
        due.sort_by(|(ia, a), (ib, b)| a.0.total_cmp(&b.0).then_with(|| ia.cmp(ib)));
        for (id, _) in &due {
            self.deadlines.remove(id);
        }
        due.into_iter().map(|(id, _)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    pub fn clear(&mut self) {
        self.deadlines.clear();
    }
}
