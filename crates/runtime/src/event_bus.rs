use std::collections::BTreeMap;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

/// Listener registry keyed by event kind.
///
/// The host delivers every engine event once; the bus decides which
/// subscribers see it. Each listener carries a tag identifying its owner,
/// returned with every dispatch.
///
/// Ordering contract:
/// - `dispatch` yields listeners in registration order.
#[derive(Debug)]
pub struct EventBus<K, T> {
    next_id: u64,
    listeners: BTreeMap<ListenerId, (K, T)>,
}

impl<K, T> Default for EventBus<K, T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            listeners: BTreeMap::new(),
        }
    }
}

impl<K: Copy + PartialEq, T: Copy + PartialEq> EventBus<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listen(&mut self, kind: K, tag: T) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.listeners.insert(id, (kind, tag));
        id
    }

    /// Returns `true` if the listener was registered.
    pub fn unlisten(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn dispatch(&self, kind: K) -> Vec<(ListenerId, T)> {
        self.listeners
            .iter()
            .filter(|(_, (k, _))| *k == kind)
            .map(|(id, (_, t))| (*id, *t))
            .collect()
    }

    pub fn has_listeners(&self, kind: K) -> bool {
        self.listeners.values().any(|(k, _)| *k == kind)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}
