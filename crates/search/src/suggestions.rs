//! The footer search bar's dropdown of top hits.

use crate::hit::TrailHit;

pub const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SuggestionKey {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
}

impl SuggestionKey {
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name {
            "ArrowDown" => Some(SuggestionKey::ArrowDown),
            "ArrowUp" => Some(SuggestionKey::ArrowUp),
            "Enter" => Some(SuggestionKey::Enter),
            "Escape" => Some(SuggestionKey::Escape),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Suggestions {
    items: Vec<TrailHit>,
    open: bool,
    active: usize,
}

impl Suggestions {
    /// Refreshes from the latest results. The list opens only for a
    /// non-blank query with at least one hit; the highlight resets.
    pub fn update(&mut self, query: &str, hits: &[TrailHit]) {
        self.items = hits.iter().take(MAX_SUGGESTIONS).cloned().collect();
        self.open = !query.trim().is_empty() && !self.items.is_empty();
        self.active = 0;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn items(&self) -> &[TrailHit] {
        &self.items
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn hover(&mut self, index: usize) {
        if index < self.items.len() {
            self.active = index;
        }
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Picks an item by index and closes the list.
    pub fn choose(&mut self, index: usize) -> Option<TrailHit> {
        let hit = self.items.get(index).cloned()?;
        self.open = false;
        Some(hit)
    }

    /// Keyboard navigation. Returns the chosen hit on Enter. Keys are
    /// ignored while the list is closed.
    pub fn key(&mut self, key: SuggestionKey) -> Option<TrailHit> {
        let n = self.items.len();
        if !self.open || n == 0 {
            return None;
        }
        match key {
            SuggestionKey::ArrowDown => {
                self.active = (self.active + 1) % n;
                None
            }
            SuggestionKey::ArrowUp => {
                self.active = (self.active + n - 1) % n;
                None
            }
            SuggestionKey::Enter => self.choose(self.active),
            SuggestionKey::Escape => {
                self.open = false;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_hits;

    #[test]
    fn opens_only_for_non_blank_query_with_hits() {
        let mut s = Suggestions::default();
        s.update("  ", &sample_hits(3));
        assert!(!s.is_open());
        s.update("tr", &[]);
        assert!(!s.is_open());
        s.update("tr", &sample_hits(8));
        assert!(s.is_open());
        assert_eq!(s.items().len(), 5);
    }

    #[test]
    fn arrows_wrap_and_enter_chooses() {
        let mut s = Suggestions::default();
        s.update("tr", &sample_hits(3));
        assert_eq!(s.key(SuggestionKey::ArrowUp), None);
        assert_eq!(s.active(), 2);
        s.key(SuggestionKey::ArrowDown);
        assert_eq!(s.active(), 0);
        s.key(SuggestionKey::ArrowDown);
        let chosen = s.key(SuggestionKey::Enter).unwrap();
        assert_eq!(chosen.name.as_deref(), Some("Trail 1"));
        assert!(!s.is_open());
        assert_eq!(s.key(SuggestionKey::Enter), None);
    }

    #[test]
    fn escape_closes() {
        let mut s = Suggestions::default();
        s.update("tr", &sample_hits(2));
        s.key(SuggestionKey::Escape);
        assert!(!s.is_open());
        assert_eq!(SuggestionKey::from_key_name("Tab"), None);
    }
}
