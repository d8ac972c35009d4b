//! Query, refinements and the accumulated infinite-hits list.

use std::collections::{BTreeMap, BTreeSet};

use crate::client::{SearchPage, SearchRequest};
use crate::config::DEFAULT_HITS_PER_PAGE;
use crate::hit::TrailHit;

/// Facet chips shown per attribute.
pub const FACET_LIMIT: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetItem {
    pub value: String,
    pub count: u64,
    pub is_refined: bool,
}

#[derive(Debug, Clone)]
pub struct SearchState {
    query: String,
    refinements: BTreeMap<String, BTreeSet<String>>,
    hits_per_page: u32,
    hits: Vec<TrailHit>,
    /// Last page appended, `None` before the first response.
    page: Option<u32>,
    nb_pages: u32,
    nb_hits: u64,
    facets: BTreeMap<String, BTreeMap<String, u64>>,
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new(DEFAULT_HITS_PER_PAGE)
    }
}

impl SearchState {
    pub fn new(hits_per_page: u32) -> Self {
        Self {
            query: String::new(),
            refinements: BTreeMap::new(),
            hits_per_page: hits_per_page.max(1),
            hits: Vec::new(),
            page: None,
            nb_pages: 0,
            nb_hits: 0,
            facets: BTreeMap::new(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn hits(&self) -> &[TrailHit] {
        &self.hits
    }

    pub fn nb_hits(&self) -> u64 {
        self.nb_hits
    }

    fn reset_results(&mut self) {
        self.hits.clear();
        self.page = None;
        self.nb_pages = 0;
        self.nb_hits = 0;
    }

    /// New query text; results restart from the first page.
    pub fn set_query(&mut self, query: &str) -> SearchRequest {
        if self.query != query {
            self.query = query.to_string();
            self.reset_results();
        }
        self.request(0)
    }

    pub fn is_refined(&self, attribute: &str, value: &str) -> bool {
        self.refinements.get(attribute).is_some_and(|s| s.contains(value))
    }

    pub fn toggle_refinement(&mut self, attribute: &str, value: &str) -> SearchRequest {
        let set = self.refinements.entry(attribute.to_string()).or_default();
        if !set.remove(value) {
            set.insert(value.to_string());
        }
        if set.is_empty() {
            self.refinements.remove(attribute);
        }
        self.reset_results();
        self.request(0)
    }

    pub fn clear_refinements(&mut self) -> SearchRequest {
        if !self.refinements.is_empty() {
            self.refinements.clear();
            self.reset_results();
        }
        self.request(0)
    }

    pub fn has_refinements(&self) -> bool {
        !self.refinements.is_empty()
    }

    /// `(attribute, value)` pairs, for the current-refinements row.
    pub fn current_refinements(&self) -> Vec<(String, String)> {
        self.refinements
            .iter()
            .flat_map(|(a, vs)| vs.iter().map(move |v| (a.clone(), v.clone())))
            .collect()
    }

    pub fn request(&self, page: u32) -> SearchRequest {
        let mut req = SearchRequest::new(self.query.clone(), self.hits_per_page).with_page(page);
        req.refinements = self
            .refinements
            .iter()
            .map(|(a, vs)| (a.clone(), vs.iter().cloned().collect()))
            .collect();
        req
    }

    pub fn is_last_page(&self) -> bool {
        match self.page {
            Some(p) => p + 1 >= self.nb_pages,
            None => false,
        }
    }

    /// Request for the page after the last one received, or `None` when the
    /// list is complete or nothing has loaded yet.
    pub fn show_more(&self) -> Option<SearchRequest> {
        let page = self.page?;
        (!self.is_last_page()).then(|| self.request(page + 1))
    }

    /// Applies a response. Responses to a request that no longer matches
    /// the query and refinements, or that skip a page, are ignored.
    pub fn apply(&mut self, request: &SearchRequest, page: SearchPage) -> bool {
        if *request != self.request(request.page) {
            tracing::debug!(page = request.page, "dropping stale search response");
            return false;
        }
        let expected = self.page.map_or(0, |p| p + 1);
        if request.page == 0 {
            self.hits.clear();
        } else if request.page != expected {
            return false;
        }
        self.hits.extend(page.hits);
        self.page = Some(request.page);
        self.nb_pages = page.nb_pages;
        self.nb_hits = page.nb_hits;
        self.facets = page.facets;
        true
    }

    /// Facet values sorted by name, at most [`FACET_LIMIT`]. Refined values
    /// stay listed even when the current results carry no count for them.
    pub fn facet_items(&self, attribute: &str) -> Vec<FacetItem> {
        let mut values: BTreeMap<&str, u64> = self
            .facets
            .get(attribute)
            .map(|m| m.iter().map(|(v, c)| (v.as_str(), *c)).collect())
            .unwrap_or_default();
        if let Some(refined) = self.refinements.get(attribute) {
            for v in refined {
                values.entry(v.as_str()).or_insert(0);
            }
        }
        values
            .into_iter()
            .take(FACET_LIMIT)
            .map(|(value, count)| FacetItem {
                value: value.to_string(),
                count,
                is_refined: self.is_refined(attribute, value),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SearchClient;
    use crate::testing::{FixtureClient, sample_hits};
    use pretty_assertions::assert_eq;

    fn run(client: &FixtureClient, state: &mut SearchState, req: SearchRequest) -> bool {
        let page = pollster::block_on(client.search("idx", &req)).unwrap();
        state.apply(&req, page)
    }

    #[test]
    fn infinite_hits_append_until_last_page() {
        let client = FixtureClient::new(sample_hits(45));
        let mut state = SearchState::default();
        assert_eq!(state.show_more(), None);
        let req = state.set_query("trail");
        assert!(run(&client, &mut state, req));
        assert_eq!(state.hits().len(), 20);
        assert!(!state.is_last_page());

        let more = state.show_more().unwrap();
        assert_eq!(more.page, 1);
        assert!(run(&client, &mut state, more));
        let more = state.show_more().unwrap();
        assert!(run(&client, &mut state, more));
        assert_eq!(state.hits().len(), 45);
        assert!(state.is_last_page());
        assert_eq!(state.show_more(), None);
    }

    #[test]
    fn stale_responses_are_dropped() {
        let client = FixtureClient::new(sample_hits(5));
        let mut state = SearchState::default();
        let old = state.set_query("tr");
        let _ = state.set_query("trail 1");
        assert!(!run(&client, &mut state, old));
        assert!(state.hits().is_empty());
    }

    #[test]
    fn refinements_toggle_and_reset_results() {
        let client = FixtureClient::new(sample_hits(10));
        let mut state = SearchState::default();
        let req = state.set_query("");
        run(&client, &mut state, req);
        assert_eq!(state.hits().len(), 10);

        let req = state.toggle_refinement("region", "West");
        assert!(state.hits().is_empty());
        run(&client, &mut state, req);
        assert_eq!(state.hits().len(), 5);
        assert!(state.hits().iter().all(|h| h.region.as_deref() == Some("West")));
        assert_eq!(state.current_refinements(), vec![("region".to_string(), "West".to_string())]);

        let _ = state.toggle_refinement("region", "West");
        assert!(!state.has_refinements());
        let _ = state.toggle_refinement("type", "route");
        let req = state.clear_refinements();
        assert!(req.refinements.is_empty());
    }

    #[test]
    fn facet_items_are_sorted_and_keep_refined_values() {
        let client = FixtureClient::new(sample_hits(6));
        let mut state = SearchState::default();
        let req = state.toggle_refinement("type", "route");
        run(&client, &mut state, req);
        let items = state.facet_items("type");
        assert_eq!(
            items,
            vec![FacetItem { value: "route".to_string(), count: 2, is_refined: true }]
        );
        let regions: Vec<String> = state.facet_items("region").into_iter().map(|i| i.value).collect();
        assert_eq!(regions, vec!["South".to_string(), "West".to_string()]);
    }
}
