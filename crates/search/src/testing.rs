//! In-memory index used by the tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::client::{SearchClient, SearchPage, SearchRequest};
use crate::config::SearchError;
use crate::hit::TrailHit;

pub struct FixtureClient {
    pub hits: Vec<TrailHit>,
    pub fail: bool,
    pub requests: Mutex<Vec<SearchRequest>>,
}

impl FixtureClient {
    pub fn new(hits: Vec<TrailHit>) -> Self {
        Self {
            hits,
            fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    fn attribute<'a>(hit: &'a TrailHit, attr: &str) -> Option<&'a str> {
        match attr {
            "region" => hit.region.as_deref(),
            "type" => hit.kind.as_deref(),
            _ => None,
        }
    }

    fn admits(hit: &TrailHit, request: &SearchRequest) -> bool {
        let q = request.query.trim().to_lowercase();
        let name_ok = q.is_empty() || hit.name.as_deref().is_some_and(|n| n.to_lowercase().contains(&q));
        name_ok
            && request.refinements.iter().all(|(attr, values)| {
                values.is_empty()
                    || Self::attribute(hit, attr).is_some_and(|v| values.iter().any(|x| x == v))
            })
    }
}

/// Named hits, ids 1.., with region and type attributes.
pub fn sample_hits(n: usize) -> Vec<TrailHit> {
    (0..n)
        .map(|i| {
            let mut h = TrailHit::new(i as i64 + 1);
            h.name = Some(format!("Trail {i}"));
            h.region = Some(if i % 2 == 0 { "West" } else { "South" }.to_string());
            h.kind = Some(if i % 3 == 0 { "route" } else { "way" }.to_string());
            h
        })
        .collect()
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl SearchClient for FixtureClient {
    async fn search(&self, _index: &str, request: &SearchRequest) -> Result<SearchPage, SearchError> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(request.clone());
        }
        if self.fail {
            return Err(SearchError::Http("connection refused".to_string()));
        }
        let matching: Vec<&TrailHit> = self.hits.iter().filter(|h| Self::admits(h, request)).collect();
        let per_page = request.hits_per_page.max(1) as usize;
        let nb_pages = matching.len().div_ceil(per_page) as u32;
        let start = request.page as usize * per_page;
        let hits = matching.iter().skip(start).take(per_page).map(|h| (*h).clone()).collect();

        let mut facets: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
        for hit in &matching {
            for attr in ["region", "type"] {
                if let Some(v) = Self::attribute(hit, attr) {
                    *facets.entry(attr.to_string()).or_default().entry(v.to_string()).or_default() += 1;
                }
            }
        }
        Ok(SearchPage {
            hits,
            page: request.page,
            nb_pages,
            nb_hits: matching.len() as u64,
            facets,
        })
    }
}
