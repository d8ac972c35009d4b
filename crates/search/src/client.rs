use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Value, json};

use crate::config::{SearchConfig, SearchError};
use crate::hit::TrailHit;

/// Facets requested with every query.
pub const FACET_ATTRIBUTES: [&str; 2] = ["region", "type"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub page: u32,
    pub hits_per_page: u32,
    /// Refined values per attribute. Values of one attribute are OR-ed,
    /// attributes are AND-ed.
    pub refinements: BTreeMap<String, Vec<String>>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, hits_per_page: u32) -> Self {
        Self {
            query: query.into(),
            page: 0,
            hits_per_page,
            refinements: BTreeMap::new(),
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// `[["region:West", "region:South"], ["type:route"]]`
    pub fn facet_filters(&self) -> Vec<Vec<String>> {
        self.refinements
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(attr, values)| values.iter().map(|v| format!("{attr}:{v}")).collect())
            .collect()
    }

    pub fn to_body(&self) -> Value {
        let mut body = json!({
            "query": self.query,
            "page": self.page,
            "hitsPerPage": self.hits_per_page,
            "facets": FACET_ATTRIBUTES,
        });
        let filters = self.facet_filters();
        if !filters.is_empty() {
            body["facetFilters"] = json!(filters);
        }
        body
    }
}

/// One page of results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub hits: Vec<TrailHit>,
    pub page: u32,
    pub nb_pages: u32,
    pub nb_hits: u64,
    /// attribute → value → count
    pub facets: BTreeMap<String, BTreeMap<String, u64>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPage {
    #[serde(default)]
    hits: Vec<Value>,
    #[serde(default)]
    page: u32,
    #[serde(default)]
    nb_pages: u32,
    #[serde(default)]
    nb_hits: u64,
    #[serde(default)]
    facets: BTreeMap<String, BTreeMap<String, u64>>,
}

impl SearchPage {
    /// Decodes a response body. Individual malformed hits are dropped.
    pub fn from_json(v: Value) -> Result<Self, SearchError> {
        let raw: RawPage = serde_json::from_value(v).map_err(|e| SearchError::Decode(e.to_string()))?;
        Ok(Self {
            hits: raw.hits.into_iter().filter_map(TrailHit::from_value).collect(),
            page: raw.page,
            nb_pages: raw.nb_pages,
            nb_hits: raw.nb_hits,
            facets: raw.facets,
        })
    }

    pub fn is_last_page(&self) -> bool {
        self.page + 1 >= self.nb_pages
    }
}

/// A hosted search index.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait SearchClient {
    async fn search(&self, index: &str, request: &SearchRequest) -> Result<SearchPage, SearchError>;
}

/// Search-only client for the Algolia REST API.
#[derive(Debug, Clone)]
pub struct AlgoliaClient {
    http: reqwest::Client,
    app_id: String,
    api_key: String,
    host: String,
}

impl AlgoliaClient {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            app_id: config.app_id.clone(),
            api_key: config.search_key.clone(),
            host: format!("https://{}-dsn.algolia.net", config.app_id.to_lowercase()),
        }
    }

    /// Overrides the `https://{app}-dsn.algolia.net` host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into().trim_end_matches('/').to_string();
        self
    }

    pub fn query_url(&self, index: &str) -> String {
        format!("{}/1/indexes/{}/query", self.host, index)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl SearchClient for AlgoliaClient {
    async fn search(&self, index: &str, request: &SearchRequest) -> Result<SearchPage, SearchError> {
        let url = self.query_url(index);
        tracing::debug!(%url, query = %request.query, page = request.page, "search");
        let resp = self
            .http
            .post(&url)
            .header("X-Algolia-Application-Id", &self.app_id)
            .header("X-Algolia-API-Key", &self.api_key)
            .json(&request.to_body())
            .send()
            .await
            .map_err(|e| SearchError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "search request rejected");
            return Err(SearchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = resp.json().await.map_err(|e| SearchError::Decode(e.to_string()))?;
        SearchPage::from_json(body)
    }
}
