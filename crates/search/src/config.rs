use std::env;

pub const DEFAULT_INDEX_NAME: &str = "US_Routes_Ways";
pub const DEFAULT_HITS_PER_PAGE: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    MissingCredential(&'static str),
    Http(String),
    Status { status: u16, message: String },
    Decode(String),
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchError::MissingCredential(var) => write!(f, "missing search credential {var}"),
            SearchError::Http(msg) => write!(f, "search request failed: {msg}"),
            SearchError::Status { status, message } => {
                write!(f, "search service returned {status}: {message}")
            }
            SearchError::Decode(msg) => write!(f, "could not decode search response: {msg}"),
        }
    }
}

impl std::error::Error for SearchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub app_id: String,
    pub search_key: String,
    pub index_name: String,
    pub hits_per_page: u32,
}

impl SearchConfig {
    pub fn new(app_id: impl Into<String>, search_key: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            search_key: search_key.into(),
            index_name: DEFAULT_INDEX_NAME.to_string(),
            hits_per_page: DEFAULT_HITS_PER_PAGE,
        }
    }

    /// Reads `ALGOLIA_APP_ID`, `ALGOLIA_SEARCH_KEY` and the optional
    /// `ALGOLIA_INDEX_NAME`. Missing credentials are an error.
    pub fn from_env() -> Result<Self, SearchError> {
        Self::from_lookup(|k| env::var(k).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SearchError> {
        let read = |k: &'static str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let app_id = read("ALGOLIA_APP_ID").ok_or(SearchError::MissingCredential("ALGOLIA_APP_ID"))?;
        let search_key =
            read("ALGOLIA_SEARCH_KEY").ok_or(SearchError::MissingCredential("ALGOLIA_SEARCH_KEY"))?;
        let mut cfg = Self::new(app_id, search_key);
        if let Some(index) = read("ALGOLIA_INDEX_NAME") {
            cfg.index_name = index;
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn index_defaults_when_unset() {
        let cfg = SearchConfig::from_lookup(lookup(&[("ALGOLIA_APP_ID", "APP"), ("ALGOLIA_SEARCH_KEY", "k")]))
            .unwrap();
        assert_eq!(cfg.index_name, "US_Routes_Ways");
        assert_eq!(cfg.hits_per_page, 20);
    }

    #[test]
    fn missing_credentials_fail_loudly() {
        let err = SearchConfig::from_lookup(lookup(&[("ALGOLIA_APP_ID", "APP"), ("ALGOLIA_SEARCH_KEY", " ")]))
            .unwrap_err();
        assert_eq!(err, SearchError::MissingCredential("ALGOLIA_SEARCH_KEY"));
        assert!(err.to_string().contains("ALGOLIA_SEARCH_KEY"));
    }
}
