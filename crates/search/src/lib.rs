//! Hosted trail search: index records, the HTTP client, and the
//! refinement / infinite-hits / suggestion state that drives the UI.

pub mod client;
pub mod config;
pub mod hit;
pub mod pagination;
pub mod state;
pub mod suggestions;

pub use client::{AlgoliaClient, SearchClient, SearchPage, SearchRequest};
pub use config::{SearchConfig, SearchError};
pub use hit::{TagVariant, TrailHit, TrailKind, TrailTypeTag, normalize_trail_kind, trail_type_tag};
pub use pagination::fetch_all_pages;
pub use state::{FacetItem, SearchState};
pub use suggestions::{SuggestionKey, Suggestions};

#[cfg(test)]
pub(crate) mod testing;
