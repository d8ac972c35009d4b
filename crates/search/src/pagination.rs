use crate::client::{SearchClient, SearchRequest};
use crate::config::SearchError;
use crate::hit::TrailHit;

/// Upper bound on pages followed by [`fetch_all_pages`] when the caller
/// passes no tighter cap.
pub const MAX_PAGES: u32 = 50;

/// Follows `page`/`nbPages` from `base.page` until the last page, an empty
/// page, or `max_pages` requests, whichever comes first.
pub async fn fetch_all_pages<C: SearchClient + ?Sized>(
    client: &C,
    index: &str,
    base: &SearchRequest,
    max_pages: u32,
) -> Result<Vec<TrailHit>, SearchError> {
    let max_pages = max_pages.clamp(1, MAX_PAGES);
    let mut out = Vec::new();
    let mut request = base.clone();
    for fetched in 1..=max_pages {
        let page = client.search(index, &request).await?;
        let done = page.hits.is_empty() || page.is_last_page();
        out.extend(page.hits);
        if done {
            break;
        }
        if fetched == max_pages {
            tracing::warn!(max_pages, "page cap reached before the last page");
            break;
        }
        request.page += 1;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixtureClient, sample_hits};

    #[test]
    fn stops_at_last_page() {
        let client = FixtureClient::new(sample_hits(45));
        let hits = pollster::block_on(fetch_all_pages(&client, "idx", &SearchRequest::new("", 20), 10)).unwrap();
        assert_eq!(hits.len(), 45);
        assert_eq!(client.request_count(), 3);
    }

    #[test]
    fn stops_at_page_cap() {
        let client = FixtureClient::new(sample_hits(100));
        let hits = pollster::block_on(fetch_all_pages(&client, "idx", &SearchRequest::new("", 10), 2)).unwrap();
        assert_eq!(hits.len(), 20);
        assert_eq!(client.request_count(), 2);
    }

    #[test]
    fn empty_result_is_one_request() {
        let client = FixtureClient::new(Vec::new());
        let hits = pollster::block_on(fetch_all_pages(&client, "idx", &SearchRequest::new("x", 20), 5)).unwrap();
        assert!(hits.is_empty());
        assert_eq!(client.request_count(), 1);
    }

    #[test]
    fn errors_propagate() {
        let client = FixtureClient::failing();
        let err = pollster::block_on(fetch_all_pages(&client, "idx", &SearchRequest::new("x", 20), 5));
        assert!(matches!(err, Err(SearchError::Http(_))));
    }
}
