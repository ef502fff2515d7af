use crate::client::{build_client, error_from_response, error_from_transport};
use crate::sources::{PostSource, SearchWindow};
use async_trait::async_trait;
use brandscope_core::{RedditPost, SourceError, SourceKind};
use reqwest::Client;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

const ENDPOINTS: [&str; 2] = ["https://www.reddit.com", "https://old.reddit.com"];
const MAX_PAGES: usize = 3;
const PAGE_LIMIT: usize = 100;

/// Official-search adapter over Reddit's public search JSON endpoint.
/// Frequently 403s from datacenter IPs; rotates www -> old and remembers
/// the last endpoint that worked for the rest of the run.
pub struct RedditSearchSource {
    client: Client,
    endpoints: Vec<String>,
    working_endpoint: AtomicUsize,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: ListingPost,
}

#[derive(Debug, Deserialize)]
struct ListingPost {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    subreddit: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    score: i32,
    #[serde(default)]
    num_comments: u32,
    #[serde(default)]
    created_utc: f64,
}

impl RedditSearchSource {
    pub fn new(user_agent: &str) -> Self {
        Self::with_endpoints(user_agent, ENDPOINTS.iter().map(|s| s.to_string()).collect())
    }

    pub fn with_endpoints(user_agent: &str, endpoints: Vec<String>) -> Self {
        Self {
            client: build_client(user_agent),
            endpoints,
            working_endpoint: AtomicUsize::new(0),
        }
    }

    /// Try each endpoint starting from the last one that worked. A 403 from
    /// one endpoint falls through to the next; only when every endpoint is
    /// blocked does the call surface as Blocked.
    async fn get_with_fallback(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Listing, SourceError> {
        let start = self.working_endpoint.load(Ordering::Relaxed) % self.endpoints.len();
        let mut last_err = None;

        for offset in 0..self.endpoints.len() {
            let idx = (start + offset) % self.endpoints.len();
            let url = format!("{}{}", self.endpoints[idx], path);

            let response = match self.client.get(&url).query(params).send().await {
                Ok(response) => response,
                Err(e) => {
                    last_err = Some(error_from_transport(e, "Reddit search"));
                    continue;
                }
            };

            if !response.status().is_success() {
                let err = error_from_response(&response, path);
                warn!("Reddit search {url} failed: {err}");
                last_err = Some(err);
                continue;
            }

            let listing: Listing = response
                .json()
                .await
                .map_err(|e| error_from_transport(e, "Reddit search"))?;
            self.working_endpoint.store(idx, Ordering::Relaxed);
            return Ok(listing);
        }

        Err(last_err.unwrap_or(SourceError::Unavailable {
            reason: "no endpoints configured".to_string(),
        }))
    }
}

#[async_trait]
impl PostSource for RedditSearchSource {
    fn kind(&self) -> SourceKind {
        SourceKind::OfficialSearch
    }

    async fn search(
        &self,
        term: &str,
        subreddit: &str,
        window: &SearchWindow,
    ) -> Result<Vec<RedditPost>, SourceError> {
        let path = format!("/r/{subreddit}/search.json");
        let quoted = format!("\"{term}\"");
        let limit = PAGE_LIMIT.to_string();
        let mut posts = Vec::new();
        let mut after: Option<String> = None;

        for page in 0..MAX_PAGES {
            let mut params = vec![
                ("q", quoted.as_str()),
                ("sort", "new"),
                ("t", "year"),
                ("limit", limit.as_str()),
                ("restrict_sr", "on"),
                ("type", "link"),
            ];
            if let Some(cursor) = after.as_deref() {
                params.push(("after", cursor));
            }

            let listing = match self.get_with_fallback(&path, &params).await {
                Ok(listing) => listing,
                Err(e) if page == 0 => return Err(e),
                Err(e) => {
                    warn!("Reddit search r/{subreddit} page {page} failed: {e}");
                    break;
                }
            };

            if listing.data.children.is_empty() {
                break;
            }

            for child in listing.data.children {
                let d = child.data;
                let created_utc = d.created_utc as i64;
                // The "t=year" filter is coarser than the lookback window.
                if !window.contains(created_utc) {
                    continue;
                }
                posts.push(RedditPost {
                    permalink: format!("https://reddit.com{}", d.permalink),
                    id: d.id,
                    title: d.title,
                    selftext: d.selftext,
                    subreddit: d.subreddit,
                    author: d.author,
                    url: d.url,
                    score: d.score,
                    num_comments: d.num_comments,
                    created_utc,
                    source: SourceKind::OfficialSearch,
                });
            }

            after = listing.data.after;
            if after.is_none() {
                break;
            }
        }

        debug!("Reddit search r/{subreddit} '{term}': {} posts", posts.len());
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_parse() {
        let json = r#"{"kind": "Listing", "data": {"children": [
            {"kind": "t3", "data": {"id": "x1", "title": "Post", "selftext": "body",
             "subreddit": "india", "author": "u1", "url": "https://x",
             "permalink": "/r/india/comments/x1/post/", "score": 10,
             "num_comments": 2, "created_utc": 1700000000.0}}
        ], "after": "t3_x1"}}"#;

        let listing: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.data.children.len(), 1);
        assert_eq!(listing.data.after.as_deref(), Some("t3_x1"));
        assert_eq!(listing.data.children[0].data.id, "x1");
    }

    #[test]
    fn test_listing_parse_without_after() {
        let json = r#"{"data": {"children": [], "after": null}}"#;
        let listing: Listing = serde_json::from_str(json).unwrap();
        assert!(listing.data.children.is_empty());
        assert!(listing.data.after.is_none());
    }
}
