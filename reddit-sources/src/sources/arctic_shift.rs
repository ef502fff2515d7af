use crate::client::{build_client, error_from_response, error_from_transport, DEFAULT_USER_AGENT};
use crate::sources::{synthesize_permalink, PostSource, SearchWindow};
use async_trait::async_trait;
use brandscope_core::{RedditPost, SourceError, SourceKind};
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

const BASE_URL: &str = "https://arctic-shift.photon-reddit.com/api/posts/search";
const PAGE_LIMIT: usize = 100;
const MAX_PAGES: usize = 5;

/// Archive-search adapter over the Arctic Shift Reddit archive. The most
/// complete source, and the only one reliable from datacenter IPs, so it
/// runs first. Full-text search requires a subreddit filter.
pub struct ArcticShiftSource {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    #[serde(default)]
    data: Vec<ArchivePost>,
}

#[derive(Debug, Deserialize)]
struct ArchivePost {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    subreddit: String,
    author: Option<String>,
    #[serde(default)]
    url: String,
    #[serde(default)]
    score: i32,
    #[serde(default)]
    num_comments: u32,
    #[serde(default)]
    created_utc: i64,
}

impl ArcticShiftSource {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: build_client(DEFAULT_USER_AGENT),
            base_url: base_url.into(),
        }
    }

    async fn fetch_page(
        &self,
        term: &str,
        subreddit: &str,
        after_date: &str,
        before_date: Option<&str>,
    ) -> Result<Vec<ArchivePost>, SourceError> {
        let limit = PAGE_LIMIT.to_string();
        let mut params = vec![
            ("query", term),
            ("subreddit", subreddit),
            ("after", after_date),
            ("limit", limit.as_str()),
            ("sort", "desc"),
        ];
        if let Some(before) = before_date {
            params.push(("before", before));
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| error_from_transport(e, "Arctic Shift"))?;

        if !response.status().is_success() {
            return Err(error_from_response(&response, "Arctic Shift"));
        }

        let body: ArchiveResponse = response
            .json()
            .await
            .map_err(|e| error_from_transport(e, "Arctic Shift"))?;
        Ok(body.data)
    }
}

impl Default for ArcticShiftSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostSource for ArcticShiftSource {
    fn kind(&self) -> SourceKind {
        SourceKind::ArchiveSearch
    }

    async fn search(
        &self,
        term: &str,
        subreddit: &str,
        window: &SearchWindow,
    ) -> Result<Vec<RedditPost>, SourceError> {
        let after_date = window.after_date();
        let mut posts = Vec::new();
        let mut before_date: Option<String> = None;

        for page in 0..MAX_PAGES {
            let results = match self
                .fetch_page(term, subreddit, &after_date, before_date.as_deref())
                .await
            {
                Ok(results) => results,
                Err(e) if page == 0 => return Err(e),
                Err(e) => {
                    // Later pages are best-effort; keep what we have.
                    warn!("Arctic Shift r/{subreddit} page {page} failed: {e}");
                    break;
                }
            };

            if results.is_empty() {
                break;
            }
            let page_len = results.len();

            // Paginate by the oldest post's date.
            if let Some(last) = results.last() {
                before_date = Utc
                    .timestamp_opt(last.created_utc, 0)
                    .single()
                    .map(|dt| dt.format("%Y-%m-%d").to_string());
            }

            for d in results {
                posts.push(RedditPost {
                    permalink: synthesize_permalink(&d.subreddit, &d.id),
                    id: d.id,
                    title: d.title,
                    selftext: d.selftext,
                    subreddit: d.subreddit,
                    author: d.author.unwrap_or_else(|| "[deleted]".to_string()),
                    url: d.url,
                    score: d.score,
                    num_comments: d.num_comments,
                    created_utc: d.created_utc,
                    source: SourceKind::ArchiveSearch,
                });
            }

            if page_len < PAGE_LIMIT {
                break;
            }
        }

        debug!("Arctic Shift r/{subreddit} '{term}': {} posts", posts.len());
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_payload_parses_with_missing_fields() {
        let json = r#"{"data": [
            {"id": "p1", "title": "First", "subreddit": "gadgets",
             "selftext": "", "url": "https://x", "score": 3,
             "num_comments": 1, "created_utc": 1700000000},
            {"id": "p2", "title": "No author or score", "subreddit": "gadgets",
             "created_utc": 1700000100}
        ]}"#;

        let parsed: ArchiveResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.data.len(), 2);
        assert_eq!(parsed.data[0].id, "p1");
        assert!(parsed.data[1].author.is_none());
        assert_eq!(parsed.data[1].score, 0);
    }

    #[test]
    fn test_empty_payload_parses() {
        let parsed: ArchiveResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.data.is_empty());
    }
}
