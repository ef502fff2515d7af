use crate::client::{build_client, error_from_response, error_from_transport, DEFAULT_USER_AGENT};
use crate::sources::{synthesize_permalink, PostSource, SearchWindow};
use async_trait::async_trait;
use brandscope_core::{RedditPost, SourceError, SourceKind};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

const BASE_URL: &str = "https://api.pullpush.io/reddit/search/submission";
const PAGE_LIMIT: usize = 100;
const MAX_PAGES: usize = 5;

/// Secondary-archive adapter over the Pullpush mirror of Pushshift.
/// Least reliable source; runs last.
pub struct PullpushSource {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PullpushResponse {
    #[serde(default)]
    data: Vec<PullpushPost>,
}

#[derive(Debug, Deserialize)]
struct PullpushPost {
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
    permalink: String,
    #[serde(default)]
    score: i32,
    #[serde(default)]
    num_comments: u32,
    #[serde(default)]
    created_utc: i64,
}

impl PullpushSource {
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
        after_ts: i64,
        before_ts: i64,
    ) -> Result<Vec<PullpushPost>, SourceError> {
        let after = after_ts.to_string();
        let before = before_ts.to_string();
        let size = PAGE_LIMIT.to_string();
        let params = [
            ("q", term),
            ("subreddit", subreddit),
            ("after", after.as_str()),
            ("before", before.as_str()),
            ("size", size.as_str()),
            ("sort", "desc"),
            ("sort_type", "created_utc"),
        ];

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| error_from_transport(e, "Pullpush"))?;

        if !response.status().is_success() {
            return Err(error_from_response(&response, "Pullpush"));
        }

        let body: PullpushResponse = response
            .json()
            .await
            .map_err(|e| error_from_transport(e, "Pullpush"))?;
        Ok(body.data)
    }
}

impl Default for PullpushSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostSource for PullpushSource {
    fn kind(&self) -> SourceKind {
        SourceKind::SecondaryArchive
    }

    async fn search(
        &self,
        term: &str,
        subreddit: &str,
        window: &SearchWindow,
    ) -> Result<Vec<RedditPost>, SourceError> {
        let after_ts = window.after_timestamp();
        let mut before_ts = chrono::Utc::now().timestamp();
        let mut posts = Vec::new();

        for page in 0..MAX_PAGES {
            let results = match self.fetch_page(term, subreddit, after_ts, before_ts).await {
                Ok(results) => results,
                Err(e) if page == 0 => return Err(e),
                Err(e) => {
                    warn!("Pullpush r/{subreddit} page {page} failed: {e}");
                    break;
                }
            };

            if results.is_empty() {
                break;
            }
            let page_len = results.len();

            // Results come newest-first; step the cursor past the oldest.
            if let Some(last) = results.last() {
                before_ts = last.created_utc - 1;
            }

            for d in results {
                let permalink = if d.permalink.is_empty() {
                    synthesize_permalink(&d.subreddit, &d.id)
                } else {
                    format!("https://reddit.com{}", d.permalink)
                };
                posts.push(RedditPost {
                    permalink,
                    id: d.id,
                    title: d.title,
                    selftext: d.selftext,
                    subreddit: d.subreddit,
                    author: d.author.unwrap_or_else(|| "[deleted]".to_string()),
                    url: d.url,
                    score: d.score,
                    num_comments: d.num_comments,
                    created_utc: d.created_utc,
                    source: SourceKind::SecondaryArchive,
                });
            }

            if page_len < PAGE_LIMIT {
                break;
            }
        }

        debug!("Pullpush r/{subreddit} '{term}': {} posts", posts.len());
        Ok(posts)
    }
}
