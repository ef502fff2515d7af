use crate::client::{build_client, error_from_response, error_from_transport};
use crate::sources::{PostSource, SearchWindow};
use async_trait::async_trait;
use brandscope_core::{RedditPost, SourceError, SourceKind};
use chrono::DateTime;
use quick_xml::de::from_str;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const FEED_BASE: &str = "https://www.reddit.com";
/// The feed endpoint returns at most ~25 entries no matter the query.
/// Truncation is inherent to the mechanism, never an error.
pub const FEED_RESULT_CAP: usize = 25;

/// Feed-based adapter over Reddit's search Atom feed. Bounded results and
/// no body text, but served from a different path than search.json and
/// sometimes survives blocks that kill the JSON endpoint.
pub struct SearchFeedSource {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: Option<String>,
    title: Option<String>,
    updated: Option<String>,
    author: Option<EntryAuthor>,
    category: Option<EntryCategory>,
    link: Option<EntryLink>,
}

#[derive(Debug, Deserialize)]
struct EntryAuthor {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EntryCategory {
    #[serde(rename = "@term")]
    term: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EntryLink {
    #[serde(rename = "@href")]
    href: Option<String>,
}

impl SearchFeedSource {
    pub fn new(user_agent: &str) -> Self {
        Self {
            client: build_client(user_agent),
            base_url: FEED_BASE.to_string(),
        }
    }

    pub fn with_base_url(user_agent: &str, base_url: impl Into<String>) -> Self {
        Self {
            client: build_client(user_agent),
            base_url: base_url.into(),
        }
    }

    fn parse_feed(xml: &str, window: &SearchWindow) -> Result<Vec<RedditPost>, SourceError> {
        let feed: Feed = from_str(xml).map_err(|e| SourceError::Unavailable {
            reason: format!("feed parse error: {e}"),
        })?;

        let mut posts = Vec::new();
        for entry in feed.entries.into_iter().take(FEED_RESULT_CAP) {
            // Atom ids look like "t3_abc123"; the bare id is the dedup key.
            let id = match entry.id.as_deref() {
                Some(raw) => raw.strip_prefix("t3_").unwrap_or(raw).to_string(),
                None => continue,
            };
            let created_utc = entry
                .updated
                .as_deref()
                .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                .map(|dt| dt.timestamp())
                .unwrap_or(0);
            if !window.contains(created_utc) {
                continue;
            }

            let subreddit = entry
                .category
                .and_then(|c| c.term)
                .unwrap_or_default();
            let url = entry.link.and_then(|l| l.href).unwrap_or_default();
            let author = entry
                .author
                .and_then(|a| a.name)
                .map(|n| n.trim_start_matches("/u/").to_string())
                .unwrap_or_else(|| "[deleted]".to_string());

            posts.push(RedditPost {
                id,
                title: entry.title.unwrap_or_default(),
                // The feed carries rendered HTML, not the raw body.
                selftext: String::new(),
                subreddit,
                author,
                permalink: url.clone(),
                url,
                score: 0,
                num_comments: 0,
                created_utc,
                source: SourceKind::SearchFeed,
            });
        }
        Ok(posts)
    }
}

#[async_trait]
impl PostSource for SearchFeedSource {
    fn kind(&self) -> SourceKind {
        SourceKind::SearchFeed
    }

    async fn search(
        &self,
        term: &str,
        subreddit: &str,
        window: &SearchWindow,
    ) -> Result<Vec<RedditPost>, SourceError> {
        let url = format!("{}/r/{subreddit}/search.rss", self.base_url);
        let quoted = format!("\"{term}\"");
        let params = [
            ("q", quoted.as_str()),
            ("sort", "new"),
            ("restrict_sr", "on"),
        ];

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| error_from_transport(e, "Reddit feed"))?;

        if !response.status().is_success() {
            return Err(error_from_response(&response, "Reddit feed"));
        }

        let xml = response
            .text()
            .await
            .map_err(|e| error_from_transport(e, "Reddit feed"))?;

        let posts = Self::parse_feed(&xml, window)?;
        debug!("Reddit feed r/{subreddit} '{term}': {} posts", posts.len());
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>search results</title>
  <entry>
    <author><name>/u/reviewer</name></author>
    <category term="gadgets" label="r/gadgets"/>
    <id>t3_feed1</id>
    <link href="https://www.reddit.com/r/gadgets/comments/feed1/review/"/>
    <updated>2023-11-20T12:00:00+00:00</updated>
    <title>Honest review</title>
  </entry>
  <entry>
    <author><name>/u/old_poster</name></author>
    <category term="gadgets" label="r/gadgets"/>
    <id>t3_feed2</id>
    <link href="https://www.reddit.com/r/gadgets/comments/feed2/ancient/"/>
    <updated>2019-01-01T00:00:00+00:00</updated>
    <title>Ancient post</title>
  </entry>
</feed>"#;

    fn window_from_2023() -> SearchWindow {
        SearchWindow {
            after: DateTime::parse_from_rfc3339("2023-01-01T00:00:00+00:00")
                .unwrap()
                .with_timezone(&chrono::Utc),
        }
    }

    #[test]
    fn test_parse_feed_fixture() {
        let posts = SearchFeedSource::parse_feed(FIXTURE, &window_from_2023()).unwrap();
        assert_eq!(posts.len(), 1);
        let post = &posts[0];
        assert_eq!(post.id, "feed1");
        assert_eq!(post.title, "Honest review");
        assert_eq!(post.subreddit, "gadgets");
        assert_eq!(post.author, "reviewer");
        assert_eq!(post.source, SourceKind::SearchFeed);
        assert!(post.selftext.is_empty());
    }

    #[test]
    fn test_parse_feed_filters_outside_window() {
        let posts = SearchFeedSource::parse_feed(FIXTURE, &window_from_2023()).unwrap();
        assert!(posts.iter().all(|p| p.id != "feed2"));
    }

    #[test]
    fn test_malformed_feed_is_unavailable() {
        let err = SearchFeedSource::parse_feed("not xml at all <<", &window_from_2023());
        assert!(matches!(err, Err(SourceError::Unavailable { .. })));
    }

    #[test]
    fn test_empty_feed_is_not_an_error() {
        let xml = r#"<?xml version="1.0"?><feed xmlns="http://www.w3.org/2005/Atom"></feed>"#;
        let posts = SearchFeedSource::parse_feed(xml, &window_from_2023()).unwrap();
        assert!(posts.is_empty());
    }
}
