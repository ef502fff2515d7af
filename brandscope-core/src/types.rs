use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The retrieval mechanisms a post can come from, in fixed priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Arctic Shift archive search. Most complete, primary source.
    ArchiveSearch,
    /// Reddit's own search JSON endpoint. Often blocked from server IPs.
    OfficialSearch,
    /// Reddit search RSS feed. Capped at ~25 results per query.
    SearchFeed,
    /// Pullpush archive mirror. Last resort.
    SecondaryArchive,
}

impl SourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::ArchiveSearch => "Arctic Shift",
            SourceKind::OfficialSearch => "Reddit search",
            SourceKind::SearchFeed => "Reddit feed",
            SourceKind::SecondaryArchive => "Pullpush",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPost {
    pub id: String,
    pub title: String,
    pub selftext: String,
    pub subreddit: String,
    pub author: String,
    pub url: String,
    pub permalink: String,
    pub score: i32,
    pub num_comments: u32,
    pub created_utc: i64,
    pub source: SourceKind,
}

impl RedditPost {
    pub fn created_date(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.created_utc, 0)
            .single()
            .unwrap_or_default()
    }

    /// Title and body joined for text matching.
    pub fn full_text(&self) -> String {
        if self.selftext.is_empty() {
            self.title.clone()
        } else {
            format!("{} {}", self.title, self.selftext)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// Parse a provider-supplied sentiment string, tolerating case and
    /// whitespace. Anything unrecognized reads as neutral.
    pub fn parse_loose(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        };
        f.write_str(s)
    }
}

/// Which path produced a judgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JudgmentOrigin {
    Provider { name: String },
    KeywordFallback,
}

/// Classification result for one post. Every fetched post receives exactly
/// one of these, from a provider or from the keyword fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostJudgment {
    pub post_id: String,
    pub relevant: bool,
    pub sentiment: Sentiment,
    pub theme: String,
    pub summary: String,
    pub competitor_mentions: Vec<String>,
    pub judged_by: JudgmentOrigin,
}

/// A fetched post paired with its judgment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzedPost {
    pub post: RedditPost,
    pub judgment: PostJudgment,
}
