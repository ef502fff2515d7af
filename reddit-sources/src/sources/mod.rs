pub mod arctic_shift;
pub mod pullpush;
pub mod reddit_search;
pub mod search_feed;

pub use arctic_shift::ArcticShiftSource;
pub use pullpush::PullpushSource;
pub use reddit_search::RedditSearchSource;
pub use search_feed::SearchFeedSource;

use async_trait::async_trait;
use brandscope_core::{RedditPost, SourceError, SourceKind};
use chrono::{DateTime, Duration, Utc};

/// One retrieval mechanism. Adapters perform no retries and no delays of
/// their own; the orchestrator owns task accounting and pacing.
#[async_trait]
pub trait PostSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Search one subreddit for one term inside the lookback window.
    async fn search(
        &self,
        term: &str,
        subreddit: &str,
        window: &SearchWindow,
    ) -> Result<Vec<RedditPost>, SourceError>;
}

/// The historical span a fetch run searches within.
#[derive(Debug, Clone)]
pub struct SearchWindow {
    pub after: DateTime<Utc>,
}

impl SearchWindow {
    pub fn lookback_days(days: i64) -> Self {
        Self {
            after: Utc::now() - Duration::days(days),
        }
    }

    pub fn after_timestamp(&self) -> i64 {
        self.after.timestamp()
    }

    /// Date cursor in the form archive APIs accept, e.g. "2024-11-09".
    pub fn after_date(&self) -> String {
        self.after.format("%Y-%m-%d").to_string()
    }

    pub fn contains(&self, created_utc: i64) -> bool {
        created_utc >= self.after_timestamp()
    }
}

/// Synthesize a canonical permalink for sources whose payloads carry only
/// id + subreddit.
pub(crate) fn synthesize_permalink(subreddit: &str, id: &str) -> String {
    format!("https://reddit.com/r/{subreddit}/comments/{id}")
}
