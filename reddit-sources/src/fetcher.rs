use crate::client::DEFAULT_USER_AGENT;
use crate::health::{HealthBoard, DISABLE_THRESHOLD};
use crate::sources::{
    ArcticShiftSource, PostSource, PullpushSource, RedditSearchSource, SearchFeedSource,
    SearchWindow,
};
use brandscope_core::{
    BrandConfig, CancelToken, FetchDiagnostics, ProgressSender, RedditPost, SourceError,
};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Default subreddits to search when a brand has few or no subreddit hints.
/// General consumer, tech, and lifestyle communities.
pub const DEFAULT_SUBREDDITS: [&str; 18] = [
    "india",
    "AskIndia",
    "indiasocial",
    "IndianGaming",
    "IndianConsumer",
    "IndiaTech",
    "gadgets",
    "technology",
    "BuyItForLife",
    "IndianSkincareAddicts",
    "IndianFashionAddicts",
    "IndiaInvestments",
    "CreditCardsIndia",
    "personalfinanceindia",
    "Fitness",
    "SkincareAddiction",
    "MakeupAddiction",
    "HeadphoneAdvice",
];

#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Historical span each search covers.
    pub lookback_days: i64,
    /// Minimum delay between consecutive calls to the same source.
    pub courtesy_delay: Duration,
    /// Budget for one search call, pagination included. Expiry counts as
    /// an Unavailable failure.
    pub call_timeout: Duration,
    /// Consecutive failures before a source is disabled.
    pub disable_threshold: u32,
    /// Appended to every brand's subreddit hints.
    pub default_subreddits: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            lookback_days: 90,
            courtesy_delay: Duration::from_secs(2),
            call_timeout: Duration::from_secs(120),
            disable_threshold: DISABLE_THRESHOLD,
            default_subreddits: DEFAULT_SUBREDDITS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug)]
pub struct FetchOutcome {
    /// Deduplicated posts, newest first.
    pub posts: Vec<RedditPost>,
    pub diagnostics: FetchDiagnostics,
}

/// Drives the source chain across (term x subreddit) tasks, deduplicates
/// posts as they arrive, and tracks per-source health. Never fails: partial
/// results plus diagnostics are the contract.
pub struct MultiSourceFetcher {
    sources: Vec<Box<dyn PostSource>>,
    config: FetchConfig,
}

impl MultiSourceFetcher {
    /// Sources must be supplied in priority order; the first source to
    /// produce a post wins dedup ties.
    pub fn new(sources: Vec<Box<dyn PostSource>>, config: FetchConfig) -> Self {
        Self { sources, config }
    }

    /// The standard four-source chain: archive, official search, search
    /// feed, secondary archive.
    pub fn with_default_sources(config: FetchConfig) -> Self {
        let sources: Vec<Box<dyn PostSource>> = vec![
            Box::new(ArcticShiftSource::new()),
            Box::new(RedditSearchSource::new(DEFAULT_USER_AGENT)),
            Box::new(SearchFeedSource::new(DEFAULT_USER_AGENT)),
            Box::new(PullpushSource::new()),
        ];
        Self::new(sources, config)
    }

    /// Brand hints first, then the default list, case-insensitively
    /// deduplicated.
    fn subreddit_list(&self, brand: &BrandConfig) -> Vec<String> {
        let mut subs: Vec<String> = Vec::new();
        for candidate in brand
            .subreddit_hints
            .iter()
            .map(|s| s.as_str())
            .chain(self.config.default_subreddits.iter().map(|s| s.as_str()))
        {
            if !subs.iter().any(|s| s.eq_ignore_ascii_case(candidate)) {
                subs.push(candidate.to_string());
            }
        }
        subs
    }

    pub async fn fetch(
        &self,
        brand: &BrandConfig,
        progress: &ProgressSender,
        cancel: &CancelToken,
    ) -> FetchOutcome {
        let window = SearchWindow::lookback_days(self.config.lookback_days);
        let subreddits = self.subreddit_list(brand);
        let kinds: Vec<_> = self.sources.iter().map(|s| s.kind()).collect();
        let health = HealthBoard::new(&kinds, self.config.disable_threshold);
        let mut seen: HashMap<String, RedditPost> = HashMap::new();

        info!(
            brand = %brand.name,
            subreddits = subreddits.len(),
            terms = brand.keywords.len(),
            "Starting multi-source fetch"
        );

        'sources: for source in &self.sources {
            let kind = source.kind();
            progress.send(format!(
                "Searching {} ({} subreddits x {} terms)...",
                kind,
                subreddits.len(),
                brand.keywords.len()
            ));

            let before_source = seen.len();
            let mut first_call = true;

            'tasks: for subreddit in &subreddits {
                if health.is_disabled(kind) {
                    break 'tasks;
                }
                progress.send(format!("Searching r/{subreddit} via {kind}..."));

                for term in &brand.keywords {
                    if cancel.is_cancelled() {
                        progress.send("Fetch cancelled; returning what was collected.");
                        break 'sources;
                    }
                    if health.is_disabled(kind) {
                        break 'tasks;
                    }

                    if !first_call && !self.config.courtesy_delay.is_zero() {
                        sleep(self.config.courtesy_delay).await;
                    }
                    first_call = false;

                    let result = match timeout(
                        self.config.call_timeout,
                        source.search(term, subreddit, &window),
                    )
                    .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(SourceError::Unavailable {
                            reason: format!("{kind} call exceeded time budget"),
                        }),
                    };

                    match result {
                        Ok(posts) => {
                            let mut added = 0;
                            for post in posts {
                                if !window.contains(post.created_utc) {
                                    continue;
                                }
                                // First seen wins: an earlier, higher-priority
                                // source's copy is never replaced.
                                seen.entry(post.id.clone()).or_insert_with(|| {
                                    added += 1;
                                    post
                                });
                            }
                            debug!("{kind} r/{subreddit} '{term}': {added} new posts");
                            health.record_success(kind, added);
                        }
                        Err(e) => {
                            warn!("{kind} r/{subreddit} '{term}' failed: {e}");
                            let newly_disabled = health.record_failure(kind, &e);
                            if newly_disabled {
                                progress.send(format!(
                                    "{kind} disabled for the rest of the run ({e})"
                                ));
                                if health.all_disabled() {
                                    progress.send(
                                        "Every source is disabled; stopping fetch early."
                                            .to_string(),
                                    );
                                    break 'sources;
                                }
                                break 'tasks;
                            }
                        }
                    }
                }
            }

            let contributed = seen.len() - before_source;
            progress.send(format!(
                "{kind}: +{contributed} new posts ({} total)",
                seen.len()
            ));
        }

        let mut posts: Vec<RedditPost> = seen.into_values().collect();
        posts.sort_by(|a, b| b.created_utc.cmp(&a.created_utc));

        let diagnostics = FetchDiagnostics {
            sources: health.diagnostics(&kinds),
            unique_posts: posts.len(),
        };
        info!(
            unique_posts = posts.len(),
            disabled = diagnostics.disabled_count(),
            "Fetch complete"
        );
        progress.send(format!(
            "Fetched {} unique posts. [{}]",
            posts.len(),
            diagnostics.summary()
        ));

        FetchOutcome { posts, diagnostics }
    }
}
