use crate::report::ResearchReport;
use brandscope_core::{
    progress_channel, AnalyzedPost, BrandConfig, CancelToken, ConfigError, CoreError,
    ProgressSender,
};
use chrono::Utc;
use llm_providers::{AnalysisConfig, BatchAnalyzer};
use reddit_sources::{FetchConfig, MultiSourceFetcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

/// Runs one research request end to end: fetch, classify, aggregate.
/// All health state lives inside the run; concurrent runs for different
/// brands share nothing.
pub struct ResearchService {
    fetcher: MultiSourceFetcher,
    analyzer: BatchAnalyzer,
}

/// Live handle to a spawned run. The caller consumes progress at its own
/// pace (the pipeline never waits for it), can request cooperative
/// cancellation, and awaits the final report.
pub struct ResearchHandle {
    pub run_id: Uuid,
    progress: Option<mpsc::UnboundedReceiver<String>>,
    cancel: CancelToken,
    task: JoinHandle<ResearchReport>,
}

impl ResearchHandle {
    /// Take the progress stream. Yields ordered human-readable status
    /// lines; dropping it does not affect the run.
    pub fn take_progress(&mut self) -> Option<mpsc::UnboundedReceiver<String>> {
        self.progress.take()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Stop issuing new tasks promptly; in-flight calls complete and the
    /// report carries whatever was accumulated.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn wait(self) -> Result<ResearchReport, CoreError> {
        self.task.await.map_err(|e| CoreError::Internal {
            message: format!("research task panicked: {e}"),
        })
    }
}

impl ResearchService {
    pub fn new(fetcher: MultiSourceFetcher, analyzer: BatchAnalyzer) -> Self {
        Self { fetcher, analyzer }
    }

    /// Standard wiring: the four-source fetcher and the provider chain
    /// from environment credentials. Fails fast when no provider key is
    /// configured.
    pub fn from_env() -> Result<Self, ConfigError> {
        let fetcher = MultiSourceFetcher::with_default_sources(FetchConfig::default());
        let analyzer = BatchAnalyzer::from_env(AnalysisConfig::default())?;
        Ok(Self::new(fetcher, analyzer))
    }

    /// Run the pipeline on the current task. Infallible after the
    /// pre-flight config check: partial results plus diagnostics are the
    /// contract.
    pub async fn run(
        &self,
        brand: &BrandConfig,
        progress: &ProgressSender,
        cancel: &CancelToken,
    ) -> Result<ResearchReport, ConfigError> {
        brand.validate()?;
        Ok(self.execute(Uuid::new_v4(), brand, progress, cancel).await)
    }

    /// The pipeline body. Only reachable behind a validated config.
    async fn execute(
        &self,
        run_id: Uuid,
        brand: &BrandConfig,
        progress: &ProgressSender,
        cancel: &CancelToken,
    ) -> ResearchReport {
        let started_at = Utc::now();
        info!(%run_id, brand = %brand.name, "Research run starting");
        progress.send(format!("Starting deep dive on {}...", brand.name));

        let fetch = self.fetcher.fetch(brand, progress, cancel).await;
        let analysis = self
            .analyzer
            .analyze(&fetch.posts, brand, progress, cancel)
            .await;

        // The analyzer returns judgments in input order; pair them back up.
        debug_assert_eq!(fetch.posts.len(), analysis.judgments.len());
        let posts: Vec<AnalyzedPost> = fetch
            .posts
            .into_iter()
            .zip(analysis.judgments)
            .map(|(post, judgment)| AnalyzedPost { post, judgment })
            .collect();

        let cancelled = cancel.is_cancelled();
        if cancelled {
            warn!(%run_id, "Research run cancelled; returning partial results");
        }

        let report = ResearchReport {
            run_id,
            brand: brand.name.clone(),
            posts,
            fetch: fetch.diagnostics,
            analysis: analysis.diagnostics,
            started_at,
            finished_at: Utc::now(),
            cancelled,
        };
        info!(%run_id, "Research run finished: {}", report.summary());
        progress.send(report.summary());
        report
    }

    /// Spawn the run off the caller's task so an interface layer stays
    /// responsive. Config errors surface here, before anything is spawned.
    pub fn spawn(self, brand: BrandConfig) -> Result<ResearchHandle, ConfigError> {
        brand.validate()?;

        let (progress, progress_rx) = progress_channel();
        let cancel = CancelToken::new();
        let run_id = Uuid::new_v4();
        let task_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            self.execute(run_id, &brand, &progress, &task_cancel).await
        });

        Ok(ResearchHandle {
            run_id,
            progress: Some(progress_rx),
            cancel,
            task,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use brandscope_core::{
        JudgmentOrigin, PostJudgment, ProviderError, RedditPost, Sentiment, SourceError,
        SourceKind,
    };
    use llm_providers::{BackoffPolicy, InferenceProvider};
    use reddit_sources::{PostSource, SearchWindow};
    use std::time::Duration;

    struct FixedSource {
        kind: SourceKind,
        posts: Vec<RedditPost>,
    }

    #[async_trait]
    impl PostSource for FixedSource {
        fn kind(&self) -> SourceKind {
            self.kind
        }

        async fn search(
            &self,
            _term: &str,
            _subreddit: &str,
            _window: &SearchWindow,
        ) -> Result<Vec<RedditPost>, SourceError> {
            Ok(self.posts.clone())
        }
    }

    struct EchoProvider;

    #[async_trait]
    impl InferenceProvider for EchoProvider {
        fn name(&self) -> &str {
            "Echo"
        }

        async fn classify_batch(
            &self,
            posts: &[RedditPost],
            _brand: &BrandConfig,
        ) -> Result<Vec<PostJudgment>, ProviderError> {
            Ok(posts
                .iter()
                .map(|p| PostJudgment {
                    post_id: p.id.clone(),
                    relevant: true,
                    sentiment: Sentiment::Positive,
                    theme: "test".to_string(),
                    summary: p.title.clone(),
                    competitor_mentions: vec![],
                    judged_by: JudgmentOrigin::Provider {
                        name: "Echo".to_string(),
                    },
                })
                .collect())
        }
    }

    fn post(id: &str) -> RedditPost {
        RedditPost {
            id: id.to_string(),
            title: format!("post {id}"),
            selftext: String::new(),
            subreddit: "india".to_string(),
            author: "tester".to_string(),
            url: String::new(),
            permalink: String::new(),
            score: 1,
            num_comments: 0,
            created_utc: Utc::now().timestamp(),
            source: SourceKind::ArchiveSearch,
        }
    }

    fn brand() -> BrandConfig {
        BrandConfig {
            name: "TestBrand".to_string(),
            category: "general".to_string(),
            keywords: vec!["testbrand".to_string()],
            product_terms: vec![],
            competitors: vec![],
            subreddit_hints: vec!["india".to_string()],
            description: String::new(),
        }
    }

    fn service(posts: Vec<RedditPost>) -> ResearchService {
        let fetcher = MultiSourceFetcher::new(
            vec![Box::new(FixedSource {
                kind: SourceKind::ArchiveSearch,
                posts,
            })],
            FetchConfig {
                courtesy_delay: Duration::ZERO,
                default_subreddits: vec![],
                ..FetchConfig::default()
            },
        );
        let analyzer = BatchAnalyzer::new(
            vec![Box::new(EchoProvider)],
            AnalysisConfig {
                batch_size: 10,
                backoff: BackoffPolicy {
                    base_delay_ms: 1,
                    max_delay_ms: 2,
                    multiplier: 2.0,
                    jitter_factor: 0.0,
                },
            },
        );
        ResearchService::new(fetcher, analyzer)
    }

    #[tokio::test]
    async fn test_spawned_run_produces_total_report() {
        let mut handle = service(vec![post("a"), post("b"), post("c")])
            .spawn(brand())
            .unwrap();
        let mut progress = handle.take_progress().unwrap();

        let report = handle.wait().await.unwrap();
        assert_eq!(report.posts.len(), 3);
        assert!(report.posts.iter().all(|p| p.judgment.relevant));
        assert_eq!(report.relevant_count(), 3);
        assert!(!report.cancelled);

        // Progress arrived in stage order and ends with the summary.
        let mut events = Vec::new();
        while let Ok(event) = progress.try_recv() {
            events.push(event);
        }
        assert!(events.first().unwrap().contains("Starting deep dive"));
        assert!(events.iter().any(|e| e.contains("Classifying batch")));
        assert!(events.last().unwrap().contains("TestBrand"));
    }

    #[tokio::test]
    async fn test_spawn_rejects_invalid_config_before_running() {
        let mut bad = brand();
        bad.keywords.clear();
        let result = service(vec![]).spawn(bad);
        assert!(matches!(result, Err(ConfigError::MissingField { .. })));
    }

    #[tokio::test]
    async fn test_cancelled_run_returns_partial_report() {
        let handle = service(vec![post("a")]).spawn(brand()).unwrap();
        handle.cancel();
        let report = handle.wait().await.unwrap();
        assert!(report.cancelled);
        // Whatever was fetched before the cancel is still judged.
        assert!(report
            .posts
            .iter()
            .all(|p| p.judgment.post_id == p.post.id));
    }

    #[tokio::test]
    async fn test_empty_fetch_still_completes() {
        let report = service(vec![])
            .spawn(brand())
            .unwrap()
            .wait()
            .await
            .unwrap();
        assert!(report.posts.is_empty());
        assert_eq!(report.relevant_count(), 0);
        assert!(report.summary().contains("0 posts fetched"));
    }
}
