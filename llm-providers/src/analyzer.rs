use crate::backoff::BackoffPolicy;
use crate::health::ProviderHealth;
use crate::keyword::KeywordClassifier;
use crate::prompt::BATCH_SIZE;
use crate::provider::{build_provider_chain, InferenceProvider, ProviderKeys};
use brandscope_core::{
    AnalysisDiagnostics, BrandConfig, CancelToken, ConfigError, PostJudgment, ProgressSender,
    RedditPost,
};
use tokio::time::sleep;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub batch_size: usize,
    pub backoff: BackoffPolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            batch_size: BATCH_SIZE,
            backoff: BackoffPolicy::default(),
        }
    }
}

#[derive(Debug)]
pub struct AnalysisOutcome {
    /// One judgment per input post, in input order.
    pub judgments: Vec<PostJudgment>,
    pub diagnostics: AnalysisDiagnostics,
}

/// Routes post batches through the provider chain. Providers are tried
/// strictly in priority order within a batch; a rate-limited provider is
/// skipped for every later batch of the run. When the whole chain fails
/// for a batch, the keyword classifier judges its posts individually;
/// classification never skips a post.
pub struct BatchAnalyzer {
    providers: Vec<Box<dyn InferenceProvider>>,
    fallback: KeywordClassifier,
    config: AnalysisConfig,
}

impl BatchAnalyzer {
    pub fn new(providers: Vec<Box<dyn InferenceProvider>>, config: AnalysisConfig) -> Self {
        Self {
            providers,
            fallback: KeywordClassifier::new(),
            config,
        }
    }

    /// The standard chain from environment credentials. Fails fast when no
    /// provider key is configured.
    pub fn from_env(config: AnalysisConfig) -> Result<Self, ConfigError> {
        let chain = build_provider_chain(&ProviderKeys::from_env())?;
        Ok(Self::new(chain, config))
    }

    /// Keyword-only analyzer. An explicit choice for offline use; never a
    /// silent degradation.
    pub fn fallback_only(config: AnalysisConfig) -> Self {
        Self::new(Vec::new(), config)
    }

    pub async fn analyze(
        &self,
        posts: &[RedditPost],
        brand: &BrandConfig,
        progress: &ProgressSender,
        cancel: &CancelToken,
    ) -> AnalysisOutcome {
        let health = ProviderHealth::new();
        let mut diagnostics = AnalysisDiagnostics::default();
        let mut judgments: Vec<PostJudgment> = Vec::with_capacity(posts.len());

        let total_batches = posts.len().div_ceil(self.config.batch_size);
        diagnostics.total_batches = total_batches as u32;
        info!(
            posts = posts.len(),
            batches = diagnostics.total_batches,
            providers = self.providers.len(),
            "Starting batch analysis"
        );

        for (index, batch) in posts.chunks(self.config.batch_size).enumerate() {
            // A cancelled run stops issuing provider calls but still owes
            // every remaining post a judgment.
            if !cancel.is_cancelled() {
                progress.send(format!(
                    "Classifying batch {}/{total_batches}...",
                    index + 1
                ));
            }

            let classified = if cancel.is_cancelled() {
                None
            } else {
                self.classify_with_chain(batch, brand, &health, &mut diagnostics)
                    .await
            };

            match classified {
                Some(batch_judgments) => judgments.extend(batch_judgments),
                None => {
                    debug!("Batch {} falling back to keyword classifier", index + 1);
                    diagnostics.fallback_judgments += batch.len();
                    judgments.extend(batch.iter().map(|p| self.fallback.judge(p, brand)));
                }
            }
        }

        diagnostics.rate_limited_providers = health.rate_limited_providers();
        info!(
            judged = judgments.len(),
            fallback = diagnostics.fallback_judgments,
            "Analysis complete"
        );
        progress.send(format!(
            "Classified {} posts. [{}]",
            judgments.len(),
            diagnostics.summary()
        ));

        AnalysisOutcome {
            judgments,
            diagnostics,
        }
    }

    /// Try providers in priority order for one batch. Returns None when
    /// the chain is exhausted.
    async fn classify_with_chain(
        &self,
        batch: &[RedditPost],
        brand: &BrandConfig,
        health: &ProviderHealth,
        diagnostics: &mut AnalysisDiagnostics,
    ) -> Option<Vec<PostJudgment>> {
        let mut failed_attempts: u32 = 0;

        for provider in &self.providers {
            let name = provider.name();
            if health.is_rate_limited(name) {
                debug!("Skipping {name}: rate-limited earlier this run");
                continue;
            }

            // Backoff before the next provider, not before retrying the
            // one that just failed.
            if failed_attempts > 0 {
                sleep(self.config.backoff.delay_for(failed_attempts - 1)).await;
            }

            match provider.classify_batch(batch, brand).await {
                Ok(batch_judgments) => {
                    diagnostics.record_provider_batch(name);
                    return Some(batch_judgments);
                }
                Err(e) if e.is_rate_limit() => {
                    warn!("{name} rate-limited; skipping it for the rest of the run");
                    health.mark_rate_limited(name);
                    failed_attempts += 1;
                }
                Err(e) => {
                    warn!("{name} failed for this batch: {e}");
                    failed_attempts += 1;
                }
            }
        }
        None
    }
}
