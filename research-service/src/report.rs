use brandscope_core::{AnalysisDiagnostics, AnalyzedPost, FetchDiagnostics, Sentiment};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentimentCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

/// Everything one research run produced: the judged post set plus the
/// diagnostics that explain any degradation. The caller owns rendering,
/// export, and delivery.
#[derive(Debug, Serialize)]
pub struct ResearchReport {
    pub run_id: Uuid,
    pub brand: String,
    pub posts: Vec<AnalyzedPost>,
    pub fetch: FetchDiagnostics,
    pub analysis: AnalysisDiagnostics,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub cancelled: bool,
}

impl ResearchReport {
    pub fn relevant_posts(&self) -> impl Iterator<Item = &AnalyzedPost> {
        self.posts.iter().filter(|p| p.judgment.relevant)
    }

    pub fn relevant_count(&self) -> usize {
        self.relevant_posts().count()
    }

    /// Sentiment distribution over relevant posts.
    pub fn sentiment_counts(&self) -> SentimentCounts {
        let mut counts = SentimentCounts::default();
        for analyzed in self.relevant_posts() {
            match analyzed.judgment.sentiment {
                Sentiment::Positive => counts.positive += 1,
                Sentiment::Negative => counts.negative += 1,
                Sentiment::Neutral => counts.neutral += 1,
            }
        }
        counts
    }

    /// Subreddits with the most relevant mentions, descending, name as
    /// tie-break.
    pub fn top_subreddits(&self, limit: usize) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for analyzed in self.relevant_posts() {
            *counts.entry(analyzed.post.subreddit.as_str()).or_default() += 1;
        }
        let mut ranked: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(name, count)| (name.to_string(), count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked
    }

    /// One-paragraph run summary in the shape the progress channel uses.
    pub fn summary(&self) -> String {
        let counts = self.sentiment_counts();
        let mut summary = format!(
            "{}: {} posts fetched, {} relevant. Sentiment +{}/-{}/~{}.",
            self.brand,
            self.posts.len(),
            self.relevant_count(),
            counts.positive,
            counts.negative,
            counts.neutral,
        );
        if self.fetch.disabled_count() > 0 {
            summary.push_str(&format!(
                " {} of {} sources disabled.",
                self.fetch.disabled_count(),
                self.fetch.sources.len()
            ));
        }
        if self.analysis.fallback_judgments > 0 {
            summary.push_str(&format!(
                " Keyword fallback used for {} posts.",
                self.analysis.fallback_judgments
            ));
        }
        if self.cancelled {
            summary.push_str(" Run was cancelled; results are partial.");
        }
        summary
    }
}
