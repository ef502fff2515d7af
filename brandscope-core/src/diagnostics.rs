use crate::types::SourceKind;
use serde::{Deserialize, Serialize};

/// Per-source outcome of one fetch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDiagnostics {
    pub source: SourceKind,
    pub tasks_attempted: u32,
    pub tasks_failed: u32,
    pub posts_contributed: usize,
    pub disabled: bool,
    pub disabled_reason: Option<String>,
}

impl SourceDiagnostics {
    pub fn new(source: SourceKind) -> Self {
        Self {
            source,
            tasks_attempted: 0,
            tasks_failed: 0,
            posts_contributed: 0,
            disabled: false,
            disabled_reason: None,
        }
    }

    /// A source that saw failures but never crossed the disable threshold.
    pub fn is_degraded(&self) -> bool {
        !self.disabled && self.tasks_failed > 0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchDiagnostics {
    pub sources: Vec<SourceDiagnostics>,
    pub unique_posts: usize,
}

impl FetchDiagnostics {
    pub fn disabled_count(&self) -> usize {
        self.sources.iter().filter(|s| s.disabled).count()
    }

    /// One-line degradation summary for the progress channel, e.g.
    /// "2 of 4 sources disabled".
    pub fn summary(&self) -> String {
        let parts: Vec<String> = self
            .sources
            .iter()
            .map(|s| {
                let mut part = format!("{}: {} posts", s.source, s.posts_contributed);
                if s.disabled {
                    part.push_str(" (disabled)");
                } else if s.tasks_failed > 0 {
                    part.push_str(&format!(" ({} errors)", s.tasks_failed));
                }
                part
            })
            .collect();
        let mut summary = parts.join(" | ");
        let disabled = self.disabled_count();
        if disabled > 0 {
            summary.push_str(&format!(
                "; {} of {} sources disabled",
                disabled,
                self.sources.len()
            ));
        }
        summary
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisDiagnostics {
    pub total_batches: u32,
    /// Batches successfully classified, per provider name.
    pub provider_batches: Vec<(String, u32)>,
    /// Providers flagged rate-limited during the run; the flag is never
    /// cleared before the run ends.
    pub rate_limited_providers: Vec<String>,
    /// Posts judged by the keyword fallback.
    pub fallback_judgments: usize,
}

impl AnalysisDiagnostics {
    pub fn record_provider_batch(&mut self, provider: &str) {
        if let Some(entry) = self.provider_batches.iter_mut().find(|(p, _)| p == provider) {
            entry.1 += 1;
        } else {
            self.provider_batches.push((provider.to_string(), 1));
        }
    }

    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        for (provider, batches) in &self.provider_batches {
            parts.push(format!("{provider}: {batches} batches"));
        }
        if self.fallback_judgments > 0 {
            parts.push(format!(
                "keyword fallback: {} posts",
                self.fallback_judgments
            ));
        }
        if !self.rate_limited_providers.is_empty() {
            parts.push(format!(
                "rate-limited: {}",
                self.rate_limited_providers.join(", ")
            ));
        }
        if parts.is_empty() {
            "no posts analyzed".to_string()
        } else {
            parts.join(" | ")
        }
    }
}
