use brandscope_core::{SourceDiagnostics, SourceError, SourceKind};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::warn;

/// Consecutive failures before a source is disabled for the rest of the run.
pub const DISABLE_THRESHOLD: u32 = 5;

/// Per-source run-scoped health. Fresh for every run; a disabled source
/// stays disabled until the run ends.
#[derive(Debug, Clone, Default)]
pub struct SourceHealth {
    pub consecutive_failures: u32,
    pub disabled: bool,
    pub disabled_reason: Option<String>,
    pub tasks_attempted: u32,
    pub tasks_failed: u32,
    pub posts_contributed: usize,
}

/// Tracks health for every source in a run. Mutated under a lock so
/// concurrent task completions cannot under-count failures or
/// double-disable a source.
#[derive(Debug)]
pub struct HealthBoard {
    entries: Mutex<HashMap<SourceKind, SourceHealth>>,
    threshold: u32,
}

impl HealthBoard {
    pub fn new(sources: &[SourceKind], threshold: u32) -> Self {
        let entries = sources
            .iter()
            .map(|kind| (*kind, SourceHealth::default()))
            .collect();
        Self {
            entries: Mutex::new(entries),
            threshold,
        }
    }

    pub fn is_disabled(&self, kind: SourceKind) -> bool {
        let entries = self.entries.lock().unwrap();
        entries.get(&kind).map(|h| h.disabled).unwrap_or(false)
    }

    pub fn all_disabled(&self) -> bool {
        let entries = self.entries.lock().unwrap();
        !entries.is_empty() && entries.values().all(|h| h.disabled)
    }

    /// A successful task resets the consecutive-failure counter.
    pub fn record_success(&self, kind: SourceKind, posts_added: usize) {
        let mut entries = self.entries.lock().unwrap();
        let health = entries.entry(kind).or_default();
        health.tasks_attempted += 1;
        health.consecutive_failures = 0;
        health.posts_contributed += posts_added;
    }

    /// Record a failed task. Returns true when this failure disabled the
    /// source. Blocked failures disable immediately: an IP-level denial
    /// will not clear within the run.
    pub fn record_failure(&self, kind: SourceKind, error: &SourceError) -> bool {
        let mut entries = self.entries.lock().unwrap();
        let health = entries.entry(kind).or_default();
        health.tasks_attempted += 1;
        health.tasks_failed += 1;
        health.consecutive_failures += 1;

        if health.disabled {
            return false;
        }

        let should_disable = error.is_permanent() || health.consecutive_failures >= self.threshold;
        if should_disable {
            health.disabled = true;
            health.disabled_reason = Some(if error.is_permanent() {
                format!("{}: {error}", kind.label())
            } else {
                format!(
                    "{}: {} consecutive failures (last: {error})",
                    kind.label(),
                    health.consecutive_failures
                )
            });
            warn!("Source {} disabled for the rest of the run: {error}", kind);
            return true;
        }
        false
    }

    pub fn diagnostics(&self, order: &[SourceKind]) -> Vec<SourceDiagnostics> {
        let entries = self.entries.lock().unwrap();
        order
            .iter()
            .map(|kind| {
                let health = entries.get(kind).cloned().unwrap_or_default();
                let mut diag = SourceDiagnostics::new(*kind);
                diag.tasks_attempted = health.tasks_attempted;
                diag.tasks_failed = health.tasks_failed;
                diag.posts_contributed = health.posts_contributed;
                diag.disabled = health.disabled;
                diag.disabled_reason = health.disabled_reason;
                diag
            })
            .collect()
    }
}
