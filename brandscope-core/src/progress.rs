use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Non-blocking progress reporter. The pipeline emits human-readable status
/// lines; a slow or departed consumer never stalls the run.
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: Option<mpsc::UnboundedSender<String>>,
}

impl ProgressSender {
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sender that drops every event. Useful for tests and for callers
    /// that only want the final report.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn send(&self, message: impl Into<String>) {
        if let Some(tx) = &self.tx {
            // Receiver may have been dropped; that is not our problem.
            let _ = tx.send(message.into());
        }
    }
}

pub fn progress_channel() -> (ProgressSender, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ProgressSender::new(tx), rx)
}

/// Cooperative cancellation flag, checked between tasks and batches.
/// In-flight network calls are allowed to complete.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
