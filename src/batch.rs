//! Progress reporting and cancellation for batches of assets.
//!
//! Batches are processed one asset at a time. The monitor is told about
//! progress before each asset and polled for cancellation between assets;
//! work already saved stays saved when a batch is cancelled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Observer of a running batch.
pub trait BatchMonitor {
    /// Called before item `done` (0-based) of `total` starts.
    fn update(&mut self, done: usize, total: usize, label: &str) {
        let _ = (done, total, label);
    }

    /// Whether the rest of the batch should be skipped.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Monitor that ignores progress and never cancels.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoMonitor;

impl BatchMonitor for NoMonitor {}

/// Monitor that logs progress through `tracing`.
#[derive(Clone, Debug, Default)]
pub struct LogMonitor {
    cancel: CancelFlag,
}

impl LogMonitor {
    /// Log monitor observing an external cancel flag.
    pub fn with_cancel(cancel: CancelFlag) -> Self {
        Self { cancel }
    }
}

impl BatchMonitor for LogMonitor {
    fn update(&mut self, done: usize, total: usize, label: &str) {
        tracing::info!("[{}/{}] {}", done + 1, total, label);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Shared cancellation request, settable from another thread or a signal.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// New, not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the remaining batch.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl BatchMonitor for CancelFlag {
    fn is_cancelled(&self) -> bool {
        CancelFlag::is_cancelled(self)
    }
}

/// Outcome of a batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Items completed.
    pub processed: usize,
    /// Items in the batch.
    pub total: usize,
    /// Batch stopped early on request.
    pub cancelled: bool,
}

impl BatchReport {
    /// User-facing summary for an extraction batch.
    pub fn metadata_summary(&self) -> String {
        if self.processed == 1 {
            "1 asset added to metadata".to_string()
        } else {
            format!("{} assets added to metadata", self.processed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flag_shared() {
        let flag = CancelFlag::new();
        let monitor = LogMonitor::with_cancel(flag.clone());
        assert!(!monitor.is_cancelled());
        flag.cancel();
        assert!(monitor.is_cancelled());
        assert!(BatchMonitor::is_cancelled(&flag));
    }

    #[test]
    fn test_summary_wording() {
        let mut r = BatchReport { processed: 1, total: 1, cancelled: false };
        assert_eq!(r.metadata_summary(), "1 asset added to metadata");
        r.processed = 3;
        assert_eq!(r.metadata_summary(), "3 assets added to metadata");
        r.processed = 0;
        assert_eq!(r.metadata_summary(), "0 assets added to metadata");
    }
}
