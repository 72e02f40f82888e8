//! Stop requests for a running analysis.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

use crate::errors::SerpError;

/// Shared flag asking a run to stop at its next checkpoint.
///
/// Checkpoints sit before resolution, before each URL and after each delay,
/// so an in-flight request always completes. Repeated cancels keep the
/// first reason.
#[derive(Default)]
pub struct CancellationToken {
    cancelled: AtomicBool,
    reason: RwLock<Option<String>>,
}

impl CancellationToken {
    /// Creates a new cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the run to stop.
    pub fn cancel(&self, reason: impl Into<String>) {
        if self
            .cancelled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            *self.reason.write() = Some(reason.into());
        }
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns the cancellation reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.reason.read().clone()
    }

    /// Checkpoint: `Err(SerpError::Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<(), SerpError> {
        if !self.is_cancelled() {
            return Ok(());
        }
        let reason = self.reason().unwrap_or_else(|| "cancelled".to_string());
        info!(reason = %reason, "Run cancelled");
        Err(SerpError::Cancelled(reason))
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish()
    }
}
