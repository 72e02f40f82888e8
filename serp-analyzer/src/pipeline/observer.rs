//! Progress observation for analysis runs.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Progress after one URL finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Rank of the finished URL.
    pub rank: u32,
    /// Number of URLs in the run.
    pub total: usize,
    /// The URL.
    pub url: String,
    /// Whether a page record was produced.
    pub success: bool,
    /// Short outcome description.
    pub summary: String,
}

impl ProgressUpdate {
    /// Fraction of the run completed, in `0.0..=1.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            f64::from(self.rank) / self.total as f64
        }
    }
}

/// A progress event, as delivered by [`ChannelProgressObserver`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The listing resolved to `total` URLs.
    Resolved {
        /// Number of URLs to process.
        total: usize,
    },
    /// A URL is about to be fetched.
    Started {
        /// Rank of the URL.
        rank: u32,
        /// Number of URLs in the run.
        total: usize,
        /// The URL.
        url: String,
    },
    /// A URL finished.
    Finished(ProgressUpdate),
}

/// Observability callbacks for a run. Purely observational.
pub trait ProgressObserver: Send + Sync {
    /// Called once the listing resolved.
    fn on_resolved(&self, total: usize);

    /// Called before a URL is fetched.
    fn on_entry_started(&self, rank: u32, total: usize, url: &str);

    /// Called after a URL's outcome was recorded.
    fn on_entry_finished(&self, update: &ProgressUpdate);
}

/// No-op implementation of [`ProgressObserver`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgressObserver;

impl ProgressObserver for NoOpProgressObserver {
    fn on_resolved(&self, _total: usize) {}
    fn on_entry_started(&self, _rank: u32, _total: usize, _url: &str) {}
    fn on_entry_finished(&self, _update: &ProgressUpdate) {}
}

/// Observer that reports progress through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingProgressObserver;

impl ProgressObserver for LoggingProgressObserver {
    fn on_resolved(&self, total: usize) {
        info!(total, "Resolved result URLs");
    }

    fn on_entry_started(&self, rank: u32, total: usize, url: &str) {
        info!(rank, total, url, "Analyzing URL {}/{}", rank, total);
    }

    fn on_entry_finished(&self, update: &ProgressUpdate) {
        if update.success {
            info!(rank = update.rank, url = %update.url, summary = %update.summary, "Analyzed URL");
        } else {
            warn!(
                rank = update.rank,
                url = %update.url,
                error = %update.summary,
                "Failed to analyze URL"
            );
        }
    }
}

/// Observer that forwards events into an unbounded channel.
///
/// Sends to a dropped receiver are ignored.
#[derive(Debug, Clone)]
pub struct ChannelProgressObserver {
    sender: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgressObserver {
    /// Creates an observer and the receiving end of its channel.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn send(&self, event: ProgressEvent) {
        let _ = self.sender.send(event);
    }
}

impl ProgressObserver for ChannelProgressObserver {
    fn on_resolved(&self, total: usize) {
        self.send(ProgressEvent::Resolved { total });
    }

    fn on_entry_started(&self, rank: u32, total: usize, url: &str) {
        self.send(ProgressEvent::Started {
            rank,
            total,
            url: url.to_string(),
        });
    }

    fn on_entry_finished(&self, update: &ProgressUpdate) {
        self.send(ProgressEvent::Finished(update.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(rank: u32, total: usize) -> ProgressUpdate {
        ProgressUpdate {
            rank,
            total,
            url: "https://example.com".to_string(),
            success: true,
            summary: "ok".to_string(),
        }
    }

    #[test]
    fn test_progress_fraction() {
        assert!((update(1, 4).fraction() - 0.25).abs() < f64::EPSILON);
        assert!((update(4, 4).fraction() - 1.0).abs() < f64::EPSILON);
        assert!((update(0, 0).fraction() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_noop_and_logging_observers() {
        for observer in [
            &NoOpProgressObserver as &dyn ProgressObserver,
            &LoggingProgressObserver,
        ] {
            observer.on_resolved(2);
            observer.on_entry_started(1, 2, "https://example.com");
            observer.on_entry_finished(&update(1, 2));
        }
        // Should not panic
    }

    #[tokio::test]
    async fn test_channel_observer_delivers_in_order() {
        let (observer, mut rx) = ChannelProgressObserver::channel();
        observer.on_resolved(1);
        observer.on_entry_started(1, 1, "https://example.com");
        observer.on_entry_finished(&update(1, 1));
        drop(observer);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                ProgressEvent::Resolved { total: 1 },
                ProgressEvent::Started {
                    rank: 1,
                    total: 1,
                    url: "https://example.com".to_string(),
                },
                ProgressEvent::Finished(update(1, 1)),
            ]
        );
    }

    #[test]
    fn test_channel_observer_ignores_closed_receiver() {
        let (observer, rx) = ChannelProgressObserver::channel();
        drop(rx);
        observer.on_resolved(3);
    }

    #[test]
    fn test_progress_event_serialization() {
        let json = serde_json::to_value(ProgressEvent::Resolved { total: 3 }).unwrap();
        assert_eq!(json, serde_json::json!({"event": "resolved", "total": 3}));
    }
}
