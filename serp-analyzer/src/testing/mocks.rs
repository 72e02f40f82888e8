//! Scripted collaborators for pipeline tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::errors::SerpError;
use crate::fetcher::{FetchOutcome, FetchedPage, PageFetcher};
use crate::models::RankedUrl;
use crate::pipeline::{ProgressEvent, ProgressObserver, ProgressUpdate};
use crate::resolver::RankResolver;

use super::fixtures;

type ErrorFactory = Box<dyn Fn() -> SerpError + Send + Sync>;

/// A resolver returning a fixed URL list, or failing on every call.
pub struct ScriptedResolver {
    urls: Vec<String>,
    error: Option<ErrorFactory>,
    queries: Mutex<Vec<(String, u32)>>,
}

impl ScriptedResolver {
    /// Creates a resolver that returns `urls` (truncated to the requested count).
    #[must_use]
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            error: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Creates a resolver whose every call fails with `make_error()`.
    #[must_use]
    pub fn failing(make_error: impl Fn() -> SerpError + Send + Sync + 'static) -> Self {
        Self {
            urls: Vec::new(),
            error: Some(Box::new(make_error)),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of times the resolver was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.queries.lock().len()
    }

    /// Returns the `(query, count)` pairs received.
    #[must_use]
    pub fn recorded_queries(&self) -> Vec<(String, u32)> {
        self.queries.lock().clone()
    }
}

impl std::fmt::Debug for ScriptedResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedResolver")
            .field("urls", &self.urls)
            .field("failing", &self.error.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RankResolver for ScriptedResolver {
    async fn resolve(&self, query: &str, count: u32) -> Result<Vec<RankedUrl>, SerpError> {
        self.queries.lock().push((query.to_string(), count));
        if let Some(make_error) = &self.error {
            return Err(make_error());
        }
        Ok(RankedUrl::rank_all(
            self.urls.iter().take(count as usize).cloned(),
        ))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// One call received by a [`ScriptedFetcher`].
#[derive(Debug, Clone)]
pub struct FetchCall {
    /// Requested URL.
    pub url: String,
    /// Timeout passed by the caller.
    pub timeout: Duration,
    /// When the call started.
    pub at: Instant,
}

/// A fetcher replaying scripted outcomes per URL.
///
/// Each URL has a queue of outcomes; the last one repeats once the queue is
/// down to a single entry. Unscripted URLs succeed with a small page whose
/// title is the URL.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<FetchOutcome>>>,
    latency: Duration,
    calls: Mutex<Vec<FetchCall>>,
}

impl ScriptedFetcher {
    /// Creates a fetcher with no scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `outcome` for `url`.
    #[must_use]
    pub fn with_outcome(self, url: impl Into<String>, outcome: FetchOutcome) -> Self {
        self.scripts
            .lock()
            .entry(url.into())
            .or_default()
            .push_back(outcome);
        self
    }

    /// Queues a successful fetch of `html` for `url`.
    #[must_use]
    pub fn with_page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        let url = url.into();
        let page = FetchedPage {
            html: html.into(),
            final_url: url.clone(),
            status: 200,
            duration_ms: 0.0,
        };
        self.with_outcome(url, FetchOutcome::Success(page))
    }

    /// Sleeps for `latency` on every call.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Returns every call received, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().clone()
    }

    /// Returns the URLs requested, in order.
    #[must_use]
    pub fn requested_urls(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.url.clone()).collect()
    }

    fn next_outcome(&self, url: &str) -> FetchOutcome {
        let mut scripts = self.scripts.lock();
        let scripted = match scripts.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        scripted.unwrap_or_else(|| {
            FetchOutcome::Success(FetchedPage {
                html: fixtures::page_with_headings(url, &[]),
                final_url: url.to_string(),
                status: 200,
                duration_ms: 0.0,
            })
        })
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchOutcome {
        self.calls.lock().push(FetchCall {
            url: url.to_string(),
            timeout,
            at: Instant::now(),
        });
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.next_outcome(url)
    }
}

/// Observer that records every event it receives.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingObserver {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }

    /// Returns only the finished-entry updates.
    #[must_use]
    pub fn finished(&self) -> Vec<ProgressUpdate> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::Finished(update) => Some(update.clone()),
                _ => None,
            })
            .collect()
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_resolved(&self, total: usize) {
        self.events.lock().push(ProgressEvent::Resolved { total });
    }

    fn on_entry_started(&self, rank: u32, total: usize, url: &str) {
        self.events.lock().push(ProgressEvent::Started {
            rank,
            total,
            url: url.to_string(),
        });
    }

    fn on_entry_finished(&self, update: &ProgressUpdate) {
        self.events
            .lock()
            .push(ProgressEvent::Finished(update.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FetchErrorKind;

    #[tokio::test]
    async fn test_scripted_resolver() {
        let resolver = ScriptedResolver::new(["https://a.example/", "https://b.example/"]);
        let ranked = resolver.resolve("q", 1).await.unwrap();

        assert_eq!(ranked, vec![RankedUrl::new(1, "https://a.example/")]);
        assert_eq!(resolver.recorded_queries(), vec![("q".to_string(), 1)]);
    }

    #[tokio::test]
    async fn test_failing_resolver() {
        let resolver = ScriptedResolver::failing(|| SerpError::rate_limited("google", "captcha"));
        assert!(resolver.resolve("q", 3).await.is_err());
        assert!(resolver.resolve("q", 3).await.is_err());
        assert_eq!(resolver.call_count(), 2);
    }

    #[tokio::test]
    async fn test_scripted_fetcher_replays_queue() {
        let url = "https://flaky.example/";
        let fetcher = ScriptedFetcher::new()
            .with_outcome(url, FetchOutcome::failure(FetchErrorKind::Timeout, "slow"))
            .with_page(url, "<title>ok</title>");
        let timeout = Duration::from_secs(1);

        assert!(!fetcher.fetch(url, timeout).await.is_success());
        assert!(fetcher.fetch(url, timeout).await.is_success());
        assert!(fetcher.fetch(url, timeout).await.is_success());
        assert!(fetcher.fetch("https://other.example/", timeout).await.is_success());
        assert_eq!(fetcher.calls().len(), 4);
    }
}
