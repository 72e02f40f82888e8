//! Sequential resolve-fetch-extract runs.

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::RunConfig;
use crate::errors::SerpError;
use crate::extractor;
use crate::fetcher::{FetchOutcome, HttpPageFetcher, PageFetcher};
use crate::models::{AnalysisReport, RankedUrl, ReportEntry};
use crate::resolver::{HttpRankResolver, RankResolver};

use super::cancellation::CancellationToken;
use super::observer::{NoOpProgressObserver, ProgressObserver, ProgressUpdate};
use super::retry::{is_retryable, retry_delay};

/// Runs a query through a resolver and a fetcher.
///
/// URLs are processed one at a time in rank order with the configured delay
/// before every request but the first. A failing URL becomes an error entry
/// and the run continues; only a resolver failure (or cancellation) fails
/// the run as a whole.
#[derive(Clone)]
pub struct Pipeline {
    resolver: Arc<dyn RankResolver>,
    fetcher: Arc<dyn PageFetcher>,
}

impl Pipeline {
    /// Creates a pipeline from its collaborators.
    #[must_use]
    pub fn new(resolver: Arc<dyn RankResolver>, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { resolver, fetcher }
    }

    /// Builds the HTTP resolver and fetcher described by `config`.
    pub fn from_config(config: &RunConfig) -> Result<Self, SerpError> {
        config.validate()?;
        let resolver = HttpRankResolver::new(config.resolver().clone())?;
        let fetcher = HttpPageFetcher::new(config.fetch().clone())?;
        Ok(Self::new(Arc::new(resolver), Arc::new(fetcher)))
    }

    /// Runs without progress reporting or cancellation.
    pub async fn run(&self, config: &RunConfig) -> Result<AnalysisReport, SerpError> {
        self.run_with(config, &NoOpProgressObserver, &CancellationToken::new())
            .await
    }

    /// Runs, reporting progress to `observer` and honoring `cancel`.
    ///
    /// An invalid `config` fails before anything is requested.
    pub async fn run_with(
        &self,
        config: &RunConfig,
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> Result<AnalysisReport, SerpError> {
        config.validate()?;
        let mut report = AnalysisReport::new(config.query(), config.count());
        let span = info_span!(
            "analysis_run",
            run_id = %report.run_id,
            query = %report.query,
            provider = self.resolver.name(),
        );

        async move {
            let started = Instant::now();
            cancel.check()?;

            let ranked = self
                .resolver
                .resolve(config.query(), config.count())
                .await?;
            let total = ranked.len();
            info!(requested = config.count(), resolved = total, "Resolved query");
            observer.on_resolved(total);

            for (index, target) in ranked.iter().enumerate() {
                cancel.check()?;
                if index > 0 && !config.delay().is_zero() {
                    debug!(delay_ms = config.delay().as_millis(), "Pausing between requests");
                    tokio::time::sleep(config.delay()).await;
                    cancel.check()?;
                }

                observer.on_entry_started(target.rank, total, &target.url);
                let entry = self.analyze(config, target, cancel).await;
                let update = ProgressUpdate {
                    rank: entry.rank,
                    total,
                    url: entry.url.clone(),
                    success: entry.is_success(),
                    summary: entry.summary(),
                };
                report.entries.push(entry);
                observer.on_entry_finished(&update);
            }

            report.generated_at = Utc::now();
            let summary = report.summary();
            info!(
                total = summary.total,
                succeeded = summary.succeeded,
                failed = summary.failed,
                duration_ms = started.elapsed().as_secs_f64() * 1000.0,
                "Run complete"
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }

    /// Fetches (with retries) and extracts one URL.
    async fn analyze(
        &self,
        config: &RunConfig,
        target: &RankedUrl,
        cancel: &CancellationToken,
    ) -> ReportEntry {
        let retry = config.retry();
        let timeout = config.fetch().timeout();
        let mut attempt = 0;

        loop {
            match self.fetcher.fetch(&target.url, timeout).await {
                FetchOutcome::Success(page) => {
                    debug!(
                        rank = target.rank,
                        status = page.status,
                        duration_ms = page.duration_ms,
                        "Extracting fields"
                    );
                    return ReportEntry::page(target, extractor::extract(&page.html));
                }
                FetchOutcome::Failure(failure) => {
                    let can_retry = attempt < retry.max_retries
                        && is_retryable(&failure, retry)
                        && !cancel.is_cancelled();
                    if !can_retry {
                        warn!(
                            rank = target.rank,
                            url = %target.url,
                            error = %failure,
                            "Fetch failed"
                        );
                        return ReportEntry::error(target, failure.into_descriptor());
                    }

                    let delay = retry_delay(retry, attempt);
                    attempt += 1;
                    debug!(
                        rank = target.rank,
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = %failure,
                        "Retrying fetch"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("resolver", &self.resolver.name())
            .finish_non_exhaustive()
    }
}

/// Analyzes the top `count` results for `query` with default settings.
pub async fn run(query: &str, count: u32, delay_seconds: f64) -> Result<AnalysisReport, SerpError> {
    let config = RunConfig::new(query, count, delay_seconds)?;
    Pipeline::from_config(&config)?.run(&config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use crate::errors::FetchErrorKind;
    use crate::fetcher::FetchFailure;
    use crate::models::EntryOutcome;
    use crate::pipeline::{ChannelProgressObserver, ProgressEvent};
    use crate::testing::{fixtures, RecordingObserver, ScriptedFetcher, ScriptedResolver};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    const A: &str = "https://a.example/";
    const B: &str = "https://b.example/";
    const C: &str = "https://c.example/";

    fn pipeline(resolver: ScriptedResolver, fetcher: Arc<ScriptedFetcher>) -> Pipeline {
        Pipeline::new(Arc::new(resolver), fetcher)
    }

    fn config(count: u32) -> RunConfig {
        RunConfig::new("rust ownership", count, 0.0).unwrap()
    }

    #[tokio::test]
    async fn test_failed_fetch_is_isolated() {
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .with_page(A, "<title>A</title><h1>x</h1>")
                .with_outcome(
                    B,
                    FetchOutcome::failure(FetchErrorKind::Timeout, "no response within 10.0s"),
                )
                .with_page(C, "<title>C</title>"),
        );
        let pipeline = pipeline(ScriptedResolver::new([A, B, C]), Arc::clone(&fetcher));

        let report = pipeline.run(&config(3)).await.unwrap();

        assert_eq!(report.len(), 3);
        assert_eq!(
            report.entries.iter().map(|e| e.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(report.entries[0].fields().unwrap().title.as_deref(), Some("A"));
        assert_eq!(report.entries[0].fields().unwrap().headers.h1, vec!["x"]);
        let error = report.entries[1].error_descriptor().unwrap();
        assert_eq!(error.kind, FetchErrorKind::Timeout);
        assert_eq!(report.entries[1].url, B);
        assert_eq!(report.entries[2].fields().unwrap().title.as_deref(), Some("C"));
        assert_eq!(fetcher.requested_urls(), vec![A, B, C]);
    }

    #[tokio::test]
    async fn test_resolver_failure_produces_no_report() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let pipeline = pipeline(
            ScriptedResolver::failing(|| SerpError::rate_limited("google", "captcha form")),
            Arc::clone(&fetcher),
        );

        let err = pipeline.run(&config(5)).await.unwrap_err();

        assert!(matches!(err, SerpError::RateLimited { .. }));
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_report_carries_query_and_requested_count() {
        let resolver = ScriptedResolver::new([A, B]);
        let fetcher = Arc::new(ScriptedFetcher::new());
        let pipeline = pipeline(resolver, fetcher);

        let report = pipeline.run(&config(10)).await.unwrap();

        assert_eq!(report.query, "rust ownership");
        assert_eq!(report.requested, 10);
        assert_eq!(report.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_resolution_gives_empty_report() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let pipeline = pipeline(ScriptedResolver::new(Vec::<String>::new()), Arc::clone(&fetcher));

        let report = pipeline.run(&config(5)).await.unwrap();

        assert!(report.is_empty());
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delay_between_requests_only() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let pipeline = pipeline(ScriptedResolver::new([A, B, C]), Arc::clone(&fetcher));
        let config = RunConfig::new("q", 3, 0.1).unwrap();

        let started = Instant::now();
        pipeline.run(&config).await.unwrap();

        let calls = fetcher.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[0].at.duration_since(started) < Duration::from_millis(100));
        for pair in calls.windows(2) {
            assert!(pair[1].at.duration_since(pair[0].at) >= Duration::from_millis(100));
        }
    }

    #[tokio::test]
    async fn test_fetch_timeout_comes_from_config() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let pipeline = pipeline(ScriptedResolver::new([A]), Arc::clone(&fetcher));
        let config = config(1).with_fetch(crate::config::FetchConfig::new().with_timeout(3.5));

        pipeline.run(&config).await.unwrap();

        assert_eq!(fetcher.calls()[0].timeout, Duration::from_secs_f64(3.5));
    }

    #[tokio::test]
    async fn test_retry_records_final_outcome_only() {
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .with_outcome(A, FetchOutcome::Failure(FetchFailure::http_status(503, "HTTP 503")))
                .with_outcome(A, FetchOutcome::failure(FetchErrorKind::NetworkError, "reset"))
                .with_page(A, fixtures::ARTICLE_PAGE),
        );
        let pipeline = pipeline(ScriptedResolver::new([A]), Arc::clone(&fetcher));
        let config = config(1).with_retry(
            RetryConfig::default()
                .with_max_retries(2)
                .with_retry_delay(0.0),
        );

        let report = pipeline.run(&config).await.unwrap();

        assert_eq!(report.len(), 1);
        assert!(report.entries[0].is_success());
        assert_eq!(fetcher.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_retry_skips_permanent_failures() {
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .with_outcome(A, FetchOutcome::Failure(FetchFailure::http_status(404, "HTTP 404"))),
        );
        let pipeline = pipeline(ScriptedResolver::new([A]), Arc::clone(&fetcher));
        let config = config(1).with_retry(
            RetryConfig::default()
                .with_max_retries(3)
                .with_retry_delay(0.0),
        );

        let report = pipeline.run(&config).await.unwrap();

        assert_eq!(fetcher.calls().len(), 1);
        assert_eq!(
            report.entries[0].error_descriptor().map(|e| e.kind),
            Some(FetchErrorKind::HttpError)
        );
    }

    #[tokio::test]
    async fn test_retry_disabled_by_default() {
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .with_outcome(A, FetchOutcome::failure(FetchErrorKind::Timeout, "slow"))
                .with_page(A, "<title>late</title>"),
        );
        let pipeline = pipeline(ScriptedResolver::new([A]), Arc::clone(&fetcher));

        let report = pipeline.run(&config(1)).await.unwrap();

        assert_eq!(fetcher.calls().len(), 1);
        assert!(!report.entries[0].is_success());
    }

    #[tokio::test]
    async fn test_observer_sees_every_entry() {
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .with_outcome(B, FetchOutcome::failure(FetchErrorKind::InvalidUrl, "bad")),
        );
        let pipeline = pipeline(ScriptedResolver::new([A, B]), fetcher);
        let observer = RecordingObserver::new();

        pipeline
            .run_with(&config(2), &observer, &CancellationToken::new())
            .await
            .unwrap();

        let events = observer.events();
        assert_eq!(events.len(), 5);
        assert_eq!(events[0], ProgressEvent::Resolved { total: 2 });
        assert_eq!(
            events[1],
            ProgressEvent::Started {
                rank: 1,
                total: 2,
                url: A.to_string(),
            }
        );
        let finished = observer.finished();
        assert_eq!(finished.iter().map(|u| u.success).collect::<Vec<_>>(), vec![true, false]);
        assert_eq!(finished[1].summary, "InvalidURL: bad");
    }

    #[tokio::test]
    async fn test_channel_observer_streams_progress() {
        let pipeline = pipeline(ScriptedResolver::new([A, B]), Arc::new(ScriptedFetcher::new()));
        let (observer, mut rx) = ChannelProgressObserver::channel();

        pipeline
            .run_with(&config(2), &observer, &CancellationToken::new())
            .await
            .unwrap();
        drop(observer);

        let mut finished = Vec::new();
        while let Some(event) = rx.recv().await {
            if let ProgressEvent::Finished(update) = event {
                finished.push(update.rank);
            }
        }
        assert_eq!(finished, vec![1, 2]);
    }

    struct CancelAfterFirst<'a>(&'a CancellationToken);

    impl ProgressObserver for CancelAfterFirst<'_> {
        fn on_resolved(&self, _total: usize) {}
        fn on_entry_started(&self, _rank: u32, _total: usize, _url: &str) {}
        fn on_entry_finished(&self, _update: &ProgressUpdate) {
            self.0.cancel("user interrupt");
        }
    }

    #[tokio::test]
    async fn test_cancellation_stops_before_next_url() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let pipeline = pipeline(ScriptedResolver::new([A, B, C]), Arc::clone(&fetcher));
        let token = CancellationToken::new();

        let err = pipeline
            .run_with(&config(3), &CancelAfterFirst(&token), &token)
            .await
            .unwrap_err();

        assert!(matches!(err, SerpError::Cancelled(ref reason) if reason == "user interrupt"));
        assert_eq!(fetcher.requested_urls(), vec![A]);
    }

    #[tokio::test]
    async fn test_cancellation_lets_in_flight_fetch_finish() {
        let fetcher = Arc::new(ScriptedFetcher::new().with_latency(Duration::from_millis(200)));
        let pipeline = pipeline(ScriptedResolver::new([A, B]), Arc::clone(&fetcher));
        let token = CancellationToken::new();
        let observer = RecordingObserver::new();
        let config = config(2);

        let (result, ()) = tokio::join!(
            pipeline.run_with(&config, &observer, &token),
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                token.cancel("shutdown");
            }
        );

        assert!(matches!(result, Err(SerpError::Cancelled(_))));
        assert_eq!(fetcher.requested_urls(), vec![A]);
        assert_eq!(observer.finished().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_skips_resolution() {
        let resolver = Arc::new(ScriptedResolver::new([A]));
        let pipeline = Pipeline::new(resolver.clone(), Arc::new(ScriptedFetcher::new()));
        let token = CancellationToken::new();
        token.cancel("shutdown");

        let err = pipeline
            .run_with(&config(1), &NoOpProgressObserver, &token)
            .await
            .unwrap_err();

        assert!(matches!(err, SerpError::Cancelled(_)));
        assert_eq!(resolver.call_count(), 0);
    }

    #[tokio::test]
    async fn test_extracted_fields_match_page() {
        let fetcher = Arc::new(ScriptedFetcher::new().with_page(A, fixtures::ARTICLE_PAGE));
        let pipeline = pipeline(ScriptedResolver::new([A]), fetcher);

        let report = pipeline.run(&config(1)).await.unwrap();

        match &report.entries[0].outcome {
            EntryOutcome::Page(fields) => {
                assert_eq!(fields.title.as_deref(), Some("Rust Ownership Explained"));
                assert_eq!(
                    fields.meta_description.as_deref(),
                    Some("A short guide to ownership and borrowing.")
                );
                assert_eq!(fields.headers.h2, vec!["Moves", "Borrowing"]);
                assert_eq!(fields.headers.h3, vec!["Mutable references"]);
            }
            EntryOutcome::Error(err) => panic!("unexpected error entry: {err}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_settings_fail_before_any_request() {
        let resolver = Arc::new(ScriptedResolver::new([A]));
        let fetcher = Arc::new(ScriptedFetcher::new());
        let pipeline = Pipeline::new(resolver.clone(), Arc::clone(&fetcher) as Arc<dyn PageFetcher>);
        let config = config(1).with_fetch(crate::config::FetchConfig::new().with_timeout(-1.0));

        let err = pipeline.run(&config).await.unwrap_err();

        assert!(matches!(err, SerpError::InvalidConfig(_)), "{err}");
        assert_eq!(resolver.call_count(), 0);
        assert!(fetcher.calls().is_empty());
    }

    #[test]
    fn test_from_config_rejects_invalid_settings() {
        let config = config(1).with_retry(RetryConfig {
            max_delay_seconds: 1e300,
            ..Default::default()
        });
        assert!(matches!(
            Pipeline::from_config(&config).unwrap_err(),
            SerpError::InvalidConfig(_)
        ));
    }

    #[test]
    fn test_pipeline_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pipeline>();
    }
}
