//! Per-URL retry decisions.

use rand::Rng;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::errors::FetchErrorKind;
use crate::fetcher::FetchFailure;

/// Whether `failure` is transient under `config`.
///
/// Timeouts and transport errors are transient; HTTP errors only when their
/// status is listed. Invalid URLs and redirect loops never are.
#[must_use]
pub fn is_retryable(failure: &FetchFailure, config: &RetryConfig) -> bool {
    match failure.kind {
        FetchErrorKind::Timeout | FetchErrorKind::NetworkError => true,
        FetchErrorKind::HttpError => failure
            .status
            .is_some_and(|status| config.should_retry_status(status)),
        FetchErrorKind::InvalidUrl | FetchErrorKind::TooManyRedirects => false,
    }
}

/// Delay before retry number `attempt`, with optional jitter.
#[must_use]
pub fn retry_delay(config: &RetryConfig, attempt: usize) -> Duration {
    let base = config.delay_for_attempt(attempt);
    if !config.jitter || base.is_zero() {
        return base;
    }
    // Equal jitter: half fixed, half random.
    let half = base.as_secs_f64() / 2.0;
    let jitter = rand::thread_rng().gen_range(0.0..=half);
    Duration::from_secs_f64(half + jitter)
}
