//! Page fetching with failure isolation.
//!
//! A fetch never returns `Err`: every failure is classified into a
//! [`FetchErrorKind`] and handed back as [`FetchOutcome::Failure`].

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

use crate::config::FetchConfig;
use crate::errors::{FetchErrorKind, SerpError};
use crate::models::ErrorDescriptor;

/// A successfully fetched page.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    /// Response body as text.
    pub html: String,
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Time taken to fetch in milliseconds.
    pub duration_ms: f64,
}

/// Why a fetch failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    /// Failure classification.
    pub kind: FetchErrorKind,
    /// Human-readable detail.
    pub message: String,
    /// HTTP status, for `HttpError` failures.
    pub status: Option<u16>,
}

impl FetchFailure {
    /// Creates a failure without an HTTP status.
    #[must_use]
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Creates an `HttpError` failure for a non-2xx status.
    #[must_use]
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::HttpError,
            message: message.into(),
            status: Some(status),
        }
    }

    /// Converts into the descriptor recorded in reports.
    #[must_use]
    pub fn into_descriptor(self) -> ErrorDescriptor {
        ErrorDescriptor::new(self.kind, self.message)
    }
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Result of fetching one URL.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The page body was retrieved.
    Success(FetchedPage),
    /// The page could not be retrieved.
    Failure(FetchFailure),
}

impl FetchOutcome {
    /// Shorthand for a failure outcome.
    #[must_use]
    pub fn failure(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self::Failure(FetchFailure::new(kind, message))
    }

    /// Whether the fetch succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Failure kind, if any.
    #[must_use]
    pub fn error_kind(&self) -> Option<FetchErrorKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure(err) => Some(err.kind),
        }
    }
}

/// Protocol for page fetching.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url` once, giving up after `timeout`.
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchOutcome;
}

/// Checks that `url` has an http(s) scheme and a host.
pub fn validate_url(url: &str) -> Result<Url, FetchFailure> {
    let parsed = Url::parse(url.trim()).map_err(|e| {
        FetchFailure::new(FetchErrorKind::InvalidUrl, format!("{url}: {e}"))
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FetchFailure::new(
            FetchErrorKind::InvalidUrl,
            format!("{url}: unsupported scheme '{}'", parsed.scheme()),
        ));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(FetchFailure::new(
            FetchErrorKind::InvalidUrl,
            format!("{url}: missing host"),
        ));
    }

    Ok(parsed)
}

/// Maps a transport error onto the fetch error taxonomy.
pub(crate) fn classify_transport_error(err: &reqwest::Error, timeout: Duration) -> FetchFailure {
    if err.is_timeout() {
        FetchFailure::new(
            FetchErrorKind::Timeout,
            format!("no response within {:.1}s", timeout.as_secs_f64()),
        )
    } else if err.is_redirect() {
        FetchFailure::new(FetchErrorKind::TooManyRedirects, err.to_string())
    } else {
        FetchFailure::new(FetchErrorKind::NetworkError, error_chain(err))
    }
}

/// Renders an error with its sources, since reqwest's top-level message is terse.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

/// HTTP fetcher backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpPageFetcher {
    /// Builds a fetcher from configuration.
    pub fn new(config: FetchConfig) -> Result<Self, SerpError> {
        config.validate()?;
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(Policy::limited(config.max_redirects))
            .timeout(config.timeout())
            .build()
            .map_err(|e| SerpError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Gets the configuration.
    #[must_use]
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchOutcome {
        let parsed = match validate_url(url) {
            Ok(parsed) => parsed,
            Err(err) => return FetchOutcome::Failure(err),
        };

        let started = Instant::now();
        debug!(url = %parsed, timeout_ms = timeout.as_millis(), "Fetching page");

        let response = match self.client.get(parsed).timeout(timeout).send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::Failure(classify_transport_error(&e, timeout)),
        };

        let status = response.status();
        if !status.is_success() {
            return FetchOutcome::Failure(FetchFailure::http_status(
                status.as_u16(),
                format!("HTTP {status} for {url}"),
            ));
        }

        let final_url = response.url().to_string();
        match response.text().await {
            Ok(html) => {
                let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
                debug!(url = %final_url, bytes = html.len(), duration_ms, "Fetched page");
                FetchOutcome::Success(FetchedPage {
                    html,
                    final_url,
                    status: status.as_u16(),
                    duration_ms,
                })
            }
            Err(e) => FetchOutcome::Failure(classify_transport_error(&e, timeout)),
        }
    }
}
