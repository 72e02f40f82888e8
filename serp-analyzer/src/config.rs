//! Configuration types for resolving, fetching and running an analysis.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use crate::errors::SerpError;

/// Upper bound on the number of results a single run may request.
pub const MAX_RESULTS: u32 = 100;

/// Desktop browser user agent; search providers and many sites serve
/// degraded or blocked pages to obvious bots.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Converts a seconds setting into a `Duration`, rejecting negative,
/// non-finite and out-of-range values.
fn seconds(name: &str, value: f64) -> Result<Duration, SerpError> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        SerpError::InvalidConfig(format!(
            "{name} must be a non-negative number of seconds, got {value}"
        ))
    })
}

/// Like [`seconds`], additionally rejecting zero.
fn positive_seconds(name: &str, value: f64) -> Result<Duration, SerpError> {
    let duration = seconds(name, value)?;
    if duration.is_zero() {
        return Err(SerpError::InvalidConfig(format!(
            "{name} must be positive, got {value}"
        )));
    }
    Ok(duration)
}

/// Search provider used to resolve a query into ranked URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SearchProvider {
    /// Google HTML results.
    #[default]
    Google,
    /// DuckDuckGo HTML results.
    #[serde(alias = "ddg")]
    #[value(name = "duckduckgo", alias = "ddg")]
    DuckDuckGo,
}

impl SearchProvider {
    /// Short provider name used in logs and errors.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::DuckDuckGo => "duckduckgo",
        }
    }

    /// Public endpoint serving the HTML results listing.
    #[must_use]
    pub fn default_endpoint(self) -> &'static str {
        match self {
            Self::Google => "https://www.google.com/search",
            Self::DuckDuckGo => "https://html.duckduckgo.com/html/",
        }
    }
}

/// Configuration for page fetching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_seconds: f64,
    /// Maximum number of redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_fetch_timeout() -> f64 {
    10.0
}

fn default_max_redirects() -> usize {
    5
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_fetch_timeout(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
        }
    }
}

impl FetchConfig {
    /// Creates a new fetch configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the redirect limit.
    #[must_use]
    pub fn with_max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Checks that the timeout is a usable duration.
    pub fn validate(&self) -> Result<(), SerpError> {
        positive_seconds("fetch timeout", self.timeout_seconds).map(|_| ())
    }

    /// Gets timeout as Duration, or the default when the value is unusable.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        positive_seconds("fetch timeout", self.timeout_seconds)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_fetch_timeout()))
    }
}

/// Configuration for the rank resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Which provider to query.
    #[serde(default)]
    pub provider: SearchProvider,
    /// Override for the provider's results endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Interface language requested from the provider.
    #[serde(default = "default_language")]
    pub language: String,
    /// Timeout for each listing request in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_seconds: f64,
    /// Pause between successive listing pages in milliseconds.
    #[serde(default)]
    pub page_delay_ms: u64,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            provider: SearchProvider::default(),
            endpoint: None,
            language: default_language(),
            timeout_seconds: default_fetch_timeout(),
            page_delay_ms: 0,
            user_agent: default_user_agent(),
        }
    }
}

impl ResolverConfig {
    /// Creates a new resolver configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the provider.
    #[must_use]
    pub fn with_provider(mut self, provider: SearchProvider) -> Self {
        self.provider = provider;
        self
    }

    /// Points the resolver at a different results endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the listing timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the pause between listing pages.
    #[must_use]
    pub fn with_page_delay_ms(mut self, delay: u64) -> Self {
        self.page_delay_ms = delay;
        self
    }

    /// Effective results endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.provider.default_endpoint())
    }

    /// Checks that the timeout is a usable duration.
    pub fn validate(&self) -> Result<(), SerpError> {
        positive_seconds("resolver timeout", self.timeout_seconds).map(|_| ())
    }

    /// Gets timeout as Duration, or the default when the value is unusable.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        positive_seconds("resolver timeout", self.timeout_seconds)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_fetch_timeout()))
    }

    /// Gets the page delay as Duration.
    #[must_use]
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

/// Retry configuration for failed page fetches.
///
/// Disabled by default so that each URL costs exactly one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first request.
    #[serde(default)]
    pub max_retries: usize,
    /// Initial delay between retries in seconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: f64,
    /// Backoff multiplier.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Maximum delay between retries.
    #[serde(default = "default_max_delay")]
    pub max_delay_seconds: f64,
    /// Whether to randomize each delay between half and all of its value.
    #[serde(default)]
    pub jitter: bool,
    /// HTTP status codes that should trigger a retry.
    #[serde(default = "default_retry_status_codes")]
    pub retry_status_codes: BTreeSet<u16>,
}

fn default_retry_delay() -> f64 {
    1.0
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_delay() -> f64 {
    30.0
}

fn default_retry_status_codes() -> BTreeSet<u16> {
    [429, 500, 502, 503, 504].into_iter().collect()
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            retry_delay_seconds: default_retry_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_seconds: default_max_delay(),
            jitter: false,
            retry_status_codes: default_retry_status_codes(),
        }
    }
}

impl RetryConfig {
    /// Creates a retry configuration allowing `max_retries` extra attempts.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the initial retry delay.
    #[must_use]
    pub fn with_retry_delay(mut self, seconds: f64) -> Self {
        self.retry_delay_seconds = seconds;
        self
    }

    /// Whether a status code should trigger a retry.
    #[must_use]
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_status_codes.contains(&status)
    }

    /// Checks the delays and the backoff multiplier.
    pub fn validate(&self) -> Result<(), SerpError> {
        seconds("retry delay", self.retry_delay_seconds)?;
        seconds("max retry delay", self.max_delay_seconds)?;
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(SerpError::InvalidConfig(format!(
                "backoff multiplier must be at least 1, got {}",
                self.backoff_multiplier
            )));
        }
        Ok(())
    }

    /// Calculates the delay before retry number `attempt` (0-indexed).
    ///
    /// Unusable settings yield no delay; [`RetryConfig::validate`] rejects them.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay = self.retry_delay_seconds * self.backoff_multiplier.powi(exponent);
        let capped = delay.min(self.max_delay_seconds).max(0.0);
        Duration::try_from_secs_f64(capped).unwrap_or_default()
    }
}

/// Validated parameters for one analysis run.
///
/// Construct through [`RunConfig::new`] or [`RunConfig::from_json_file`];
/// both reject blank queries, a zero count and delays that are negative or
/// out of range. The `with_*` setters do not validate; finish with
/// [`RunConfig::validated`]. [`Pipeline`](crate::pipeline::Pipeline) also
/// re-checks before starting a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRunConfig")]
pub struct RunConfig {
    query: String,
    count: u32,
    delay_seconds: f64,
    fetch: FetchConfig,
    resolver: ResolverConfig,
    retry: RetryConfig,
}

#[derive(Debug, Deserialize)]
struct RawRunConfig {
    query: String,
    #[serde(default = "default_count")]
    count: u32,
    #[serde(default = "default_delay")]
    delay_seconds: f64,
    #[serde(default)]
    fetch: FetchConfig,
    #[serde(default)]
    resolver: ResolverConfig,
    #[serde(default)]
    retry: RetryConfig,
}

fn default_count() -> u32 {
    10
}

fn default_delay() -> f64 {
    2.0
}

impl TryFrom<RawRunConfig> for RunConfig {
    type Error = SerpError;

    fn try_from(raw: RawRunConfig) -> Result<Self, Self::Error> {
        Self::new(raw.query, raw.count, raw.delay_seconds).and_then(|config| {
            config
                .with_fetch(raw.fetch)
                .with_resolver(raw.resolver)
                .with_retry(raw.retry)
                .validated()
        })
    }
}

impl RunConfig {
    /// Creates a run configuration, trimming the query.
    pub fn new(
        query: impl Into<String>,
        count: u32,
        delay_seconds: f64,
    ) -> Result<Self, SerpError> {
        let query = query.into().trim().to_string();
        if query.is_empty() {
            return Err(SerpError::InvalidQuery("query must not be blank".to_string()));
        }
        if count == 0 {
            return Err(SerpError::InvalidConfig(
                "count must be at least 1".to_string(),
            ));
        }
        seconds("delay", delay_seconds)?;

        Ok(Self {
            query,
            count,
            delay_seconds,
            fetch: FetchConfig::default(),
            resolver: ResolverConfig::default(),
            retry: RetryConfig::default(),
        })
    }

    /// Loads and validates a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SerpError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Replaces the fetch configuration.
    #[must_use]
    pub fn with_fetch(mut self, fetch: FetchConfig) -> Self {
        self.fetch = fetch;
        self
    }

    /// Replaces the resolver configuration.
    #[must_use]
    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replaces the retry configuration.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Checks every setting, including those replaced through `with_*`.
    pub fn validate(&self) -> Result<(), SerpError> {
        if self.query.trim().is_empty() {
            return Err(SerpError::InvalidQuery("query must not be blank".to_string()));
        }
        if self.count == 0 {
            return Err(SerpError::InvalidConfig(
                "count must be at least 1".to_string(),
            ));
        }
        seconds("delay", self.delay_seconds)?;
        self.fetch.validate()?;
        self.resolver.validate()?;
        self.retry.validate()
    }

    /// Validates, returning the config unchanged when every setting is usable.
    pub fn validated(self) -> Result<Self, SerpError> {
        self.validate()?;
        Ok(self)
    }

    /// The trimmed search query.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Requested number of results, clamped to [`MAX_RESULTS`].
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count.min(MAX_RESULTS)
    }

    /// Delay between page requests.
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_seconds).unwrap_or_default()
    }

    /// Fetch configuration.
    #[must_use]
    pub fn fetch(&self) -> &FetchConfig {
        &self.fetch
    }

    /// Resolver configuration.
    #[must_use]
    pub fn resolver(&self) -> &ResolverConfig {
        &self.resolver
    }

    /// Retry configuration.
    #[must_use]
    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }
}
