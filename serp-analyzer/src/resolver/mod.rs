//! Query-to-results resolution.
//!
//! A [`RankResolver`] turns a query into an ordered list of organic result
//! URLs. Resolution is all-or-nothing: a blocked, unreachable or unparseable
//! listing fails the whole call, while a provider that simply has fewer
//! results than requested is not an error.

mod duckduckgo;
mod google;
mod html;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::config::{ResolverConfig, SearchProvider, MAX_RESULTS};
use crate::errors::SerpError;
use crate::models::RankedUrl;

/// Listing pages requested before giving up on reaching `count`.
const MAX_PAGES: usize = 10;

/// Block page markup served by the supported providers.
const BLOCK_MARKUP_PATTERN: &str = r#"(?i)(id="captcha-form"|class="g-recaptcha"|anomaly-modal)"#;

/// Block page wording. Only meaningful on pages without organic results,
/// since a result snippet may quote it.
const BLOCK_PHRASE_PATTERN: &str =
    r"(?i)(unusual traffic from your computer network|bots use duckduckgo too)";

/// Protocol for resolving a query into ranked result URLs.
#[async_trait]
pub trait RankResolver: Send + Sync {
    /// Returns at most `count` organic result URLs, ranked from 1.
    async fn resolve(&self, query: &str, count: u32) -> Result<Vec<RankedUrl>, SerpError>;

    /// Provider name for logs and errors.
    fn name(&self) -> &'static str;
}

/// Trims `query`, rejecting blank input.
pub fn normalize_query(query: &str) -> Result<&str, SerpError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        Err(SerpError::InvalidQuery("query must not be blank".to_string()))
    } else {
        Ok(trimmed)
    }
}

/// Clamps a requested result count into `1..=MAX_RESULTS`.
#[must_use]
pub fn clamp_count(count: u32) -> u32 {
    count.clamp(1, MAX_RESULTS)
}

/// A raw listing response.
#[derive(Debug, Clone)]
pub(crate) struct ListingResponse {
    pub status: u16,
    pub final_url: String,
    pub body: String,
}

/// What one listing page contained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ListingPage {
    /// Organic result URLs in listing order.
    Results(Vec<String>),
    /// The provider stated that nothing matched.
    NoResults,
    /// Neither results nor a "no results" marker were found.
    Unrecognized,
}

/// Resolver that scrapes a provider's HTML results listing.
#[derive(Debug, Clone)]
pub struct HttpRankResolver {
    client: Client,
    config: ResolverConfig,
    block_markup: Regex,
    block_phrases: Regex,
}

impl HttpRankResolver {
    /// Builds a resolver from configuration.
    pub fn new(config: ResolverConfig) -> Result<Self, SerpError> {
        config.validate()?;
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .map_err(|e| SerpError::InvalidConfig(format!("HTTP client: {e}")))?;
        let block_markup = Regex::new(BLOCK_MARKUP_PATTERN)
            .map_err(|e| SerpError::InvalidConfig(e.to_string()))?;
        let block_phrases = Regex::new(BLOCK_PHRASE_PATTERN)
            .map_err(|e| SerpError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            config,
            block_markup,
            block_phrases,
        })
    }

    /// Gets the configuration.
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    fn provider(&self) -> &'static str {
        self.config.provider.name()
    }

    async fn fetch_listing(
        &self,
        query: &str,
        offset: usize,
        wanted: usize,
    ) -> Result<ListingResponse, SerpError> {
        let endpoint = self.config.endpoint();
        let request = match self.config.provider {
            SearchProvider::Google => google::page_request(
                &self.client,
                endpoint,
                &self.config.language,
                query,
                offset,
                wanted,
            ),
            SearchProvider::DuckDuckGo => duckduckgo::page_request(
                &self.client,
                endpoint,
                &self.config.language,
                query,
                offset,
            ),
        };

        debug!(provider = self.provider(), offset, "Requesting results listing");
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SerpError::network(
                    self.provider(),
                    format!("timed out after {:.1}s", self.config.timeout_seconds),
                )
            } else {
                SerpError::network(self.provider(), e.to_string())
            }
        })?;

        let status = response.status();
        let final_url = response.url().to_string();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SerpError::rate_limited(self.provider(), "HTTP 429 Too Many Requests"));
        }
        if !status.is_success() {
            if final_url.contains("/sorry/") {
                return Err(SerpError::rate_limited(self.provider(), "redirected to block page"));
            }
            return Err(SerpError::network(self.provider(), format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SerpError::network(self.provider(), e.to_string()))?;

        Ok(ListingResponse {
            status: status.as_u16(),
            final_url,
            body,
        })
    }

    /// Returns the reason a response looks like a block page.
    ///
    /// Wording markers count only when `listing` holds no organic results.
    fn block_reason(&self, response: &ListingResponse, listing: &ListingPage) -> Option<String> {
        if response.final_url.contains("/sorry/") {
            return Some("redirected to block page".to_string());
        }
        if let Some(m) = self.block_markup.find(&response.body) {
            return Some(format!("block page marker '{}'", m.as_str()));
        }
        if matches!(listing, ListingPage::Results(_)) {
            return None;
        }
        self.block_phrases
            .find(&response.body)
            .map(|m| format!("block page text '{}'", m.as_str()))
    }

    fn parse_listing(&self, response: &ListingResponse) -> ListingPage {
        match self.config.provider {
            SearchProvider::Google => google::parse_listing(&response.body),
            SearchProvider::DuckDuckGo => duckduckgo::parse_listing(&response.body),
        }
    }
}

#[async_trait]
impl RankResolver for HttpRankResolver {
    async fn resolve(&self, query: &str, count: u32) -> Result<Vec<RankedUrl>, SerpError> {
        let query = normalize_query(query)?;
        let count = clamp_count(count) as usize;

        let mut urls: Vec<String> = Vec::with_capacity(count);
        let mut seen = HashSet::new();
        let mut offset = 0;

        for page in 0..MAX_PAGES {
            if urls.len() >= count {
                break;
            }
            if page > 0 && self.config.page_delay_ms > 0 {
                tokio::time::sleep(self.config.page_delay()).await;
            }

            let response = self.fetch_listing(query, offset, count - urls.len()).await?;
            let listing = self.parse_listing(&response);
            if let Some(reason) = self.block_reason(&response, &listing) {
                return Err(SerpError::rate_limited(self.provider(), reason));
            }

            match listing {
                ListingPage::Results(found) => {
                    let before = urls.len();
                    offset += found.len();
                    for url in found {
                        if seen.insert(url.clone()) {
                            urls.push(url);
                        }
                    }
                    if urls.len() == before {
                        debug!(page, "Listing page added no new results");
                        break;
                    }
                }
                ListingPage::NoResults => break,
                ListingPage::Unrecognized => {
                    return Err(SerpError::parse(
                        self.provider(),
                        format!(
                            "no organic results in listing page {} (HTTP {})",
                            page + 1,
                            response.status
                        ),
                    ));
                }
            }
        }

        urls.truncate(count);
        info!(
            provider = self.provider(),
            requested = count,
            found = urls.len(),
            "Resolved results listing"
        );
        Ok(RankedUrl::rank_all(urls))
    }

    fn name(&self) -> &'static str {
        self.provider()
    }
}
