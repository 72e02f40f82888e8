//! Error types for the SERP analyzer.
//!
//! Two layers exist. [`SerpError`] aborts a whole run (or an I/O operation
//! around one). [`FetchErrorKind`] classifies a single URL's failure and is
//! downgraded into a report entry instead of propagating.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The main error type for run-level operations.
#[derive(Debug, Error)]
pub enum SerpError {
    /// The query was blank after trimming.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The search provider answered with a block page or CAPTCHA.
    #[error("Rate limited by {provider}: {message}")]
    RateLimited {
        /// Provider name.
        provider: String,
        /// What gave the block away.
        message: String,
    },

    /// The search provider could not be reached.
    #[error("Network error contacting {provider}: {message}")]
    Network {
        /// Provider name.
        provider: String,
        /// Underlying transport message.
        message: String,
    },

    /// The results listing did not have the expected shape.
    #[error("Could not parse {provider} results: {message}")]
    Parse {
        /// Provider name.
        provider: String,
        /// Description of what was missing.
        message: String,
    },

    /// Run parameters were rejected at construction.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The run was cancelled between URLs.
    #[error("Run cancelled: {0}")]
    Cancelled(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SerpError {
    /// Creates a rate-limited error.
    #[must_use]
    pub fn rate_limited(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable kind name.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidQuery(_) => "InvalidQuery",
            Self::RateLimited { .. } => "RateLimited",
            Self::Network { .. } => "NetworkError",
            Self::Parse { .. } => "ParseError",
            Self::InvalidConfig(_) => "InvalidConfig",
            Self::Cancelled(_) => "Cancelled",
            Self::Serialization(_) => "SerializationError",
            Self::Io(_) => "IoError",
        }
    }

    /// Whether this error came from resolving the results listing.
    #[must_use]
    pub fn is_resolver_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidQuery(_)
                | Self::RateLimited { .. }
                | Self::Network { .. }
                | Self::Parse { .. }
        )
    }
}

impl From<serde_json::Error> for SerpError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<csv::Error> for SerpError {
    fn from(err: csv::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Classification of a single URL's fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FetchErrorKind {
    /// The URL had no scheme/host or an unsupported scheme.
    #[serde(rename = "InvalidURL")]
    InvalidUrl,
    /// The redirect chain exceeded the configured limit.
    TooManyRedirects,
    /// The server answered with a non-2xx status.
    #[serde(rename = "HTTPError")]
    HttpError,
    /// The request did not complete within its timeout.
    Timeout,
    /// Any other transport failure.
    NetworkError,
}

impl FetchErrorKind {
    /// Stable name, identical to the serialized form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidUrl => "InvalidURL",
            Self::TooManyRedirects => "TooManyRedirects",
            Self::HttpError => "HTTPError",
            Self::Timeout => "Timeout",
            Self::NetworkError => "NetworkError",
        }
    }

    /// Parses the stable name back into a kind.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "InvalidURL" => Some(Self::InvalidUrl),
            "TooManyRedirects" => Some(Self::TooManyRedirects),
            "HTTPError" => Some(Self::HttpError),
            "Timeout" => Some(Self::Timeout),
            "NetworkError" => Some(Self::NetworkError),
            _ => None,
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_display() {
        let err = SerpError::rate_limited("google", "captcha form present");
        assert_eq!(
            err.to_string(),
            "Rate limited by google: captcha form present"
        );
        assert_eq!(err.kind(), "RateLimited");
        assert!(err.is_resolver_error());
    }

    #[test]
    fn test_io_error_is_not_resolver_error() {
        let err: SerpError = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert!(!err.is_resolver_error());
        assert_eq!(err.kind(), "IoError");
    }

    #[test]
    fn test_fetch_error_kind_names_round_trip() {
        for kind in [
            FetchErrorKind::InvalidUrl,
            FetchErrorKind::TooManyRedirects,
            FetchErrorKind::HttpError,
            FetchErrorKind::Timeout,
            FetchErrorKind::NetworkError,
        ] {
            assert_eq!(FetchErrorKind::parse(kind.as_str()), Some(kind));
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        assert_eq!(FetchErrorKind::parse("Bogus"), None);
    }
}
