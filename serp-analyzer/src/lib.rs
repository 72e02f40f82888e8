//! # SERP Analyzer
//!
//! Looks up the top search results for a query, fetches each result page and
//! extracts its title, meta description and `<h1>`..`<h6>` headings.
//!
//! A run has four parts:
//!
//! - **Rank resolution**: query a search provider and keep the organic result URLs
//! - **Page fetching**: one GET per URL, failures classified instead of raised
//! - **Field extraction**: a pure function from HTML to [`models::PageFields`]
//! - **Orchestration**: sequential processing with a polite delay, progress
//!   reporting and cooperative cancellation
//!
//! The resulting [`models::AnalysisReport`] can be written as JSON and CSV
//! with [`output::ReportWriter`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use serp_analyzer::prelude::*;
//!
//! let config = RunConfig::new("rust web frameworks", 10, 2.0)?;
//! let report = Pipeline::from_config(&config)?.run(&config).await?;
//!
//! let written = ReportWriter::new("reports").write(&report)?;
//! println!("{}", written.json_path.display());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod errors;
pub mod extractor;
pub mod fetcher;
pub mod models;
pub mod observability;
pub mod output;
pub mod pipeline;
pub mod resolver;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        FetchConfig, ResolverConfig, RetryConfig, RunConfig, SearchProvider, MAX_RESULTS,
    };
    pub use crate::errors::{FetchErrorKind, SerpError};
    pub use crate::extractor::{extract, HtmlDocument, ScraperDocument};
    pub use crate::fetcher::{FetchOutcome, FetchedPage, FetchFailure, HttpPageFetcher, PageFetcher};
    pub use crate::models::{
        AnalysisReport, EntryOutcome, ErrorDescriptor, Headers, HeadingLevel, PageFields,
        PageRecord, RankedUrl, ReportEntry, ReportSummary,
    };
    pub use crate::output::{ReportWriter, WrittenArtifacts};
    pub use crate::pipeline::{
        CancellationToken, ChannelProgressObserver, LoggingProgressObserver,
        NoOpProgressObserver, Pipeline, ProgressEvent, ProgressObserver, ProgressUpdate,
    };
    pub use crate::resolver::{HttpRankResolver, RankResolver};
}
