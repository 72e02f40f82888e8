//! Data models for ranked results, extracted page fields and reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::FetchErrorKind;

/// A result URL with its 1-based position in the listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RankedUrl {
    /// 1-based rank.
    pub rank: u32,
    /// Result URL.
    pub url: String,
}

impl RankedUrl {
    /// Creates a ranked URL.
    #[must_use]
    pub fn new(rank: u32, url: impl Into<String>) -> Self {
        Self {
            rank,
            url: url.into(),
        }
    }

    /// Assigns ranks 1..=n to URLs in listing order.
    #[must_use]
    pub fn rank_all<I, S>(urls: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        (1u32..)
            .zip(urls)
            .map(|(rank, url)| Self::new(rank, url))
            .collect()
    }
}

/// Heading level `h1` through `h6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HeadingLevel {
    /// `<h1>`
    H1,
    /// `<h2>`
    H2,
    /// `<h3>`
    H3,
    /// `<h4>`
    H4,
    /// `<h5>`
    H5,
    /// `<h6>`
    H6,
}

impl HeadingLevel {
    /// All levels in order.
    pub const ALL: [Self; 6] = [Self::H1, Self::H2, Self::H3, Self::H4, Self::H5, Self::H6];

    /// Lowercase tag name.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
            Self::H4 => "h4",
            Self::H5 => "h5",
            Self::H6 => "h6",
        }
    }

    /// Looks up a level by tag name, ignoring ASCII case.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.tag().eq_ignore_ascii_case(tag))
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Heading texts per level, in document order.
///
/// Every level is always present; a level with no elements is an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headers {
    /// `<h1>` texts.
    #[serde(default)]
    pub h1: Vec<String>,
    /// `<h2>` texts.
    #[serde(default)]
    pub h2: Vec<String>,
    /// `<h3>` texts.
    #[serde(default)]
    pub h3: Vec<String>,
    /// `<h4>` texts.
    #[serde(default)]
    pub h4: Vec<String>,
    /// `<h5>` texts.
    #[serde(default)]
    pub h5: Vec<String>,
    /// `<h6>` texts.
    #[serde(default)]
    pub h6: Vec<String>,
}

impl Headers {
    /// Creates an empty set of headers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Texts for a level.
    #[must_use]
    pub fn get(&self, level: HeadingLevel) -> &[String] {
        match level {
            HeadingLevel::H1 => &self.h1,
            HeadingLevel::H2 => &self.h2,
            HeadingLevel::H3 => &self.h3,
            HeadingLevel::H4 => &self.h4,
            HeadingLevel::H5 => &self.h5,
            HeadingLevel::H6 => &self.h6,
        }
    }

    /// Mutable texts for a level.
    pub fn get_mut(&mut self, level: HeadingLevel) -> &mut Vec<String> {
        match level {
            HeadingLevel::H1 => &mut self.h1,
            HeadingLevel::H2 => &mut self.h2,
            HeadingLevel::H3 => &mut self.h3,
            HeadingLevel::H4 => &mut self.h4,
            HeadingLevel::H5 => &mut self.h5,
            HeadingLevel::H6 => &mut self.h6,
        }
    }

    /// Appends a heading text to its level.
    pub fn push(&mut self, level: HeadingLevel, text: impl Into<String>) {
        self.get_mut(level).push(text.into());
    }

    /// Iterates levels with their texts in `h1`..`h6` order.
    pub fn iter(&self) -> impl Iterator<Item = (HeadingLevel, &[String])> + '_ {
        HeadingLevel::ALL
            .into_iter()
            .map(move |level| (level, self.get(level)))
    }

    /// Total number of headings across all levels.
    #[must_use]
    pub fn total(&self) -> usize {
        self.iter().map(|(_, texts)| texts.len()).sum()
    }
}

/// Structural fields extracted from one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFields {
    /// Text of the first `<title>`.
    pub title: Option<String>,
    /// `content` of `<meta name="description">`.
    pub meta_description: Option<String>,
    /// Heading texts by level.
    #[serde(flatten)]
    pub headers: Headers,
}

impl PageFields {
    /// Creates empty fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the meta description.
    #[must_use]
    pub fn with_meta_description(mut self, desc: impl Into<String>) -> Self {
        self.meta_description = Some(desc.into());
        self
    }

    /// Appends a heading.
    #[must_use]
    pub fn with_heading(mut self, level: HeadingLevel, text: impl Into<String>) -> Self {
        self.headers.push(level, text);
        self
    }
}

/// Extracted fields tied to their rank and URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// 1-based rank.
    pub rank: u32,
    /// Page URL as resolved.
    pub url: String,
    /// Extracted fields.
    #[serde(flatten)]
    pub fields: PageFields,
}

/// Why a single URL produced no page record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    /// Failure classification.
    pub kind: FetchErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl ErrorDescriptor {
    /// Creates an error descriptor.
    #[must_use]
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Outcome of one report entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum EntryOutcome {
    /// Page fetched and extracted.
    #[serde(rename = "ok")]
    Page(PageFields),
    /// Page could not be fetched.
    Error(ErrorDescriptor),
}

/// One row of an analysis report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// 1-based rank.
    pub rank: u32,
    /// Page URL as resolved.
    pub url: String,
    /// Success or per-URL error.
    pub outcome: EntryOutcome,
}

impl ReportEntry {
    /// Creates a successful entry.
    #[must_use]
    pub fn page(ranked: &RankedUrl, fields: PageFields) -> Self {
        Self {
            rank: ranked.rank,
            url: ranked.url.clone(),
            outcome: EntryOutcome::Page(fields),
        }
    }

    /// Creates an error entry.
    #[must_use]
    pub fn error(ranked: &RankedUrl, error: ErrorDescriptor) -> Self {
        Self {
            rank: ranked.rank,
            url: ranked.url.clone(),
            outcome: EntryOutcome::Error(error),
        }
    }

    /// Whether the page was fetched and extracted.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, EntryOutcome::Page(_))
    }

    /// Extracted fields, if successful.
    #[must_use]
    pub fn fields(&self) -> Option<&PageFields> {
        match &self.outcome {
            EntryOutcome::Page(fields) => Some(fields),
            EntryOutcome::Error(_) => None,
        }
    }

    /// Error descriptor, if failed.
    #[must_use]
    pub fn error_descriptor(&self) -> Option<&ErrorDescriptor> {
        match &self.outcome {
            EntryOutcome::Page(_) => None,
            EntryOutcome::Error(err) => Some(err),
        }
    }

    /// Converts a successful entry into a page record.
    #[must_use]
    pub fn to_page_record(&self) -> Option<PageRecord> {
        self.fields().map(|fields| PageRecord {
            rank: self.rank,
            url: self.url.clone(),
            fields: fields.clone(),
        })
    }

    /// Short description for progress displays.
    #[must_use]
    pub fn summary(&self) -> String {
        match &self.outcome {
            EntryOutcome::Page(fields) => format!(
                "ok ({} headings, title {})",
                fields.headers.total(),
                if fields.title.is_some() { "present" } else { "absent" }
            ),
            EntryOutcome::Error(err) => err.to_string(),
        }
    }
}

/// The complete ordered outcome of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Unique run identifier.
    pub run_id: Uuid,
    /// Query the run resolved.
    pub query: String,
    /// Number of results requested (after clamping).
    pub requested: u32,
    /// When the run finished.
    pub generated_at: DateTime<Utc>,
    /// One entry per resolved URL, rank ascending.
    pub entries: Vec<ReportEntry>,
}

impl AnalysisReport {
    /// Creates an empty report for a query.
    #[must_use]
    pub fn new(query: impl Into<String>, requested: u32) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            query: query.into(),
            requested,
            generated_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the report has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Successful page records in rank order.
    pub fn pages(&self) -> impl Iterator<Item = PageRecord> + '_ {
        self.entries.iter().filter_map(ReportEntry::to_page_record)
    }

    /// Failed entries in rank order.
    pub fn failures(&self) -> impl Iterator<Item = &ReportEntry> + '_ {
        self.entries.iter().filter(|entry| !entry.is_success())
    }

    /// Aggregate counts over the report.
    #[must_use]
    pub fn summary(&self) -> ReportSummary {
        ReportSummary::from_entries(&self.entries)
    }
}

/// Aggregate statistics over a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Entries in the report.
    pub total: usize,
    /// Entries with page fields.
    pub succeeded: usize,
    /// Entries with an error descriptor.
    pub failed: usize,
    /// Mean `<h1>` count over successful pages.
    pub avg_h1: f64,
    /// Mean `<h2>` count over successful pages.
    pub avg_h2: f64,
}

impl ReportSummary {
    /// Computes the summary for a slice of entries.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_entries(entries: &[ReportEntry]) -> Self {
        let pages: Vec<&PageFields> = entries.iter().filter_map(ReportEntry::fields).collect();
        let succeeded = pages.len();
        let mean = |level: HeadingLevel| {
            if succeeded == 0 {
                0.0
            } else {
                pages.iter().map(|p| p.headers.get(level).len()).sum::<usize>() as f64
                    / succeeded as f64
            }
        };

        Self {
            total: entries.len(),
            succeeded,
            failed: entries.len() - succeeded,
            avg_h1: mean(HeadingLevel::H1),
            avg_h2: mean(HeadingLevel::H2),
        }
    }
}
