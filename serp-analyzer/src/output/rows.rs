//! The flat row schema shared by both output formats.

use serde::{Deserialize, Serialize};

use crate::errors::{FetchErrorKind, SerpError};
use crate::models::{EntryOutcome, ErrorDescriptor, Headers, PageFields, ReportEntry};

/// Column names, in output order.
pub const COLUMNS: [&str; 13] = [
    "rank",
    "url",
    "status",
    "title",
    "meta_description",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "error_kind",
    "error_message",
];

/// Whether a row carries page fields or an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    /// Page fields are populated.
    Ok,
    /// Error columns are populated.
    Error,
}

impl RowStatus {
    /// Cell value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }

    /// Parses a cell value.
    pub fn parse(value: &str) -> Result<Self, SerpError> {
        match value {
            "ok" => Ok(Self::Ok),
            "error" => Ok(Self::Error),
            other => Err(SerpError::Serialization(format!(
                "unknown row status '{other}'"
            ))),
        }
    }
}

/// One report entry flattened to the shared column set.
///
/// Every column is always present: page columns are `None`/empty on error
/// rows and error columns are `None` on page rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    /// 1-based rank.
    pub rank: u32,
    /// Result URL.
    pub url: String,
    /// Row kind.
    pub status: RowStatus,
    /// Page title.
    pub title: Option<String>,
    /// Meta description.
    pub meta_description: Option<String>,
    /// `<h1>` texts.
    pub h1: Vec<String>,
    /// `<h2>` texts.
    pub h2: Vec<String>,
    /// `<h3>` texts.
    pub h3: Vec<String>,
    /// `<h4>` texts.
    pub h4: Vec<String>,
    /// `<h5>` texts.
    pub h5: Vec<String>,
    /// `<h6>` texts.
    pub h6: Vec<String>,
    /// Failure kind.
    pub error_kind: Option<FetchErrorKind>,
    /// Failure detail.
    pub error_message: Option<String>,
}

impl From<&ReportEntry> for ReportRow {
    fn from(entry: &ReportEntry) -> Self {
        let mut row = Self {
            rank: entry.rank,
            url: entry.url.clone(),
            status: RowStatus::Ok,
            title: None,
            meta_description: None,
            h1: Vec::new(),
            h2: Vec::new(),
            h3: Vec::new(),
            h4: Vec::new(),
            h5: Vec::new(),
            h6: Vec::new(),
            error_kind: None,
            error_message: None,
        };

        match &entry.outcome {
            EntryOutcome::Page(fields) => {
                row.title.clone_from(&fields.title);
                row.meta_description.clone_from(&fields.meta_description);
                let Headers { h1, h2, h3, h4, h5, h6 } = fields.headers.clone();
                row.h1 = h1;
                row.h2 = h2;
                row.h3 = h3;
                row.h4 = h4;
                row.h5 = h5;
                row.h6 = h6;
            }
            EntryOutcome::Error(err) => {
                row.status = RowStatus::Error;
                row.error_kind = Some(err.kind);
                row.error_message = Some(err.message.clone());
            }
        }
        row
    }
}

impl TryFrom<ReportRow> for ReportEntry {
    type Error = SerpError;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        let outcome = match row.status {
            RowStatus::Ok => EntryOutcome::Page(PageFields {
                title: row.title,
                meta_description: row.meta_description,
                headers: Headers {
                    h1: row.h1,
                    h2: row.h2,
                    h3: row.h3,
                    h4: row.h4,
                    h5: row.h5,
                    h6: row.h6,
                },
            }),
            RowStatus::Error => {
                let kind = row.error_kind.ok_or_else(|| {
                    SerpError::Serialization(format!("error row {} has no error_kind", row.rank))
                })?;
                EntryOutcome::Error(ErrorDescriptor::new(
                    kind,
                    row.error_message.unwrap_or_default(),
                ))
            }
        };

        Ok(Self {
            rank: row.rank,
            url: row.url,
            outcome,
        })
    }
}

/// Converts read-back rows into entries, in file order.
pub fn rows_to_entries(rows: Vec<ReportRow>) -> Result<Vec<ReportEntry>, SerpError> {
    rows.into_iter().map(ReportEntry::try_from).collect()
}
