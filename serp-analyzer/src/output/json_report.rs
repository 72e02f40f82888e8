//! JSON report rendering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use uuid::Uuid;

use super::rows::{rows_to_entries, ReportRow};
use crate::errors::SerpError;
use crate::models::{AnalysisReport, ReportSummary};

/// On-disk JSON layout: run metadata plus one row per entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ReportDocument {
    run_id: Uuid,
    query: String,
    requested: u32,
    generated_at: DateTime<Utc>,
    #[serde(default)]
    summary: Option<ReportSummary>,
    entries: Vec<ReportRow>,
}

impl From<&AnalysisReport> for ReportDocument {
    fn from(report: &AnalysisReport) -> Self {
        Self {
            run_id: report.run_id,
            query: report.query.clone(),
            requested: report.requested,
            generated_at: report.generated_at,
            summary: Some(report.summary()),
            entries: report.entries.iter().map(ReportRow::from).collect(),
        }
    }
}

/// Renders `report` as pretty-printed JSON.
pub fn to_json_string(report: &AnalysisReport) -> Result<String, SerpError> {
    Ok(serde_json::to_string_pretty(&ReportDocument::from(report))?)
}

/// Writes `report` as pretty-printed JSON to `writer`.
pub fn write_json<W: Write>(report: &AnalysisReport, mut writer: W) -> Result<(), SerpError> {
    serde_json::to_writer_pretty(&mut writer, &ReportDocument::from(report))?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Reads a report previously rendered by [`to_json_string`].
///
/// The stored summary is ignored; it is derived from the entries.
pub fn from_json_str(json: &str) -> Result<AnalysisReport, SerpError> {
    let document: ReportDocument = serde_json::from_str(json)?;
    Ok(AnalysisReport {
        run_id: document.run_id,
        query: document.query,
        requested: document.requested,
        generated_at: document.generated_at,
        entries: rows_to_entries(document.entries)?,
    })
}
