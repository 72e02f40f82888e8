//! CSV report rendering.
//!
//! One row per entry using [`COLUMNS`]. Absent values are empty cells and
//! heading lists are stored as JSON arrays so texts containing commas or
//! newlines survive a round trip.

use std::io::{Read, Write};

use super::rows::{rows_to_entries, ReportRow, RowStatus, COLUMNS};
use crate::errors::{FetchErrorKind, SerpError};
use crate::models::{AnalysisReport, ReportEntry};

/// Writes `report` as CSV to `writer`, header row first.
pub fn write_csv<W: Write>(report: &AnalysisReport, writer: W) -> Result<(), SerpError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(COLUMNS)?;
    for entry in &report.entries {
        out.write_record(row_cells(&ReportRow::from(entry))?)?;
    }
    out.flush()?;
    Ok(())
}

/// Renders `report` as a CSV string.
pub fn to_csv_string(report: &AnalysisReport) -> Result<String, SerpError> {
    let mut buf = Vec::new();
    write_csv(report, &mut buf)?;
    String::from_utf8(buf).map_err(|e| SerpError::Serialization(e.to_string()))
}

/// Reads entries back from CSV produced by [`write_csv`].
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<ReportEntry>, SerpError> {
    let mut input = csv::Reader::from_reader(reader);
    let headers = input.headers()?.clone();
    if !headers.iter().eq(COLUMNS) {
        return Err(SerpError::Serialization(format!(
            "unexpected CSV header: {}",
            headers.iter().collect::<Vec<_>>().join(",")
        )));
    }

    let mut rows = Vec::new();
    for record in input.records() {
        rows.push(parse_row(&record?)?);
    }
    rows_to_entries(rows)
}

/// Reads entries back from a CSV string.
pub fn from_csv_str(data: &str) -> Result<Vec<ReportEntry>, SerpError> {
    read_csv(data.as_bytes())
}

fn row_cells(row: &ReportRow) -> Result<Vec<String>, SerpError> {
    let mut cells = vec![
        row.rank.to_string(),
        row.url.clone(),
        row.status.as_str().to_string(),
        row.title.clone().unwrap_or_default(),
        row.meta_description.clone().unwrap_or_default(),
    ];
    for texts in [&row.h1, &row.h2, &row.h3, &row.h4, &row.h5, &row.h6] {
        cells.push(serde_json::to_string(texts)?);
    }
    cells.push(row.error_kind.map(|k| k.as_str().to_string()).unwrap_or_default());
    cells.push(row.error_message.clone().unwrap_or_default());
    Ok(cells)
}

fn parse_row(record: &csv::StringRecord) -> Result<ReportRow, SerpError> {
    let cell = |index: usize| record.get(index).unwrap_or_default();
    let optional = |index: usize| {
        let value = cell(index);
        (!value.is_empty()).then(|| value.to_string())
    };
    let headings = |index: usize| -> Result<Vec<String>, SerpError> {
        let value = cell(index);
        if value.is_empty() {
            Ok(Vec::new())
        } else {
            Ok(serde_json::from_str(value)?)
        }
    };

    let rank = cell(0)
        .parse()
        .map_err(|e| SerpError::Serialization(format!("bad rank '{}': {e}", cell(0))))?;
    let error_kind = match optional(11) {
        Some(name) => Some(
            FetchErrorKind::parse(&name)
                .ok_or_else(|| SerpError::Serialization(format!("unknown error kind '{name}'")))?,
        ),
        None => None,
    };

    Ok(ReportRow {
        rank,
        url: cell(1).to_string(),
        status: RowStatus::parse(cell(2))?,
        title: optional(3),
        meta_description: optional(4),
        h1: headings(5)?,
        h2: headings(6)?,
        h3: headings(7)?,
        h4: headings(8)?,
        h5: headings(9)?,
        h6: headings(10)?,
        error_kind,
        error_message: optional(12),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ErrorDescriptor, HeadingLevel, PageFields, RankedUrl};
    use pretty_assertions::assert_eq;

    fn sample_report() -> AnalysisReport {
        let ranked = RankedUrl::rank_all([
            "https://a.example/",
            "https://b.example/?q=1,2",
            "https://c.example/",
        ]);
        let mut report = AnalysisReport::new("csv check", 3);
        report.entries.push(ReportEntry::page(
            &ranked[0],
            PageFields::new()
                .with_title("Commas, \"quotes\" and more")
                .with_meta_description("Two\nlines")
                .with_heading(HeadingLevel::H1, "First, heading")
                .with_heading(HeadingLevel::H1, "[bracketed]")
                .with_heading(HeadingLevel::H6, "tiny"),
        ));
        report.entries.push(ReportEntry::error(
            &ranked[1],
            ErrorDescriptor::new(FetchErrorKind::HttpError, "HTTP 500 Internal Server Error"),
        ));
        report.entries.push(ReportEntry::page(&ranked[2], PageFields::new()));
        report
    }

    #[test]
    fn test_csv_round_trip() {
        let report = sample_report();
        let csv = to_csv_string(&report).unwrap();

        assert_eq!(from_csv_str(&csv).unwrap(), report.entries);
    }

    #[test]
    fn test_csv_header_and_empty_cells() {
        let csv = to_csv_string(&sample_report()).unwrap();
        let mut lines = csv.lines();

        assert_eq!(lines.next().unwrap(), COLUMNS.join(","));
        let last = csv.lines().last().unwrap();
        assert_eq!(last, "3,https://c.example/,ok,,,[],[],[],[],[],[],,");
    }

    #[test]
    fn test_empty_report_is_header_only() {
        let report = AnalysisReport::new("nothing", 5);
        let csv = to_csv_string(&report).unwrap();

        assert_eq!(csv.trim_end(), COLUMNS.join(","));
        assert!(from_csv_str(&csv).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_foreign_header() {
        let err = from_csv_str("a,b,c\n1,2,3\n").unwrap_err();
        assert!(matches!(err, SerpError::Serialization(_)));
    }

    #[test]
    fn test_rejects_unknown_error_kind() {
        let mut csv = COLUMNS.join(",");
        csv.push_str("\n1,https://a.example/,error,,,[],[],[],[],[],[],Exploded,boom\n");

        assert!(matches!(
            from_csv_str(&csv),
            Err(SerpError::Serialization(_))
        ));
    }
}
