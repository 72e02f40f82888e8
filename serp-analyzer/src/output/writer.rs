//! Writes both report artifacts to a directory.

use std::fs::{self, File, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

use super::csv_report::write_csv;
use super::json_report::write_json;
use crate::errors::SerpError;
use crate::models::AnalysisReport;

/// Longest query prefix kept in file names.
const MAX_STEM_CHARS: usize = 80;

/// Paths of the artifacts produced by [`ReportWriter::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifacts {
    /// The JSON document.
    pub json_path: PathBuf,
    /// The CSV table.
    pub csv_path: PathBuf,
}

/// Writes a report as `<query>_<YYYYmmdd_HHMMSS>.json` and `.csv`.
///
/// Existing files are never replaced. When the name is taken, the first
/// eight hex digits of the run id are appended to the stem.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    /// Creates a writer targeting `dir`, which is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name stem for `report`, without extension.
    #[must_use]
    pub fn file_stem(report: &AnalysisReport) -> String {
        format!(
            "{}_{}",
            sanitize_query(&report.query),
            report.generated_at.format("%Y%m%d_%H%M%S")
        )
    }

    /// Writes both artifacts, creating the directory if needed.
    pub fn write(&self, report: &AnalysisReport) -> Result<WrittenArtifacts, SerpError> {
        fs::create_dir_all(&self.dir)?;
        let mut stem = Self::file_stem(report);
        if self.is_taken(&stem) {
            let run_id = report.run_id.simple().to_string();
            stem = format!("{stem}_{}", &run_id[..8]);
        }
        let json_path = self.dir.join(format!("{stem}.json"));
        let csv_path = self.dir.join(format!("{stem}.csv"));

        write_json(report, BufWriter::new(create_new(&json_path)?))?;
        write_csv(report, BufWriter::new(create_new(&csv_path)?))?;

        info!(
            json = %json_path.display(),
            csv = %csv_path.display(),
            entries = report.len(),
            "Wrote report"
        );
        Ok(WrittenArtifacts {
            json_path,
            csv_path,
        })
    }

    fn is_taken(&self, stem: &str) -> bool {
        ["json", "csv"]
            .iter()
            .any(|ext| self.dir.join(format!("{stem}.{ext}")).exists())
    }
}

fn create_new(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}

/// Spaces become underscores; anything unsafe in a file name is dropped.
fn sanitize_query(query: &str) -> String {
    let stem: String = query
        .trim()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            c if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') => Some(c),
            _ => None,
        })
        .take(MAX_STEM_CHARS)
        .collect();
    let stem = stem.trim_matches('.');

    if stem.is_empty() {
        "report".to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FetchErrorKind;
    use crate::models::{ErrorDescriptor, PageFields, RankedUrl, ReportEntry};
    use crate::output::{from_csv_str, from_json_str};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn report(query: &str) -> AnalysisReport {
        let mut report = AnalysisReport::new(query, 2);
        report.generated_at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        report
    }

    #[test]
    fn test_sanitize_query() {
        assert_eq!(sanitize_query("best rust books"), "best_rust_books");
        assert_eq!(sanitize_query("site:example.com a/b"), "siteexample.com_ab");
        assert_eq!(sanitize_query("../.."), "report");
        assert_eq!(sanitize_query("???"), "report");
        assert_eq!(sanitize_query(&"x".repeat(200)).len(), MAX_STEM_CHARS);
    }

    #[test]
    fn test_file_stem_uses_timestamp() {
        assert_eq!(
            ReportWriter::file_stem(&report("rust async")),
            "rust_async_20240309_140507"
        );
    }

    #[test]
    fn test_write_creates_both_artifacts() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("out");
        let writer = ReportWriter::new(&dir);

        let mut report = report("rust async");
        let ranked = RankedUrl::rank_all(["https://a.example/", "https://b.example/"]);
        report.entries.push(ReportEntry::page(&ranked[0], PageFields::new().with_title("A")));
        report.entries.push(ReportEntry::error(
            &ranked[1],
            ErrorDescriptor::new(FetchErrorKind::TooManyRedirects, "redirect loop"),
        ));

        let written = writer.write(&report).unwrap();

        assert_eq!(written.json_path, dir.join("rust_async_20240309_140507.json"));
        assert_eq!(written.csv_path, dir.join("rust_async_20240309_140507.csv"));

        let json = fs::read_to_string(&written.json_path).unwrap();
        assert_eq!(from_json_str(&json).unwrap(), report);
        let csv = fs::read_to_string(&written.csv_path).unwrap();
        assert_eq!(from_csv_str(&csv).unwrap(), report.entries);
    }

    #[test]
    fn test_write_same_second_keeps_both_runs() {
        let tmp = TempDir::new().unwrap();
        let writer = ReportWriter::new(tmp.path());
        let first = report("rust async");
        let second = report("rust async");

        let a = writer.write(&first).unwrap();
        let b = writer.write(&second).unwrap();

        assert_ne!(a.json_path, b.json_path);
        assert_ne!(a.csv_path, b.csv_path);
        let suffix = &second.run_id.simple().to_string()[..8];
        assert_eq!(
            b.json_path,
            tmp.path().join(format!("rust_async_20240309_140507_{suffix}.json"))
        );
        let json = fs::read_to_string(&a.json_path).unwrap();
        assert_eq!(from_json_str(&json).unwrap().run_id, first.run_id);
        let json = fs::read_to_string(&b.json_path).unwrap();
        assert_eq!(from_json_str(&json).unwrap().run_id, second.run_id);
    }

    #[test]
    fn test_write_never_replaces_existing_files() {
        let tmp = TempDir::new().unwrap();
        let writer = ReportWriter::new(tmp.path());
        let report = report("rust async");

        writer.write(&report).unwrap();
        writer.write(&report).unwrap();
        let err = writer.write(&report).unwrap_err();
        assert!(matches!(err, SerpError::Io(_)), "{err}");
    }

    #[test]
    fn test_write_empty_report() {
        let tmp = TempDir::new().unwrap();
        let written = ReportWriter::new(tmp.path()).write(&report("nothing here")).unwrap();

        let json = fs::read_to_string(&written.json_path).unwrap();
        assert!(from_json_str(&json).unwrap().is_empty());
        let csv = fs::read_to_string(&written.csv_path).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
