//! Report serialization.
//!
//! Both formats share the [`ReportRow`] column set so a rank can be
//! correlated across them, and both read back into the same entries.

mod csv_report;
mod json_report;
mod rows;
mod writer;

pub use csv_report::{from_csv_str, read_csv, to_csv_string, write_csv};
pub use json_report::{from_json_str, to_json_string, write_json};
pub use rows::{rows_to_entries, ReportRow, RowStatus, COLUMNS};
pub use writer::{ReportWriter, WrittenArtifacts};
