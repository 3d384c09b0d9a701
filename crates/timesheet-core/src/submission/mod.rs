//! Submission gateway: spreadsheet export and remote upload.

pub mod export;
mod remote;

pub use export::{export_file_name, rows, write_export, CsvExporter, ExportRow, Exporter};
pub use remote::RemoteSubmitter;
