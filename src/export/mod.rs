//! Export of generated variations.
//!
//! Provides CSV and single-sheet XLSX writers over `(variation, message)` rows.

pub mod delimited;
pub mod spreadsheet;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::ExportError;
use crate::generation::ExportRow;

pub use delimited::{export_delimited, write_delimited};
pub use spreadsheet::{export_spreadsheet, write_spreadsheet};

/// Header row shared by both formats.
pub const HEADER: [&str; 2] = ["Variation", "Message"];

/// Default CSV file name, written to the working directory.
pub const CSV_FILE_NAME: &str = "variations_export.csv";

/// Default XLSX file name, written to the working directory.
pub const XLSX_FILE_NAME: &str = "variations_export.xlsx";

/// Supported export file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    /// Default file name written to the working directory.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            ExportFormat::Csv => CSV_FILE_NAME,
            ExportFormat::Xlsx => XLSX_FILE_NAME,
        }
    }

    /// Default export path in the current working directory.
    pub fn default_path(&self) -> Result<PathBuf, ExportError> {
        Ok(std::env::current_dir()?.join(self.default_file_name()))
    }

    /// Infer the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match ext.as_deref() {
            Some("csv") => Ok(ExportFormat::Csv),
            Some("xlsx") => Ok(ExportFormat::Xlsx),
            _ => Err(ExportError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" => Ok(ExportFormat::Xlsx),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Write `rows` to `path` in the given format.
pub fn export(format: ExportFormat, rows: &[ExportRow], path: &Path) -> Result<(), ExportError> {
    match format {
        ExportFormat::Csv => export_delimited(rows, path),
        ExportFormat::Xlsx => export_spreadsheet(rows, path),
    }
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
