//! CSV export of generated variations.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::ExportError;
use crate::generation::ExportRow;

use super::{ensure_parent_dir, HEADER};

/// Write rows as UTF-8 CSV with a `Variation,Message` header.
///
/// Overwrites `path` if it exists.
pub fn export_delimited(rows: &[ExportRow], path: &Path) -> Result<(), ExportError> {
    ensure_parent_dir(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    write_delimited(rows, &mut writer)?;
    writer.flush()?;

    tracing::info!(path = %path.display(), rows = rows.len(), "Exported CSV");
    Ok(())
}

/// Write CSV to any writer.
pub fn write_delimited<W: Write>(rows: &[ExportRow], writer: &mut W) -> std::io::Result<()> {
    write_record(writer, &HEADER)?;
    for row in rows {
        write_record(writer, &[row.variation_name.as_str(), row.message.as_str()])?;
    }
    Ok(())
}

fn write_record<W: Write>(writer: &mut W, fields: &[&str]) -> std::io::Result<()> {
    let line = fields
        .iter()
        .map(|field| escape_field(field))
        .collect::<Vec<_>>()
        .join(",");
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")
}

/// Quote a field when it contains the delimiter, a quote, or a line break.
pub fn escape_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') || raw.contains('\r') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
