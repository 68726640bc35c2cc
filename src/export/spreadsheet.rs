//! XLSX export of generated variations.
//!
//! Writes the smallest Office Open XML package spreadsheet applications
//! accept: content types, package and workbook relationships, a workbook
//! with one sheet, and the sheet itself using inline-string cells.

use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ExportError;
use crate::generation::ExportRow;

use super::{ensure_parent_dir, HEADER};

/// Name of the single worksheet.
pub const SHEET_NAME: &str = "Sheet1";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

/// Write rows as a single-sheet XLSX workbook with a `Variation | Message` header.
///
/// Overwrites `path` if it exists.
pub fn export_spreadsheet(rows: &[ExportRow], path: &Path) -> Result<(), ExportError> {
    ensure_parent_dir(path)?;
    let file = File::create(path)?;
    write_spreadsheet(rows, file)?;

    tracing::info!(path = %path.display(), rows = rows.len(), "Exported XLSX");
    Ok(())
}

/// Write the XLSX package to any seekable writer.
pub fn write_spreadsheet<W: Write + Seek>(rows: &[ExportRow], writer: W) -> Result<W, ExportError> {
    let mut zip = ZipWriter::new(writer);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
        ("_rels/.rels", ROOT_RELS_XML.to_string()),
        ("xl/workbook.xml", workbook_xml()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML.to_string()),
        ("xl/worksheets/sheet1.xml", sheet_xml(rows)),
    ];

    for (name, content) in parts {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
    }

    Ok(zip.finish()?)
}

fn workbook_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        SHEET_NAME
    )
}

/// Worksheet XML: header in row 1, one row per export row after it.
fn sheet_xml(rows: &[ExportRow]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    xml.push_str(&row_xml(1, &HEADER));
    for (i, row) in rows.iter().enumerate() {
        xml.push_str(&row_xml(i + 2, &[row.variation_name.as_str(), row.message.as_str()]));
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn row_xml(row_number: usize, cells: &[&str]) -> String {
    let cells_xml: String = cells
        .iter()
        .enumerate()
        .map(|(col, value)| {
            format!(
                r#"<c r="{}{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                column_letter(col),
                row_number,
                escape_xml_text(value)
            )
        })
        .collect();
    format!(r#"<row r="{}">{}</row>"#, row_number, cells_xml)
}

/// Column letter for a 0-based column index (A..Z, AA..).
fn column_letter(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// Escape XML markup and drop characters XML 1.0 cannot carry.
///
/// `\r` is written as a character reference; a literal one would be
/// normalized to `\n` by XML parsers.
fn escape_xml_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .filter(|c| !matches!(c, '\u{FFFE}' | '\u{FFFF}'))
        .collect::<String>()
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
        .replace('\r', "&#13;")
}
