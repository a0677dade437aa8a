// 📂 Loader - Raw tabular ingestion
// Parses the two input files (CSV or Excel) into untyped text tables.
//
// Two quirks drive this module:
// - The Ternium catalog ships with two title/metadata rows before the
//   real header, so the caller picks the header row index.
// - The Odoo export must be read with every cell as TEXT. Reading
//   "0001234" as a number destroys the leading zeros and the codes
//   never match again.

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use std::path::Path;

// ============================================================================
// TABLE FORMAT
// ============================================================================

/// Declared format of an input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Delimited text (comma)
    Csv,
    /// Excel spreadsheet (xlsx)
    Xlsx,
}

impl TableFormat {
    pub fn name(&self) -> &str {
        match self {
            TableFormat::Csv => "CSV",
            TableFormat::Xlsx => "Excel",
        }
    }

    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Result<TableFormat> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => Ok(TableFormat::Csv),
            "xlsx" | "xlsm" => Ok(TableFormat::Xlsx),
            other => Err(anyhow!(
                "Unsupported file format '.{}' for '{}' (expected .csv or .xlsx)",
                other,
                path.display()
            )),
        }
    }
}

// ============================================================================
// RAW TABLE
// ============================================================================

/// An untyped table: one header row plus data rows, all cells as text.
/// Rows may be ragged (shorter than the header); `cell` pads with "".
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Find a column by exact header name (after trimming the header cell)
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Find the first column whose header contains `needle`
    /// (case-insensitive). Used for loosely-named columns like the
    /// bonus price, whose exact header drifted between catalog
    /// revisions.
    pub fn find_column_containing(&self, needle: &str) -> Option<usize> {
        let needle_lower = needle.to_lowercase();
        self.headers
            .iter()
            .position(|h| h.to_lowercase().contains(&needle_lower))
    }

    /// Cell text at (row, column); missing cells read as ""
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Load a table from raw bytes.
///
/// `header_row` is 0-based: rows before it are skipped as metadata,
/// the row at that index becomes the header, everything after is data.
/// `source_name` appears in error messages ("Odoo", "Ternium").
pub fn load_table(
    bytes: &[u8],
    format: TableFormat,
    header_row: usize,
    source_name: &str,
) -> Result<RawTable> {
    match format {
        TableFormat::Csv => load_csv(bytes, header_row, source_name),
        TableFormat::Xlsx => load_xlsx(bytes, header_row, source_name),
    }
}

/// Load a table from a file path, detecting the format by extension
pub fn load_table_from_path(path: &Path, header_row: usize, source_name: &str) -> Result<RawTable> {
    let format = TableFormat::from_path(path)?;
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read {} file '{}'", source_name, path.display()))?;
    load_table(&bytes, format, header_row, source_name)
}

fn load_csv(bytes: &[u8], header_row: usize, source_name: &str) -> Result<RawTable> {
    let content = decode_utf8_lossy_1252(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut all_rows: Vec<Vec<String>> = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("CSV parse error in {} at line {}", source_name, i + 1))?;
        all_rows.push(record.iter().map(|f| f.to_string()).collect());
    }

    split_header(all_rows, header_row, source_name)
}

fn load_xlsx(bytes: &[u8], header_row: usize, source_name: &str) -> Result<RawTable> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| anyhow!("Could not open {} workbook: {}", source_name, e))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("{} workbook has no sheets", source_name))?
        .map_err(|e| anyhow!("Could not read first sheet of {}: {}", source_name, e))?;

    let all_rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(render_cell_as_text).collect())
        .collect();

    split_header(all_rows, header_row, source_name)
}

/// Split raw rows into header + data, skipping `header_row` metadata rows
fn split_header(
    mut all_rows: Vec<Vec<String>>,
    header_row: usize,
    source_name: &str,
) -> Result<RawTable> {
    if all_rows.len() <= header_row {
        return Err(anyhow!(
            "{} file has {} row(s) but the header is expected at row {}; file is empty or truncated",
            source_name,
            all_rows.len(),
            header_row + 1
        ));
    }

    let rows = all_rows.split_off(header_row + 1);
    match all_rows.pop() {
        Some(headers) => Ok(RawTable { headers, rows }),
        None => Err(anyhow!("{} file has no header row", source_name)),
    }
}

/// Render a spreadsheet cell as text without inventing precision.
/// Text cells pass through untouched (leading zeros survive);
/// numeric cells use the shortest exact decimal rendering, so an
/// integer-valued float comes out as "123", not "123.0".
fn render_cell_as_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

/// Decode CSV bytes as UTF-8, falling back to Windows-1252.
/// Excel on Windows still exports Latin CSVs; "Precio con envío"
/// arrives as 1252 bytes often enough to matter.
fn decode_utf8_lossy_1252(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
