use anyhow::{Context, Result};
use csv::ReaderBuilder;
use encoding_rs::WINDOWS_1257;
use rust_decimal::Decimal;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::ReportError;

const NBSP: char = '\u{a0}';

/// A POS export held in memory: ordered headers and string cells.
///
/// Cells are kept as text; numeric columns are parsed on access with
/// [`parse_locale_decimal`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Read a POS export (Windows-1257, `;` separated, decimal comma).
///
/// Non-breaking spaces are removed from the whole text before the CSV parser
/// sees it, since the portal uses them as thousands grouping in varying positions.
pub fn read_export<P: AsRef<Path>>(file_path: P) -> Result<ExportTable> {
    let path = file_path.as_ref();
    info!("Reading POS export: {:?}", path);

    let bytes = fs::read(path).with_context(|| format!("Failed to read export {:?}", path))?;
    parse_export_bytes(&bytes)
}

/// Decode and parse raw export bytes
pub fn parse_export_bytes(bytes: &[u8]) -> Result<ExportTable> {
    let (decoded, _, had_errors) = WINDOWS_1257.decode(bytes);
    if had_errors {
        debug!("Export contained bytes outside Windows-1257; replaced");
    }
    let content = strip_nbsp(&decoded);
    parse_export_text(&content)
}

fn strip_nbsp(content: &str) -> String {
    content.chars().filter(|c| *c != NBSP).collect()
}

fn parse_export_text(content: &str) -> Result<ExportTable> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReportError::MalformedInput(format!("unreadable header row: {}", e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(ReportError::MalformedInput("export has no header row".into()).into());
    }

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            ReportError::MalformedInput(format!("unreadable record at line {}: {}", idx + 2, e))
        })?;
        let mut row: Vec<String> = record.iter().map(|f| f.trim().to_string()).collect();
        // Extra cells would shift every later value under the wrong header
        if row.len() > headers.len() && row[headers.len()..].iter().any(|c| !c.is_empty()) {
            return Err(ReportError::MalformedInput(format!(
                "record at line {} has {} fields, header has {}",
                idx + 2,
                row.len(),
                headers.len()
            ))
            .into());
        }
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(ReportError::MalformedInput("export contains no rows".into()).into());
    }

    debug!("Parsed export: {} columns, {} rows", headers.len(), rows.len());
    Ok(ExportTable { headers, rows })
}

/// Parse a number written with a decimal comma, e.g. `1 000,50`.
///
/// Blank cells read as zero.
pub fn parse_locale_decimal(text: &str) -> Result<Decimal> {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != NBSP && !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if cleaned.is_empty() {
        return Ok(Decimal::ZERO);
    }

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .with_context(|| format!("Failed to parse decimal: {}", text))
}

impl ExportTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by exact (trimmed) header name
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column(name).ok_or_else(|| {
            ReportError::MalformedInput(format!("column not found in export: {}", name)).into()
        })
    }

    /// Drop the first `n` columns (store metadata in every POS grid export)
    pub fn drop_leading(&mut self, n: usize) {
        let n = n.min(self.headers.len());
        self.headers.drain(..n);
        for row in &mut self.rows {
            row.drain(..n.min(row.len()));
        }
    }

    /// Drop a column by name; no-op when absent
    pub fn drop_column(&mut self, name: &str) {
        if let Some(idx) = self.column(name) {
            self.headers.remove(idx);
            for row in &mut self.rows {
                if idx < row.len() {
                    row.remove(idx);
                }
            }
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn decimal(&self, row: usize, col: usize) -> Result<Decimal> {
        parse_locale_decimal(self.cell(row, col))
            .with_context(|| format!("row {}, column {}", row + 1, self.headers[col]))
    }
}
