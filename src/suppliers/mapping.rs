//! Persisted `product_code -> supplier_name` table (`mapping.csv`)
//!
//! The file is only ever appended to. Codes may therefore repeat; when they
//! do, the line appended last wins.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::models::normalize_product_code;

pub const MAPPING_HEADER: [&str; 2] = ["product_code", "supplier_name"];

#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: HashMap<String, String>,
    duplicates: usize,
}

impl MappingTable {
    /// Load the table; a missing file is an empty table
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No supplier mapping at {:?}; starting empty", path);
            return Ok(Self::default());
        }

        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read mapping {:?}", path))?;
        let table = Self::parse(&content)?;
        info!(
            "Loaded {} supplier mappings ({} superseded duplicates)",
            table.len(),
            table.duplicates
        );
        Ok(table)
    }

    /// Parse mapping CSV content: header row, then `code,supplier` records
    pub fn parse(content: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut table = Self::default();
        for (idx, result) in reader.records().enumerate() {
            let record = result.with_context(|| format!("Bad mapping record at line {}", idx + 2))?;
            let code = normalize_product_code(record.get(0).unwrap_or(""));
            let supplier = record.get(1).unwrap_or("").trim();
            if code.is_empty() || supplier.is_empty() {
                debug!("Ignoring incomplete mapping line {}", idx + 2);
                continue;
            }
            table.insert(code, supplier.to_string());
        }
        Ok(table)
    }

    fn insert(&mut self, code: String, supplier: String) {
        if self.entries.insert(code, supplier).is_some() {
            self.duplicates += 1;
        }
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lines that were overridden by a later line for the same code
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Append one `code,supplier` line to the mapping file.
    ///
    /// The file may have been edited by hand, so a newline is inserted first
    /// when the last byte is not one. A new file gets the header row.
    pub fn append<P: AsRef<Path>>(path: P, code: &str, supplier: &str) -> Result<()> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)
            .with_context(|| format!("Failed to open mapping {:?} for append", path))?;

        let len = file.metadata()?.len();
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        if len == 0 {
            writer.write_record(MAPPING_HEADER)?;
        } else {
            file.seek(SeekFrom::End(-1))?;
            let mut last = [0u8; 1];
            file.read_exact(&mut last)?;
            if last[0] != b'\n' {
                file.write_all(b"\n")?;
            }
        }

        writer.write_record([code, supplier])?;
        let line = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to encode mapping line: {}", e))?;
        file.write_all(&line)
            .with_context(|| format!("Failed to append to mapping {:?}", path))?;
        file.flush()?;

        debug!("Appended mapping {} -> {}", code, supplier);
        Ok(())
    }
}
