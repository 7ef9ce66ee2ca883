use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Counter value used when no usable counter file exists: `YYYYMMDD`
pub fn date_seed(date: NaiveDate) -> u64 {
    date.year() as u64 * 10000 + date.month() as u64 * 100 + date.day() as u64
}

/// Date seed of January 1st of the following year
pub fn next_year_seed(date: NaiveDate) -> u64 {
    (date.year() as u64 + 1) * 10000
}

/// Single-integer counter file backing cash receipt document numbers.
///
/// There is no locking; one run at a time is assumed.
#[derive(Debug, Clone)]
pub struct DocumentNumberStore {
    path: PathBuf,
}

impl DocumentNumberStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current counter, seeded from today's date when missing
    pub fn read(&self) -> Result<u64> {
        self.read_at(Local::now().date_naive())
    }

    /// Current counter, seeded from `today` when the file is missing or garbled
    pub fn read_at(&self, today: NaiveDate) -> Result<u64> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let seed = date_seed(today);
                debug!("No counter at {:?}; seeding {}", self.path, seed);
                return Ok(seed);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read counter {:?}", self.path))
            }
        };

        match content.trim().parse::<u64>() {
            Ok(n) => Ok(n),
            Err(_) => {
                let seed = date_seed(today);
                warn!(
                    "Counter file {:?} holds {:?}; reseeding from date {}",
                    self.path,
                    content.trim(),
                    seed
                );
                Ok(seed)
            }
        }
    }

    /// Overwrite the counter (temporary file + rename)
    pub fn save(&self, number: u64) -> Result<()> {
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, number.to_string())
            .with_context(|| format!("Failed to write counter {:?}", tmp_path))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to finalize counter {:?}", self.path))?;
        Ok(())
    }
}
