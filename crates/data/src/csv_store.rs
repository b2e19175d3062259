//! Monthly-partitioned CSV append store.
//!
//! One file per (dataset, year, month), named from the batch capture
//! timestamp. The header is written exactly once, when the file is created;
//! every later write appends data rows only. Appends to the same partition
//! serialize through a per-file lock.

use chrono::{DateTime, Datelike, Utc};
use csv::WriterBuilder;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::debug;

/// Errors from partition storage operations.
///
/// These are not retried; they propagate to the cycle that triggered the
/// write.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem failure (permissions, disk space, missing directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A record that knows its CSV header and row representation.
pub trait CsvRecord {
    /// Column names, written once per partition file.
    const HEADER: &'static [&'static str];

    /// Row cells, in header order. Nullable fields render as empty cells.
    fn fields(&self) -> Vec<String>;
}

/// The two datasets the poller produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Ticker,
    Mining,
}

impl Dataset {
    /// File name prefix for this dataset's partitions.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Ticker => "five-minute",
            Self::Mining => "whattomine",
        }
    }
}

/// Identifies one monthly partition file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartitionKey {
    pub dataset: Dataset,
    pub year: i32,
    pub month: u32,
}

impl PartitionKey {
    /// Derives the partition for a batch from its capture timestamp.
    #[must_use]
    pub fn for_timestamp(dataset: Dataset, captured_at: DateTime<Utc>) -> Self {
        Self {
            dataset,
            year: captured_at.year(),
            month: captured_at.month(),
        }
    }

    /// Deterministic partition file name, e.g. `five-minute-2024-03.csv`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}-{:04}-{:02}.csv", self.dataset.prefix(), self.year, self.month)
    }
}

/// Append-only CSV store rooted at a single output directory.
pub struct CsvStore {
    output_dir: PathBuf,
    // Lazily created, one lock per partition file. The two cycles target
    // different datasets, so this only matters if a scheduler overlaps two
    // invocations of the same cycle.
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl CsvStore {
    /// Creates a store rooted at `output_dir`. The directory is created on
    /// first append, not here.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the full path of a partition file.
    #[must_use]
    pub fn partition_path(&self, key: &PartitionKey) -> PathBuf {
        self.output_dir.join(key.file_name())
    }

    /// Appends a batch of records to the partition identified by `key`.
    ///
    /// Creates the output directory if absent and writes the header only
    /// when the target file does not yet exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on filesystem or CSV serialization failure.
    pub fn append<R: CsvRecord>(
        &self,
        key: &PartitionKey,
        records: &[R],
    ) -> Result<(), StorageError> {
        let path = self.partition_path(key);
        let lock = self.lock_for(&path);
        let _guard = lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        std::fs::create_dir_all(&self.output_dir)?;
        let needs_header = !path.exists();

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        if needs_header {
            writer.write_record(R::HEADER)?;
        }
        for record in records {
            writer.write_record(record.fields())?;
        }
        writer.flush()?;

        debug!(
            partition = %path.display(),
            records = records.len(),
            wrote_header = needs_header,
            "Appended batch to partition"
        );
        Ok(())
    }

    fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        locks.entry(path.to_path_buf()).or_default().clone()
    }
}
