// ============================================================
// COLUMN PROFILER
// ============================================================
// Scan one column of a delimited file and collect its distinct values

use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::path::Path;
use tracing::debug;

use crate::domain::error::{AppError, Result};
use crate::domain::profile::ColumnProfile;

/// Reads a delimited file once per requested column
pub struct ColumnProfiler {
    /// Delimiter character (default: comma)
    delimiter: u8,
}

impl Default for ColumnProfiler {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl ColumnProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Header names from the first row
    pub fn headers(&self, path: &Path) -> Result<Vec<String>> {
        let mut reader = self.open(path)?;
        let headers = Self::read_headers(&mut reader)?;
        Ok(headers.iter().map(str::to_string).collect())
    }

    /// Distinct values of `column_index` across all data rows.
    ///
    /// The header row is excluded. A data row with too few fields fails the
    /// whole call with [`AppError::ColumnIndex`]; rows are never skipped.
    pub fn profile(&self, path: &Path, column_index: usize) -> Result<ColumnProfile> {
        let mut reader = self.open(path)?;
        let headers = Self::read_headers(&mut reader)?;

        let header = headers.get(column_index).map(str::to_string);
        let mut profile = ColumnProfile::new(column_index, header);
        let mut record = StringRecord::new();
        let mut row = 0usize;

        loop {
            let has_row = reader.read_record(&mut record).map_err(|e| {
                AppError::ParseError(format!(
                    "Failed to parse data row {} of {}: {}",
                    row + 1,
                    path.display(),
                    e
                ))
            })?;
            if !has_row {
                break;
            }
            row += 1;

            let value = record.get(column_index).ok_or_else(|| {
                AppError::ColumnIndex(format!(
                    "Column {} out of range in data row {} of {} ({} fields)",
                    column_index,
                    row,
                    path.display(),
                    record.len()
                ))
            })?;
            profile.observe(value);
        }

        debug!(
            path = %path.display(),
            column_index,
            rows = profile.row_count,
            distinct = profile.cardinality(),
            "Profiled column"
        );

        Ok(profile)
    }

    /// One independent scan per index
    pub fn profile_many(
        &self,
        path: &Path,
        column_indices: &[usize],
    ) -> Result<Vec<ColumnProfile>> {
        column_indices
            .iter()
            .map(|&index| self.profile(path, index))
            .collect()
    }

    fn open(&self, path: &Path) -> Result<csv::Reader<File>> {
        let file = File::open(path).map_err(|e| {
            AppError::FileAccess(format!("Failed to open {}: {}", path.display(), e))
        })?;

        Ok(ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .trim(Trim::None)
            .flexible(true) // Short rows are reported as ColumnIndex errors, not csv errors
            .from_reader(file))
    }

    fn read_headers(reader: &mut csv::Reader<File>) -> Result<StringRecord> {
        reader
            .headers()
            .map(|h| h.clone())
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))
    }
}
