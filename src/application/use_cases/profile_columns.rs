// ============================================================
// PROFILE COLUMNS USE CASE
// ============================================================
// Profile the requested columns of a file and assemble a report

use std::path::Path;
use std::time::Instant;

use tracing::info;

use crate::domain::error::{AppError, Result};
use crate::domain::profile::{ProfileReport, SizingPolicy};
use crate::infrastructure::csv::ColumnProfiler;

pub struct ProfileColumnsUseCase {
    profiler: ColumnProfiler,
    policy: SizingPolicy,
}

impl ProfileColumnsUseCase {
    pub fn new(profiler: ColumnProfiler, policy: SizingPolicy) -> Self {
        Self { profiler, policy }
    }

    /// Profile `columns`, or every header column when empty
    pub fn execute(&self, path: &Path, columns: &[usize]) -> Result<ProfileReport> {
        let start = Instant::now();

        self.policy
            .validate()
            .map_err(|e| AppError::ValidationError(format!("Invalid sizing policy: {}", e)))?;

        let indices: Vec<usize> = if columns.is_empty() {
            (0..self.profiler.headers(path)?.len()).collect()
        } else {
            columns.to_vec()
        };

        let profiles = self.profiler.profile_many(path, &indices)?;

        info!(
            path = %path.display(),
            columns = profiles.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Profiled file"
        );

        Ok(ProfileReport::new(
            path.to_path_buf(),
            self.policy.clone(),
            &profiles,
        ))
    }
}
