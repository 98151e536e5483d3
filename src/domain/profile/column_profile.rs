// ============================================================
// COLUMN PROFILE
// ============================================================
// Distinct values of one CSV column plus the facts derived from them

use super::{SizingPolicy, MAX_VARCHAR_LENGTH};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;

/// Distinct values observed in one column of a delimited file.
///
/// Built fresh by every profiling call and never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnProfile {
    /// Zero-based column index
    pub column_index: usize,

    /// Header name for the column, when the header row has one
    pub header: Option<String>,

    /// Number of data rows scanned (header excluded)
    pub row_count: usize,

    /// Distinct values, compared by exact string equality
    pub values: HashSet<String>,
}

impl ColumnProfile {
    pub fn new(column_index: usize, header: Option<String>) -> Self {
        Self {
            column_index,
            header,
            row_count: 0,
            values: HashSet::new(),
        }
    }

    /// Record one field value from a data row
    pub fn observe(&mut self, value: &str) {
        self.row_count += 1;
        if !self.values.contains(value) {
            self.values.insert(value.to_string());
        }
    }

    /// Number of distinct values
    pub fn cardinality(&self) -> usize {
        self.values.len()
    }

    /// Longest value in characters, 0 for an empty profile
    pub fn max_length(&self) -> usize {
        self.values
            .iter()
            .map(|v| v.chars().count())
            .max()
            .unwrap_or(0)
    }

    /// Whether the column looks drawn from a small closed set of literals
    pub fn is_enumerable(&self, policy: &SizingPolicy) -> bool {
        let cardinality = self.cardinality();
        cardinality > 0 && cardinality <= policy.enum_cardinality_threshold
    }

    /// Bounded text width: observed maximum times the headroom factor,
    /// clamped to `1..=MAX_VARCHAR_LENGTH`
    pub fn suggested_text_width(&self, policy: &SizingPolicy) -> usize {
        self.max_length()
            .saturating_mul(policy.text_headroom_factor)
            .clamp(1, MAX_VARCHAR_LENGTH)
    }

    /// Distinct values in sorted order, for stable display
    pub fn sorted_values(&self) -> Vec<&str> {
        let mut values: Vec<&str> = self.values.iter().map(String::as_str).collect();
        values.sort_unstable();
        values
    }
}

/// Profiles gathered for one file, as printed by the `profile` command
#[derive(Debug, Clone, Serialize)]
pub struct ProfileReport {
    pub path: PathBuf,
    pub policy: SizingPolicy,
    pub columns: Vec<ColumnSummary>,
}

/// Serializable view of a profile with the derived checks filled in
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub column_index: usize,
    pub header: Option<String>,
    pub row_count: usize,
    pub cardinality: usize,
    pub max_length: usize,
    pub enumerable: bool,
    pub suggested_text_width: usize,
    /// Listed only for enumerable columns
    pub values: Option<Vec<String>>,
}

impl ProfileReport {
    pub fn new(path: PathBuf, policy: SizingPolicy, profiles: &[ColumnProfile]) -> Self {
        let columns = profiles
            .iter()
            .map(|p| {
                let enumerable = p.is_enumerable(&policy);
                ColumnSummary {
                    column_index: p.column_index,
                    header: p.header.clone(),
                    row_count: p.row_count,
                    cardinality: p.cardinality(),
                    max_length: p.max_length(),
                    enumerable,
                    suggested_text_width: p.suggested_text_width(&policy),
                    values: enumerable.then(|| {
                        p.sorted_values().into_iter().map(str::to_string).collect()
                    }),
                }
            })
            .collect();

        Self {
            path,
            policy,
            columns,
        }
    }

    /// Get human-readable summary
    pub fn summary(&self) -> String {
        let mut lines = vec![format!("Profile of {}", self.path.display())];

        for column in &self.columns {
            lines.push(String::new());
            lines.push(format!(
                "Column {} ({}), {} rows:",
                column.column_index,
                column.header.as_deref().unwrap_or("<unnamed>"),
                column.row_count
            ));
            lines.push(format!("- Distinct values: {}", column.cardinality));
            lines.push(format!("- Max length: {} chars", column.max_length));
            lines.push(format!(
                "- Enumerable: {}",
                if column.enumerable { "yes" } else { "no" }
            ));
            lines.push(format!(
                "- Suggested varchar width: {}",
                column.suggested_text_width
            ));
            if let Some(values) = &column.values {
                lines.push(format!("- Values: {}", values.join(", ")));
            }
        }

        lines.join("\n")
    }
}
