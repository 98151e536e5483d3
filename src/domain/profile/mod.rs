// ============================================================
// COLUMN PROFILE DOMAIN LAYER
// ============================================================
// Value objects produced by scanning one CSV column
// No I/O, no async

mod column_profile;
mod sizing_policy;

pub use column_profile::{ColumnProfile, ColumnSummary, ProfileReport};
pub use sizing_policy::{SizingPolicy, MAX_VARCHAR_LENGTH};
