pub mod app;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

pub use domain::error::{AppError, Result};
pub use domain::profile::{ColumnProfile, SizingPolicy};
pub use infrastructure::csv::ColumnProfiler;
