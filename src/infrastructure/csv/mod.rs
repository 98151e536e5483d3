// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// Column scanning over delimited files

mod column_profiler;

pub use column_profiler::ColumnProfiler;
