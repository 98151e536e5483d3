pub mod error;
pub mod provisioning;

// Column profiling
pub mod profile;
