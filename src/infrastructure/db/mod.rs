pub mod catalog;
pub mod session;
pub mod statements;

use std::fmt;
use std::path::Path;

use async_trait::async_trait;

use crate::domain::error::Result;

/// Which database a statement runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Server-level work: CREATE/DROP DATABASE, roles
    Maintenance,
    /// The provisioned database itself
    Database,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Maintenance => write!(f, "maintenance"),
            Target::Database => write!(f, "database"),
        }
    }
}

#[async_trait]
pub trait SqlSession: Send {
    /// Run one statement, returning rows affected
    async fn execute(&mut self, target: Target, sql: &str) -> Result<u64>;

    /// Run a `COPY ... FROM STDIN` statement fed from `path`, returning rows copied
    async fn copy_in(&mut self, target: Target, statement: &str, path: &Path) -> Result<u64>;

    /// Drop any open connection to `target`
    async fn disconnect(&mut self, target: Target);
}
