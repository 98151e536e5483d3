use serde::{Deserialize, Serialize};
use std::fmt;

/// Privilege level granted to a group on the schema's tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Retrieval only
    ReadOnly,

    /// Retrieval plus insertion, modification, deletion
    ReadWrite,
}

impl AccessLevel {
    /// Table privileges in GRANT order
    pub fn table_privileges(&self) -> &'static [&'static str] {
        match self {
            AccessLevel::ReadOnly => &["SELECT"],
            AccessLevel::ReadWrite => &["SELECT", "INSERT", "UPDATE", "DELETE"],
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLevel::ReadOnly => write!(f, "read-only"),
            AccessLevel::ReadWrite => write!(f, "read-write"),
        }
    }
}

/// Non-login group role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub name: String,
    pub access: AccessLevel,
}

/// Login role that inherits a group's grants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSpec {
    pub name: String,
    pub group: String,
    /// `env:NAME`, `keychain:KEY`, `plain:VALUE` or a bare password
    pub password_ref: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privileges_per_level() {
        assert_eq!(AccessLevel::ReadOnly.table_privileges(), &["SELECT"]);
        assert_eq!(
            AccessLevel::ReadWrite.table_privileges(),
            &["SELECT", "INSERT", "UPDATE", "DELETE"]
        );
    }
}
