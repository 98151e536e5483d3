use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::error::{AppError, Result};

// Unquoted-style names only; PostgreSQL truncates identifiers past 63 bytes.
static IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").unwrap());

/// Reject names that would need anything beyond plain double-quoting
pub fn validate_identifier(kind: &str, name: &str) -> Result<()> {
    if IDENTIFIER_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(AppError::ValidationError(format!(
            "Invalid {} name '{}': expected letters, digits or underscores, max 63 chars",
            kind, name
        )))
    }
}

/// Double-quote an identifier, doubling embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Schema-qualified, quoted name
pub fn qualified(schema: &str, name: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(name))
}

/// Single-quote a string literal, doubling embedded quotes
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
