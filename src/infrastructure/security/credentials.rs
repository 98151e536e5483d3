use crate::domain::error::{AppError, Result};
use keyring::Entry;

const KEYCHAIN_USER: &str = "pgprovision";

/// Resolve a password reference.
///
/// Formats:
/// - `env:NAME` reads the `NAME` environment variable
/// - `keychain:KEY` reads the OS keychain entry (service = KEY, user = pgprovision)
/// - `plain:VALUE` returns VALUE (development only)
/// - anything else is taken as the password itself
pub fn resolve_password(password_ref: &str) -> Result<String> {
    if let Some(env_key) = password_ref.strip_prefix("env:") {
        std::env::var(env_key).map_err(|_| {
            AppError::SecurityError(format!(
                "Environment variable '{}' not found for password",
                env_key
            ))
        })
    } else if let Some(key_name) = password_ref.strip_prefix("keychain:") {
        let entry = Entry::new(key_name, KEYCHAIN_USER).map_err(|e| {
            AppError::SecurityError(format!("Failed to access keychain: {}", e))
        })?;
        entry.get_password().map_err(|e| {
            AppError::SecurityError(format!(
                "Failed to retrieve password '{}' from keychain: {}",
                key_name, e
            ))
        })
    } else if let Some(plain) = password_ref.strip_prefix("plain:") {
        Ok(plain.to_string())
    } else {
        Ok(password_ref.to_string())
    }
}

/// Store a password in the OS keychain under `key_name`
pub fn store_in_keychain(key_name: &str, password: &str) -> Result<()> {
    let entry = Entry::new(key_name, KEYCHAIN_USER).map_err(|e| {
        tracing::error!(key = key_name, error = %e, "Failed to create keychain entry");
        AppError::SecurityError(format!("Failed to create keychain entry: {}", e))
    })?;
    entry.set_password(password).map_err(|e| {
        tracing::error!(key = key_name, error = %e, "Failed to store keychain password");
        AppError::SecurityError(format!("Failed to store password in keychain: {}", e))
    })?;
    tracing::info!(key = key_name, "Stored password in keychain");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_password_env() {
        std::env::set_var("PGPROVISION_TEST_PASSWORD", "secret123");
        let result = resolve_password("env:PGPROVISION_TEST_PASSWORD");
        assert_eq!(result.unwrap(), "secret123");
        std::env::remove_var("PGPROVISION_TEST_PASSWORD");
    }

    #[test]
    fn test_resolve_password_missing_env() {
        let result = resolve_password("env:PGPROVISION_TEST_NEVER_SET_4711");
        assert!(matches!(result, Err(AppError::SecurityError(_))));
    }

    #[test]
    fn test_resolve_password_plain_and_direct() {
        assert_eq!(resolve_password("plain:hunter2").unwrap(), "hunter2");
        assert_eq!(resolve_password("direct_password").unwrap(), "direct_password");
    }
}
