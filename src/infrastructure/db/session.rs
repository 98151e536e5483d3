//! PostgreSQL session backed by sqlx.
//!
//! Holds at most one single-connection pool per [`Target`]. Pools are opened
//! lazily so the target database connection is only made after it exists.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolCopyExt, PgPoolOptions, PgSslMode};
use sqlx::{Pool, Postgres};
use tracing::{error, info};

use super::{SqlSession, Target};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::ConnectionSettings;
use crate::infrastructure::security::credentials::resolve_password;

pub struct PgSession {
    settings: ConnectionSettings,
    password: String,
    database: String,
    maintenance_pool: Option<Pool<Postgres>>,
    database_pool: Option<Pool<Postgres>>,
}

impl PgSession {
    /// Resolve the admin password; no connection is made yet
    pub fn new(settings: ConnectionSettings, database: &str) -> Result<Self> {
        let password = resolve_password(&settings.password_ref)?;
        Ok(Self {
            settings,
            password,
            database: database.to_string(),
            maintenance_pool: None,
            database_pool: None,
        })
    }

    /// Parse SSL mode string to PgSslMode
    fn parse_ssl_mode(ssl_mode: &str) -> PgSslMode {
        match ssl_mode.to_lowercase().as_str() {
            "disable" => PgSslMode::Disable,
            "allow" => PgSslMode::Allow,
            "prefer" => PgSslMode::Prefer,
            "require" => PgSslMode::Require,
            "verify-ca" => PgSslMode::VerifyCa,
            "verify-full" => PgSslMode::VerifyFull,
            _ => PgSslMode::Prefer,
        }
    }

    fn database_name(&self, target: Target) -> &str {
        match target {
            Target::Maintenance => &self.settings.maintenance_database,
            Target::Database => &self.database,
        }
    }

    fn build_options(&self, target: Target) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.settings.host)
            .port(self.settings.port)
            .database(self.database_name(target))
            .username(&self.settings.username)
            .password(&self.password)
            .ssl_mode(Self::parse_ssl_mode(&self.settings.ssl_mode))
    }

    async fn connect(&self, target: Target) -> Result<Pool<Postgres>> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(self.settings.connect_timeout_secs))
            .connect_with(self.build_options(target))
            .await
            .map_err(|e| {
                error!(
                    target_db = self.database_name(target),
                    error = %e,
                    "Failed to connect to PostgreSQL"
                );
                AppError::DatabaseError(format!(
                    "Failed to connect to {} database '{}' at {}:{}: {}",
                    target,
                    self.database_name(target),
                    self.settings.host,
                    self.settings.port,
                    e
                ))
            })?;

        info!(
            host = %self.settings.host,
            database = self.database_name(target),
            "Connected to PostgreSQL"
        );
        Ok(pool)
    }

    /// Get or open the pool for `target`
    pub async fn pool(&mut self, target: Target) -> Result<&Pool<Postgres>> {
        let missing = match target {
            Target::Maintenance => self.maintenance_pool.is_none(),
            Target::Database => self.database_pool.is_none(),
        };
        if missing {
            let pool = self.connect(target).await?;
            match target {
                Target::Maintenance => self.maintenance_pool = Some(pool),
                Target::Database => self.database_pool = Some(pool),
            }
        }

        let slot = match target {
            Target::Maintenance => &self.maintenance_pool,
            Target::Database => &self.database_pool,
        };
        slot.as_ref().ok_or_else(|| {
            AppError::DatabaseError(format!("No {} connection available", target))
        })
    }

    /// Close every open pool
    pub async fn close(&mut self) {
        self.disconnect(Target::Database).await;
        self.disconnect(Target::Maintenance).await;
    }
}

#[async_trait]
impl SqlSession for PgSession {
    async fn execute(&mut self, target: Target, sql: &str) -> Result<u64> {
        let pool = self.pool(target).await?;
        let result = sqlx::raw_sql(sql)
            .execute(pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Statement failed: {}", e)))?;
        Ok(result.rows_affected())
    }

    async fn copy_in(&mut self, target: Target, statement: &str, path: &Path) -> Result<u64> {
        let file = tokio::fs::File::open(path).await.map_err(|e| {
            AppError::FileAccess(format!("Failed to open {}: {}", path.display(), e))
        })?;

        let pool = self.pool(target).await?;
        let mut copy = pool
            .copy_in_raw(statement)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to start COPY: {}", e)))?;

        let streamed = copy.read_from(file).await.map(|_| ());
        if let Err(e) = streamed {
            let message = format!("Failed to stream {} into COPY: {}", path.display(), e);
            let _ = copy.abort(message.clone()).await;
            return Err(AppError::DatabaseError(message));
        }

        copy.finish()
            .await
            .map_err(|e| AppError::DatabaseError(format!("COPY failed: {}", e)))
    }

    async fn disconnect(&mut self, target: Target) {
        let pool = match target {
            Target::Maintenance => self.maintenance_pool.take(),
            Target::Database => self.database_pool.take(),
        };
        if let Some(pool) = pool {
            info!(database = self.database_name(target), "Closing connection");
            pool.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ssl_mode() {
        assert!(matches!(PgSession::parse_ssl_mode("disable"), PgSslMode::Disable));
        assert!(matches!(PgSession::parse_ssl_mode("require"), PgSslMode::Require));
        assert!(matches!(PgSession::parse_ssl_mode("PREFER"), PgSslMode::Prefer));
        assert!(matches!(PgSession::parse_ssl_mode("unknown"), PgSslMode::Prefer));
    }

    #[test]
    fn test_new_resolves_password_without_connecting() {
        let settings = ConnectionSettings {
            password_ref: "plain:admin".to_string(),
            ..Default::default()
        };
        let session = PgSession::new(settings, "city_records").unwrap();
        assert_eq!(session.password, "admin");
        assert_eq!(session.database_name(Target::Database), "city_records");
        assert_eq!(session.database_name(Target::Maintenance), "postgres");
        assert!(session.maintenance_pool.is_none());
    }

    #[test]
    fn test_new_fails_on_unresolvable_password() {
        let settings = ConnectionSettings {
            password_ref: "env:PGPROVISION_TEST_ADMIN_NEVER_SET_4711".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            PgSession::new(settings, "db"),
            Err(AppError::SecurityError(_))
        ));
    }
}
