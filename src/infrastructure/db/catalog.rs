//! Catalog queries that confirm what a provisioning run created.
//!
//! Role attributes come from `pg_roles`, memberships from `pg_auth_members`,
//! table grants from `information_schema.role_table_grants`.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::info;

use crate::domain::error::{AppError, Result};
use crate::domain::provisioning::identifier::{qualified, quote_ident};
use crate::domain::provisioning::{ColumnType, DatabaseLayout, TableSpec};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleAttributes {
    pub name: String,
    pub can_login: bool,
    pub inherit: bool,
    pub superuser: bool,
    pub create_db: bool,
    pub create_role: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Membership {
    pub member: String,
    pub group: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableGrant {
    pub grantee: String,
    pub table_name: String,
    pub privilege: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub database: String,
    pub schema: String,
    pub table: String,
    pub roles: Vec<RoleAttributes>,
    pub memberships: Vec<Membership>,
    pub grants: Vec<TableGrant>,
    pub row_count: i64,
    pub sample_rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl VerificationReport {
    /// Roles from the layout that the catalog does not know about
    pub fn missing_roles(&self, layout: &DatabaseLayout) -> Vec<String> {
        layout
            .role_names()
            .into_iter()
            .filter(|name| !self.roles.iter().any(|r| &r.name == name))
            .collect()
    }

    /// Privileges held by `grantee`, sorted
    pub fn privileges_of(&self, grantee: &str) -> Vec<&str> {
        let mut privileges: Vec<&str> = self
            .grants
            .iter()
            .filter(|g| g.grantee == grantee)
            .map(|g| g.privilege.as_str())
            .collect();
        privileges.sort_unstable();
        privileges.dedup();
        privileges
    }

    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Verification of {}.{}.{} ({} rows)",
            self.database, self.schema, self.table, self.row_count
        )];

        lines.push("Roles:".to_string());
        for role in &self.roles {
            lines.push(format!(
                "- {}: login={} inherit={} superuser={} createdb={} createrole={}",
                role.name,
                role.can_login,
                role.inherit,
                role.superuser,
                role.create_db,
                role.create_role
            ));
        }

        lines.push("Memberships:".to_string());
        for m in &self.memberships {
            lines.push(format!("- {} -> {}", m.member, m.group));
        }

        lines.push("Table grants:".to_string());
        let mut grantees: Vec<&str> = self.grants.iter().map(|g| g.grantee.as_str()).collect();
        grantees.sort_unstable();
        grantees.dedup();
        for grantee in grantees {
            lines.push(format!("- {}: {}", grantee, self.privileges_of(grantee).join(", ")));
        }

        lines.push("Sample rows:".to_string());
        for row in &self.sample_rows {
            lines.push(format!("- {}", serde_json::Value::Object(row.clone())));
        }

        lines.join("\n")
    }
}

pub struct CatalogVerifier<'a> {
    pool: &'a Pool<Postgres>,
}

impl<'a> CatalogVerifier<'a> {
    /// `pool` must be connected to the provisioned database
    pub fn new(pool: &'a Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn verify(
        &self,
        layout: &DatabaseLayout,
        sample_rows: u32,
    ) -> Result<VerificationReport> {
        let role_names = layout.role_names();
        let group_names: Vec<String> = layout.groups.iter().map(|g| g.name.clone()).collect();

        let roles = self.role_attributes(&role_names).await?;
        let memberships = self.memberships(&role_names).await?;
        let grants = self.table_grants(&layout.schema, &group_names).await?;
        let row_count = self.row_count(&layout.schema, &layout.table).await?;
        let sample_rows = self
            .sample_rows(&layout.schema, &layout.table, sample_rows)
            .await?;

        info!(
            roles = roles.len(),
            grants = grants.len(),
            row_count,
            "Verification queries finished"
        );

        Ok(VerificationReport {
            database: layout.database.clone(),
            schema: layout.schema.clone(),
            table: layout.table.name.clone(),
            roles,
            memberships,
            grants,
            row_count,
            sample_rows,
        })
    }

    pub async fn role_attributes(&self, names: &[String]) -> Result<Vec<RoleAttributes>> {
        let query = r#"
            SELECT rolname::text AS rolname, rolcanlogin, rolinherit, rolsuper,
                   rolcreatedb, rolcreaterole
            FROM pg_roles
            WHERE rolname = ANY($1)
            ORDER BY rolname
        "#;

        let rows = sqlx::query(query)
            .bind(names)
            .fetch_all(self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to read pg_roles: {}", e)))?;

        rows.iter()
            .map(|row| {
                Ok(RoleAttributes {
                    name: get(row, "rolname")?,
                    can_login: get(row, "rolcanlogin")?,
                    inherit: get(row, "rolinherit")?,
                    superuser: get(row, "rolsuper")?,
                    create_db: get(row, "rolcreatedb")?,
                    create_role: get(row, "rolcreaterole")?,
                })
            })
            .collect()
    }

    pub async fn memberships(&self, names: &[String]) -> Result<Vec<Membership>> {
        let query = r#"
            SELECT m.rolname::text AS member, g.rolname::text AS group_name
            FROM pg_auth_members am
            JOIN pg_roles m ON m.oid = am.member
            JOIN pg_roles g ON g.oid = am.roleid
            WHERE m.rolname = ANY($1)
            ORDER BY m.rolname, g.rolname
        "#;

        let rows = sqlx::query(query)
            .bind(names)
            .fetch_all(self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to read pg_auth_members: {}", e))
            })?;

        rows.iter()
            .map(|row| {
                Ok(Membership {
                    member: get(row, "member")?,
                    group: get(row, "group_name")?,
                })
            })
            .collect()
    }

    pub async fn table_grants(
        &self,
        schema: &str,
        grantees: &[String],
    ) -> Result<Vec<TableGrant>> {
        let query = r#"
            SELECT grantee::text AS grantee, table_name::text AS table_name,
                   privilege_type::text AS privilege_type
            FROM information_schema.role_table_grants
            WHERE table_schema = $1 AND grantee = ANY($2)
            ORDER BY grantee, table_name, privilege_type
        "#;

        let rows = sqlx::query(query)
            .bind(schema)
            .bind(grantees)
            .fetch_all(self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to read table grants: {}", e)))?;

        rows.iter()
            .map(|row| {
                Ok(TableGrant {
                    grantee: get(row, "grantee")?,
                    table_name: get(row, "table_name")?,
                    privilege: get(row, "privilege_type")?,
                })
            })
            .collect()
    }

    pub async fn row_count(&self, schema: &str, table: &TableSpec) -> Result<i64> {
        let query = format!(
            "SELECT COUNT(*) AS row_count FROM {}",
            qualified(schema, &table.name)
        );
        let row = sqlx::query(&query)
            .fetch_one(self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count rows: {}", e)))?;
        get(&row, "row_count")
    }

    /// First `limit` rows by primary key, decoded by declared column type
    pub async fn sample_rows(
        &self,
        schema: &str,
        table: &TableSpec,
        limit: u32,
    ) -> Result<Vec<serde_json::Map<String, serde_json::Value>>> {
        let query = sample_query(schema, table, limit);
        let rows = sqlx::query(&query)
            .fetch_all(self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to read sample rows: {}", e)))?;

        rows.iter()
            .map(|row| {
                let mut map = serde_json::Map::new();
                for (index, column) in table.columns.iter().enumerate() {
                    let value = decode_value(row, index, &column.column_type)?;
                    map.insert(column.name.clone(), value);
                }
                Ok(map)
            })
            .collect()
    }
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column)
        .map_err(|e| AppError::DatabaseError(format!("Failed to parse {}: {}", column, e)))
}

fn sample_query(schema: &str, table: &TableSpec, limit: u32) -> String {
    let columns = table
        .columns
        .iter()
        .map(|c| match c.column_type {
            // Enum values come back as text so they decode into String
            ColumnType::Enumerated { .. } => format!("{}::text", quote_ident(&c.name)),
            _ => quote_ident(&c.name),
        })
        .collect::<Vec<_>>()
        .join(", ");

    let order_by = table
        .primary_keys()
        .first()
        .map(|c| format!(" ORDER BY {}", quote_ident(&c.name)))
        .unwrap_or_default();

    format!(
        "SELECT {} FROM {}{} LIMIT {}",
        columns,
        qualified(schema, &table.name),
        order_by,
        limit
    )
}

fn decode_value(row: &PgRow, index: usize, column_type: &ColumnType) -> Result<serde_json::Value> {
    let decode_err = |e: sqlx::Error| {
        AppError::DatabaseError(format!("Failed to decode column {}: {}", index, e))
    };

    let value = match column_type {
        ColumnType::Integer => row
            .try_get::<Option<i32>, _>(index)
            .map_err(decode_err)?
            .map(|n| serde_json::Value::Number(n.into())),
        ColumnType::BoundedText { .. } | ColumnType::Enumerated { .. } => row
            .try_get::<Option<String>, _>(index)
            .map_err(decode_err)?
            .map(serde_json::Value::String),
        ColumnType::Date => row
            .try_get::<Option<NaiveDate>, _>(index)
            .map_err(decode_err)?
            .map(|d| serde_json::Value::String(d.to_string())),
        // Kept as a string so no precision is lost to f64
        ColumnType::Numeric => row
            .try_get::<Option<BigDecimal>, _>(index)
            .map_err(decode_err)?
            .map(|n| serde_json::Value::String(n.to_string())),
    };

    Ok(value.unwrap_or(serde_json::Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> VerificationReport {
        VerificationReport {
            database: "city_records".to_string(),
            schema: "incidents".to_string(),
            table: "incident_reports".to_string(),
            roles: vec![
                RoleAttributes {
                    name: "readonly_group".to_string(),
                    can_login: false,
                    inherit: true,
                    superuser: false,
                    create_db: false,
                    create_role: false,
                },
                RoleAttributes {
                    name: "report_reader".to_string(),
                    can_login: true,
                    inherit: true,
                    superuser: false,
                    create_db: false,
                    create_role: false,
                },
            ],
            memberships: vec![Membership {
                member: "report_reader".to_string(),
                group: "readonly_group".to_string(),
            }],
            grants: vec![
                TableGrant {
                    grantee: "readwrite_group".to_string(),
                    table_name: "incident_reports".to_string(),
                    privilege: "UPDATE".to_string(),
                },
                TableGrant {
                    grantee: "readwrite_group".to_string(),
                    table_name: "incident_reports".to_string(),
                    privilege: "DELETE".to_string(),
                },
                TableGrant {
                    grantee: "readonly_group".to_string(),
                    table_name: "incident_reports".to_string(),
                    privilege: "SELECT".to_string(),
                },
            ],
            row_count: 2,
            sample_rows: Vec::new(),
        }
    }

    #[test]
    fn test_sample_query_casts_enums_and_orders_by_key() {
        let table = TableSpec::incident_reports("weekday");
        let sql = sample_query("incidents", &table, 5);
        assert!(sql.starts_with("SELECT \"id\", \"code\""));
        assert!(sql.contains("\"day_of_week\"::text"));
        assert!(sql.ends_with("FROM \"incidents\".\"incident_reports\" ORDER BY \"id\" LIMIT 5"));
    }

    #[test]
    fn test_missing_roles() {
        let layout = DatabaseLayout::default();
        assert_eq!(
            report().missing_roles(&layout),
            vec!["readwrite_group".to_string(), "report_writer".to_string()]
        );
    }

    #[test]
    fn test_privileges_of_sorted() {
        let report = report();
        assert_eq!(report.privileges_of("readwrite_group"), vec!["DELETE", "UPDATE"]);
        assert_eq!(report.privileges_of("readonly_group"), vec!["SELECT"]);
        assert!(report.privileges_of("nobody").is_empty());
    }

    #[test]
    fn test_summary_mentions_roles_and_grants() {
        let summary = report().summary();
        assert!(summary.contains("city_records.incidents.incident_reports (2 rows)"));
        assert!(summary.contains("- report_reader: login=true"));
        assert!(summary.contains("- report_reader -> readonly_group"));
        assert!(summary.contains("- readwrite_group: DELETE, UPDATE"));
    }
}
