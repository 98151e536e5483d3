// ============================================================
// SQL STATEMENTS
// ============================================================
// DDL / DCL text for each provisioning step. Identifiers are always
// double-quoted, literals single-quoted; nothing here touches a connection.

use crate::domain::provisioning::identifier::{qualified, quote_ident, quote_literal};
use crate::domain::provisioning::{AccessLevel, EnumTypeSpec, TableSpec};

pub fn create_database(database: &str) -> String {
    format!("CREATE DATABASE {}", quote_ident(database))
}

pub fn drop_database_if_exists(database: &str) -> String {
    format!("DROP DATABASE IF EXISTS {}", quote_ident(database))
}

pub fn create_schema(schema: &str) -> String {
    format!("CREATE SCHEMA {}", quote_ident(schema))
}

pub fn create_enum_type(schema: &str, enum_type: &EnumTypeSpec) -> String {
    let values = enum_type
        .values
        .iter()
        .map(|v| quote_literal(v))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE TYPE {} AS ENUM ({})",
        qualified(schema, &enum_type.name),
        values
    )
}

pub fn create_table(schema: &str, table: &TableSpec) -> String {
    let columns = table
        .columns
        .iter()
        .map(|c| {
            let mut definition = format!(
                "    {} {}",
                quote_ident(&c.name),
                c.column_type.sql_type(schema)
            );
            if c.primary_key {
                definition.push_str(" PRIMARY KEY");
            }
            definition
        })
        .collect::<Vec<_>>()
        .join(",\n");
    format!(
        "CREATE TABLE {} (\n{}\n)",
        qualified(schema, &table.name),
        columns
    )
}

/// COPY fed from the client; the file's header row is skipped by the server
pub fn copy_from_stdin(schema: &str, table: &TableSpec, delimiter: u8) -> String {
    let columns = table
        .column_names()
        .into_iter()
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "COPY {} ({}) FROM STDIN WITH (FORMAT csv, HEADER true, DELIMITER {})",
        qualified(schema, &table.name),
        columns,
        quote_literal(&(delimiter as char).to_string())
    )
}

pub fn revoke_database_from_public(database: &str) -> String {
    format!("REVOKE ALL ON DATABASE {} FROM PUBLIC", quote_ident(database))
}

pub fn revoke_schema_from_public(schema: &str) -> String {
    format!("REVOKE ALL ON SCHEMA {} FROM PUBLIC", quote_ident(schema))
}

pub fn create_group(group: &str) -> String {
    format!("CREATE ROLE {} NOLOGIN", quote_ident(group))
}

pub fn grant_connect(database: &str, role: &str) -> String {
    format!(
        "GRANT CONNECT ON DATABASE {} TO {}",
        quote_ident(database),
        quote_ident(role)
    )
}

pub fn grant_schema_usage(schema: &str, role: &str) -> String {
    format!(
        "GRANT USAGE ON SCHEMA {} TO {}",
        quote_ident(schema),
        quote_ident(role)
    )
}

pub fn grant_table_privileges(schema: &str, role: &str, access: AccessLevel) -> String {
    format!(
        "GRANT {} ON ALL TABLES IN SCHEMA {} TO {}",
        access.table_privileges().join(", "),
        quote_ident(schema),
        quote_ident(role)
    )
}

/// Covers tables created in the schema after the run
pub fn alter_default_privileges(schema: &str, role: &str, access: AccessLevel) -> String {
    format!(
        "ALTER DEFAULT PRIVILEGES IN SCHEMA {} GRANT {} ON TABLES TO {}",
        quote_ident(schema),
        access.table_privileges().join(", "),
        quote_ident(role)
    )
}

/// Contains the password literal; never log the result
pub fn create_user(user: &str, password: &str, group: &str) -> String {
    format!(
        "CREATE ROLE {} LOGIN PASSWORD {} IN ROLE {}",
        quote_ident(user),
        quote_literal(password),
        quote_ident(group)
    )
}

pub fn drop_role_if_exists(role: &str) -> String {
    format!("DROP ROLE IF EXISTS {}", quote_ident(role))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::provisioning::{ColumnSpec, ColumnType};

    #[test]
    fn test_create_enum_type() {
        let sql = create_enum_type("incidents", &EnumTypeSpec::weekday());
        assert_eq!(
            sql,
            "CREATE TYPE \"incidents\".\"weekday\" AS ENUM ('Monday', 'Tuesday', 'Wednesday', \
             'Thursday', 'Friday', 'Saturday', 'Sunday')"
        );
    }

    #[test]
    fn test_create_table() {
        let table = TableSpec {
            name: "t".to_string(),
            columns: vec![
                ColumnSpec::new("id", ColumnType::Integer).primary_key(),
                ColumnSpec::new("name", ColumnType::BoundedText { max_length: 30 }),
                ColumnSpec::new(
                    "day",
                    ColumnType::Enumerated {
                        type_name: "weekday".to_string(),
                    },
                ),
            ],
        };

        let sql = create_table("s", &table);
        assert_eq!(
            sql,
            "CREATE TABLE \"s\".\"t\" (\n    \"id\" integer PRIMARY KEY,\n    \
             \"name\" varchar(30),\n    \"day\" \"s\".\"weekday\"\n)"
        );
    }

    #[test]
    fn test_copy_from_stdin() {
        let table = TableSpec {
            name: "t".to_string(),
            columns: vec![
                ColumnSpec::new("a", ColumnType::Integer),
                ColumnSpec::new("b", ColumnType::Date),
            ],
        };
        assert_eq!(
            copy_from_stdin("s", &table, b','),
            "COPY \"s\".\"t\" (\"a\", \"b\") FROM STDIN \
             WITH (FORMAT csv, HEADER true, DELIMITER ',')"
        );
    }

    #[test]
    fn test_grants_follow_access_level() {
        assert_eq!(
            grant_table_privileges("s", "ro", AccessLevel::ReadOnly),
            "GRANT SELECT ON ALL TABLES IN SCHEMA \"s\" TO \"ro\""
        );
        assert_eq!(
            alter_default_privileges("s", "rw", AccessLevel::ReadWrite),
            "ALTER DEFAULT PRIVILEGES IN SCHEMA \"s\" \
             GRANT SELECT, INSERT, UPDATE, DELETE ON TABLES TO \"rw\""
        );
    }

    #[test]
    fn test_create_user_escapes_password() {
        assert_eq!(
            create_user("reader", "it's", "ro"),
            "CREATE ROLE \"reader\" LOGIN PASSWORD 'it''s' IN ROLE \"ro\""
        );
    }

    #[test]
    fn test_simple_statements() {
        assert_eq!(create_database("db"), "CREATE DATABASE \"db\"");
        assert_eq!(drop_database_if_exists("db"), "DROP DATABASE IF EXISTS \"db\"");
        assert_eq!(create_group("g"), "CREATE ROLE \"g\" NOLOGIN");
        assert_eq!(drop_role_if_exists("g"), "DROP ROLE IF EXISTS \"g\"");
        assert_eq!(
            revoke_database_from_public("db"),
            "REVOKE ALL ON DATABASE \"db\" FROM PUBLIC"
        );
        assert_eq!(
            revoke_schema_from_public("public"),
            "REVOKE ALL ON SCHEMA \"public\" FROM PUBLIC"
        );
    }
}
