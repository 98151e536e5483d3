// ============================================================
// PROVISIONING DOMAIN LAYER
// ============================================================
// What gets created: database, schema, enum, table, groups, users

mod access;
pub mod identifier;
mod table;

pub use access::{AccessLevel, GroupSpec, UserSpec};
pub use table::{ColumnSpec, ColumnType, EnumTypeSpec, TableSpec};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::error::{AppError, Result};
use identifier::validate_identifier;

/// Everything the provisioning run creates inside PostgreSQL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseLayout {
    pub database: String,
    pub schema: String,
    pub enum_type: EnumTypeSpec,
    pub table: TableSpec,
    pub groups: Vec<GroupSpec>,
    pub users: Vec<UserSpec>,
}

impl Default for DatabaseLayout {
    fn default() -> Self {
        let enum_type = EnumTypeSpec::weekday();
        let table = TableSpec::incident_reports(&enum_type.name);

        Self {
            database: "city_records".to_string(),
            schema: "incidents".to_string(),
            enum_type,
            table,
            groups: vec![
                GroupSpec {
                    name: "readonly_group".to_string(),
                    access: AccessLevel::ReadOnly,
                },
                GroupSpec {
                    name: "readwrite_group".to_string(),
                    access: AccessLevel::ReadWrite,
                },
            ],
            users: vec![
                UserSpec {
                    name: "report_reader".to_string(),
                    group: "readonly_group".to_string(),
                    password_ref: "env:PGPROVISION_READER_PASSWORD".to_string(),
                },
                UserSpec {
                    name: "report_writer".to_string(),
                    group: "readwrite_group".to_string(),
                    password_ref: "env:PGPROVISION_WRITER_PASSWORD".to_string(),
                },
            ],
        }
    }
}

impl DatabaseLayout {
    pub fn group(&self, name: &str) -> Option<&GroupSpec> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Names of every role the run creates, groups first
    pub fn role_names(&self) -> Vec<String> {
        self.groups
            .iter()
            .map(|g| g.name.clone())
            .chain(self.users.iter().map(|u| u.name.clone()))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        validate_identifier("database", &self.database)?;
        validate_identifier("schema", &self.schema)?;
        validate_identifier("enum type", &self.enum_type.name)?;
        validate_identifier("table", &self.table.name)?;

        if self.enum_type.values.is_empty() {
            return Err(AppError::ValidationError(format!(
                "Enum type '{}' has no values",
                self.enum_type.name
            )));
        }
        let mut seen = HashSet::new();
        for value in &self.enum_type.values {
            if !seen.insert(value.as_str()) {
                return Err(AppError::ValidationError(format!(
                    "Enum type '{}' repeats value '{}'",
                    self.enum_type.name, value
                )));
            }
        }

        if self.table.columns.is_empty() {
            return Err(AppError::ValidationError(format!(
                "Table '{}' has no columns",
                self.table.name
            )));
        }
        let mut column_names = HashSet::new();
        for column in &self.table.columns {
            validate_identifier("column", &column.name)?;
            if !column_names.insert(column.name.as_str()) {
                return Err(AppError::ValidationError(format!(
                    "Column '{}' declared twice",
                    column.name
                )));
            }
            match &column.column_type {
                ColumnType::BoundedText { max_length } if *max_length == 0 => {
                    return Err(AppError::ValidationError(format!(
                        "Column '{}' has a zero varchar width",
                        column.name
                    )));
                }
                ColumnType::Enumerated { type_name } if *type_name != self.enum_type.name => {
                    return Err(AppError::ValidationError(format!(
                        "Column '{}' references unknown enum type '{}'",
                        column.name, type_name
                    )));
                }
                _ => {}
            }
        }
        if self.table.primary_keys().len() != 1 {
            return Err(AppError::ValidationError(format!(
                "Table '{}' must declare exactly one primary key column",
                self.table.name
            )));
        }

        let mut role_names = HashSet::new();
        for group in &self.groups {
            validate_identifier("group", &group.name)?;
            if !role_names.insert(group.name.as_str()) {
                return Err(AppError::ValidationError(format!(
                    "Role '{}' declared twice",
                    group.name
                )));
            }
        }
        for user in &self.users {
            validate_identifier("user", &user.name)?;
            if !role_names.insert(user.name.as_str()) {
                return Err(AppError::ValidationError(format!(
                    "Role '{}' declared twice",
                    user.name
                )));
            }
            if self.group(&user.group).is_none() {
                return Err(AppError::ValidationError(format!(
                    "User '{}' belongs to unknown group '{}'",
                    user.name, user.group
                )));
            }
        }

        Ok(())
    }
}
