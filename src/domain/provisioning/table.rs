// ============================================================
// TABLE MODEL
// ============================================================
// Column types chosen by the operator and the table they form

use serde::{Deserialize, Serialize};

use super::identifier::qualified;

/// Storage type picked for one column after looking at its profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnType {
    /// 32-bit integer
    Integer,

    /// varchar(max_length)
    BoundedText { max_length: u32 },

    /// Calendar date
    Date,

    /// Fixed-point numeric with unbounded precision and scale
    Numeric,

    /// Closed enumeration declared in the same schema
    Enumerated { type_name: String },
}

impl ColumnType {
    /// SQL type as written in a column definition
    pub fn sql_type(&self, schema: &str) -> String {
        match self {
            ColumnType::Integer => "integer".to_string(),
            ColumnType::BoundedText { max_length } => format!("varchar({})", max_length),
            ColumnType::Date => "date".to_string(),
            ColumnType::Numeric => "numeric".to_string(),
            ColumnType::Enumerated { type_name } => qualified(schema, type_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default)]
    pub primary_key: bool,
}

impl ColumnSpec {
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            primary_key: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

/// Enumerated type with its literals in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumTypeSpec {
    pub name: String,
    pub values: Vec<String>,
}

impl EnumTypeSpec {
    pub fn weekday() -> Self {
        Self {
            name: "weekday".to_string(),
            values: [
                "Monday",
                "Tuesday",
                "Wednesday",
                "Thursday",
                "Friday",
                "Saturday",
                "Sunday",
            ]
            .iter()
            .map(|d| d.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
}

impl TableSpec {
    /// Column names in declaration order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn primary_keys(&self) -> Vec<&ColumnSpec> {
        self.columns.iter().filter(|c| c.primary_key).collect()
    }

    /// Default layout of the incident file: id, code, description, date,
    /// weekday and two coordinates
    pub fn incident_reports(enum_type: &str) -> Self {
        Self {
            name: "incident_reports".to_string(),
            columns: vec![
                ColumnSpec::new("id", ColumnType::Integer).primary_key(),
                ColumnSpec::new("code", ColumnType::Integer),
                ColumnSpec::new("description", ColumnType::BoundedText { max_length: 120 }),
                ColumnSpec::new("occurred_on", ColumnType::Date),
                ColumnSpec::new(
                    "day_of_week",
                    ColumnType::Enumerated {
                        type_name: enum_type.to_string(),
                    },
                ),
                ColumnSpec::new("latitude", ColumnType::Numeric),
                ColumnSpec::new("longitude", ColumnType::Numeric),
            ],
        }
    }
}
