//! Table shape declared by a resource for the destinations.
//!
//! The declaration is fixed up front; destinations translate it into their
//! own type system instead of inferring one from the rows.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use serde_json::{json, Value};

/// Arrow extension name carried by JSON columns stored as UTF-8.
pub const ARROW_JSON_EXTENSION: &str = "arrow.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    BigInt,
    Json,
    Timestamp,
}

impl ColumnType {
    fn bigquery_type(&self) -> &'static str {
        match self {
            ColumnType::BigInt => "INT64",
            ColumnType::Json => "JSON",
            ColumnType::Timestamp => "TIMESTAMP",
        }
    }

    fn sqlite_type(&self) -> &'static str {
        match self {
            ColumnType::BigInt => "INTEGER",
            // SQLite has no JSON storage class; json_* functions work on TEXT.
            ColumnType::Json => "TEXT",
            ColumnType::Timestamp => "TEXT",
        }
    }

    fn arrow_type(&self) -> DataType {
        match self {
            ColumnType::BigInt => DataType::Int64,
            ColumnType::Json => DataType::Utf8,
            ColumnType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
        }
    }
}

/// How existing table contents are treated by a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteDisposition {
    /// Drop whatever the table held and keep only the rows of this load.
    Replace,
}

impl fmt::Display for WriteDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteDisposition::Replace => f.write_str("replace"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: ColumnType,
    pub nullable: bool,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
    pub write_disposition: WriteDisposition,
    /// Nominal key; a replace load never merges on it.
    pub primary_key: Vec<String>,
}

impl TableSchema {
    /// The breed table: `row_id`, `breed_json`, `updated_at`, replaced on every load.
    pub fn breeds(table_name: impl Into<String>) -> Self {
        Self {
            name: table_name.into(),
            columns: vec![
                ColumnSchema::new("row_id", ColumnType::BigInt),
                ColumnSchema::new("breed_json", ColumnType::Json),
                ColumnSchema::new("updated_at", ColumnType::Timestamp),
            ],
            write_disposition: WriteDisposition::Replace,
            primary_key: vec!["row_id".to_string()],
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn to_arrow_schema(&self) -> SchemaRef {
        let fields: Vec<Field> = self
            .columns
            .iter()
            .map(|c| {
                let field = Field::new(&c.name, c.data_type.arrow_type(), c.nullable);
                if c.data_type == ColumnType::Json {
                    field.with_metadata(HashMap::from([(
                        "ARROW:extension:name".to_string(),
                        ARROW_JSON_EXTENSION.to_string(),
                    )]))
                } else {
                    field
                }
            })
            .collect();
        Arc::new(Schema::new(fields))
    }

    /// Field list in the shape of a BigQuery `TableSchema.fields`.
    pub fn bigquery_fields(&self) -> Value {
        let fields: Vec<Value> = self
            .columns
            .iter()
            .map(|c| {
                let mode = if c.nullable { "NULLABLE" } else { "REQUIRED" };
                json!({
                    "name": c.name,
                    "type": c.data_type.bigquery_type(),
                    "mode": mode,
                })
            })
            .collect();
        Value::Array(fields)
    }

    pub fn sqlite_ddl(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                let mut def = format!("{} {}", quote_ident(&c.name), c.data_type.sqlite_type());
                if !c.nullable {
                    def.push_str(" NOT NULL");
                }
                if self.primary_key.len() == 1 && self.primary_key[0] == c.name {
                    def.push_str(" PRIMARY KEY");
                }
                def
            })
            .collect();
        format!("CREATE TABLE {} ({})", quote_ident(&self.name), columns.join(", "))
    }
}

/// Double-quoted SQL identifier, with embedded quotes doubled.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
