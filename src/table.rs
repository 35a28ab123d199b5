//! In-memory tables used for import and export
//!
//! A table is a list of typed columns plus rows of [`Value`]s. It
//! serializes as
//!
//! ```json
//! {
//!   "columns": [{"name": "age", "type": "number"}, {"name": "city", "type": "text", "max_length": 20}],
//!   "rows": [[42, "Oslo"], [null, "Lima"]]
//! }
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::dictionary::Value;
use crate::errors::{SavError, SavResult};

/// One row, one value per column
pub type DataRow = Vec<Value>;

/// Column type of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColumnType {
    /// Text, optionally with a declared maximum length in bytes
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<u32>,
    },
    Number,
    Integer,
    Boolean,
    DateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataColumn {
    pub name: String,
    #[serde(flatten)]
    pub column_type: ColumnType,
}

impl DataColumn {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    /// Adjusts a loosely typed value (e.g. from JSON) to this column's type.
    ///
    /// Text that parses as a date-time becomes one in date-time columns;
    /// date-times in text columns become their ISO-8601 text.
    pub fn coerce(&self, value: Value) -> Value {
        match (&self.column_type, value) {
            (ColumnType::DateTime, Value::Text(text)) => text
                .parse::<NaiveDateTime>()
                .map(Value::DateTime)
                .unwrap_or(Value::Text(text)),
            (ColumnType::Text { .. }, Value::DateTime(dt)) => Value::Text(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            (_, value) => value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    pub columns: Vec<DataColumn>,
    #[serde(default)]
    pub rows: Vec<DataRow>,
}

impl DataTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_column(&mut self, name: impl Into<String>, column_type: ColumnType) -> usize {
        self.columns.push(DataColumn::new(name, column_type));
        self.columns.len() - 1
    }

    /// Appends a row; it must have one value per column
    pub fn add_row(&mut self, row: DataRow) -> SavResult<()> {
        if row.len() != self.columns.len() {
            return Err(SavError::invalid_argument(format!(
                "Row has {} values but the table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}
