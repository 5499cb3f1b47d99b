//! Store wire format
//!
//! Field names follow the store's PascalCase JSON convention.

use crate::schema::{Dimension, Measurement};

use serde::{Deserialize, Serialize};

/// Batched write addressed to one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WriteRecordsRequest {
    pub database_name: String,
    pub table_name: String,
    pub records: Vec<WriteRecord>,
}

/// One measure as the store receives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WriteRecord {
    pub time: String,
    pub time_unit: String,
    pub measure_name: String,
    pub measure_value: String,
    pub measure_value_type: String,
    pub dimensions: Vec<WireDimension>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WireDimension {
    pub name: String,
    pub value: String,
}

impl From<&Dimension> for WireDimension {
    fn from(dimension: &Dimension) -> Self {
        Self {
            name: dimension.name.clone(),
            value: dimension.value.clone(),
        }
    }
}

impl From<&Measurement> for WriteRecord {
    fn from(m: &Measurement) -> Self {
        Self {
            time: m.time.to_string(),
            time_unit: m.time_unit.as_str().to_string(),
            measure_name: m.name.clone(),
            measure_value: m.measure_value(),
            measure_value_type: m.value_type.as_str().to_string(),
            dimensions: m.dimensions.iter().map(WireDimension::from).collect(),
        }
    }
}

/// Query submission body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryStatement {
    pub query_string: String,
}

/// Tabular query output: declared columns plus positional rows.
///
/// Every scalar arrives as a string regardless of the column's declared type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryResponse {
    #[serde(default)]
    pub column_info: Vec<ColumnInfo>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl QueryResponse {
    /// Build a response from column names and row values.
    pub fn from_table(columns: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            column_info: columns
                .iter()
                .map(|name| ColumnInfo {
                    name: Some(name.to_string()),
                })
                .collect(),
            rows: rows
                .iter()
                .map(|values| Row {
                    data: values
                        .iter()
                        .map(|v| Datum {
                            scalar_value: Some(v.to_string()),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ColumnInfo {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Row {
    #[serde(default)]
    pub data: Vec<Datum>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Datum {
    #[serde(default)]
    pub scalar_value: Option<String>,
}
