//! Canonical table model built from a catalog table description

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Catalog table parameter carrying the storage file format
pub const CLASSIFICATION_PARAMETER: &str = "classification";

/// A column or partition key of a catalog table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Column name (case-sensitive)
    pub name: String,

    /// Type as declared in the catalog (e.g. `int`, `decimal(10,2)`)
    #[serde(rename = "type")]
    pub data_type: String,

    /// Free-form column comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Column {
    /// Create a new column without a comment
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            comment: None,
        }
    }

    /// Set the column comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// One catalog table, normalized for synchronization
///
/// Built once per change notification and never mutated afterwards. Column
/// and partition order follow the catalog so the rendered DDL is stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableModel {
    /// Catalog database name, still in the catalog's `__` namespace encoding
    pub database: String,

    /// Table name
    pub name: String,

    /// Data columns, in catalog order
    pub columns: Vec<Column>,

    /// Partition keys, in catalog order
    pub partitions: Vec<Column>,

    /// Storage URI prefix of the table data
    pub location: String,

    /// File format as reported by the catalog (case preserved)
    pub file_format: String,
}

/// Errors raised for catalog descriptions that cannot be modelled
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid table description: {0}")]
    InvalidDocument(String),

    #[error("Table {table} has no 'classification' parameter")]
    MissingClassification { table: String },

    #[error("Table {table} has no storage location")]
    MissingLocation { table: String },

    #[error("Table {table} declares column '{column}' more than once across columns and partitions")]
    DuplicateColumn { table: String, column: String },
}

impl TableModel {
    /// Create a table model, checking that column names are unique across
    /// data columns and partition keys combined
    pub fn new(
        database: impl Into<String>,
        name: impl Into<String>,
        columns: Vec<Column>,
        partitions: Vec<Column>,
        location: impl Into<String>,
        file_format: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let table = Self {
            database: database.into(),
            name: name.into(),
            columns,
            partitions,
            location: location.into(),
            file_format: file_format.into(),
        };
        table.check_unique_columns()?;
        Ok(table)
    }

    /// Build table models from a catalog `GetTable` response document
    ///
    /// Returns an empty list when the table has no storage descriptor: there
    /// is nothing to synchronize for it. At most one model is produced today;
    /// the list leaves room for notifications covering several tables.
    pub fn from_get_table(document: &serde_json::Value) -> Result<Vec<Self>, ModelError> {
        let response: GetTableResponse = serde_json::from_value(document.clone())
            .map_err(|e| ModelError::InvalidDocument(e.to_string()))?;
        let raw = response.table;
        let fqn = format!("{}.{}", raw.database_name, raw.name);

        let Some(storage) = raw.storage_descriptor else {
            tracing::info!(table = %fqn, "Table has no storage descriptor");
            return Ok(Vec::new());
        };

        let location = storage
            .location
            .filter(|location| !location.is_empty())
            .ok_or_else(|| ModelError::MissingLocation { table: fqn.clone() })?;

        let file_format = raw
            .parameters
            .get(CLASSIFICATION_PARAMETER)
            .cloned()
            .ok_or_else(|| ModelError::MissingClassification { table: fqn.clone() })?;

        let table = Self::new(
            raw.database_name,
            raw.name,
            storage.columns.into_iter().map(Column::from).collect(),
            raw.partition_keys.into_iter().map(Column::from).collect(),
            location,
            file_format,
        )?;

        Ok(vec![table])
    }

    /// Parse a `GetTable` response from JSON text
    pub fn from_get_table_str(json: &str) -> Result<Vec<Self>, ModelError> {
        let document: serde_json::Value =
            serde_json::from_str(json).map_err(|e| ModelError::InvalidDocument(e.to_string()))?;
        Self::from_get_table(&document)
    }

    /// Fully qualified catalog name (`database.table`)
    pub fn fqn(&self) -> String {
        format!("{}.{}", self.database, self.name)
    }

    fn check_unique_columns(&self) -> Result<(), ModelError> {
        let mut seen = HashSet::new();
        for column in self.columns.iter().chain(self.partitions.iter()) {
            if !seen.insert(column.name.as_str()) {
                return Err(ModelError::DuplicateColumn {
                    table: self.fqn(),
                    column: column.name.clone(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for TableModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fqn())
    }
}

/// Catalog `GetTable` response, reduced to the fields we read
#[derive(Debug, Deserialize)]
struct GetTableResponse {
    #[serde(rename = "Table")]
    table: RawTable,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawTable {
    name: String,
    database_name: String,
    #[serde(default)]
    storage_descriptor: Option<RawStorageDescriptor>,
    #[serde(default)]
    partition_keys: Vec<RawColumn>,
    #[serde(default)]
    parameters: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawStorageDescriptor {
    #[serde(default)]
    columns: Vec<RawColumn>,
    #[serde(default)]
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawColumn {
    name: String,
    #[serde(rename = "Type")]
    data_type: String,
    #[serde(default)]
    comment: Option<String>,
}

impl From<RawColumn> for Column {
    fn from(raw: RawColumn) -> Self {
        Self {
            name: raw.name,
            data_type: raw.data_type,
            comment: raw.comment,
        }
    }
}
