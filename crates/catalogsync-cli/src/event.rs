//! Catalog change events
//!
//! Table changes arrive as audit records wrapped in an event-bus envelope:
//!
//! ```json
//! {
//!   "detail": {
//!     "eventSource": "glue.amazonaws.com",
//!     "eventName": "UpdateTable",
//!     "userIdentity": {"accountId": "123456789012"},
//!     "requestParameters": {
//!       "catalogId": "123456789012",
//!       "databaseName": "sales",
//!       "tableInput": {"name": "orders"}
//!     }
//!   }
//! }
//! ```

use serde::Deserialize;
use std::fmt;

/// Event source of catalog audit records
pub const CATALOG_EVENT_SOURCE: &str = "glue.amazonaws.com";

/// Event names that carry a table definition change
pub const TABLE_CHANGE_EVENTS: [&str; 2] = ["CreateTable", "UpdateTable"];

/// Errors raised for events that cannot be interpreted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Event has neither requestParameters.catalogId nor userIdentity.accountId")]
    MissingCatalogId,
}

/// Identifies one table in the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub catalog_id: String,
    pub database: String,
    pub table: String,
}

impl TableRef {
    pub fn new(
        catalog_id: impl Into<String>,
        database: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            catalog_id: catalog_id.into(),
            database: database.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}.{}", self.catalog_id, self.database, self.table)
    }
}

/// Event-bus envelope around a catalog audit record
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEvent {
    pub detail: EventDetail,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetail {
    pub event_source: String,
    pub event_name: String,
    #[serde(default)]
    pub user_identity: Option<UserIdentity>,
    #[serde(default)]
    pub request_parameters: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    #[serde(default)]
    pub account_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableChangeParameters {
    database_name: String,
    table_input: TableInput,
    #[serde(default)]
    catalog_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TableInput {
    name: String,
}

impl CatalogEvent {
    pub fn from_value(value: &serde_json::Value) -> Result<Self, EventError> {
        serde_json::from_value(value.clone()).map_err(|e| EventError::InvalidEvent(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, EventError> {
        serde_json::from_str(json).map_err(|e| EventError::InvalidEvent(e.to_string()))
    }

    /// Whether this is a table create/update from the catalog
    pub fn is_table_change(&self) -> bool {
        self.detail.event_source == CATALOG_EVENT_SOURCE
            && TABLE_CHANGE_EVENTS.contains(&self.detail.event_name.as_str())
    }

    /// The changed table; the catalog id falls back to the caller's account
    pub fn table_ref(&self) -> Result<TableRef, EventError> {
        let params: TableChangeParameters =
            serde_json::from_value(self.detail.request_parameters.clone())
                .map_err(|e| EventError::InvalidEvent(format!("requestParameters: {}", e)))?;

        let catalog_id = params
            .catalog_id
            .or_else(|| {
                self.detail
                    .user_identity
                    .as_ref()
                    .and_then(|identity| identity.account_id.clone())
            })
            .ok_or(EventError::MissingCatalogId)?;

        Ok(TableRef::new(catalog_id, params.database_name, params.table_input.name))
    }
}
