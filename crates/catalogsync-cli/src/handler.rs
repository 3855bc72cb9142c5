//! Event handler
//!
//! One [`Handler`] is initialized per process and handles every event the
//! process receives:
//!
//! 1. Ignore anything that is not a catalog table create/update
//! 2. Read the table description from the catalog
//! 3. Build the table models
//! 4. Hand them to the active sync target
//!
//! A failed catalog read, or a table without a storage descriptor, ends the
//! invocation successfully with nothing synchronized. Model and sync errors
//! fail the invocation.

use serde::Serialize;

use catalogsync_core::{ModelError, SyncConfig, TableModel, TargetType};
use catalogsync_target::{build_target, SyncDispatcher, SyncError, SyncOutcome};

use crate::catalog::CatalogClient;
use crate::event::{CatalogEvent, EventError};

/// Response returned to the invoker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

impl HandlerResponse {
    pub fn ok() -> Self {
        Self { status_code: 200 }
    }
}

/// What happened to one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Not a table create/update
    Ignored,

    /// Catalog read failed or the table has nothing to synchronize
    NoModel,

    /// Table models were handed to the target
    Synced(SyncOutcome),
}

impl Invocation {
    pub fn response(&self) -> HandlerResponse {
        HandlerResponse::ok()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error(transparent)]
    Event(#[from] EventError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

pub struct Handler {
    dispatcher: SyncDispatcher,
    catalog: Box<dyn CatalogClient>,
}

impl Handler {
    pub fn new(dispatcher: SyncDispatcher, catalog: impl CatalogClient + 'static) -> Self {
        Self {
            dispatcher,
            catalog: Box::new(catalog),
        }
    }

    /// Build the target selected by `target_type` and wire it to `catalog`
    pub fn initialize(
        target_type: TargetType,
        config: Option<&SyncConfig>,
        catalog: impl CatalogClient + 'static,
    ) -> Result<Self, HandlerError> {
        let target = build_target(target_type, config)?;
        Ok(Self::new(SyncDispatcher::new(target), catalog))
    }

    pub fn target_name(&self) -> &'static str {
        self.dispatcher.target_name()
    }

    pub async fn handle(&self, event: &serde_json::Value) -> Result<Invocation, HandlerError> {
        tracing::info!(event = %event, "Incoming event");

        let event = CatalogEvent::from_value(event)?;
        if !event.is_table_change() {
            tracing::info!(
                source = %event.detail.event_source,
                name = %event.detail.event_name,
                "Ignoring event"
            );
            return Ok(Invocation::Ignored);
        }

        let table = event.table_ref()?;
        let document = match self.catalog.get_table(&table).await {
            Ok(document) => document,
            Err(e) => {
                tracing::error!(table = %table, error = %e, "Get table exception");
                return Ok(Invocation::NoModel);
            }
        };

        let models = TableModel::from_get_table(&document)?;
        if models.is_empty() {
            tracing::info!(table = %table, "Glue table extract failed");
            return Ok(Invocation::NoModel);
        }

        let outcome = self.dispatcher.synchronize(&models).await?;
        tracing::info!(table = %table, outcome = ?outcome, "Table sync attempted");
        Ok(Invocation::Synced(outcome))
    }

    /// Handle an event given as JSON text
    pub async fn handle_json(&self, json: &str) -> Result<Invocation, HandlerError> {
        let event: serde_json::Value =
            serde_json::from_str(json).map_err(|e| EventError::InvalidEvent(e.to_string()))?;
        self.handle(&event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn update_event() -> serde_json::Value {
        json!({
            "detail": {
                "eventSource": "glue.amazonaws.com",
                "eventName": "UpdateTable",
                "requestParameters": {
                    "catalogId": "123456789012",
                    "databaseName": "sales",
                    "tableInput": {"name": "orders"}
                }
            }
        })
    }

    #[test]
    fn response_wire_format() {
        assert_eq!(
            serde_json::to_value(HandlerResponse::ok()).unwrap(),
            json!({"statusCode": 200})
        );
    }

    #[tokio::test]
    async fn logging_target_without_config() {
        let catalog = InMemoryCatalog::new();
        catalog
            .add_table(
                "sales",
                "orders",
                json!({"Table": {
                    "Name": "orders",
                    "DatabaseName": "sales",
                    "StorageDescriptor": {
                        "Columns": [{"Name": "id", "Type": "int"}],
                        "Location": "s3://bucket/orders/"
                    },
                    "Parameters": {"classification": "parquet"}
                }}),
            )
            .await;

        let handler = Handler::initialize(TargetType::Logging, None, catalog).unwrap();
        assert_eq!(handler.target_name(), "Logging");

        let invocation = handler.handle(&update_event()).await.unwrap();
        assert_eq!(invocation, Invocation::Synced(SyncOutcome::Logged { table_count: 1 }));
        assert_eq!(invocation.response().status_code, 200);
    }

    #[tokio::test]
    async fn missing_table_is_success() {
        let handler = Handler::initialize(TargetType::Logging, None, InMemoryCatalog::new()).unwrap();
        assert_eq!(handler.handle(&update_event()).await.unwrap(), Invocation::NoModel);
    }

    #[tokio::test]
    async fn malformed_json_is_an_error() {
        let handler = Handler::initialize(TargetType::Logging, None, InMemoryCatalog::new()).unwrap();
        let result = handler.handle_json("{not json").await;
        assert!(matches!(result, Err(HandlerError::Event(EventError::InvalidEvent(_)))));
    }
}
