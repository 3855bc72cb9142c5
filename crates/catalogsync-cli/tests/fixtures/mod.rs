//! Test fixtures for handler tests
//!
//! Catalog documents, change events and a handler wired to a Snowflake
//! target over the recording transport.

#![allow(dead_code)]

use catalogsync_cli::{Handler, InMemoryCatalog};
use catalogsync_core::{AllowedFormats, StageMap};
use catalogsync_ddl::DdlRenderer;
use catalogsync_target::{
    AuthSession, MockTransport, SnowflakeTarget, StaticTokenIssuer, SyncDispatcher, WarehouseClient,
};
use serde_json::{json, Value};

pub const ACCOUNT_ID: &str = "123456789012";

/// Catalog change event for `database.table`
pub fn table_event(event_name: &str, database: &str, table: &str) -> Value {
    json!({
        "version": "0",
        "detail-type": "AWS API Call via CloudTrail",
        "source": "aws.glue",
        "detail": {
            "eventSource": "glue.amazonaws.com",
            "eventName": event_name,
            "userIdentity": {"accountId": ACCOUNT_ID},
            "requestParameters": {
                "databaseName": database,
                "tableInput": {"name": table}
            }
        }
    })
}

/// `GetTable` document for `db.orders` with the given classification
pub fn orders_document(location: &str, classification: &str) -> Value {
    json!({
        "Table": {
            "Name": "orders",
            "DatabaseName": "db",
            "StorageDescriptor": {
                "Columns": [
                    {"Name": "id", "Type": "int"},
                    {"Name": "amt", "Type": "decimal"}
                ],
                "Location": location
            },
            "PartitionKeys": [],
            "TableType": "EXTERNAL_TABLE",
            "Parameters": {"classification": classification}
        }
    })
}

/// `GetTable` document for a view: no storage descriptor
pub fn view_document() -> Value {
    json!({
        "Table": {
            "Name": "orders",
            "DatabaseName": "db",
            "TableType": "VIRTUAL_VIEW",
            "Parameters": {}
        }
    })
}

/// Handler with a Snowflake target over `transport`; `orders_stage` only,
/// PARQUET only
pub fn snowflake_handler(
    transport: &MockTransport,
    issuer: &StaticTokenIssuer,
    catalog: InMemoryCatalog,
) -> Handler {
    let target = SnowflakeTarget::new(
        DdlRenderer::new().unwrap(),
        StageMap::new([("orders_stage", "s3://bucket/orders")]).unwrap(),
        AllowedFormats::new(["PARQUET"]),
        WarehouseClient::new(transport.clone(), AuthSession::new(issuer.clone()), "SYSADMIN"),
    );
    Handler::new(SyncDispatcher::new(Box::new(target)), catalog)
}
