//! Test fixtures for sync target integration tests
//!
//! Table models, stage maps and credentials shared by the tests. The RSA key
//! pair under this directory exists only for signing test tokens.

#![allow(dead_code)]

use catalogsync_core::{AllowedFormats, Column, StageMap, TableModel};

pub const TEST_KEY: &str = include_str!("test_rsa_key.pem");
pub const TEST_PUBLIC_KEY: &str = include_str!("test_rsa_key.pub.pem");
pub const TEST_KEY_FINGERPRINT: &str = "SHA256:sUS7SzLaTp3Jwk1M8DDiBUPBc80V8jIn5Q8CCbx1LrY=";

/// `db.orders`: two data columns, no partitions, parquet
pub fn orders_table() -> TableModel {
    TableModel::new(
        "db",
        "orders",
        vec![Column::new("id", "int"), Column::new("amt", "decimal")],
        vec![],
        "s3://bucket/orders/",
        "PARQUET",
    )
    .unwrap()
}

/// `sales__raw.clicks`: partitioned by year and month below the lake stage
pub fn clicks_table() -> TableModel {
    TableModel::new(
        "sales__raw",
        "clicks",
        vec![
            Column::new("user_id", "bigint"),
            Column::new("url", "string"),
        ],
        vec![Column::new("year", "string"), Column::new("month", "string")],
        "s3://bucket/lake/clicks/",
        "json",
    )
    .unwrap()
}

pub fn stages() -> StageMap {
    StageMap::new([
        ("orders_stage", "s3://bucket/orders"),
        ("lake_stage", "s3://bucket/lake/"),
    ])
    .unwrap()
}

pub fn formats() -> AllowedFormats {
    AllowedFormats::new(["PARQUET", "JSON"])
}

/// Connection document pointing at `url`, signing with the test key
pub fn connection_document(url: &str) -> String {
    serde_json::json!({
        "url": url,
        "accountidentifier": "xy12345.us-east-1",
        "warehouse": "COMPUTE_WH",
        "role": "SYSADMIN",
        "username": "catalog_sync",
        "private_key": TEST_KEY,
        "stages": {"s3": {"orders_stage": "s3://bucket/orders/"}},
        "allowedvalues": {"fileformats": ["PARQUET"]},
        "request_timeout_secs": 5
    })
    .to_string()
}
