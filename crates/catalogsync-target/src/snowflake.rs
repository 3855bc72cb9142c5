//! Snowflake external-table target
//!
//! Renders a `CREATE OR REPLACE EXTERNAL TABLE` statement for every table
//! whose file format is allowed and whose location resolves to a stage, and
//! submits them as one multi-statement batch through the SQL API.
//!
//! ## Retry policy
//!
//! Token expiry is only discovered when the warehouse rejects a call, and the
//! response is not inspected to tell an expired token from any other
//! failure. So any failure of the first attempt issues a fresh token and
//! repeats the attempt once. A second failure is returned to the caller.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let config = SyncConfig::from_file(Path::new("snowflake.json"))?;
//! let target = SnowflakeTarget::build(&config)?;
//! target.synchronize(&tables).await?;
//! ```
//!
//! Reference: https://docs.snowflake.com/en/sql-reference/sql/create-external-table

use catalogsync_core::{AllowedFormats, StageMap, SyncConfig, TableModel};
use catalogsync_ddl::DdlRenderer;

use crate::client::WarehouseClient;
use crate::error::SyncError;
use crate::target::{SyncOutcome, SyncTarget};

const MAX_ATTEMPTS: usize = 2;

/// Warehouse target applying external-table DDL
pub struct SnowflakeTarget {
    renderer: DdlRenderer,
    stages: StageMap,
    formats: AllowedFormats,
    client: WarehouseClient,
}

impl SnowflakeTarget {
    pub fn new(
        renderer: DdlRenderer,
        stages: StageMap,
        formats: AllowedFormats,
        client: WarehouseClient,
    ) -> Self {
        Self {
            renderer,
            stages,
            formats,
            client,
        }
    }

    pub fn client(&self) -> &WarehouseClient {
        &self.client
    }

    async fn synchronize_once(&self, tables: &[TableModel]) -> Result<SyncOutcome, SyncError> {
        let batch = self
            .renderer
            .render_batch(tables, &self.stages, &self.formats)?;
        let skipped = batch.skipped().len();

        if batch.is_empty() {
            tracing::info!(tables = tables.len(), skipped, "No statements to apply");
            return Ok(SyncOutcome::NothingToApply { skipped });
        }

        let statement = batch.statement();
        tracing::info!(
            tables = ?batch.tables(),
            statements = batch.statement_count(),
            statement = %statement,
            "Snowflake table definition"
        );

        self.client
            .invoke(&statement, batch.statement_count())
            .await?;

        Ok(SyncOutcome::Applied {
            statement_count: batch.statement_count(),
            skipped,
        })
    }
}

#[async_trait::async_trait]
impl SyncTarget for SnowflakeTarget {
    fn build(config: &SyncConfig) -> Result<Self, SyncError> {
        tracing::info!(
            stages = ?config.stage_map().iter().collect::<Vec<_>>(),
            "Stages available in connection configuration"
        );

        Ok(Self::new(
            DdlRenderer::new()?,
            config.stage_map().clone(),
            config.allowed_formats().clone(),
            WarehouseClient::from_config(config)?,
        ))
    }

    fn name(&self) -> &'static str {
        "Snowflake"
    }

    async fn synchronize(&self, tables: &[TableModel]) -> Result<SyncOutcome, SyncError> {
        let mut attempt = 1;
        loop {
            match self.synchronize_once(tables).await {
                Ok(outcome) => return Ok(outcome),
                Err(error) if attempt < MAX_ATTEMPTS => {
                    tracing::warn!(error = %error, attempt, "Synchronize failed; auto generating token");
                    self.client.session().refresh().await?;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
