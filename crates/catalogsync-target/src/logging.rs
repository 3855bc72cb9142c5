//! Diagnostic target that only logs table definitions

use catalogsync_core::{SyncConfig, TableModel};

use crate::error::SyncError;
use crate::target::{SyncOutcome, SyncTarget};

/// Logs each table definition and touches nothing else
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingTarget;

impl LoggingTarget {
    pub fn new() -> Self {
        tracing::info!("Logging :: build");
        Self
    }
}

#[async_trait::async_trait]
impl SyncTarget for LoggingTarget {
    fn build(_config: &SyncConfig) -> Result<Self, SyncError> {
        Ok(Self::new())
    }

    fn name(&self) -> &'static str {
        "Logging"
    }

    async fn synchronize(&self, tables: &[TableModel]) -> Result<SyncOutcome, SyncError> {
        tracing::info!(tables = tables.len(), "Logging :: synchronize");
        for table in tables {
            tracing::info!(table = %table, definition = ?table, "Table definition");
        }

        Ok(SyncOutcome::Logged {
            table_count: tables.len(),
        })
    }
}
