//! Sync target trait

use catalogsync_core::{SyncConfig, TableModel};

use crate::error::SyncError;

/// What a synchronize call did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A batch was sent and accepted
    Applied {
        statement_count: usize,
        skipped: usize,
    },

    /// Every table was filtered out; the warehouse was not contacted
    NothingToApply { skipped: usize },

    /// Table definitions were only logged
    Logged { table_count: usize },
}

/// A destination for catalog table definitions
#[async_trait::async_trait]
pub trait SyncTarget: Send + Sync {
    /// Build the target from the connection configuration
    fn build(config: &SyncConfig) -> Result<Self, SyncError>
    where
        Self: Sized;

    /// Get the target name (e.g., "Snowflake", "Logging")
    fn name(&self) -> &'static str;

    /// Mirror the given tables into the target
    async fn synchronize(&self, tables: &[TableModel]) -> Result<SyncOutcome, SyncError>;
}
