//! Catalog read boundary
//!
//! [`CatalogClient`] fetches the `GetTable` description of one table. Reads
//! go through [`RetryingCatalog`], which retries transient failures with
//! exponential backoff; everything else fails fast.
//!
//! - [`FileCatalog`] serves descriptions exported to `<root>/<database>/<table>.json`
//! - [`InMemoryCatalog`] holds descriptions in memory and can be scripted to
//!   fail, for tests

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::event::TableRef;

/// Total attempts per read, first one included
pub const CATALOG_READ_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid table description for {table}: {message}")]
    InvalidDocument { table: String, message: String },

    #[error("Invalid catalog name '{0}'")]
    InvalidName(String),
}

impl CatalogError {
    /// Whether repeating the read may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Reads table descriptions from the catalog
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch the `GetTable` response document for `table`
    async fn get_table(&self, table: &TableRef) -> Result<serde_json::Value, CatalogError>;
}

/// Retries transient read failures of the wrapped client
pub struct RetryingCatalog<C> {
    inner: C,
    backoff: ExponentialBuilder,
}

impl<C: CatalogClient> RetryingCatalog<C> {
    pub fn new(inner: C) -> Self {
        Self::with_backoff(
            inner,
            ExponentialBuilder::default()
                .with_min_delay(Duration::from_millis(200))
                .with_max_delay(Duration::from_secs(2))
                .with_max_times(CATALOG_READ_ATTEMPTS - 1),
        )
    }

    pub fn with_backoff(inner: C, backoff: ExponentialBuilder) -> Self {
        Self { inner, backoff }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: CatalogClient> CatalogClient for RetryingCatalog<C> {
    async fn get_table(&self, table: &TableRef) -> Result<serde_json::Value, CatalogError> {
        (|| async { self.inner.get_table(table).await })
            .retry(self.backoff.clone())
            .when(CatalogError::is_transient)
            .notify(|err: &CatalogError, delay: Duration| {
                tracing::warn!(table = %table, error = %err, ?delay, "Catalog read failed, retrying");
            })
            .await
    }
}

/// Table descriptions exported as JSON files
pub struct FileCatalog {
    root: PathBuf,
}

impl FileCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// File holding the description of `table`; names that could leave the
    /// catalog root are rejected
    pub fn path_for(&self, table: &TableRef) -> Result<PathBuf, CatalogError> {
        let database = path_component(&table.database)?;
        let name = path_component(&table.table)?;
        Ok(self.root.join(database).join(format!("{}.json", name)))
    }
}

#[async_trait]
impl CatalogClient for FileCatalog {
    async fn get_table(&self, table: &TableRef) -> Result<serde_json::Value, CatalogError> {
        let path = self.path_for(table)?;
        tracing::debug!(path = %path.display(), "Reading table description");

        let contents = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CatalogError::TableNotFound(table.to_string())
            } else {
                CatalogError::Unavailable(format!("{}: {}", path.display(), e))
            }
        })?;

        serde_json::from_str(&contents).map_err(|e| CatalogError::InvalidDocument {
            table: table.to_string(),
            message: e.to_string(),
        })
    }
}

fn path_component(name: &str) -> Result<&str, CatalogError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(CatalogError::InvalidName(name.to_string()));
    }
    Ok(name)
}

/// In-memory catalog for tests
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    tables: Arc<RwLock<HashMap<String, serde_json::Value>>>,
    remaining_failures: Arc<AtomicUsize>,
    reads: Arc<AtomicUsize>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the `GetTable` document for `database.table`
    pub async fn add_table(&self, database: &str, table: &str, document: serde_json::Value) {
        self.tables
            .write()
            .await
            .insert(format!("{}.{}", database, table), document);
    }

    /// Fail the next `times` reads as unavailable
    pub fn fail_times(self, times: usize) -> Self {
        self.remaining_failures.store(times, Ordering::SeqCst);
        self
    }

    /// Reads attempted so far, failed ones included
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogClient for InMemoryCatalog {
    async fn get_table(&self, table: &TableRef) -> Result<serde_json::Value, CatalogError> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        let scripted_failure = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if scripted_failure {
            return Err(CatalogError::Unavailable("throttled".to_string()));
        }

        self.tables
            .read()
            .await
            .get(&format!("{}.{}", table.database, table.table))
            .cloned()
            .ok_or_else(|| CatalogError::TableNotFound(table.to_string()))
    }
}
