//! Active-target holder
//!
//! Built once before the first event and reused for every event the process
//! handles. Callers only ever see [`SyncDispatcher::synchronize`]; which
//! target sits behind it is decided at start-up from [`TargetType`].

use catalogsync_core::{ConfigError, SyncConfig, TableModel, TargetType};

use crate::error::SyncError;
use crate::logging::LoggingTarget;
use crate::snowflake::SnowflakeTarget;
use crate::target::{SyncOutcome, SyncTarget};

/// Build the target selected by `target_type`
///
/// The warehouse target needs a connection configuration; the logging
/// target works without one.
pub fn build_target(
    target_type: TargetType,
    config: Option<&SyncConfig>,
) -> Result<Box<dyn SyncTarget>, SyncError> {
    let target: Box<dyn SyncTarget> = match (target_type, config) {
        (TargetType::Snowflake, Some(config)) => Box::new(SnowflakeTarget::build(config)?),
        (TargetType::Snowflake, None) => {
            return Err(ConfigError::MissingField(
                "connection configuration for SNOWFLAKE target".to_string(),
            )
            .into())
        }
        (TargetType::Logging, Some(config)) => Box::new(LoggingTarget::build(config)?),
        (TargetType::Logging, None) => Box::new(LoggingTarget::new()),
    };

    tracing::info!(target_type = %target_type, target = target.name(), "Built sync target");
    Ok(target)
}

/// Forwards synchronize calls to the active target
pub struct SyncDispatcher {
    target: Box<dyn SyncTarget>,
}

impl SyncDispatcher {
    pub fn new(target: Box<dyn SyncTarget>) -> Self {
        Self { target }
    }

    /// Replace the active target, returning the previous one
    pub fn set_target(&mut self, target: Box<dyn SyncTarget>) -> Box<dyn SyncTarget> {
        std::mem::replace(&mut self.target, target)
    }

    pub fn target_name(&self) -> &'static str {
        self.target.name()
    }

    pub async fn synchronize(&self, tables: &[TableModel]) -> Result<SyncOutcome, SyncError> {
        tracing::info!(target = self.target.name(), tables = tables.len(), "Syncing table definitions");
        self.target.synchronize(tables).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warehouse_target_requires_config() {
        let result = build_target(TargetType::Snowflake, None);
        assert!(matches!(result, Err(SyncError::Config(ConfigError::MissingField(_)))));
    }

    #[test]
    fn logging_target_without_config() {
        let target = build_target(TargetType::Logging, None).unwrap();
        assert_eq!(target.name(), "Logging");
    }

    #[tokio::test]
    async fn swapping_targets() {
        let mut dispatcher = SyncDispatcher::new(Box::new(LoggingTarget::new()));
        assert_eq!(dispatcher.target_name(), "Logging");

        let previous = dispatcher.set_target(Box::new(LoggingTarget::new()));
        assert_eq!(previous.name(), "Logging");
        assert_eq!(
            dispatcher.synchronize(&[]).await.unwrap(),
            SyncOutcome::Logged { table_count: 0 }
        );
    }
}
