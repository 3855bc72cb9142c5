//! Errors raised while synchronizing with a target

use catalogsync_core::ConfigError;
use catalogsync_ddl::RenderError;

/// Errors that can occur while issuing access tokens
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Token signing failed: {0}")]
    SigningError(String),
}

/// Errors that can occur when sending statements to the warehouse
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WarehouseError {
    #[error("Statement rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Errors surfaced by a sync target
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
