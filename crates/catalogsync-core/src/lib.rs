//! catalogsync core
//!
//! Domain model shared by the renderer, the sync targets and the handler:
//! the canonical table model built from a catalog description, the stage map
//! used to turn storage locations into stage references, and the connection
//! configuration loaded once per process.

pub mod table;
pub mod stage;
pub mod config;

pub use table::{Column, TableModel, ModelError};
pub use stage::StageMap;
pub use config::{SyncConfig, AllowedFormats, TargetType, ConfigError};
