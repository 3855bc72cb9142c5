//! Sync targets for mirroring catalog tables into the warehouse
//!
//! A [`SyncTarget`] receives the table models produced for one catalog
//! change notification and does something with them. Two targets exist:
//! - [`SnowflakeTarget`] renders external-table DDL and applies it through
//!   the SQL API, authenticating with a key-pair JWT
//! - [`LoggingTarget`] only logs the table definitions
//!
//! The process picks one at start-up and hands it to a [`SyncDispatcher`],
//! so the caller never needs to know which concrete target is active.
//!
//! ## Example
//!
//! ```rust,ignore
//! use catalogsync_target::{build_target, SyncDispatcher};
//!
//! let config = SyncConfig::from_file(Path::new("snowflake.json"))?;
//! let target = build_target(TargetType::Snowflake, Some(&config))?;
//! let dispatcher = SyncDispatcher::new(target);
//! dispatcher.synchronize(&tables).await?;
//! ```

pub mod error;
pub mod auth;
pub mod client;
pub mod target;
pub mod snowflake;
pub mod logging;
pub mod dispatcher;
pub mod mock;

pub use error::{AuthError, WarehouseError, SyncError};
pub use auth::{AuthSession, AuthToken, KeyPairIssuer, TokenIssuer};
pub use client::{HttpTransport, StatementRequest, StatementTransport, WarehouseClient};
pub use target::{SyncOutcome, SyncTarget};
pub use snowflake::SnowflakeTarget;
pub use logging::LoggingTarget;
pub use dispatcher::{build_target, SyncDispatcher};
pub use mock::{MockTransport, RecordedRequest, StaticTokenIssuer};
