//! Catalog change handling
//!
//! Turns catalog change notifications into warehouse external-table
//! definitions:
//! - [`event`]: the notification envelope and the relevance filter
//! - [`catalog`]: reading table descriptions, with retry on transient failures
//! - [`handler`]: the per-event pipeline from notification to sync target

pub mod event;
pub mod catalog;
pub mod handler;

pub use event::{CatalogEvent, EventError, TableRef};
pub use catalog::{CatalogClient, CatalogError, FileCatalog, InMemoryCatalog, RetryingCatalog};
pub use handler::{Handler, HandlerError, HandlerResponse, Invocation};
