//! External-table DDL rendering
//!
//! This crate handles:
//! - Rendering one `CREATE OR REPLACE EXTERNAL TABLE` statement per table
//! - Deriving partition columns from Hive-style object path segments
//! - Filtering tables by file format and stage resolvability
//! - Assembling the surviving statements into one multi-statement batch

pub mod templates;
pub mod partition;
pub mod renderer;
pub mod batch;

pub use templates::DdlTemplates;
pub use partition::{partition_segment_index, stage_depth};
pub use renderer::{DdlRenderer, RenderError};
pub use batch::{RenderedBatch, SkipReason, SkippedTable};
