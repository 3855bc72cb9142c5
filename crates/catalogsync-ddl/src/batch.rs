//! Multi-statement batches and the reasons tables are left out of them

use std::fmt;

/// Why a table produced no DDL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The table's file format is not on the allow-list
    DisallowedFormat { file_format: String },

    /// No stage is registered for any prefix of the table location
    UnresolvedStage { location: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DisallowedFormat { file_format } => {
                write!(f, "file format {} is not allowed", file_format)
            }
            Self::UnresolvedStage { location } => {
                write!(f, "could not find stage for {}", location)
            }
        }
    }
}

/// A table dropped from the batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedTable {
    pub table: String,
    pub reason: SkipReason,
}

/// Statements for all tables that survived filtering, ready to send
///
/// The SQL API needs the number of semicolon-terminated statements alongside
/// the text, so the count travels with the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedBatch {
    statements: Vec<String>,
    tables: Vec<String>,
    skipped: Vec<SkippedTable>,
}

impl RenderedBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, table: String, statement: String) {
        self.tables.push(table);
        self.statements.push(statement);
    }

    pub(crate) fn skip(&mut self, table: String, reason: SkipReason) {
        self.skipped.push(SkippedTable { table, reason });
    }

    /// All statements concatenated in table order
    pub fn statement(&self) -> String {
        self.statements.concat()
    }

    pub fn statement_count(&self) -> usize {
        self.statements.len()
    }

    /// Names of the tables that have a statement in the batch
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn skipped(&self) -> &[SkippedTable] {
        &self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.statements.iter().all(|s| s.is_empty())
    }
}
