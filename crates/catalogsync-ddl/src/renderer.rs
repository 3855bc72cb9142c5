//! External-table statement rendering
//!
//! Converts a [`TableModel`] and its resolved stage path into warehouse DDL.

use catalogsync_core::{AllowedFormats, Column, StageMap, TableModel};
use minijinja::{context, Environment};

use crate::batch::{RenderedBatch, SkipReason};
use crate::partition::partition_segment_index;
use crate::templates::DdlTemplates;

/// Catalog encoding of a `.` inside a database name
const NAMESPACE_SEPARATOR: &str = "__";

const COLUMN: &str = "column";
const PARTITION_COLUMN: &str = "partition_column";
const PARTITION_EXPRESSION: &str = "partition_expression";
const CREATE: &str = "create";

/// Error during DDL rendering
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Invalid template '{name}': {source}")]
    Template {
        name: &'static str,
        #[source]
        source: minijinja::Error,
    },

    #[error("Failed to render {table}: {source}")]
    Render {
        table: String,
        #[source]
        source: minijinja::Error,
    },
}

/// Renders external-table DDL from compiled templates
pub struct DdlRenderer {
    env: Environment<'static>,
}

impl DdlRenderer {
    /// Create a renderer with the default templates
    pub fn new() -> Result<Self, RenderError> {
        Self::with_templates(DdlTemplates::default())
    }

    /// Create a renderer from a custom template set
    pub fn with_templates(templates: DdlTemplates) -> Result<Self, RenderError> {
        let mut env = Environment::new();

        for (name, source) in [
            (COLUMN, templates.column),
            (PARTITION_COLUMN, templates.partition_column),
            (PARTITION_EXPRESSION, templates.partition_expression),
            (CREATE, templates.create),
        ] {
            env.add_template(name, source)
                .map_err(|source| RenderError::Template { name, source })?;
        }

        Ok(Self { env })
    }

    /// Render the statement for one table at a resolved stage path
    pub fn render_table(&self, table: &TableModel, stage_path: &str) -> Result<String, RenderError> {
        let fqn = table.fqn();
        let render_err = |source: minijinja::Error| RenderError::Render {
            table: fqn.clone(),
            source,
        };

        let mut columns = table
            .columns
            .iter()
            .map(|column| self.render_column(column))
            .collect::<Result<Vec<_>, _>>()
            .map_err(render_err)?;

        for (position, partition) in table.partitions.iter().enumerate() {
            let index = partition_segment_index(stage_path, position);
            columns.push(self.render_partition(partition, index).map_err(render_err)?);
        }

        let partitions = table
            .partitions
            .iter()
            .map(|partition| partition.name.as_str())
            .collect::<Vec<_>>()
            .join(",");

        self.env
            .get_template(CREATE)
            .and_then(|template| {
                template.render(context! {
                    database_name => table.database.replace(NAMESPACE_SEPARATOR, "."),
                    table_name => &table.name,
                    columns => columns.join(","),
                    partitions => partitions,
                    table_path => stage_path,
                    auto_refresh => "true",
                    file_format => &table.file_format,
                })
            })
            .map_err(render_err)
    }

    /// Filter, resolve and render a set of tables into one batch
    ///
    /// Tables with a disallowed file format or an unresolvable location are
    /// recorded as skipped; they never fail the batch.
    pub fn render_batch(
        &self,
        tables: &[TableModel],
        stages: &StageMap,
        formats: &AllowedFormats,
    ) -> Result<RenderedBatch, RenderError> {
        let mut batch = RenderedBatch::new();

        for table in tables {
            if !formats.allows(&table.file_format) {
                tracing::info!(table = %table, file_format = %table.file_format, "Skipping table: file format not allowed");
                batch.skip(
                    table.fqn(),
                    SkipReason::DisallowedFormat {
                        file_format: table.file_format.clone(),
                    },
                );
                continue;
            }

            let Some(stage_path) = stages.resolve(&table.location) else {
                tracing::warn!(table = %table, location = %table.location, "Could not find stage for table location");
                batch.skip(
                    table.fqn(),
                    SkipReason::UnresolvedStage {
                        location: table.location.clone(),
                    },
                );
                continue;
            };

            tracing::debug!(table = %table, stage_path = %stage_path, "Resolved stage");
            let statement = self.render_table(table, &stage_path)?;
            batch.push(table.fqn(), statement);
        }

        Ok(batch)
    }

    fn render_column(&self, column: &Column) -> Result<String, minijinja::Error> {
        self.env.get_template(COLUMN)?.render(context! {
            name => &column.name,
            column_type => &column.data_type,
        })
    }

    fn render_partition(&self, partition: &Column, index: usize) -> Result<String, minijinja::Error> {
        let expression = self
            .env
            .get_template(PARTITION_EXPRESSION)?
            .render(context! { index => index })?;

        self.env.get_template(PARTITION_COLUMN)?.render(context! {
            name => &partition.name,
            column_type => &partition.data_type,
            expression => expression,
        })
    }
}
