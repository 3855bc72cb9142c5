//! Statement templates for the warehouse's external-table dialect

/// Data column: a typed projection out of the semi-structured `value` column
pub const COLUMN_TEMPLATE: &str = "{{ name }} {{ column_type }} as (value:{{ name }}::{{ column_type }})";

/// Partition column: a typed expression over the object path
pub const PARTITION_COLUMN_TEMPLATE: &str = "{{ name }} {{ column_type }} as {{ expression }}";

/// Value of the `index`-th path segment (1-based); the part after `=` for
/// `key=value` segments, the raw segment otherwise
pub const PARTITION_EXPRESSION_TEMPLATE: &str = "DECODE(SPLIT_PART(SPLIT_PART(metadata$filename, '/', {{ index }}),'=',2),'',SPLIT_PART(metadata$filename, '/', {{ index }}),SPLIT_PART(SPLIT_PART(metadata$filename, '/', {{ index }}),'=',2))";

pub const CREATE_TEMPLATE: &str = concat!(
    "CREATE OR REPLACE EXTERNAL TABLE {{ database_name }}.{{ table_name }} ",
    "({{ columns }}) ",
    "{% if partitions %}PARTITION BY ({{ partitions }}){% endif %}",
    " LOCATION=@{{ table_path }} AUTO_REFRESH = {{ auto_refresh }} FILE_FORMAT = (TYPE = {{ file_format }});",
);

/// The set of templates a renderer is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DdlTemplates {
    pub column: &'static str,
    pub partition_column: &'static str,
    pub partition_expression: &'static str,
    pub create: &'static str,
}

impl Default for DdlTemplates {
    fn default() -> Self {
        Self {
            column: COLUMN_TEMPLATE,
            partition_column: PARTITION_COLUMN_TEMPLATE,
            partition_expression: PARTITION_EXPRESSION_TEMPLATE,
            create: CREATE_TEMPLATE,
        }
    }
}
