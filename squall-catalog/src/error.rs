use thiserror::Error;

/// Errors raised by catalog lookups, construction and (de)serialization.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("table `{0}` does not exist")]
    TableNotFound(String),

    #[error("column `{0}` does not exist")]
    ColumnNotFound(String),

    #[error("table-column pair `{table}.{column}` does not exist")]
    TableColumnNotFound { table: String, column: String },

    #[error("each edge's nodes must come from the given nodes")]
    EdgeOutsideGraph,

    #[error("node does not exist in the graph")]
    NodeNotFound,

    #[error("`{0}` does not correspond to any DataType")]
    UnknownDataType(String),

    #[error("`{0}` is not a valid column type for {1}")]
    InvalidColumnType(crate::column_stats::ColumnType, crate::schema::DataType),

    #[error("expected {expected} column series for table `{table}`, got {actual}")]
    SeriesCountMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("schema DDL error: {0}")]
    Ddl(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
