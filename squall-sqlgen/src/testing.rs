//! Shared fixtures for the crate's unit tests.

use squall_catalog::{
    CatalogError, Column, ColumnConstraint, DataStats, DataType, Schema, Table,
};
use squall_sql::Literal;

fn pk(name: &str, dtype: DataType) -> Column {
    Column::new(
        name,
        dtype,
        ColumnConstraint {
            is_primary_key: true,
            ..Default::default()
        },
    )
}

fn fk(name: &str, dtype: DataType) -> Column {
    Column::new(
        name,
        dtype,
        ColumnConstraint {
            is_foreign_key: true,
            ..Default::default()
        },
    )
}

fn plain(name: &str, dtype: DataType) -> Column {
    Column::new(name, dtype, ColumnConstraint::default())
}

/// A two-table library schema whose columns cover all four statistics
/// kinds: keys, numerical, categorical and raw strings.
pub(crate) fn library_schema() -> Schema {
    let author = Table::new(
        "author",
        vec![
            pk("id", DataType::Integer),
            plain("age", DataType::Integer),
            plain("name", DataType::String),
        ],
    );
    let book = Table::new(
        "book",
        vec![
            pk("id", DataType::Integer),
            plain("title", DataType::String),
            plain("rating", DataType::Float),
            plain("genre", DataType::String),
            plain("in_print", DataType::Boolean),
            fk("author_id", DataType::Integer),
        ],
    );
    Schema::new(
        "library",
        vec![author, book],
        &[("book", "author_id", "author", "id")],
    )
    .unwrap()
}

/// An org chart with a self-referencing foreign key.
pub(crate) fn self_referencing_schema() -> Schema {
    let employee = Table::new(
        "employee",
        vec![
            pk("id", DataType::Integer),
            plain("name", DataType::String),
            fk("manager_id", DataType::Integer),
        ],
    );
    Schema::new(
        "org",
        vec![employee],
        &[("employee", "manager_id", "employee", "id")],
    )
    .unwrap()
}

const GENRES: [&str; 5] = ["novel", "poetry", "drama", "essay", "satire"];

fn column_series(column: &Column, num_rows: i64) -> Vec<Option<Literal>> {
    (0..num_rows)
        .map(|i| {
            Some(match (column.name.as_str(), column.dtype) {
                ("age", _) => Literal::Integer(18 + i % 62),
                ("rating", _) => Literal::Float(i as f64 / 10.0),
                ("genre", _) => Literal::String(GENRES[i as usize % GENRES.len()].into()),
                ("in_print", _) => Literal::Boolean(i % 2 == 0),
                (_, DataType::Integer) => Literal::Integer(i),
                _ => Literal::String(format!("row {i} text value")),
            })
        })
        .collect()
}

/// Synthetic statistics for any of the fixture schemas.
pub(crate) fn synthetic_stats(schema: &Schema) -> DataStats {
    DataStats::from_tables(
        schema,
        |table| -> Result<_, CatalogError> {
            Ok(table
                .columns
                .iter()
                .map(|column| column_series(column, 200))
                .collect())
        },
        false,
    )
    .unwrap()
}
