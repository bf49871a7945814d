//! Shared fixtures for the crate's unit tests.

use crate::schema::{Column, ColumnConstraint, DataType, Schema, Table};

/// A two-table library schema: `author(id PK, name)` and
/// `book(id PK, title, author_id FK -> author.id)`.
pub(crate) fn library_schema() -> Schema {
    let author = Table::new(
        "author",
        vec![
            Column::new(
                "id",
                DataType::Integer,
                ColumnConstraint {
                    is_primary_key: true,
                    ..Default::default()
                },
            ),
            Column::new(
                "name",
                DataType::String,
                ColumnConstraint {
                    is_not_null: true,
                    max_char_length: Some(128),
                    ..Default::default()
                },
            ),
        ],
    );
    let book = Table::new(
        "book",
        vec![
            Column::new(
                "id",
                DataType::Integer,
                ColumnConstraint {
                    is_primary_key: true,
                    ..Default::default()
                },
            ),
            Column::new("title", DataType::String, ColumnConstraint::default()),
            Column::new(
                "author_id",
                DataType::Integer,
                ColumnConstraint {
                    is_foreign_key: true,
                    ..Default::default()
                },
            ),
        ],
    );
    Schema::new(
        "library",
        vec![author, book],
        &[("book", "author_id", "author", "id")],
    )
    .unwrap()
}
