//! Catalog model for the squall workload toolkit: tables, columns,
//! constraints, the foreign-key relationship graph, and per-column
//! statistics.
//!
//! Schemas can be built programmatically, loaded from a DDL text of
//! `CREATE TABLE` statements, or round-tripped through JSON so that
//! precomputed statistics files can be used independently of the source
//! dataset.

pub mod column_stats;
pub mod ddl;
pub mod error;
pub mod graph;
pub mod schema;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;

pub use column_stats::{
    CategoricalStats, ColumnStats, ColumnType, KeyStats, NumericalStats, RawStringStats,
};
pub use ddl::schema_from_ddl;
pub use error::CatalogError;
pub use graph::DirectedGraph;
pub use schema::{
    Column, ColumnConstraint, DataType, RelationshipGraph, Schema, Table, TableColumn,
};
pub use stats::{DataStats, TableStats};
