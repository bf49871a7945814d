//! Deterministic orderings over hash-based collections.
//!
//! Set iteration order is not stable, so every place a sampler makes a
//! random choice over a set goes through one of these sorts first.

use squall_catalog::TableColumn;

use crate::ast::unique_table::UniqueTable;
use crate::sampler::join::JoinEdge;

/// Sorts table occurrences by `(table name, identity)`.
pub fn sort_unique_tables(
    unique_tables: impl IntoIterator<Item = UniqueTable>,
) -> Vec<UniqueTable> {
    let mut sorted: Vec<UniqueTable> = unique_tables.into_iter().collect();
    sorted.sort_by(|a, b| {
        a.name()
            .cmp(b.name())
            .then_with(|| a.id().cmp(&b.id()))
    });
    sorted
}

/// Sorts join edges lexicographically by their `"table.column"` endpoint
/// pairs (endpoints ordered within each edge first).
pub fn sort_join_edges(join_edges: impl IntoIterator<Item = JoinEdge>) -> Vec<JoinEdge> {
    fn stringify(table_column: &TableColumn) -> String {
        format!("{}.{}", table_column.table.name, table_column.column.name)
    }

    let mut keyed: Vec<((String, String), JoinEdge)> = join_edges
        .into_iter()
        .map(|edge| {
            let mut endpoints = [stringify(&edge.first), stringify(&edge.second)];
            endpoints.sort();
            let [lo, hi] = endpoints;
            ((lo, hi), edge)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, edge)| edge).collect()
}
