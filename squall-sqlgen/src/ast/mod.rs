//! Generator-side AST wrappers.
//!
//! These mirror the plain AST of `squall-sql`, but reference tables through
//! [`UniqueTable`] occurrences instead of resolved alias strings. Aliases
//! are assigned globally when a statement is lowered with `to_sql`, so that
//! self-joins get deterministic `<name>_1`, `<name>_2`, … names.

pub mod expression;
pub mod from_clause;
pub mod statement;
pub mod unique_table;
pub mod where_clause;

pub use expression::{GenColumnReference, GenExpression, GenFunctionCall};
pub use from_clause::{GenAliasedTable, GenFromClause, GenJoin, JoinPredicate, TableAliases};
pub use statement::{GenSelectStatement, GenTargetList};
pub use unique_table::UniqueTable;
pub use where_clause::{GenCompoundPredicate, GenSimplePredicate, GenWhereClause};
