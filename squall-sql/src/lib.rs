//! A minimal, language-agnostic representation of SQL `SELECT` statements.
//!
//! The types in this crate form the output side of the query generator:
//! statements are assembled programmatically and serialized to SQL text via
//! their `Display` implementations. Only the subset of PostgreSQL syntax
//! needed for generated workloads is covered: joins, filter predicates and
//! aggregate target lists.

pub mod expression;
pub mod from_clause;
pub mod operator;
pub mod statement;
pub mod value;
pub mod where_clause;

pub use expression::{Expression, FunctionName};
pub use from_clause::{AliasedTable, FromClause, Join, JoinType};
pub use operator::{BinaryOperator, LogicalOperator, UnaryOperator};
pub use statement::{SelectStatement, TargetList};
pub use value::Literal;
pub use where_clause::WhereClause;
