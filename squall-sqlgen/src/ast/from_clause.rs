use std::collections::{HashMap, HashSet};

use squall_sql::expression::BinaryRhs;
use squall_sql::{AliasedTable, BinaryOperator, Expression, FromClause, Join, JoinType};

use crate::ast::expression::GenColumnReference;
use crate::ast::unique_table::UniqueTable;
use crate::util::sort_unique_tables;

/// Alias assignment for the table occurrences of one statement.
///
/// Only occurrences whose base table appears more than once get an alias.
#[derive(Debug, Default)]
pub struct TableAliases {
    aliases: HashMap<UniqueTable, String>,
}

impl TableAliases {
    pub fn get(&self, unique_table: &UniqueTable) -> Option<&str> {
        self.aliases.get(unique_table).map(String::as_str)
    }
}

/// Generator-side `from_clause`: a single table occurrence or a left-deep
/// join tree whose right children are always single occurrences.
#[derive(Debug, Clone)]
pub enum GenFromClause {
    Table(GenAliasedTable),
    Join(Box<GenJoin>),
}

/// A table occurrence whose alias is left undetermined until lowering, so
/// that aliases can be assigned globally across the whole statement.
#[derive(Debug, Clone)]
pub struct GenAliasedTable {
    pub unique_table: UniqueTable,
}

/// A join whose right side is a fresh table occurrence. The join type is
/// never a cross join, so a predicate is always present.
#[derive(Debug, Clone)]
pub struct GenJoin {
    pub left: GenFromClause,
    pub join_type: JoinType,
    pub right: GenAliasedTable,
    pub predicate: JoinPredicate,
}

/// An equijoin predicate over the columns of two table occurrences.
#[derive(Debug, Clone)]
pub struct JoinPredicate {
    pub left: GenColumnReference,
    pub operator: BinaryOperator,
    pub right: GenColumnReference,
}

impl GenFromClause {
    /// All table occurrences of this clause.
    pub fn unique_tables(&self) -> HashSet<UniqueTable> {
        let mut tables = HashSet::new();
        self.collect_unique_tables(&mut tables);
        tables
    }

    fn collect_unique_tables(&self, tables: &mut HashSet<UniqueTable>) {
        match self {
            GenFromClause::Table(table) => {
                tables.insert(table.unique_table.clone());
            }
            GenFromClause::Join(join) => {
                join.left.collect_unique_tables(tables);
                tables.insert(join.right.unique_table.clone());
            }
        }
    }

    /// Assigns aliases to the occurrences of this clause: occurrences are
    /// grouped by base table, and any group of size > 1 gets 1-based
    /// `<name>_<i>` aliases in deterministic order.
    pub fn generate_table_aliases(&self) -> TableAliases {
        let mut groups: HashMap<&str, Vec<UniqueTable>> = HashMap::new();
        let unique_tables = self.unique_tables();
        for unique_table in &unique_tables {
            groups
                .entry(unique_table.name())
                .or_default()
                .push(unique_table.clone());
        }

        let mut aliases = HashMap::new();
        for group in groups.into_values() {
            if group.len() > 1 {
                for (i, unique_table) in sort_unique_tables(group).into_iter().enumerate() {
                    let alias = format!("{}_{}", unique_table.name(), i + 1);
                    aliases.insert(unique_table, alias);
                }
            }
        }

        TableAliases { aliases }
    }

    pub fn to_sql(&self, table_aliases: &TableAliases) -> FromClause {
        match self {
            GenFromClause::Table(table) => FromClause::Table(table.to_sql(table_aliases)),
            GenFromClause::Join(join) => FromClause::Join(Box::new(Join {
                left: join.left.to_sql(table_aliases),
                join_type: join.join_type,
                right: FromClause::Table(join.right.to_sql(table_aliases)),
                predicate: Some(Expression::Binary {
                    left: Box::new(Expression::Column(
                        join.predicate.left.to_sql(table_aliases),
                    )),
                    operator: join.predicate.operator,
                    right: BinaryRhs::One(Box::new(Expression::Column(
                        join.predicate.right.to_sql(table_aliases),
                    ))),
                }),
            })),
        }
    }
}

impl GenAliasedTable {
    pub fn new(unique_table: UniqueTable) -> GenAliasedTable {
        GenAliasedTable { unique_table }
    }

    pub fn to_sql(&self, table_aliases: &TableAliases) -> AliasedTable {
        AliasedTable {
            name: self.unique_table.name().to_string(),
            alias: table_aliases
                .get(&self.unique_table)
                .map(str::to_string),
        }
    }
}
