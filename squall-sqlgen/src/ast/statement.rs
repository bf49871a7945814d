use squall_sql::{SelectStatement, TargetList};

use crate::ast::expression::GenExpression;
use crate::ast::from_clause::{GenFromClause, TableAliases};
use crate::ast::where_clause::GenWhereClause;

/// Generator-side target list.
#[derive(Debug, Clone)]
pub struct GenTargetList {
    pub targets: Vec<GenExpression>,
}

impl GenTargetList {
    pub fn new(targets: Vec<GenExpression>) -> GenTargetList {
        GenTargetList { targets }
    }

    pub fn to_sql(&self, table_aliases: &TableAliases) -> TargetList {
        TargetList::new(
            self.targets
                .iter()
                .map(|target| target.to_sql(table_aliases))
                .collect(),
        )
    }
}

/// Generator-side `SELECT` statement. Unlike the plain AST, the from
/// clause is always present.
#[derive(Debug, Clone)]
pub struct GenSelectStatement {
    pub target_list: GenTargetList,
    pub from_clause: GenFromClause,
    pub where_clause: Option<GenWhereClause>,
}

impl GenSelectStatement {
    /// Lowers to the plain AST, assigning table aliases globally.
    pub fn to_sql(&self) -> SelectStatement {
        let table_aliases = self.from_clause.generate_table_aliases();
        SelectStatement {
            target_list: self.target_list.to_sql(&table_aliases),
            from_clause: Some(self.from_clause.to_sql(&table_aliases)),
            where_clause: self
                .where_clause
                .as_ref()
                .map(|where_clause| where_clause.to_sql(&table_aliases)),
        }
    }
}
