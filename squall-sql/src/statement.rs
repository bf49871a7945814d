use std::fmt;

use crate::expression::{join_displayed, Expression};
use crate::from_clause::FromClause;
use crate::where_clause::WhereClause;

/// The target list of a `SELECT` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetList {
    pub targets: Vec<Expression>,
}

impl TargetList {
    pub fn new(targets: Vec<Expression>) -> TargetList {
        TargetList { targets }
    }
}

impl fmt::Display for TargetList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_displayed(&self.targets, ", "))
    }
}

/// A SQL `SELECT` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub target_list: TargetList,
    pub from_clause: Option<FromClause>,
    pub where_clause: Option<WhereClause>,
}

impl fmt::Display for SelectStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT {}", self.target_list)?;
        if let Some(from_clause) = &self.from_clause {
            write!(f, " FROM {from_clause}")?;
        }
        if let Some(where_clause) = &self.where_clause {
            write!(f, " WHERE {where_clause}")?;
        }
        f.write_str(";")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{BinaryRhs, FunctionCall, FunctionName};
    use crate::from_clause::AliasedTable;
    use crate::operator::BinaryOperator;

    #[test]
    fn test_render_select_statement() {
        let statement = SelectStatement {
            target_list: TargetList::new(vec![Expression::Function(FunctionCall::star(
                FunctionName::Count,
            ))]),
            from_clause: Some(FromClause::Table(AliasedTable::new("book", None))),
            where_clause: Some(WhereClause::Simple(Expression::Binary {
                left: Box::new(Expression::column(Some("book"), "id")),
                operator: BinaryOperator::Leq,
                right: BinaryRhs::One(Box::new(Expression::constant(100i64))),
            })),
        };
        assert_eq!(
            statement.to_string(),
            "SELECT COUNT(*) FROM book WHERE book.id <= 100;"
        );
    }

    #[test]
    fn test_render_select_without_optional_clauses() {
        let statement = SelectStatement {
            target_list: TargetList::new(vec![Expression::constant(1i64)]),
            from_clause: None,
            where_clause: None,
        };
        assert_eq!(statement.to_string(), "SELECT 1;");
    }
}
