use std::fmt;

use crate::expression::{join_displayed, Expression};
use crate::operator::LogicalOperator;

/// The `where_clause` of a `SELECT` statement.
///
/// A `Compound` node with `NOT` has exactly one child; `AND`/`OR` nodes
/// have at least two.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereClause {
    Simple(Expression),
    Compound {
        operator: LogicalOperator,
        children: Vec<WhereClause>,
    },
}

impl WhereClause {
    pub fn and(children: Vec<WhereClause>) -> WhereClause {
        debug_assert!(children.len() > 1);
        WhereClause::Compound {
            operator: LogicalOperator::And,
            children,
        }
    }

    pub fn or(children: Vec<WhereClause>) -> WhereClause {
        debug_assert!(children.len() > 1);
        WhereClause::Compound {
            operator: LogicalOperator::Or,
            children,
        }
    }

    pub fn negate(child: WhereClause) -> WhereClause {
        WhereClause::Compound {
            operator: LogicalOperator::Not,
            children: vec![child],
        }
    }

    /// Number of simple predicates in this clause tree.
    pub fn num_simple_predicates(&self) -> usize {
        match self {
            WhereClause::Simple(_) => 1,
            WhereClause::Compound { children, .. } => {
                children.iter().map(WhereClause::num_simple_predicates).sum()
            }
        }
    }

    // Compound children are parenthesized to preserve precedence
    fn parenthesized(&self) -> String {
        match self {
            WhereClause::Simple(_) => self.to_string(),
            WhereClause::Compound { .. } => format!("({self})"),
        }
    }
}

impl fmt::Display for WhereClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WhereClause::Simple(expression) => expression.fmt(f),
            WhereClause::Compound { operator, children } => {
                if *operator == LogicalOperator::Not {
                    debug_assert_eq!(children.len(), 1);
                    return write!(f, "{} {}", operator, children[0]);
                }
                let parts: Vec<String> =
                    children.iter().map(WhereClause::parenthesized).collect();
                f.write_str(&join_displayed(&parts, &format!(" {operator} ")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::BinaryRhs;
    use crate::operator::BinaryOperator;

    fn simple(column: &str, value: i64) -> WhereClause {
        WhereClause::Simple(Expression::Binary {
            left: Box::new(Expression::column(Some("t"), column)),
            operator: BinaryOperator::Eq,
            right: BinaryRhs::One(Box::new(Expression::constant(value))),
        })
    }

    #[test]
    fn test_render_simple_predicate() {
        assert_eq!(simple("x", 1).to_string(), "t.x = 1");
    }

    #[test]
    fn test_render_compound_predicates() {
        let and = WhereClause::and(vec![simple("x", 1), simple("y", 2)]);
        assert_eq!(and.to_string(), "t.x = 1 AND t.y = 2");

        let nested = WhereClause::or(vec![and.clone(), simple("z", 3)]);
        assert_eq!(nested.to_string(), "(t.x = 1 AND t.y = 2) OR t.z = 3");

        let negated = WhereClause::negate(simple("x", 1));
        assert_eq!(negated.to_string(), "NOT t.x = 1");
    }

    #[test]
    fn test_count_simple_predicates() {
        let clause = WhereClause::and(vec![
            simple("x", 1),
            WhereClause::negate(simple("y", 2)),
            simple("z", 3),
        ]);
        assert_eq!(clause.num_simple_predicates(), 3);
    }
}
