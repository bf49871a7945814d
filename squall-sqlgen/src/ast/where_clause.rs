use squall_sql::{BinaryOperator, Literal, LogicalOperator, WhereClause};

use crate::ast::expression::{GenBinaryRhs, GenColumnReference, GenExpression};
use crate::ast::from_clause::TableAliases;

/// Generator-side `where_clause`; lowers to [`squall_sql::WhereClause`].
#[derive(Debug, Clone)]
pub enum GenWhereClause {
    Simple(GenSimplePredicate),
    Compound(GenCompoundPredicate),
}

#[derive(Debug, Clone)]
pub struct GenSimplePredicate {
    pub expression: GenExpression,
}

impl GenSimplePredicate {
    /// A `<column> <op> <constant>` predicate.
    pub fn binary_constant(
        left: GenColumnReference,
        operator: BinaryOperator,
        right: Literal,
    ) -> GenSimplePredicate {
        GenSimplePredicate {
            expression: GenExpression::Binary {
                left: Box::new(GenExpression::Column(left)),
                operator,
                right: GenBinaryRhs::One(Box::new(GenExpression::Constant(right))),
            },
        }
    }

    /// A `<column> <op> (<constants…>)` predicate (`IN`, `BETWEEN`).
    pub fn binary_constants(
        left: GenColumnReference,
        operator: BinaryOperator,
        right: Vec<Literal>,
    ) -> GenSimplePredicate {
        GenSimplePredicate {
            expression: GenExpression::Binary {
                left: Box::new(GenExpression::Column(left)),
                operator,
                right: GenBinaryRhs::Many(
                    right.into_iter().map(GenExpression::Constant).collect(),
                ),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenCompoundPredicate {
    pub operator: LogicalOperator,
    pub children: Vec<GenWhereClause>,
}

impl GenCompoundPredicate {
    pub fn make_and(children: Vec<GenWhereClause>) -> GenWhereClause {
        debug_assert!(children.len() > 1);
        GenWhereClause::Compound(GenCompoundPredicate {
            operator: LogicalOperator::And,
            children,
        })
    }

    pub fn make_or(children: Vec<GenWhereClause>) -> GenWhereClause {
        debug_assert!(children.len() > 1);
        GenWhereClause::Compound(GenCompoundPredicate {
            operator: LogicalOperator::Or,
            children,
        })
    }

    pub fn make_not(child: GenWhereClause) -> GenWhereClause {
        GenWhereClause::Compound(GenCompoundPredicate {
            operator: LogicalOperator::Not,
            children: vec![child],
        })
    }
}

impl GenWhereClause {
    pub fn to_sql(&self, table_aliases: &TableAliases) -> WhereClause {
        match self {
            GenWhereClause::Simple(predicate) => {
                WhereClause::Simple(predicate.expression.to_sql(table_aliases))
            }
            GenWhereClause::Compound(predicate) => WhereClause::Compound {
                operator: predicate.operator,
                children: predicate
                    .children
                    .iter()
                    .map(|child| child.to_sql(table_aliases))
                    .collect(),
            },
        }
    }
}
