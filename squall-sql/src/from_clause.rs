use std::fmt;

use crate::expression::Expression;

/// Join types supported by PostgreSQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
    Cross,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JoinType::Inner => "JOIN",
            JoinType::LeftOuter => "LEFT OUTER JOIN",
            JoinType::RightOuter => "RIGHT OUTER JOIN",
            JoinType::FullOuter => "FULL OUTER JOIN",
            JoinType::Cross => "CROSS JOIN",
        })
    }
}

/// The `from_clause` of a `SELECT` statement: a single table or a join tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FromClause {
    Table(AliasedTable),
    Join(Box<Join>),
}

/// A table occurrence, optionally renamed with an alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AliasedTable {
    pub name: String,
    pub alias: Option<String>,
}

impl AliasedTable {
    pub fn new(name: &str, alias: Option<&str>) -> AliasedTable {
        AliasedTable {
            name: name.to_string(),
            alias: alias.map(str::to_string),
        }
    }
}

impl fmt::Display for AliasedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} AS {}", self.name, alias),
            None => f.write_str(&self.name),
        }
    }
}

/// A join of two `from_clause` items.
///
/// The predicate is `None` exactly for cross joins; every other join type
/// carries one.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub left: FromClause,
    pub join_type: JoinType,
    pub right: FromClause,
    pub predicate: Option<Expression>,
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.join_type == JoinType::Cross {
            return write!(f, "{}, {}", self.left, self.right);
        }
        debug_assert!(self.predicate.is_some());
        match &self.predicate {
            Some(predicate) => {
                write!(
                    f,
                    "{} {} {} ON {}",
                    self.left, self.join_type, self.right, predicate
                )
            }
            None => write!(f, "{} {} {}", self.left, self.join_type, self.right),
        }
    }
}

impl fmt::Display for FromClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FromClause::Table(table) => table.fmt(f),
            FromClause::Join(join) => join.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::BinaryRhs;
    use crate::operator::BinaryOperator;

    fn equijoin(left: (&str, &str), right: (&str, &str)) -> Expression {
        Expression::Binary {
            left: Box::new(Expression::column(Some(left.0), left.1)),
            operator: BinaryOperator::Eq,
            right: BinaryRhs::One(Box::new(Expression::column(Some(right.0), right.1))),
        }
    }

    #[test]
    fn test_render_single_table() {
        assert_eq!(
            FromClause::Table(AliasedTable::new("book", None)).to_string(),
            "book"
        );
        assert_eq!(
            FromClause::Table(AliasedTable::new("book", Some("book_1"))).to_string(),
            "book AS book_1"
        );
    }

    #[test]
    fn test_render_left_deep_join() {
        let from = FromClause::Join(Box::new(Join {
            left: FromClause::Join(Box::new(Join {
                left: FromClause::Table(AliasedTable::new("author", None)),
                join_type: JoinType::Inner,
                right: FromClause::Table(AliasedTable::new("book", None)),
                predicate: Some(equijoin(("book", "author_id"), ("author", "id"))),
            })),
            join_type: JoinType::LeftOuter,
            right: FromClause::Table(AliasedTable::new("genre", None)),
            predicate: Some(equijoin(("book", "genre_id"), ("genre", "id"))),
        }));

        assert_eq!(
            from.to_string(),
            "author JOIN book ON book.author_id = author.id \
             LEFT OUTER JOIN genre ON book.genre_id = genre.id"
        );
    }

    #[test]
    fn test_render_cross_join() {
        let from = FromClause::Join(Box::new(Join {
            left: FromClause::Table(AliasedTable::new("a", None)),
            join_type: JoinType::Cross,
            right: FromClause::Table(AliasedTable::new("b", None)),
            predicate: None,
        }));
        assert_eq!(from.to_string(), "a, b");
    }
}
