use std::fmt;

use thiserror::Error;

use crate::operator::{BinaryOperator, UnaryOperator};
use crate::value::Literal;

/// Raised when a name does not correspond to any known function.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("`{name}` does not correspond to any FunctionName")]
pub struct UnknownFunction {
    pub name: String,
}

/// Aggregate functions emitted by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionName {
    Count,
    Min,
    Max,
    Sum,
    Avg,
}

impl FunctionName {
    pub const ALL: [FunctionName; 5] = [
        FunctionName::Count,
        FunctionName::Min,
        FunctionName::Max,
        FunctionName::Sum,
        FunctionName::Avg,
    ];

    pub fn from_str_ignore_case(name: &str) -> Result<FunctionName, UnknownFunction> {
        Self::ALL
            .iter()
            .find(|func| func.to_string().eq_ignore_ascii_case(name))
            .copied()
            .ok_or_else(|| UnknownFunction {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FunctionName::Count => "COUNT",
            FunctionName::Min => "MIN",
            FunctionName::Max => "MAX",
            FunctionName::Sum => "SUM",
            FunctionName::Avg => "AVG",
        })
    }
}

/// An expression tree node.
///
/// `Binary.right` holds a single expression for most operators; `IN` takes
/// an arbitrary sequence and `BETWEEN`/`NOT BETWEEN` a sequence of exactly
/// two elements.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    Binary {
        left: Box<Expression>,
        operator: BinaryOperator,
        right: BinaryRhs,
    },
    Column(ColumnReference),
    Constant(Literal),
    Function(FunctionCall),
}

/// Right-hand side of a binary expression.
#[derive(Debug, Clone, PartialEq)]
pub enum BinaryRhs {
    One(Box<Expression>),
    Many(Vec<Expression>),
}

/// A (possibly alias-qualified) reference to a table column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnReference {
    pub table_alias: Option<String>,
    pub column_name: String,
}

/// A function call such as `COUNT(*)` or `AVG(t.x)`.
///
/// Exactly one of `agg_star` and `args` is meaningful: `COUNT(*)` carries
/// no arguments, every other call carries at least one.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub func_name: FunctionName,
    pub agg_star: bool,
    pub agg_distinct: bool,
    pub args: Vec<Expression>,
}

impl FunctionCall {
    pub fn star(func_name: FunctionName) -> FunctionCall {
        FunctionCall {
            func_name,
            agg_star: true,
            agg_distinct: false,
            args: Vec::new(),
        }
    }

    pub fn new(func_name: FunctionName, args: Vec<Expression>) -> FunctionCall {
        FunctionCall {
            func_name,
            agg_star: false,
            agg_distinct: false,
            args,
        }
    }

    pub fn distinct(func_name: FunctionName, args: Vec<Expression>) -> FunctionCall {
        FunctionCall {
            func_name,
            agg_star: false,
            agg_distinct: true,
            args,
        }
    }
}

impl Expression {
    pub fn column(table_alias: Option<&str>, column_name: &str) -> Expression {
        Expression::Column(ColumnReference {
            table_alias: table_alias.map(str::to_string),
            column_name: column_name.to_string(),
        })
    }

    pub fn constant(value: impl Into<Literal>) -> Expression {
        Expression::Constant(value.into())
    }
}

impl fmt::Display for ColumnReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Quoted identifiers are not handled here
        match &self.table_alias {
            Some(alias) => write!(f, "{}.{}", alias, self.column_name),
            None => f.write_str(&self.column_name),
        }
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.agg_star {
            return write!(f, "{}(*)", self.func_name);
        }
        write!(
            f,
            "{}({}{})",
            self.func_name,
            if self.agg_distinct { "DISTINCT " } else { "" },
            join_displayed(&self.args, ", ")
        )
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Unary { operator, operand } => {
                if operator.is_postfix() {
                    write!(f, "{operand} {operator}")
                } else {
                    write!(f, "{operator}{operand}")
                }
            }
            Expression::Binary {
                left,
                operator,
                right,
            } => {
                let right_str = match (operator, right) {
                    (BinaryOperator::In, BinaryRhs::Many(values)) => {
                        format!("({})", join_displayed(values, ", "))
                    }
                    (
                        BinaryOperator::Between | BinaryOperator::NotBetween,
                        BinaryRhs::Many(values),
                    ) => {
                        debug_assert_eq!(values.len(), 2);
                        format!("{} AND {}", values[0], values[1])
                    }
                    (_, BinaryRhs::One(value)) => value.to_string(),
                    (_, BinaryRhs::Many(values)) => join_displayed(values, ", "),
                };
                write!(f, "{left} {operator} {right_str}")
            }
            Expression::Column(column) => column.fmt(f),
            Expression::Constant(value) => value.fmt(f),
            Expression::Function(call) => call.fmt(f),
        }
    }
}

pub(crate) fn join_displayed<T: fmt::Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(T::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}
