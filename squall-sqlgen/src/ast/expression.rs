use squall_catalog::Column;
use squall_sql::expression::{BinaryRhs, ColumnReference, FunctionCall};
use squall_sql::{BinaryOperator, Expression, FunctionName, Literal, UnaryOperator};

use crate::ast::from_clause::TableAliases;
use crate::ast::unique_table::UniqueTable;

/// Generator-side expression tree; lowers to [`squall_sql::Expression`]
/// once table aliases are known.
#[derive(Debug, Clone)]
pub enum GenExpression {
    Unary {
        operator: UnaryOperator,
        operand: Box<GenExpression>,
    },
    Binary {
        left: Box<GenExpression>,
        operator: BinaryOperator,
        right: GenBinaryRhs,
    },
    Column(GenColumnReference),
    Constant(Literal),
    Function(GenFunctionCall),
}

#[derive(Debug, Clone)]
pub enum GenBinaryRhs {
    One(Box<GenExpression>),
    Many(Vec<GenExpression>),
}

/// A reference to a column of one particular table occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenColumnReference {
    pub unique_table: UniqueTable,
    pub column: Column,
}

impl GenColumnReference {
    pub fn new(unique_table: UniqueTable, column: Column) -> GenColumnReference {
        GenColumnReference {
            unique_table,
            column,
        }
    }

    pub fn to_sql(&self, table_aliases: &TableAliases) -> ColumnReference {
        // Fall back to the bare table name when no alias was assigned
        ColumnReference {
            table_alias: Some(
                table_aliases
                    .get(&self.unique_table)
                    .unwrap_or_else(|| self.unique_table.name())
                    .to_string(),
            ),
            column_name: self.column.name.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenFunctionCall {
    pub func_name: FunctionName,
    pub agg_star: bool,
    pub agg_distinct: bool,
    pub args: Vec<GenExpression>,
}

impl GenFunctionCall {
    pub fn star(func_name: FunctionName) -> GenFunctionCall {
        GenFunctionCall {
            func_name,
            agg_star: true,
            agg_distinct: false,
            args: Vec::new(),
        }
    }

    pub fn new(func_name: FunctionName, args: Vec<GenExpression>) -> GenFunctionCall {
        GenFunctionCall {
            func_name,
            agg_star: false,
            agg_distinct: false,
            args,
        }
    }

    pub fn with_distinct(mut self, agg_distinct: bool) -> GenFunctionCall {
        self.agg_distinct = agg_distinct;
        self
    }

    pub fn to_sql(&self, table_aliases: &TableAliases) -> FunctionCall {
        FunctionCall {
            func_name: self.func_name,
            agg_star: self.agg_star,
            agg_distinct: self.agg_distinct,
            args: self
                .args
                .iter()
                .map(|arg| arg.to_sql(table_aliases))
                .collect(),
        }
    }
}

impl GenExpression {
    pub fn to_sql(&self, table_aliases: &TableAliases) -> Expression {
        match self {
            GenExpression::Unary { operator, operand } => Expression::Unary {
                operator: *operator,
                operand: Box::new(operand.to_sql(table_aliases)),
            },
            GenExpression::Binary {
                left,
                operator,
                right,
            } => Expression::Binary {
                left: Box::new(left.to_sql(table_aliases)),
                operator: *operator,
                right: match right {
                    GenBinaryRhs::One(expr) => {
                        BinaryRhs::One(Box::new(expr.to_sql(table_aliases)))
                    }
                    GenBinaryRhs::Many(exprs) => BinaryRhs::Many(
                        exprs.iter().map(|expr| expr.to_sql(table_aliases)).collect(),
                    ),
                },
            },
            GenExpression::Column(column_ref) => {
                Expression::Column(column_ref.to_sql(table_aliases))
            }
            GenExpression::Constant(value) => Expression::Constant(value.clone()),
            GenExpression::Function(call) => Expression::Function(call.to_sql(table_aliases)),
        }
    }
}
