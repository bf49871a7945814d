//! End-to-end checks of the random SQL generator: every generated string
//! must be parseable SQL whose tables and columns resolve against the
//! source schema.

use std::collections::HashSet;
use std::sync::Arc;

use sqlparser::ast::{
    Expr, SelectItem, SetExpr, Statement, TableFactor, TableWithJoins,
};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use squall_catalog::{schema_from_ddl, DataStats, Schema};
use squall_sql::Literal;
use squall_sqlgen::{
    AggregateSamplerConfig, JoinSamplerConfig, PredicateSamplerConfig, RandomSqlGenerator,
    SqlGenerator,
};

const LIBRARY_DDL: &str = "
    CREATE TABLE author (
        id integer PRIMARY KEY,
        age integer,
        name varchar(128)
    );
    CREATE TABLE book (
        id integer PRIMARY KEY,
        title varchar(256),
        rating real,
        author_id integer REFERENCES author (id)
    );
";

fn library_schema() -> Schema {
    schema_from_ddl("library", LIBRARY_DDL).unwrap()
}

fn library_stats(schema: &Schema) -> DataStats {
    DataStats::from_tables(
        schema,
        |table| {
            Ok(table
                .columns
                .iter()
                .map(|column| {
                    (0..300)
                        .map(|i| {
                            Some(match column.dtype {
                                squall_catalog::DataType::Integer => Literal::Integer(i),
                                squall_catalog::DataType::Float => {
                                    Literal::Float(i as f64 / 7.0)
                                }
                                _ => Literal::String(format!("word{} common text", i % 40)),
                            })
                        })
                        .collect()
                })
                .collect())
        },
        false,
    )
    .unwrap()
}

fn generator(
    schema: Arc<Schema>,
    join_config: JoinSamplerConfig,
    predicate_config: PredicateSamplerConfig,
    aggregate_config: AggregateSamplerConfig,
    num_queries: usize,
    seed: u64,
) -> RandomSqlGenerator {
    let stats = Arc::new(library_stats(&schema));
    RandomSqlGenerator::new(
        schema,
        stats,
        join_config,
        predicate_config,
        aggregate_config,
        num_queries,
        seed,
    )
    .unwrap()
}

fn default_generator(num_queries: usize, seed: u64) -> RandomSqlGenerator {
    generator(
        Arc::new(library_schema()),
        JoinSamplerConfig::inner_only(2),
        PredicateSamplerConfig::with_max(3),
        AggregateSamplerConfig::with_max(2).unwrap(),
        num_queries,
        seed,
    )
}

fn parse_select(sql: &str) -> sqlparser::ast::Query {
    let statements = Parser::parse_sql(&PostgreSqlDialect {}, sql)
        .unwrap_or_else(|e| panic!("generated SQL must parse, got `{sql}`: {e}"));
    assert_eq!(statements.len(), 1, "one statement per line: `{sql}`");
    match statements.into_iter().next().unwrap() {
        Statement::Query(query) => *query,
        other => panic!("expected a SELECT, got {other:?}"),
    }
}

/// Collects `(table_name, alias)` pairs from the from-clause.
fn collect_tables(from: &[TableWithJoins]) -> Vec<(String, Option<String>)> {
    let mut tables = Vec::new();
    for table_with_joins in from {
        collect_factor(&table_with_joins.relation, &mut tables);
        for join in &table_with_joins.joins {
            collect_factor(&join.relation, &mut tables);
        }
    }
    tables
}

fn collect_factor(factor: &TableFactor, tables: &mut Vec<(String, Option<String>)>) {
    match factor {
        TableFactor::Table { name, alias, .. } => {
            tables.push((
                name.to_string(),
                alias.as_ref().map(|a| a.name.value.clone()),
            ));
        }
        other => panic!("unexpected table factor: {other:?}"),
    }
}

#[test]
fn test_hundred_queries_resolve_against_schema() {
    let schema = library_schema();
    let sqls: Vec<String> = default_generator(100, 0).iter().collect();
    assert_eq!(sqls.len(), 100);

    for sql in &sqls {
        let query = parse_select(sql);
        let SetExpr::Select(select) = *query.body else {
            panic!("expected a plain SELECT body");
        };

        // Every from-clause table is a schema table, and every alias or
        // bare name is usable as a column qualifier.
        let tables = collect_tables(&select.from);
        assert!(!tables.is_empty());
        let mut qualifiers = HashSet::new();
        for (name, alias) in &tables {
            assert!(
                schema.get_table(name).is_ok(),
                "unknown table `{name}` in `{sql}`"
            );
            qualifiers.insert(alias.clone().unwrap_or_else(|| name.clone()));
        }

        // Every column reference in the projection resolves
        for item in &select.projection {
            let SelectItem::UnnamedExpr(expr) = item else {
                panic!("expected unnamed projection items in `{sql}`");
            };
            check_column_refs(expr, &qualifiers, &schema, &tables, sql);
        }
        if let Some(selection) = &select.selection {
            check_column_refs(selection, &qualifiers, &schema, &tables, sql);
        }
    }
}

fn check_column_refs(
    expr: &Expr,
    qualifiers: &HashSet<String>,
    schema: &Schema,
    tables: &[(String, Option<String>)],
    sql: &str,
) {
    match expr {
        Expr::CompoundIdentifier(parts) => {
            assert_eq!(parts.len(), 2, "qualified references only in `{sql}`");
            let qualifier = &parts[0].value;
            let column = &parts[1].value;
            assert!(
                qualifiers.contains(qualifier),
                "unknown qualifier `{qualifier}` in `{sql}`"
            );
            // Resolve through the alias back to the base table
            let table_name = tables
                .iter()
                .find(|(name, alias)| {
                    alias.as_deref() == Some(qualifier.as_str()) || name == qualifier
                })
                .map(|(name, _)| name.clone())
                .unwrap();
            let table = schema.get_table(&table_name).unwrap();
            assert!(
                table.get_column(column).is_ok(),
                "unknown column `{qualifier}.{column}` in `{sql}`"
            );
        }
        Expr::BinaryOp { left, right, .. } => {
            check_column_refs(left, qualifiers, schema, tables, sql);
            check_column_refs(right, qualifiers, schema, tables, sql);
        }
        Expr::UnaryOp { expr, .. } | Expr::Nested(expr) => {
            check_column_refs(expr, qualifiers, schema, tables, sql);
        }
        Expr::InList { expr, .. } => check_column_refs(expr, qualifiers, schema, tables, sql),
        Expr::Between { expr, .. } => check_column_refs(expr, qualifiers, schema, tables, sql),
        Expr::Like { expr, .. } => check_column_refs(expr, qualifiers, schema, tables, sql),
        Expr::Function(function) => {
            // Arguments of COUNT/MIN/MAX/SUM/AVG
            if let sqlparser::ast::FunctionArguments::List(list) = &function.args {
                for arg in &list.args {
                    if let sqlparser::ast::FunctionArg::Unnamed(
                        sqlparser::ast::FunctionArgExpr::Expr(arg_expr),
                    ) = arg
                    {
                        check_column_refs(arg_expr, qualifiers, schema, tables, sql);
                    }
                }
            }
        }
        _ => {}
    }
}

#[test]
fn test_determinism_across_iterations() {
    let gen = default_generator(100, 7);
    let first: Vec<String> = gen.iter().collect();
    let second: Vec<String> = gen.iter().collect();
    assert_eq!(first, second);
}

#[test]
fn test_no_joins_config_yields_single_table_queries() {
    let gen = generator(
        Arc::new(library_schema()),
        JoinSamplerConfig::inner_only(0),
        PredicateSamplerConfig::with_max(2),
        AggregateSamplerConfig::with_max(2).unwrap(),
        50,
        3,
    );
    for sql in gen.iter() {
        let query = parse_select(&sql);
        let SetExpr::Select(select) = *query.body else {
            panic!("expected a plain SELECT body");
        };
        assert_eq!(select.from.len(), 1);
        assert!(select.from[0].joins.is_empty(), "unexpected join in `{sql}`");
    }
}

#[test]
fn test_no_predicates_config_yields_no_where_clause() {
    let gen = generator(
        Arc::new(library_schema()),
        JoinSamplerConfig::inner_only(2),
        PredicateSamplerConfig::with_max(0),
        AggregateSamplerConfig::with_max(2).unwrap(),
        50,
        4,
    );
    for sql in gen.iter() {
        let query = parse_select(&sql);
        let SetExpr::Select(select) = *query.body else {
            panic!("expected a plain SELECT body");
        };
        assert!(select.selection.is_none(), "unexpected WHERE in `{sql}`");
    }
}

#[test]
fn test_count_star_probability_one() {
    let gen = generator(
        Arc::new(library_schema()),
        JoinSamplerConfig::inner_only(2),
        PredicateSamplerConfig::with_max(2),
        AggregateSamplerConfig::new(3, 1.0, 0.5).unwrap(),
        50,
        5,
    );
    for sql in gen.iter() {
        assert!(
            sql.starts_with("SELECT COUNT(*) FROM "),
            "expected COUNT(*) target list in `{sql}`"
        );
    }
}
