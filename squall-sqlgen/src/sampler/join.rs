use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use squall_catalog::{Schema, Table, TableColumn};
use squall_sql::{BinaryOperator, JoinType};

use crate::ast::expression::GenColumnReference;
use crate::ast::from_clause::{GenAliasedTable, GenFromClause, GenJoin, JoinPredicate};
use crate::ast::unique_table::UniqueTable;
use crate::error::ConfigError;
use crate::random::Randomizer;
use crate::util::sort_join_edges;

/// Configuration of a join sampler.
///
/// `max_num_joins` can exceed the number of tables (self-joins), which is
/// why the bound is on joins rather than tables.
#[derive(Debug, Clone)]
pub struct JoinSamplerConfig {
    max_num_joins: usize,
    join_types: Vec<JoinType>,
    join_types_weights: Option<Vec<f64>>,
    with_self_join: bool,
}

impl JoinSamplerConfig {
    pub fn new(
        max_num_joins: usize,
        join_types: Vec<JoinType>,
        join_types_weights: Option<Vec<f64>>,
        with_self_join: bool,
    ) -> Result<JoinSamplerConfig, ConfigError> {
        if join_types.is_empty() {
            return Err(ConfigError::EmptyJoinTypes);
        }
        if join_types.contains(&JoinType::Cross) {
            return Err(ConfigError::CrossJoinNotSupported);
        }
        if let Some(weights) = &join_types_weights {
            if weights.len() != join_types.len() {
                return Err(ConfigError::WeightsLengthMismatch);
            }
            if (weights.iter().sum::<f64>() - 1.0).abs() > 1e-9 {
                return Err(ConfigError::WeightsSumMismatch);
            }
        }
        Ok(JoinSamplerConfig {
            max_num_joins,
            join_types,
            join_types_weights,
            with_self_join,
        })
    }

    /// Inner joins only, no self-joins: the common default.
    pub fn inner_only(max_num_joins: usize) -> JoinSamplerConfig {
        JoinSamplerConfig {
            max_num_joins,
            join_types: vec![JoinType::Inner],
            join_types_weights: None,
            with_self_join: false,
        }
    }

    pub fn max_num_joins(&self) -> usize {
        self.max_num_joins
    }

    pub fn join_types(&self) -> &[JoinType] {
        &self.join_types
    }
}

/// Random sampler of table joins based on the relationship graph.
///
/// The graph may be cyclic (self-referencing foreign keys are fine), and
/// only equijoins over foreign-key edges are generated.
#[derive(Debug)]
pub struct JoinSampler {
    schema: Arc<Schema>,
    config: JoinSamplerConfig,
    rng: Randomizer,
}

impl JoinSampler {
    pub fn new(schema: Arc<Schema>, config: JoinSamplerConfig, seed: Option<u64>) -> JoinSampler {
        JoinSampler {
            schema,
            config,
            rng: Randomizer::new(seed),
        }
    }

    /// Samples a join plan and returns its AST representation.
    pub fn sample_joins(&mut self) -> GenFromClause {
        // Start with a random table
        let initial_table = Arc::clone(self.rng.choose_one(self.schema.tables()));
        let initial_unique_table = UniqueTable::new(Arc::clone(&initial_table));

        let mut join_tables: HashMap<String, UniqueTable> = HashMap::from([(
            initial_table.name.clone(),
            initial_unique_table.clone(),
        )]);
        let mut possible_join_edges =
            JoinEdge::possible_join_edges(&self.schema, &initial_table);
        let mut joins = GenFromClause::Table(GenAliasedTable::new(initial_unique_table));

        let num_joins = self.rng.rand_range_inclusive(0, self.config.max_num_joins);

        for _ in 0..num_joins {
            // Terminate early if there are no more possible joins
            if possible_join_edges.is_empty() {
                break;
            }

            // Hash-set iteration order is not deterministic, so choose
            // from a sorted sequence
            let sorted_edges = sort_join_edges(possible_join_edges.iter().cloned());
            let join_edge = self.rng.choose_one(&sorted_edges).clone();

            let first = &join_edge.first;
            let second = &join_edge.second;
            let first_joined = join_tables.contains_key(&first.table.name);
            let second_joined = join_tables.contains_key(&second.table.name);

            let (left_unique_table, right_unique_table, left_column, right_column);
            match (first_joined, second_joined) {
                (true, true) => {
                    left_unique_table = join_tables[&first.table.name].clone();
                    if first.table.name == second.table.name {
                        // Self-join: consumes the iteration even when skipped
                        if !self.config.with_self_join {
                            continue;
                        }
                        right_unique_table = UniqueTable::new(Arc::clone(&second.table));
                    } else {
                        right_unique_table = join_tables[&second.table.name].clone();
                    }
                    left_column = first.column.clone();
                    right_column = second.column.clone();
                }
                (true, false) => {
                    left_unique_table = join_tables[&first.table.name].clone();
                    right_unique_table = UniqueTable::new(Arc::clone(&second.table));
                    left_column = first.column.clone();
                    right_column = second.column.clone();

                    join_tables
                        .insert(second.table.name.clone(), right_unique_table.clone());
                    possible_join_edges
                        .extend(JoinEdge::possible_join_edges(&self.schema, &second.table));
                }
                (false, true) => {
                    // Keep the left side on the already-joined table
                    left_unique_table = join_tables[&second.table.name].clone();
                    right_unique_table = UniqueTable::new(Arc::clone(&first.table));
                    left_column = second.column.clone();
                    right_column = first.column.clone();

                    join_tables
                        .insert(first.table.name.clone(), right_unique_table.clone());
                    possible_join_edges
                        .extend(JoinEdge::possible_join_edges(&self.schema, &first.table));
                }
                (false, false) => {
                    unreachable!("at least one endpoint of a candidate edge is already joined")
                }
            }

            possible_join_edges.remove(&join_edge);

            let join_type = match &self.config.join_types_weights {
                Some(weights) => *self
                    .rng
                    .choose_one_weighted(&self.config.join_types, weights),
                None => *self.rng.choose_one(&self.config.join_types),
            };

            joins = GenFromClause::Join(Box::new(GenJoin {
                left: joins,
                join_type,
                right: GenAliasedTable::new(right_unique_table.clone()),
                predicate: JoinPredicate {
                    left: GenColumnReference::new(left_unique_table, left_column),
                    // Always equijoin
                    operator: BinaryOperator::Eq,
                    right: GenColumnReference::new(right_unique_table, right_column),
                },
            }));
        }

        joins
    }
}

/// An undirected join edge: two table-column pairs that can be equijoined.
///
/// `A.a JOIN B.b` is the same edge as `B.b JOIN A.a`, so the endpoints are
/// stored in canonical `(table, column)`-name order and equality/hash are
/// order-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinEdge {
    pub first: TableColumn,
    pub second: TableColumn,
}

impl JoinEdge {
    pub fn new(first: TableColumn, second: TableColumn) -> JoinEdge {
        let key = |tc: &TableColumn| (tc.table.name.clone(), tc.column.name.clone());
        if key(&second) < key(&first) {
            JoinEdge {
                first: second,
                second: first,
            }
        } else {
            JoinEdge { first, second }
        }
    }

    /// All join edges that involve the given table.
    pub fn possible_join_edges(schema: &Schema, table: &Arc<Table>) -> HashSet<JoinEdge> {
        table
            .columns
            .iter()
            .flat_map(|column| {
                schema
                    .relationships()
                    .get_possible_joins(table, column)
                    .expect("schema table columns are relationship-graph nodes")
                    .into_iter()
                    .map(|neighbor| {
                        JoinEdge::new(
                            TableColumn::new(Arc::clone(table), column.clone()),
                            neighbor,
                        )
                    })
            })
            .collect()
    }
}
