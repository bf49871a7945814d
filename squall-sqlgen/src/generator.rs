use std::sync::Arc;

use squall_catalog::{CatalogError, DataStats, Schema};

use crate::ast::statement::GenSelectStatement;
use crate::sampler::aggregate::{AggregateSampler, AggregateSamplerConfig};
use crate::sampler::join::{JoinSampler, JoinSamplerConfig};
use crate::sampler::predicate::{PredicateSampler, PredicateSamplerConfig};

/// An immutable source of SQL strings.
///
/// Implementations must be lazy (no query is materialized before
/// iteration) and restartable: every call to `iter` yields the same
/// sequence. This makes generators safe to share and to replay, which is
/// what the workload runner relies on.
pub trait SqlGenerator: Send + Sync {
    fn iter(&self) -> Box<dyn Iterator<Item = String> + Send + '_>;
}

/// Lazy SQL generator based on random sampling from a schema and its
/// statistics.
///
/// Only a subset of PostgreSQL is generated: `SELECT` statements with
/// joins, filters and aggregates. Group-bys, `HAVING` clauses and
/// subqueries are not produced.
///
/// The output is pseudo-random: the single `seed` fixed at construction
/// fully determines the stream, so multiple iterations of one generator
/// instance always yield the same sequence of strings.
#[derive(Debug, Clone)]
pub struct RandomSqlGenerator {
    schema: Arc<Schema>,
    stats: Arc<DataStats>,
    join_config: JoinSamplerConfig,
    predicate_config: PredicateSamplerConfig,
    aggregate_config: AggregateSamplerConfig,
    num_queries: usize,
    seed: u64,
}

impl RandomSqlGenerator {
    /// Creates a generator after checking that `stats` covers every table
    /// and column of `schema`, so that iteration itself cannot fail.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        schema: Arc<Schema>,
        stats: Arc<DataStats>,
        join_config: JoinSamplerConfig,
        predicate_config: PredicateSamplerConfig,
        aggregate_config: AggregateSamplerConfig,
        num_queries: usize,
        seed: u64,
    ) -> Result<RandomSqlGenerator, CatalogError> {
        for table in schema.tables() {
            let table_stats = stats.get(table.as_ref())?;
            for column in &table.columns {
                table_stats.get(column)?;
            }
        }

        Ok(RandomSqlGenerator {
            schema,
            stats,
            join_config,
            predicate_config,
            aggregate_config,
            num_queries,
            seed,
        })
    }

    pub fn num_queries(&self) -> usize {
        self.num_queries
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl SqlGenerator for RandomSqlGenerator {
    fn iter(&self) -> Box<dyn Iterator<Item = String> + Send + '_> {
        // Fresh samplers per iteration, all seeded identically, keep the
        // generator immutable and its output repeatable.
        Box::new(RandomSqlIter {
            join_sampler: JoinSampler::new(
                Arc::clone(&self.schema),
                self.join_config.clone(),
                Some(self.seed),
            ),
            predicate_sampler: PredicateSampler::new(
                Arc::clone(&self.stats),
                self.predicate_config.clone(),
                Some(self.seed),
            ),
            aggregate_sampler: AggregateSampler::new(
                self.aggregate_config.clone(),
                Some(self.seed),
            ),
            remaining: self.num_queries,
        })
    }
}

struct RandomSqlIter {
    join_sampler: JoinSampler,
    predicate_sampler: PredicateSampler,
    aggregate_sampler: AggregateSampler,
    remaining: usize,
}

impl Iterator for RandomSqlIter {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let joins = self.join_sampler.sample_joins();
        let predicates = self
            .predicate_sampler
            .sample_predicates(&joins)
            .expect("statistics coverage was validated at construction");
        let aggregates = self.aggregate_sampler.sample_aggregates(&joins);

        let statement = GenSelectStatement {
            target_list: aggregates,
            from_clause: joins,
            where_clause: predicates,
        };

        Some(statement.to_sql().to_string())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
