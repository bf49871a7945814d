use std::sync::Arc;

use squall_catalog::{
    CatalogError, CategoricalStats, ColumnStats, DataStats, KeyStats, NumericalStats,
    RawStringStats,
};
use squall_sql::{BinaryOperator, Literal};

use crate::ast::expression::GenColumnReference;
use crate::ast::from_clause::GenFromClause;
use crate::ast::where_clause::{GenCompoundPredicate, GenSimplePredicate, GenWhereClause};
use crate::error::{check_probability, ConfigError};
use crate::random::Randomizer;
use crate::util::sort_unique_tables;

/// Configuration of a predicate sampler.
#[derive(Debug, Clone)]
pub struct PredicateSamplerConfig {
    max_num_predicates: usize,
    p_drop_point_query: f64,
    p_not: f64,
}

impl PredicateSamplerConfig {
    pub const DEFAULT_P_DROP_POINT_QUERY: f64 = 0.9;
    pub const DEFAULT_P_NOT: f64 = 0.05;

    pub fn new(
        max_num_predicates: usize,
        p_drop_point_query: f64,
        p_not: f64,
    ) -> Result<PredicateSamplerConfig, ConfigError> {
        check_probability("p_drop_point_query", p_drop_point_query)?;
        check_probability("p_not", p_not)?;
        Ok(PredicateSamplerConfig {
            max_num_predicates,
            p_drop_point_query,
            p_not,
        })
    }

    /// The defaults with the given predicate bound.
    pub fn with_max(max_num_predicates: usize) -> PredicateSamplerConfig {
        PredicateSamplerConfig {
            max_num_predicates,
            p_drop_point_query: Self::DEFAULT_P_DROP_POINT_QUERY,
            p_not: Self::DEFAULT_P_NOT,
        }
    }

    pub fn max_num_predicates(&self) -> usize {
        self.max_num_predicates
    }
}

/// Random sampler of filter predicates based on column statistics.
///
/// Columns are sampled from the given join plan, then each sampled column
/// yields a predicate whose operator is legal for the column's statistics
/// kind (a range query for numerical columns, `LIKE` for raw strings, and
/// so on).
#[derive(Debug)]
pub struct PredicateSampler {
    stats: Arc<DataStats>,
    config: PredicateSamplerConfig,
    rng: Randomizer,
}

impl PredicateSampler {
    pub fn new(
        stats: Arc<DataStats>,
        config: PredicateSamplerConfig,
        seed: Option<u64>,
    ) -> PredicateSampler {
        PredicateSampler {
            stats,
            config,
            rng: Randomizer::new(seed),
        }
    }

    /// Samples filter predicates for the given join plan, if any.
    ///
    /// Fails only when the statistics do not cover a column of the plan.
    pub fn sample_predicates(
        &mut self,
        joins: &GenFromClause,
    ) -> Result<Option<GenWhereClause>, CatalogError> {
        let unique_tables = sort_unique_tables(joins.unique_tables());

        let possible_column_refs: Vec<GenColumnReference> = unique_tables
            .iter()
            .flat_map(|unique_table| {
                unique_table
                    .columns()
                    .iter()
                    .map(|column| GenColumnReference::new(unique_table.clone(), column.clone()))
            })
            .collect();

        // Weight by 1/#columns so that wide tables are not over-represented
        let mut weights: Vec<f64> = unique_tables
            .iter()
            .flat_map(|unique_table| {
                let weight = 1.0 / unique_table.columns().len() as f64;
                unique_table.columns().iter().map(move |_| weight)
            })
            .collect();
        let total: f64 = weights.iter().sum();
        for weight in &mut weights {
            *weight /= total;
        }

        let num_predicates = self.rng.rand_range_inclusive(
            0,
            possible_column_refs
                .len()
                .min(self.config.max_num_predicates),
        );

        // The `WHERE` clause is allowed to be empty
        if num_predicates == 0 {
            return Ok(None);
        }

        let sampled_column_refs =
            self.rng
                .choose_weighted(&possible_column_refs, num_predicates, &weights);

        // Some chosen columns may not produce a predicate (insufficient
        // statistics); simply keep what's left without resampling.
        let mut sampled_predicates: Vec<GenWhereClause> = Vec::new();
        for column_ref in sampled_column_refs {
            if let Some(predicate) = self.sample_predicate(column_ref)? {
                let predicate = GenWhereClause::Simple(predicate);
                sampled_predicates.push(if self.rng.flip(self.config.p_not) {
                    GenCompoundPredicate::make_not(predicate)
                } else {
                    predicate
                });
            }
        }

        Ok(match sampled_predicates.len() {
            0 => None,
            1 => Some(sampled_predicates.remove(0)),
            _ => Some(GenCompoundPredicate::make_and(sampled_predicates)),
        })
    }

    /// Samples one predicate for the given column reference, dispatching
    /// on the column's statistics kind. Returns `None` when the stats are
    /// insufficient (e.g. an all-null column).
    fn sample_predicate(
        &mut self,
        column_ref: &GenColumnReference,
    ) -> Result<Option<GenSimplePredicate>, CatalogError> {
        let column_stats = self
            .stats
            .get(column_ref.unique_table.table().as_ref())?
            .get(&column_ref.column)?
            .clone();

        Ok(match column_stats {
            ColumnStats::Categorical(stats) => {
                self.sample_categorical_predicate(column_ref, &stats)
            }
            ColumnStats::Key(stats) => self.sample_key_predicate(column_ref, &stats),
            ColumnStats::Numerical(stats) => self.sample_numerical_predicate(column_ref, &stats),
            ColumnStats::RawString(stats) => {
                self.sample_raw_string_predicate(column_ref, &stats)
            }
        })
    }

    /// Available operators: `=`, `<>` and `IN`.
    fn sample_categorical_predicate(
        &mut self,
        column_ref: &GenColumnReference,
        stats: &CategoricalStats,
    ) -> Option<GenSimplePredicate> {
        let most_frequent_values = stats.sorted_values();
        if most_frequent_values.is_empty() {
            return None;
        }

        let operator = *self.rng.choose_one(&[
            BinaryOperator::Eq,
            BinaryOperator::Neq,
            BinaryOperator::In,
        ]);

        if operator == BinaryOperator::In {
            let size = self.rng.rand_range_inclusive(1, most_frequent_values.len());
            let values = self
                .rng
                .choose(&most_frequent_values, size)
                .into_iter()
                .map(|value| (*value).clone())
                .collect();
            return Some(GenSimplePredicate::binary_constants(
                column_ref.clone(),
                BinaryOperator::In,
                values,
            ));
        }

        Some(GenSimplePredicate::binary_constant(
            column_ref.clone(),
            operator,
            (*self.rng.choose_one(&most_frequent_values)).clone(),
        ))
    }

    /// Available operators: `=` (point query).
    fn sample_key_predicate(
        &mut self,
        column_ref: &GenColumnReference,
        stats: &KeyStats,
    ) -> Option<GenSimplePredicate> {
        if stats.sampled_values.is_empty() {
            return None;
        }

        // Randomly drop point queries so that the generated predicates
        // are not overly selective
        if self.rng.flip(self.config.p_drop_point_query) {
            return None;
        }

        Some(GenSimplePredicate::binary_constant(
            column_ref.clone(),
            BinaryOperator::Eq,
            self.rng.choose_one(&stats.sampled_values).clone(),
        ))
    }

    /// Available operators: `<`, `<=` (twice as likely) and
    /// `BETWEEN`/`NOT BETWEEN` (range queries).
    fn sample_numerical_predicate(
        &mut self,
        column_ref: &GenColumnReference,
        stats: &NumericalStats,
    ) -> Option<GenSimplePredicate> {
        // All-null columns have useless statistics
        if stats.mean.is_none() || stats.percentiles.is_empty() {
            return None;
        }

        let operator = *self.rng.choose_one(&[
            BinaryOperator::Lt,
            BinaryOperator::Leq,
            BinaryOperator::Lt,
            BinaryOperator::Leq,
            BinaryOperator::Between,
            BinaryOperator::NotBetween,
        ]);

        if operator == BinaryOperator::Between || operator == BinaryOperator::NotBetween {
            let bounds = self
                .rng
                .choose(&stats.percentiles, 2)
                .into_iter()
                .map(|value| Literal::Float(*value))
                .collect();
            return Some(GenSimplePredicate::binary_constants(
                column_ref.clone(),
                operator,
                bounds,
            ));
        }

        Some(GenSimplePredicate::binary_constant(
            column_ref.clone(),
            operator,
            Literal::Float(*self.rng.choose_one(&stats.percentiles)),
        ))
    }

    /// Available operators: `LIKE`.
    fn sample_raw_string_predicate(
        &mut self,
        column_ref: &GenColumnReference,
        stats: &RawStringStats,
    ) -> Option<GenSimplePredicate> {
        let frequent_words = stats.sorted_words();
        if frequent_words.is_empty() {
            return None;
        }

        let word = *self.rng.choose_one(&frequent_words);
        Some(GenSimplePredicate::binary_constant(
            column_ref.clone(),
            BinaryOperator::Like,
            Literal::String(format!("%{word}%")),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::join::{JoinSampler, JoinSamplerConfig};
    use crate::testing::{library_schema, synthetic_stats};

    fn sample_pair(
        max_num_predicates: usize,
        seed: u64,
    ) -> (GenFromClause, Option<GenWhereClause>) {
        let schema = Arc::new(library_schema());
        let stats = Arc::new(synthetic_stats(&schema));
        let mut join_sampler =
            JoinSampler::new(Arc::clone(&schema), JoinSamplerConfig::inner_only(2), Some(seed));
        let mut predicate_sampler = PredicateSampler::new(
            stats,
            PredicateSamplerConfig::with_max(max_num_predicates),
            Some(seed),
        );
        let joins = join_sampler.sample_joins();
        let predicates = predicate_sampler.sample_predicates(&joins).unwrap();
        (joins, predicates)
    }

    #[test]
    fn test_zero_max_predicates_yields_no_where_clause() {
        for seed in 0..20 {
            let (_, predicates) = sample_pair(0, seed);
            assert!(predicates.is_none());
        }
    }

    #[test]
    fn test_predicate_count_is_bounded() {
        for seed in 0..50 {
            if let (joins, Some(clause)) = sample_pair(3, seed) {
                let aliases = joins.generate_table_aliases();
                assert!(clause.to_sql(&aliases).num_simple_predicates() <= 3);
            }
        }
    }

    #[test]
    fn test_same_seed_same_predicates() {
        for seed in [0, 1, 42] {
            let (joins_a, predicates_a) = sample_pair(4, seed);
            let (joins_b, predicates_b) = sample_pair(4, seed);
            let render = |joins: &GenFromClause, predicates: &Option<GenWhereClause>| {
                predicates
                    .as_ref()
                    .map(|clause| clause.to_sql(&joins.generate_table_aliases()).to_string())
            };
            assert_eq!(render(&joins_a, &predicates_a), render(&joins_b, &predicates_b));
        }
    }

    #[test]
    fn test_config_rejects_invalid_probabilities() {
        assert!(PredicateSamplerConfig::new(1, 1.5, 0.0).is_err());
        assert!(PredicateSamplerConfig::new(1, 0.5, -0.1).is_err());
        assert!(PredicateSamplerConfig::new(1, 0.0, 1.0).is_ok());
    }
}
