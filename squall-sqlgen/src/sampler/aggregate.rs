use squall_catalog::DataType;
use squall_sql::FunctionName;

use crate::ast::expression::{GenColumnReference, GenExpression, GenFunctionCall};
use crate::ast::from_clause::GenFromClause;
use crate::ast::statement::GenTargetList;
use crate::error::{check_probability, ConfigError};
use crate::random::Randomizer;
use crate::util::sort_unique_tables;

/// Configuration of an aggregate sampler.
#[derive(Debug, Clone)]
pub struct AggregateSamplerConfig {
    max_num_aggregates: usize,
    p_count_star: f64,
    p_count_distinct: f64,
}

impl AggregateSamplerConfig {
    pub const DEFAULT_P_COUNT_STAR: f64 = 0.1;
    pub const DEFAULT_P_COUNT_DISTINCT: f64 = 0.5;

    pub fn new(
        max_num_aggregates: usize,
        p_count_star: f64,
        p_count_distinct: f64,
    ) -> Result<AggregateSamplerConfig, ConfigError> {
        if max_num_aggregates < 1 {
            return Err(ConfigError::ZeroAggregates);
        }
        check_probability("p_count_star", p_count_star)?;
        check_probability("p_count_distinct", p_count_distinct)?;
        Ok(AggregateSamplerConfig {
            max_num_aggregates,
            p_count_star,
            p_count_distinct,
        })
    }

    /// The defaults with the given aggregate bound.
    pub fn with_max(max_num_aggregates: usize) -> Result<AggregateSamplerConfig, ConfigError> {
        AggregateSamplerConfig::new(
            max_num_aggregates,
            Self::DEFAULT_P_COUNT_STAR,
            Self::DEFAULT_P_COUNT_DISTINCT,
        )
    }

    pub fn max_num_aggregates(&self) -> usize {
        self.max_num_aggregates
    }
}

/// Random sampler of target-list aggregates.
///
/// String and boolean columns and key columns only admit `COUNT`; `SUM`
/// or `AVG` over a key would be meaningless.
#[derive(Debug)]
pub struct AggregateSampler {
    config: AggregateSamplerConfig,
    rng: Randomizer,
}

impl AggregateSampler {
    pub fn new(config: AggregateSamplerConfig, seed: Option<u64>) -> AggregateSampler {
        AggregateSampler {
            config,
            rng: Randomizer::new(seed),
        }
    }

    /// Samples target aggregates for the given join plan.
    pub fn sample_aggregates(&mut self, joins: &GenFromClause) -> GenTargetList {
        // Simply return a `COUNT(*)` with some probability
        if self.rng.flip(self.config.p_count_star) {
            return GenTargetList::new(vec![GenExpression::Function(GenFunctionCall::star(
                FunctionName::Count,
            ))]);
        }

        let possible_column_refs: Vec<GenColumnReference> =
            sort_unique_tables(joins.unique_tables())
                .into_iter()
                .flat_map(|unique_table| {
                    unique_table
                        .columns()
                        .to_vec()
                        .into_iter()
                        .map(move |column| GenColumnReference::new(unique_table.clone(), column))
                })
                .collect();

        // At least one aggregate is always generated
        let num_aggregates = self.rng.rand_range_inclusive(
            1,
            possible_column_refs
                .len()
                .min(self.config.max_num_aggregates),
        );

        let sampled_column_refs = self.rng.choose(&possible_column_refs, num_aggregates);

        GenTargetList::new(
            sampled_column_refs
                .into_iter()
                .map(|column_ref| GenExpression::Function(self.sample_aggregate(column_ref)))
                .collect(),
        )
    }

    fn sample_aggregate(&mut self, column_ref: &GenColumnReference) -> GenFunctionCall {
        let column = &column_ref.column;
        let count_only = matches!(column.dtype, DataType::String | DataType::Boolean)
            || column.is_primary_key()
            || column.is_foreign_key();

        let func_name = if count_only {
            FunctionName::Count
        } else {
            *self.rng.choose_one(&FunctionName::ALL)
        };

        let call = GenFunctionCall::new(
            func_name,
            vec![GenExpression::Column(column_ref.clone())],
        );

        if func_name == FunctionName::Count {
            let agg_distinct = self.rng.flip(self.config.p_count_distinct);
            call.with_distinct(agg_distinct)
        } else {
            call
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::sampler::join::{JoinSampler, JoinSamplerConfig};
    use crate::testing::library_schema;

    fn sample_targets(
        config: AggregateSamplerConfig,
        seed: u64,
    ) -> (GenFromClause, GenTargetList) {
        let schema = Arc::new(library_schema());
        let mut join_sampler =
            JoinSampler::new(schema, JoinSamplerConfig::inner_only(1), Some(seed));
        let mut aggregate_sampler = AggregateSampler::new(config, Some(seed));
        let joins = join_sampler.sample_joins();
        let targets = aggregate_sampler.sample_aggregates(&joins);
        (joins, targets)
    }

    #[test]
    fn test_count_star_probability_one() {
        let config = AggregateSamplerConfig::new(3, 1.0, 0.5).unwrap();
        for seed in 0..20 {
            let (joins, targets) = sample_targets(config.clone(), seed);
            let rendered = targets
                .to_sql(&joins.generate_table_aliases())
                .to_string();
            assert_eq!(rendered, "COUNT(*)");
        }
    }

    #[test]
    fn test_aggregate_count_is_bounded() {
        let config = AggregateSamplerConfig::new(2, 0.0, 0.5).unwrap();
        for seed in 0..50 {
            let (_, targets) = sample_targets(config.clone(), seed);
            assert!(!targets.targets.is_empty());
            assert!(targets.targets.len() <= 2);
        }
    }

    #[test]
    fn test_key_and_string_columns_only_count() {
        let config = AggregateSamplerConfig::new(6, 0.0, 0.0).unwrap();
        for seed in 0..50 {
            let (_, targets) = sample_targets(config.clone(), seed);
            for target in &targets.targets {
                let GenExpression::Function(call) = target else {
                    panic!("expected function call targets");
                };
                let GenExpression::Column(column_ref) = &call.args[0] else {
                    panic!("expected a column argument");
                };
                let column = &column_ref.column;
                if matches!(column.dtype, DataType::String | DataType::Boolean)
                    || column.is_primary_key()
                    || column.is_foreign_key()
                {
                    assert_eq!(call.func_name, FunctionName::Count);
                }
            }
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(matches!(
            AggregateSamplerConfig::new(0, 0.1, 0.5),
            Err(ConfigError::ZeroAggregates)
        ));
        assert!(AggregateSamplerConfig::new(1, 0.1, 0.5).is_ok());
    }
}
