use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use squall_sql::Literal;

use crate::error::CatalogError;
use crate::schema::{Column, DataType};

// Inference thresholds, tuned on real datasets
const CATEGORICAL_NUM_UNIQUE_THRESHOLD: usize = 50;
const CATEGORICAL_UNIQUE_RATIO_THRESHOLD: f64 = 0.01;

const MAX_FREQUENT_VALUES: usize = 50;
const MAX_SAMPLED_VALUES: usize = 1000;
const MAX_FREQUENT_WORDS: usize = 100;
const NUM_PERCENTILES: usize = 101;

/// General category of the data in a column.
///
/// The column type determines the kinds of filter predicates that can be
/// generated for the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Categorical,
    Key,
    Numerical,
    RawString,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColumnType::Categorical => "categorical",
            ColumnType::Key => "key",
            ColumnType::Numerical => "numerical",
            ColumnType::RawString => "raw_string",
        })
    }
}

impl ColumnType {
    /// Infers the type of a column from its data, based on some heuristics.
    pub fn infer_from_series(series: &[Option<Literal>], column: &Column) -> ColumnType {
        match column.dtype {
            DataType::Integer => {
                // Key constraints are user-defined, so check them first
                if column.is_primary_key() || column.is_foreign_key() {
                    ColumnType::Key
                } else if is_series_categorical(series) {
                    ColumnType::Categorical
                } else {
                    ColumnType::Numerical
                }
            }
            DataType::Float => ColumnType::Numerical,
            DataType::String => {
                if column.is_primary_key() || column.is_foreign_key() {
                    ColumnType::Key
                } else if is_series_categorical(series) {
                    ColumnType::Categorical
                } else {
                    ColumnType::RawString
                }
            }
            DataType::Boolean => ColumnType::Categorical,
        }
    }

    /// Checks that this column type is legal for the given data type
    /// (e.g. raw-string stats make no sense on an integer column).
    pub fn check_compatible(&self, dtype: DataType) -> Result<(), CatalogError> {
        let compatible = match dtype {
            DataType::Integer => *self != ColumnType::RawString,
            DataType::Float => *self == ColumnType::Numerical,
            DataType::String => *self != ColumnType::Numerical,
            DataType::Boolean => *self == ColumnType::Categorical,
        };
        if compatible {
            Ok(())
        } else {
            Err(CatalogError::InvalidColumnType(*self, dtype))
        }
    }
}

fn is_series_categorical(series: &[Option<Literal>]) -> bool {
    let non_null: Vec<&Literal> = series.iter().flatten().collect();
    let num_unique = non_null.iter().collect::<BTreeSet<_>>().len();
    if non_null.is_empty() {
        return true;
    }
    num_unique <= CATEGORICAL_NUM_UNIQUE_THRESHOLD
        || (num_unique as f64) / (non_null.len() as f64) <= CATEGORICAL_UNIQUE_RATIO_THRESHOLD
}

/// Statistics for a column with `categorical` type.
///
/// Supported data types: integer, string, boolean.
/// Reasonable operations: `=`, `<>`, `IN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalStats {
    pub nan_ratio: f64,
    pub num_unique: usize,
    /// Value-to-frequency pairs, most frequent first, capped at 50.
    pub most_frequent_values: Vec<(Literal, f64)>,
}

impl CategoricalStats {
    /// The distinct frequent values in their deterministic (sorted) order.
    pub fn sorted_values(&self) -> Vec<&Literal> {
        let mut values: Vec<&Literal> =
            self.most_frequent_values.iter().map(|(value, _)| value).collect();
        values.sort();
        values
    }
}

/// Statistics for a column with `key` type (primary or foreign key).
///
/// Supported data types: integer and string (commonly used keys).
/// Reasonable operations: point query (`=`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyStats {
    pub nan_ratio: f64,
    pub num_unique: usize,
    /// A bounded sample of observed non-null values.
    pub sampled_values: Vec<Literal>,
}

impl KeyStats {
    pub fn sorted_values(&self) -> Vec<&Literal> {
        let mut values: Vec<&Literal> = self.sampled_values.iter().collect();
        values.sort();
        values
    }
}

/// Statistics for a column with `numerical` type.
///
/// Supported data types: integer, float.
/// Reasonable operations: range query (`<`, `<=`, `>`, `>=`, `BETWEEN`).
///
/// `min`/`max`/`mean` are `None` when the column holds no non-null values,
/// in which case `percentiles` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericalStats {
    pub nan_ratio: f64,
    pub num_unique: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    /// 101 percentiles (0..=100), nearest interpolation.
    pub percentiles: Vec<f64>,
}

/// Statistics for a column with `raw_string` type.
///
/// Supported data types: string.
/// Reasonable operations: `LIKE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStringStats {
    pub nan_ratio: f64,
    pub num_unique: usize,
    /// Word to row-frequency, most frequent first, capped at 100.
    pub frequent_words: IndexMap<String, f64>,
}

impl RawStringStats {
    pub fn sorted_words(&self) -> Vec<&str> {
        let mut words: Vec<&str> = self.frequent_words.keys().map(String::as_str).collect();
        words.sort_unstable();
        words
    }
}

/// Per-column statistics, tagged by the column type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "column_type", rename_all = "snake_case")]
pub enum ColumnStats {
    Categorical(CategoricalStats),
    Key(KeyStats),
    Numerical(NumericalStats),
    RawString(RawStringStats),
}

impl ColumnStats {
    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnStats::Categorical(_) => ColumnType::Categorical,
            ColumnStats::Key(_) => ColumnType::Key,
            ColumnStats::Numerical(_) => ColumnType::Numerical,
            ColumnStats::RawString(_) => ColumnType::RawString,
        }
    }

    pub fn nan_ratio(&self) -> f64 {
        match self {
            ColumnStats::Categorical(stats) => stats.nan_ratio,
            ColumnStats::Key(stats) => stats.nan_ratio,
            ColumnStats::Numerical(stats) => stats.nan_ratio,
            ColumnStats::RawString(stats) => stats.nan_ratio,
        }
    }

    pub fn num_unique(&self) -> usize {
        match self {
            ColumnStats::Categorical(stats) => stats.num_unique,
            ColumnStats::Key(stats) => stats.num_unique,
            ColumnStats::Numerical(stats) => stats.num_unique,
            ColumnStats::RawString(stats) => stats.num_unique,
        }
    }

    /// Computes the stats of the given column based on the given data.
    ///
    /// The computed kind depends on the "type" of the column, which is
    /// inferred when not provided. Fails if the requested column type is
    /// not legal for the column's data type.
    pub fn from_series(
        series: &[Option<Literal>],
        column: &Column,
        column_type: Option<ColumnType>,
    ) -> Result<ColumnStats, CatalogError> {
        let column_type =
            column_type.unwrap_or_else(|| ColumnType::infer_from_series(series, column));
        column_type.check_compatible(column.dtype)?;

        let nan_ratio = if series.is_empty() {
            0.0
        } else {
            series.iter().filter(|value| value.is_none()).count() as f64 / series.len() as f64
        };
        let num_unique = series
            .iter()
            .flatten()
            .collect::<BTreeSet<_>>()
            .len();

        Ok(match column_type {
            ColumnType::Categorical => ColumnStats::Categorical(CategoricalStats {
                nan_ratio,
                num_unique,
                most_frequent_values: most_frequent_values(series),
            }),
            ColumnType::Key => ColumnStats::Key(KeyStats {
                nan_ratio,
                num_unique,
                sampled_values: sample_values(series),
            }),
            ColumnType::Numerical => {
                let (min, max, mean, percentiles) = numerical_summary(series);
                ColumnStats::Numerical(NumericalStats {
                    nan_ratio,
                    num_unique,
                    min,
                    max,
                    mean,
                    percentiles,
                })
            }
            ColumnType::RawString => ColumnStats::RawString(RawStringStats {
                nan_ratio,
                num_unique,
                frequent_words: frequent_words(series),
            }),
        })
    }
}

fn most_frequent_values(series: &[Option<Literal>]) -> Vec<(Literal, f64)> {
    let mut counts: BTreeMap<&Literal, usize> = BTreeMap::new();
    for value in series.iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut ranked: Vec<(&Literal, usize)> = counts.into_iter().collect();
    // Count descending, then value ascending for a stable ranking
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    // Null values still count toward the denominator
    ranked
        .into_iter()
        .take(MAX_FREQUENT_VALUES)
        .map(|(value, count)| (value.clone(), count as f64 / series.len() as f64))
        .collect()
}

/// Takes an evenly-strided sample so that parallel and sequential stats
/// computations agree (a random sample would not).
fn sample_values(series: &[Option<Literal>]) -> Vec<Literal> {
    let non_null: Vec<&Literal> = series.iter().flatten().collect();
    if non_null.len() <= MAX_SAMPLED_VALUES {
        return non_null.into_iter().cloned().collect();
    }
    let stride = non_null.len() as f64 / MAX_SAMPLED_VALUES as f64;
    (0..MAX_SAMPLED_VALUES)
        .map(|i| non_null[(i as f64 * stride) as usize].clone())
        .collect()
}

fn numerical_summary(
    series: &[Option<Literal>],
) -> (Option<f64>, Option<f64>, Option<f64>, Vec<f64>) {
    let mut values: Vec<f64> = series
        .iter()
        .flatten()
        .filter_map(|value| match value {
            Literal::Integer(v) => Some(*v as f64),
            Literal::Float(v) => Some(*v),
            _ => None,
        })
        .collect();

    if values.is_empty() {
        return (None, None, None, Vec::new());
    }

    values.sort_by(f64::total_cmp);
    let min = values[0];
    let max = values[values.len() - 1];
    let mean = values.iter().sum::<f64>() / values.len() as f64;

    // Nearest-interpolation quantiles at 0, 1, ..., 100 percent
    let percentiles = (0..NUM_PERCENTILES)
        .map(|q| {
            let position = q as f64 / (NUM_PERCENTILES - 1) as f64 * (values.len() - 1) as f64;
            values[position.round() as usize]
        })
        .collect();

    (Some(min), Some(max), Some(mean), percentiles)
}

fn frequent_words(series: &[Option<Literal>]) -> IndexMap<String, f64> {
    let mut row_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in series.iter().flatten() {
        if let Literal::String(text) = value {
            // Count each word once per row
            let words: BTreeSet<&str> = text.split_whitespace().collect();
            for word in words {
                *row_counts.entry(word).or_insert(0) += 1;
            }
        }
    }

    let mut ranked: Vec<(&str, usize)> = row_counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    ranked
        .into_iter()
        .take(MAX_FREQUENT_WORDS)
        .map(|(word, count)| (word.to_string(), count as f64 / series.len() as f64))
        .collect()
}
