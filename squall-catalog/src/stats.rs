use std::io::{Read, Write};

use indexmap::IndexMap;
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use squall_sql::Literal;

use crate::column_stats::ColumnStats;
use crate::error::CatalogError;
use crate::schema::{Column, Schema, Table};

/// Statistics of all columns in a table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableStats {
    stats: IndexMap<Column, ColumnStats>,
}

impl TableStats {
    pub fn new(stats: IndexMap<Column, ColumnStats>) -> TableStats {
        TableStats { stats }
    }

    /// Returns the stats for the given column.
    pub fn get(&self, column: &Column) -> Result<&ColumnStats, CatalogError> {
        self.stats
            .get(column)
            .ok_or_else(|| CatalogError::ColumnNotFound(column.name.clone()))
    }

    /// Returns the stats for the column with the given name.
    pub fn get_by_name(&self, column_name: &str) -> Result<&ColumnStats, CatalogError> {
        self.stats
            .iter()
            .find(|(column, _)| column.name == column_name)
            .map(|(_, stats)| stats)
            .ok_or_else(|| CatalogError::ColumnNotFound(column_name.to_string()))
    }

    /// Computes the stats of all columns of `table` from the given column
    /// series, one series per column in table order.
    pub fn from_series(
        table: &Table,
        series: &[Vec<Option<Literal>>],
    ) -> Result<TableStats, CatalogError> {
        if series.len() != table.columns.len() {
            return Err(CatalogError::SeriesCountMismatch {
                table: table.name.clone(),
                expected: table.columns.len(),
                actual: series.len(),
            });
        }

        debug!("computing stats for table `{}`", table.name);
        let stats = table
            .columns
            .iter()
            .zip(series)
            .map(|(column, values)| {
                ColumnStats::from_series(values, column, None)
                    .map(|stats| (column.clone(), stats))
            })
            .collect::<Result<IndexMap<_, _>, _>>()?;

        Ok(TableStats { stats })
    }
}

/// Statistics of all tables in a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DataStats {
    stats: IndexMap<Table, TableStats>,
}

impl DataStats {
    pub fn new(stats: IndexMap<Table, TableStats>) -> DataStats {
        DataStats { stats }
    }

    /// Returns the stats for the given table.
    pub fn get(&self, table: &Table) -> Result<&TableStats, CatalogError> {
        self.stats
            .get(table)
            .ok_or_else(|| CatalogError::TableNotFound(table.name.clone()))
    }

    /// Returns the stats for the table with the given name.
    pub fn get_by_name(&self, table_name: &str) -> Result<&TableStats, CatalogError> {
        self.stats
            .iter()
            .find(|(table, _)| table.name == table_name)
            .map(|(_, stats)| stats)
            .ok_or_else(|| CatalogError::TableNotFound(table_name.to_string()))
    }

    /// Computes the stats of every table in the schema, pulling each
    /// table's column series from `provider`.
    ///
    /// When `parallel` is set, tables are processed on the rayon thread
    /// pool; the result is identical to the sequential computation.
    pub fn from_tables<F>(
        schema: &Schema,
        provider: F,
        parallel: bool,
    ) -> Result<DataStats, CatalogError>
    where
        F: Fn(&Table) -> Result<Vec<Vec<Option<Literal>>>, CatalogError> + Sync,
    {
        info!(
            "computing stats for schema `{}` ({} tables)",
            schema.name,
            schema.tables().len()
        );

        let compute = |table: &Table| -> Result<(Table, TableStats), CatalogError> {
            let series = provider(table)?;
            Ok((table.clone(), TableStats::from_series(table, &series)?))
        };

        let computed: Vec<(Table, TableStats)> = if parallel {
            schema
                .tables()
                .par_iter()
                .map(|table| compute(table.as_ref()))
                .collect::<Result<_, _>>()?
        } else {
            schema
                .tables()
                .iter()
                .map(|table| compute(table.as_ref()))
                .collect::<Result<_, _>>()?
        };

        Ok(DataStats {
            stats: computed.into_iter().collect(),
        })
    }

    /// Reads a JSON-serialized data stats from the given stream.
    pub fn load(reader: impl Read) -> Result<DataStats, CatalogError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Serializes this data stats as JSON into the given stream.
    pub fn dump(&self, writer: impl Write) -> Result<(), CatalogError> {
        Ok(serde_json::to_writer(writer, self)?)
    }
}

// Serde surface: `[{table, table_stats: [{column, column_stats}]}]`.

#[derive(Serialize, Deserialize)]
struct ColumnStatsRecord {
    column: Column,
    column_stats: ColumnStats,
}

#[derive(Serialize, Deserialize)]
struct TableStatsRecord {
    table: Table,
    table_stats: Vec<ColumnStatsRecord>,
}

impl Serialize for TableStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let records: Vec<ColumnStatsRecord> = self
            .stats
            .iter()
            .map(|(column, column_stats)| ColumnStatsRecord {
                column: column.clone(),
                column_stats: column_stats.clone(),
            })
            .collect();
        records.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TableStats {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let records = Vec::<ColumnStatsRecord>::deserialize(deserializer)?;
        Ok(TableStats {
            stats: records
                .into_iter()
                .map(|record| (record.column, record.column_stats))
                .collect(),
        })
    }
}

impl Serialize for DataStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let records: Vec<TableStatsRecord> = self
            .stats
            .iter()
            .map(|(table, table_stats)| TableStatsRecord {
                table: table.clone(),
                table_stats: table_stats
                    .stats
                    .iter()
                    .map(|(column, column_stats)| ColumnStatsRecord {
                        column: column.clone(),
                        column_stats: column_stats.clone(),
                    })
                    .collect(),
            })
            .collect();
        records.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DataStats {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let records = Vec::<TableStatsRecord>::deserialize(deserializer)?;
        Ok(DataStats {
            stats: records
                .into_iter()
                .map(|record| {
                    (
                        record.table,
                        TableStats {
                            stats: record
                                .table_stats
                                .into_iter()
                                .map(|inner| (inner.column, inner.column_stats))
                                .collect(),
                        },
                    )
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::library_schema;

    fn series_for(table: &Table) -> Result<Vec<Vec<Option<Literal>>>, CatalogError> {
        Ok(table
            .columns
            .iter()
            .map(|column| match column.dtype {
                crate::schema::DataType::Integer => {
                    (0..200).map(|i| Some(Literal::Integer(i))).collect()
                }
                _ => (0..200)
                    .map(|i| Some(Literal::String(format!("value number {i}"))))
                    .collect(),
            })
            .collect())
    }

    #[test]
    fn test_get_by_column_and_name() {
        let schema = library_schema();
        let stats = DataStats::from_tables(&schema, series_for, false).unwrap();

        let book = schema.get_table("book").unwrap();
        let table_stats = stats.get(book.as_ref()).unwrap();
        let column = book.get_column("title").unwrap();
        assert_eq!(
            table_stats.get(column).unwrap(),
            table_stats.get_by_name("title").unwrap()
        );

        assert!(stats.get_by_name("magazine").is_err());
        assert!(table_stats.get_by_name("isbn").is_err());
    }

    #[test]
    fn test_parallel_equals_sequential() {
        let schema = library_schema();
        let sequential = DataStats::from_tables(&schema, series_for, false).unwrap();
        let parallel = DataStats::from_tables(&schema, series_for, true).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_json_round_trip() {
        let schema = library_schema();
        let stats = DataStats::from_tables(&schema, series_for, false).unwrap();

        let encoded = serde_json::to_string(&stats).unwrap();
        let decoded = DataStats::load(encoded.as_bytes()).unwrap();
        assert_eq!(decoded, stats);

        // Round-tripping the serialized form is a fixed point
        let re_encoded = serde_json::to_string(&decoded).unwrap();
        assert_eq!(re_encoded, encoded);
    }

    #[test]
    fn test_series_count_mismatch() {
        let schema = library_schema();
        let book = schema.get_table("book").unwrap();
        assert!(TableStats::from_series(book, &[]).is_err());
    }
}
