use std::collections::HashSet;
use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CatalogError;
use crate::graph::DirectedGraph;

/// Data types supported by the generator, with their PostgreSQL names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Integer,
    Float,
    String,
    Boolean,
}

impl DataType {
    pub fn common_name(&self) -> &'static str {
        match self {
            DataType::Integer => "integer",
            DataType::Float => "real",
            DataType::String => "character varying",
            DataType::Boolean => "boolean",
        }
    }

    pub fn internal_name(&self) -> &'static str {
        match self {
            DataType::Integer => "pg_catalog.int4",
            DataType::Float => "pg_catalog.float4",
            DataType::String => "pg_catalog.varchar",
            DataType::Boolean => "pg_catalog.bool",
        }
    }

    /// Looks up a data type by its common or internal name.
    pub fn from_name(name: &str) -> Result<DataType, CatalogError> {
        const ALL: [DataType; 4] = [
            DataType::Integer,
            DataType::Float,
            DataType::String,
            DataType::Boolean,
        ];
        ALL.into_iter()
            .find(|dtype| name == dtype.common_name() || name == dtype.internal_name())
            .ok_or_else(|| CatalogError::UnknownDataType(name.to_string()))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.common_name())
    }
}

impl Serialize for DataType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.common_name())
    }
}

impl<'de> Deserialize<'de> for DataType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        DataType::from_name(&name).map_err(D::Error::custom)
    }
}

/// Constraints of a table's column, including the type mods
/// (e.g. `n` in `varchar(n)`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnConstraint {
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
    pub is_unique: bool,
    pub is_not_null: bool,
    pub max_char_length: Option<u32>,
}

/// Column of a table/relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    pub name: String,
    pub dtype: DataType,
    pub constraint: ColumnConstraint,
}

impl Column {
    pub fn new(name: &str, dtype: DataType, constraint: ColumnConstraint) -> Column {
        Column {
            name: name.to_string(),
            dtype,
            constraint,
        }
    }

    pub fn is_primary_key(&self) -> bool {
        self.constraint.is_primary_key
    }

    pub fn is_foreign_key(&self) -> bool {
        self.constraint.is_foreign_key
    }

    /// Whether this column only contains unique values.
    pub fn is_unique(&self) -> bool {
        self.constraint.is_unique || self.constraint.is_primary_key
    }

    /// Whether this column only contains non-null values.
    pub fn is_not_null(&self) -> bool {
        self.constraint.is_not_null || self.constraint.is_primary_key
    }
}

/// Table/relation of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: &str, columns: Vec<Column>) -> Table {
        Table {
            name: name.to_string(),
            columns,
        }
    }

    /// Returns the column with the given name.
    pub fn get_column(&self, column_name: &str) -> Result<&Column, CatalogError> {
        self.columns
            .iter()
            .find(|column| column.name == column_name)
            .ok_or_else(|| CatalogError::ColumnNotFound(column_name.to_string()))
    }
}

/// A particular table-column pair, the node type of the relationship graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableColumn {
    pub table: Arc<Table>,
    pub column: Column,
}

impl TableColumn {
    pub fn new(table: Arc<Table>, column: Column) -> TableColumn {
        TableColumn { table, column }
    }
}

/// Relationship graph of the tables in a dataset.
///
/// Nodes are table-column pairs; a directed edge denotes a foreign-key
/// reference. Both forward and reverse adjacency are stored, since a join
/// can follow a foreign key in either direction.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipGraph {
    graph: DirectedGraph<TableColumn>,
    reverse_graph: DirectedGraph<TableColumn>,
}

/// A foreign-key reference from one table-column to another.
pub type Relationship = (Arc<Table>, Column, Arc<Table>, Column);

impl RelationshipGraph {
    pub fn new(
        tables: &[Arc<Table>],
        relationships: &[Relationship],
    ) -> Result<RelationshipGraph, CatalogError> {
        let nodes: HashSet<TableColumn> = tables
            .iter()
            .flat_map(|table| {
                table
                    .columns
                    .iter()
                    .map(|column| TableColumn::new(Arc::clone(table), column.clone()))
            })
            .collect();

        let edges: HashSet<(TableColumn, TableColumn)> = relationships
            .iter()
            .map(|(from_table, from_column, to_table, to_column)| {
                (
                    TableColumn::new(Arc::clone(from_table), from_column.clone()),
                    TableColumn::new(Arc::clone(to_table), to_column.clone()),
                )
            })
            .collect();

        let reverse_edges: HashSet<(TableColumn, TableColumn)> = edges
            .iter()
            .map(|(from_node, to_node)| (to_node.clone(), from_node.clone()))
            .collect();

        Ok(RelationshipGraph {
            graph: DirectedGraph::new(nodes.iter().cloned(), edges)?,
            reverse_graph: DirectedGraph::new(nodes, reverse_edges)?,
        })
    }

    /// All table-column pairs that can be equijoined with the given pair,
    /// regardless of the foreign-key direction.
    pub fn get_possible_joins(
        &self,
        table: &Arc<Table>,
        column: &Column,
    ) -> Result<HashSet<TableColumn>, CatalogError> {
        let table_column = TableColumn::new(Arc::clone(table), column.clone());
        if !self.graph.contains_node(&table_column) {
            return Err(CatalogError::TableColumnNotFound {
                table: table.name.clone(),
                column: column.name.clone(),
            });
        }

        let forward = self.graph.neighbors(&table_column)?;
        let reverse = self.reverse_graph.neighbors(&table_column)?;
        Ok(forward.union(reverse).cloned().collect())
    }

    /// Forward edges as `[from_table, from_column, to_table, to_column]`
    /// name quadruples, sorted lexicographically.
    pub fn to_list(&self) -> Vec<[String; 4]> {
        let mut edge_list: Vec<[String; 4]> = self
            .graph
            .edges()
            .map(|(from_node, to_node)| {
                [
                    from_node.table.name.clone(),
                    from_node.column.name.clone(),
                    to_node.table.name.clone(),
                    to_node.column.name.clone(),
                ]
            })
            .collect();
        edge_list.sort();
        edge_list
    }
}

/// Schema of a dataset: its tables plus their relationship graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub name: String,
    tables: Vec<Arc<Table>>,
    relationships: RelationshipGraph,
}

impl Schema {
    /// Builds a schema from owned tables and name-based foreign-key
    /// references `(from_table, from_column, to_table, to_column)`.
    pub fn new(
        name: &str,
        tables: Vec<Table>,
        relationships: &[(&str, &str, &str, &str)],
    ) -> Result<Schema, CatalogError> {
        let tables: Vec<Arc<Table>> = tables.into_iter().map(Arc::new).collect();
        let resolved = resolve_relationships(&tables, relationships)?;
        Ok(Schema {
            name: name.to_string(),
            relationships: RelationshipGraph::new(&tables, &resolved)?,
            tables,
        })
    }

    pub fn tables(&self) -> &[Arc<Table>] {
        &self.tables
    }

    pub fn relationships(&self) -> &RelationshipGraph {
        &self.relationships
    }

    /// Returns the table with the given name.
    pub fn get_table(&self, table_name: &str) -> Result<&Arc<Table>, CatalogError> {
        self.tables
            .iter()
            .find(|table| table.name == table_name)
            .ok_or_else(|| CatalogError::TableNotFound(table_name.to_string()))
    }

    /// Reads a JSON-serialized schema from the given stream.
    pub fn load(reader: impl Read) -> Result<Schema, CatalogError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Serializes this schema as JSON into the given stream.
    pub fn dump(&self, writer: impl Write) -> Result<(), CatalogError> {
        Ok(serde_json::to_writer(writer, self)?)
    }
}

fn resolve_relationships(
    tables: &[Arc<Table>],
    relationships: &[(&str, &str, &str, &str)],
) -> Result<Vec<Relationship>, CatalogError> {
    relationships
        .iter()
        .map(|(from_table_name, from_column_name, to_table_name, to_column_name)| {
            let find_table = |name: &str| {
                tables
                    .iter()
                    .find(|table| table.name == name)
                    .cloned()
                    .ok_or_else(|| CatalogError::TableNotFound(name.to_string()))
            };
            let from_table = find_table(from_table_name)?;
            let from_column = from_table.get_column(from_column_name)?.clone();
            let to_table = find_table(to_table_name)?;
            let to_column = to_table.get_column(to_column_name)?.clone();
            Ok((from_table, from_column, to_table, to_column))
        })
        .collect()
}

// Serde surface: records matching the on-disk JSON layout.

#[derive(Serialize, Deserialize)]
struct ColumnRecord {
    name: String,
    dtype: DataType,
    is_primary_key: bool,
    is_foreign_key: bool,
    is_unique: bool,
    is_not_null: bool,
    max_char_length: Option<u32>,
}

#[derive(Serialize, Deserialize)]
struct TableRecord {
    name: String,
    columns: Vec<ColumnRecord>,
}

#[derive(Serialize, Deserialize)]
struct SchemaRecord {
    name: String,
    tables: Vec<TableRecord>,
    relationships: Vec<[String; 4]>,
}

impl From<&Column> for ColumnRecord {
    fn from(column: &Column) -> Self {
        ColumnRecord {
            name: column.name.clone(),
            dtype: column.dtype,
            is_primary_key: column.constraint.is_primary_key,
            is_foreign_key: column.constraint.is_foreign_key,
            is_unique: column.constraint.is_unique,
            is_not_null: column.constraint.is_not_null,
            max_char_length: column.constraint.max_char_length,
        }
    }
}

impl From<ColumnRecord> for Column {
    fn from(record: ColumnRecord) -> Self {
        Column {
            name: record.name,
            dtype: record.dtype,
            constraint: ColumnConstraint {
                is_primary_key: record.is_primary_key,
                is_foreign_key: record.is_foreign_key,
                is_unique: record.is_unique,
                is_not_null: record.is_not_null,
                max_char_length: record.max_char_length,
            },
        }
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TableRecord {
            name: self.name.clone(),
            columns: self.columns.iter().map(ColumnRecord::from).collect(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Table {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = TableRecord::deserialize(deserializer)?;
        Ok(Table {
            name: record.name,
            columns: record.columns.into_iter().map(Column::from).collect(),
        })
    }
}

impl Serialize for Column {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ColumnRecord::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Column {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(ColumnRecord::deserialize(deserializer)?.into())
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SchemaRecord {
            name: self.name.clone(),
            tables: self
                .tables
                .iter()
                .map(|table| TableRecord {
                    name: table.name.clone(),
                    columns: table.columns.iter().map(ColumnRecord::from).collect(),
                })
                .collect(),
            relationships: self.relationships.to_list(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = SchemaRecord::deserialize(deserializer)?;
        let tables: Vec<Table> = record
            .tables
            .into_iter()
            .map(|table_record| Table {
                name: table_record.name,
                columns: table_record.columns.into_iter().map(Column::from).collect(),
            })
            .collect();
        let relationships: Vec<(&str, &str, &str, &str)> = record
            .relationships
            .iter()
            .map(|[a, b, c, d]| (a.as_str(), b.as_str(), c.as_str(), d.as_str()))
            .collect();
        Schema::new(&record.name, tables, &relationships).map_err(D::Error::custom)
    }
}
