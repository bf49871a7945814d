//! Loads a [`Schema`] from a DDL text.
//!
//! The accepted input is deliberately narrow: a sequence of `CREATE TABLE`
//! statements (plus optional `DROP TABLE` statements, which are ignored)
//! whose column options and table constraints establish the column types,
//! keys and foreign-key edges. Anything else is rejected.

use sqlparser::ast::{
    CharacterLength, ColumnDef, ColumnOption, CreateTable, DataType as SqlDataType, Ident,
    ObjectName, ObjectType, Statement, TableConstraint,
};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

use crate::error::CatalogError;
use crate::schema::{Column, ColumnConstraint, DataType, Schema, Table};

/// A foreign-key reference collected while walking the DDL, with the
/// referenced column left optional (`REFERENCES t` implies `t`'s primary
/// key).
struct FkReference {
    from_table: String,
    from_column: String,
    to_table: String,
    to_column: Option<String>,
}

/// Parses the given DDL text into a schema with the given name.
pub fn schema_from_ddl(schema_name: &str, ddl: &str) -> Result<Schema, CatalogError> {
    let statements = Parser::parse_sql(&PostgreSqlDialect {}, ddl)
        .map_err(|e| CatalogError::Ddl(e.to_string()))?;

    let mut tables: Vec<Table> = Vec::new();
    let mut fk_references: Vec<FkReference> = Vec::new();

    for statement in &statements {
        match statement {
            Statement::CreateTable(create_table) => {
                let table = parse_create_table(create_table, &mut fk_references)?;
                tables.push(table);
            }
            Statement::Drop { object_type, .. } => {
                if *object_type != ObjectType::Table {
                    return Err(CatalogError::Ddl(format!(
                        "only DROP TABLE is allowed, got DROP {object_type}"
                    )));
                }
            }
            other => {
                return Err(CatalogError::Ddl(format!(
                    "schema must consist of CREATE TABLE and DROP TABLE statements only, \
                     got: {other}"
                )));
            }
        }
    }

    // Resolve implied referenced columns and mark referencing columns as
    // foreign keys before the relationship graph is built.
    let mut relationships: Vec<(String, String, String, String)> = Vec::new();
    for fk in &fk_references {
        let to_table = tables
            .iter()
            .find(|table| table.name == fk.to_table)
            .ok_or_else(|| CatalogError::TableNotFound(fk.to_table.clone()))?;
        let to_column = match &fk.to_column {
            Some(name) => to_table.get_column(name)?.name.clone(),
            None => to_table
                .columns
                .iter()
                .find(|column| column.is_primary_key())
                .map(|column| column.name.clone())
                .ok_or_else(|| {
                    CatalogError::Ddl(format!(
                        "foreign key on `{}.{}` references `{}` which has no primary key",
                        fk.from_table, fk.from_column, fk.to_table
                    ))
                })?,
        };
        relationships.push((
            fk.from_table.clone(),
            fk.from_column.clone(),
            fk.to_table.clone(),
            to_column,
        ));
    }

    for table in &mut tables {
        for column in &mut table.columns {
            if fk_references
                .iter()
                .any(|fk| fk.from_table == table.name && fk.from_column == column.name)
            {
                column.constraint.is_foreign_key = true;
            }
        }
    }

    let relationship_refs: Vec<(&str, &str, &str, &str)> = relationships
        .iter()
        .map(|(a, b, c, d)| (a.as_str(), b.as_str(), c.as_str(), d.as_str()))
        .collect();

    Schema::new(schema_name, tables, &relationship_refs)
}

fn parse_create_table(
    create_table: &CreateTable,
    fk_references: &mut Vec<FkReference>,
) -> Result<Table, CatalogError> {
    let table_name = object_name_to_string(&create_table.name);

    let mut columns = Vec::new();
    for col_def in &create_table.columns {
        columns.push(parse_column_def(&table_name, col_def, fk_references)?);
    }

    // Table-level constraints override/augment the column options
    for constraint in &create_table.constraints {
        match constraint {
            TableConstraint::PrimaryKey {
                columns: pk_columns,
                ..
            } => {
                for ident in pk_columns {
                    find_column(&table_name, &mut columns, &ident.value)?
                        .constraint
                        .is_primary_key = true;
                }
            }
            TableConstraint::Unique {
                columns: unique_columns,
                ..
            } => {
                for ident in unique_columns {
                    find_column(&table_name, &mut columns, &ident.value)?
                        .constraint
                        .is_unique = true;
                }
            }
            TableConstraint::ForeignKey {
                columns: fk_columns,
                foreign_table,
                referred_columns,
                ..
            } => {
                for (i, ident) in fk_columns.iter().enumerate() {
                    // Verify the referencing column exists
                    find_column(&table_name, &mut columns, &ident.value)?;
                    fk_references.push(FkReference {
                        from_table: table_name.clone(),
                        from_column: ident.value.clone(),
                        to_table: object_name_to_string(foreign_table),
                        to_column: referred_columns.get(i).map(|c| c.value.clone()),
                    });
                }
            }
            other => {
                return Err(CatalogError::Ddl(format!(
                    "unsupported table constraint on `{table_name}`: {other}"
                )));
            }
        }
    }

    Ok(Table::new(&table_name, columns))
}

fn parse_column_def(
    table_name: &str,
    col_def: &ColumnDef,
    fk_references: &mut Vec<FkReference>,
) -> Result<Column, CatalogError> {
    let name = col_def.name.value.clone();
    let (dtype, max_char_length) = map_data_type(&col_def.data_type)?;

    let mut constraint = ColumnConstraint {
        max_char_length,
        ..Default::default()
    };

    for option in &col_def.options {
        match &option.option {
            ColumnOption::Unique { is_primary, .. } => {
                if *is_primary {
                    constraint.is_primary_key = true;
                } else {
                    constraint.is_unique = true;
                }
            }
            ColumnOption::NotNull => constraint.is_not_null = true,
            ColumnOption::ForeignKey {
                foreign_table,
                referred_columns,
                ..
            } => {
                fk_references.push(FkReference {
                    from_table: table_name.to_string(),
                    from_column: name.clone(),
                    to_table: object_name_to_string(foreign_table),
                    to_column: referred_columns.first().map(|c| c.value.clone()),
                });
            }
            ColumnOption::Null => {}
            other => {
                return Err(CatalogError::Ddl(format!(
                    "unsupported column option on `{table_name}.{name}`: {other}"
                )));
            }
        }
    }

    Ok(Column {
        name,
        dtype,
        constraint,
    })
}

fn map_data_type(
    data_type: &SqlDataType,
) -> Result<(DataType, Option<u32>), CatalogError> {
    let mapped = match data_type {
        SqlDataType::Int(_)
        | SqlDataType::Integer(_)
        | SqlDataType::SmallInt(_)
        | SqlDataType::BigInt(_) => (DataType::Integer, None),

        SqlDataType::Real | SqlDataType::Float(_) | SqlDataType::Double => {
            (DataType::Float, None)
        }

        SqlDataType::Varchar(length) | SqlDataType::CharacterVarying(length) => {
            (DataType::String, char_length(length))
        }
        SqlDataType::Text => (DataType::String, None),

        SqlDataType::Boolean | SqlDataType::Bool => (DataType::Boolean, None),

        other => {
            return Err(CatalogError::Ddl(format!(
                "unsupported data type: {other}"
            )));
        }
    };
    Ok(mapped)
}

fn char_length(length: &Option<CharacterLength>) -> Option<u32> {
    match length {
        Some(CharacterLength::IntegerLength { length, .. }) => Some(*length as u32),
        _ => None,
    }
}

fn find_column<'a>(
    table_name: &str,
    columns: &'a mut [Column],
    column_name: &str,
) -> Result<&'a mut Column, CatalogError> {
    columns
        .iter_mut()
        .find(|column| column.name == column_name)
        .ok_or_else(|| {
            CatalogError::Ddl(format!(
                "constraint on `{table_name}` names unknown column `{column_name}`"
            ))
        })
}

fn object_name_to_string(name: &ObjectName) -> String {
    name.0
        .iter()
        .map(|ident: &Ident| ident.value.clone())
        .collect::<Vec<_>>()
        .join(".")
}
