//! Name-based retrieval of tables and columns

use std::collections::HashMap;

use crate::error::SchemaError;
use crate::schema::{Column, Schema, Table};

impl Schema {
    /// Find a table by exact, case-sensitive name
    pub fn find_table_by_name(&self, name: &str) -> Result<&Table, SchemaError> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| SchemaError::table_not_found(name))
    }

    /// Mutable variant of [`Schema::find_table_by_name`]
    pub fn find_table_by_name_mut(&mut self, name: &str) -> Result<&mut Table, SchemaError> {
        self.tables
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| SchemaError::table_not_found(name))
    }
}

impl Table {
    /// Find a column of this table by exact, case-sensitive name
    pub fn find_column_by_name(&self, name: &str) -> Result<&Column, SchemaError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| SchemaError::column_not_found(&self.name, name))
    }

    /// Mutable variant of [`Table::find_column_by_name`]
    pub fn find_column_by_name_mut(&mut self, name: &str) -> Result<&mut Column, SchemaError> {
        let table = &self.name;
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| SchemaError::column_not_found(table, name))
    }
}

struct TableEntry<'a> {
    position: usize,
    columns: HashMap<&'a str, usize>,
}

/// One-shot name → position map over a schema's tables and columns
///
/// Built once for bulk resolution and dropped before the schema is mutated.
/// When names collide the first occurrence wins, matching the linear lookups.
pub struct SchemaIndex<'a> {
    tables: HashMap<&'a str, TableEntry<'a>>,
}

impl<'a> SchemaIndex<'a> {
    pub fn build(schema: &'a Schema) -> Self {
        let mut tables = HashMap::with_capacity(schema.tables.len());

        for (position, table) in schema.tables.iter().enumerate() {
            tables.entry(table.name.as_str()).or_insert_with(|| {
                let mut columns = HashMap::with_capacity(table.columns.len());
                for (i, column) in table.columns.iter().enumerate() {
                    columns.entry(column.name.as_str()).or_insert(i);
                }
                TableEntry { position, columns }
            });
        }

        Self { tables }
    }

    /// Position of a table in `Schema::tables`
    pub fn table(&self, name: &str) -> Result<usize, SchemaError> {
        self.tables
            .get(name)
            .map(|entry| entry.position)
            .ok_or_else(|| SchemaError::table_not_found(name))
    }

    /// Position of a column in its table's `columns`
    pub fn column(&self, table: &str, column: &str) -> Result<usize, SchemaError> {
        let entry = self
            .tables
            .get(table)
            .ok_or_else(|| SchemaError::table_not_found(table))?;
        entry
            .columns
            .get(column)
            .copied()
            .ok_or_else(|| SchemaError::column_not_found(table, column))
    }

    /// Positions of several columns of one table, in the given order
    pub fn columns(&self, table: &str, columns: &[String]) -> Result<Vec<usize>, SchemaError> {
        columns.iter().map(|c| self.column(table, c)).collect()
    }
}
