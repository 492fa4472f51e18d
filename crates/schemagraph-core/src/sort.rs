//! Canonical ordering for reproducible snapshots

use crate::schema::{Schema, Table};

impl Table {
    /// Sort columns, indexes and constraints by name
    pub fn sort(&mut self) {
        self.columns.sort_by(|a, b| a.name.cmp(&b.name));
        self.indexes.sort_by(|a, b| a.name.cmp(&b.name));
        self.constraints.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

impl Schema {
    /// Sort tables by name, then each table's contents
    ///
    /// Byte-wise, stable. Relations and back-reference lists keep their order,
    /// so relation handles stay valid.
    pub fn sort(&mut self) {
        self.tables.sort_by(|a, b| a.name.cmp(&b.name));
        for table in &mut self.tables {
            table.sort();
        }
    }
}
