//! Relation repair: re-link relations after they crossed a serialization
//! boundary and rebuild every column's back-reference lists
//!
//! Resolution runs to completion before anything is mutated, so a schema that
//! fails to repair is left exactly as it was.

use tracing::debug;

use crate::error::SchemaError;
use crate::lookup::SchemaIndex;
use crate::schema::{Relation, RelationId, Schema, Table};

/// A relation with every name resolved to a position
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedRelation {
    pub table: usize,
    pub columns: Vec<usize>,
    pub parent_table: usize,
    pub parent_columns: Vec<usize>,
}

impl ResolvedRelation {
    /// Resolve `relation` against `index`
    ///
    /// Lookup failures come back as [`SchemaError::NotFound`]; callers decide
    /// how to report them.
    pub fn resolve(index: &SchemaIndex<'_>, relation: &Relation) -> Result<Self, SchemaError> {
        Ok(Self {
            table: index.table(&relation.table)?,
            columns: index.columns(&relation.table, &relation.columns)?,
            parent_table: index.table(&relation.parent_table)?,
            parent_columns: index.columns(&relation.parent_table, &relation.parent_columns)?,
        })
    }
}

/// Explain why a relation's column lists are unusable, if they are
pub(crate) fn shape_problem(relation: &Relation) -> Option<String> {
    if relation.columns.is_empty() || relation.parent_columns.is_empty() {
        Some("relation has no columns".to_string())
    } else if relation.columns.len() != relation.parent_columns.len() {
        Some(format!(
            "{} child columns but {} parent columns",
            relation.columns.len(),
            relation.parent_columns.len()
        ))
    } else {
        None
    }
}

/// Append `id` to the back-reference lists of every column `resolved` touches
///
/// This is the single derivation rule for back-references; the incremental
/// path in additional-data merge goes through it as well.
pub(crate) fn link_relation(tables: &mut [Table], id: RelationId, resolved: &ResolvedRelation) {
    for &column in &resolved.columns {
        tables[resolved.table].columns[column].parent_relations.push(id);
    }
    for &column in &resolved.parent_columns {
        tables[resolved.parent_table].columns[column].child_relations.push(id);
    }
}

impl Schema {
    /// Resolve every relation by name and rebuild back-reference lists
    ///
    /// Must run after deserializing a snapshot and before any other stage
    /// touches the graph. Idempotent.
    pub fn repair(&mut self) -> Result<(), SchemaError> {
        let resolved = {
            let index = SchemaIndex::build(self);
            self.relations
                .iter()
                .map(|relation| {
                    if let Some(reason) = shape_problem(relation) {
                        return Err(SchemaError::RelationIntegrity {
                            relation: relation.to_string(),
                            reason,
                        });
                    }
                    ResolvedRelation::resolve(&index, relation).map_err(|e| {
                        SchemaError::RelationIntegrity {
                            relation: relation.to_string(),
                            reason: e.to_string(),
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        for column in self.tables.iter_mut().flat_map(|t| t.columns.iter_mut()) {
            column.parent_relations.clear();
            column.child_relations.clear();
        }

        for (i, relation) in resolved.iter().enumerate() {
            link_relation(&mut self.tables, RelationId(i), relation);
        }

        debug!(
            schema = %self.name,
            tables = self.tables.len(),
            relations = self.relations.len(),
            "repaired relations"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Column;

    fn ab_schema() -> Schema {
        Schema::new("testschema")
            .with_tables(vec![
                Table::new("a").with_columns(vec![Column::new("a", "bigint(20)")]),
                Table::new("b").with_columns(vec![Column::new("b", "text").with_nullable(true)]),
            ])
            .with_relations(vec![Relation::new("a", ["a"], "b", ["b"])])
    }

    #[test]
    fn repair_links_both_sides() {
        let mut schema = ab_schema();
        schema.repair().unwrap();

        let a = &schema.tables[0].columns[0];
        let b = &schema.tables[1].columns[0];
        assert_eq!(a.parent_relations, vec![RelationId(0)]);
        assert!(a.child_relations.is_empty());
        assert_eq!(b.child_relations, vec![RelationId(0)]);
        assert!(b.parent_relations.is_empty());

        let parent = schema.parent_relations_of(a).next().unwrap();
        assert_eq!(parent.resolve_parent_table(&schema).unwrap().name, "b");
    }

    #[test]
    fn repair_discards_stale_back_references() {
        let mut schema = ab_schema();
        schema.tables[1].columns[0].parent_relations.push(RelationId(7));
        schema.repair().unwrap();
        assert!(schema.tables[1].columns[0].parent_relations.is_empty());
    }

    #[test]
    fn repair_is_idempotent() {
        let mut once = ab_schema();
        once.repair().unwrap();
        let mut twice = once.clone();
        twice.repair().unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn self_reference_populates_both_lists() {
        let mut schema = Schema::new("db")
            .with_tables(vec![Table::new("node").with_columns(vec![
                Column::new("id", "int"),
                Column::new("parent_id", "int").with_nullable(true),
            ])])
            .with_relations(vec![
                Relation::new("node", ["parent_id"], "node", ["id"]),
                Relation::new("node", ["id"], "node", ["parent_id"]),
            ]);
        schema.repair().unwrap();

        let id = &schema.tables[0].columns[0];
        assert_eq!(id.child_relations, vec![RelationId(0)]);
        assert_eq!(id.parent_relations, vec![RelationId(1)]);
    }

    #[test]
    fn unknown_column_is_an_integrity_error() {
        let mut schema = ab_schema();
        schema.relations.push(Relation::new("a", ["a"], "b", ["missing"]));
        let before = schema.clone();

        let err = schema.repair().unwrap_err();
        assert!(matches!(err, SchemaError::RelationIntegrity { .. }));
        assert!(err.to_string().contains("b.missing"));
        assert_eq!(schema, before);
    }

    #[test]
    fn mismatched_columns_are_an_integrity_error() {
        let mut schema = ab_schema();
        schema.relations[0].parent_columns.push("b".to_string());
        let err = schema.repair().unwrap_err();
        assert!(err.to_string().contains("1 child columns but 2 parent columns"));
    }
}
