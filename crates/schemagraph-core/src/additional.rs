//! Additional data: caller-supplied overrides merged into a repaired schema
//!
//! Overrides come as an ordered document (usually the `[[overrides]]` array of
//! `schemagraph.toml`):
//!
//! ```toml
//! [[overrides]]
//! kind = "comment"
//! table = "posts"
//! column = "title"
//! value = "post title"
//!
//! [[overrides]]
//! kind = "relation"
//! table = "posts"
//! columns = ["user_id"]
//! parent_table = "users"
//! parent_columns = ["id"]
//! ```
//!
//! Every override is checked against the schema before the first one is
//! applied, so a document with a bad reference changes nothing.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ConfigError;
use crate::error::SchemaError;
use crate::lookup::SchemaIndex;
use crate::repair::{link_relation, shape_problem, ResolvedRelation};
use crate::schema::{Relation, RelationId, Schema};

/// Definition recorded on relations that come from additional data
pub const ADDITIONAL_RELATION_DEF: &str = "Additional Relation";

/// Overwrite a table comment, or a column comment when `column` is set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentOverride {
    pub table: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,

    pub value: String,
}

/// Declare a relation the engine does not know about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationOverride {
    pub table: String,
    pub columns: Vec<String>,
    pub parent_table: String,
    pub parent_columns: Vec<String>,

    /// Defaults to [`ADDITIONAL_RELATION_DEF`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub def: Option<String>,
}

impl RelationOverride {
    fn to_relation(&self) -> Relation {
        let mut relation = Relation::new(
            self.table.clone(),
            self.columns.iter().cloned(),
            self.parent_table.clone(),
            self.parent_columns.iter().cloned(),
        )
        .with_def(self.def.as_deref().unwrap_or(ADDITIONAL_RELATION_DEF));
        relation.is_additional = true;
        relation
    }

    fn matches(&self, relation: &Relation) -> bool {
        self.table == relation.table
            && self.columns == relation.columns
            && self.parent_table == relation.parent_table
            && self.parent_columns == relation.parent_columns
    }
}

/// Attach labels to a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelOverride {
    pub table: String,
    pub labels: Vec<String>,
}

/// A single override operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Override {
    Comment(CommentOverride),
    Relation(RelationOverride),
    Label(LabelOverride),
}

impl Override {
    /// Operation name used in error messages
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Comment(_) => "comment",
            Self::Relation(_) => "relation",
            Self::Label(_) => "label",
        }
    }
}

/// Ordered override document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalData {
    #[serde(default)]
    pub overrides: Vec<Override>,
}

impl AdditionalData {
    pub fn new(overrides: Vec<Override>) -> Self {
        Self { overrides }
    }

    /// Parse an override document from TOML
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Parse an override document from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// The document minus relation overrides `schema` already carries
    ///
    /// A relation override is dropped when an additional relation with the
    /// same endpoints is present, as in a snapshot written after a merge.
    /// Comment and label overrides are always kept; reapplying them is
    /// idempotent.
    pub fn pending_for(&self, schema: &Schema) -> AdditionalData {
        let overrides = self
            .overrides
            .iter()
            .filter(|item| match item {
                Override::Relation(relation) => !schema
                    .relations
                    .iter()
                    .any(|existing| existing.is_additional && relation.matches(existing)),
                _ => true,
            })
            .cloned()
            .collect();
        Self { overrides }
    }
}

/// An override with every reference resolved to a position
enum Planned {
    Comment {
        table: usize,
        column: Option<usize>,
        value: String,
    },
    Relation {
        relation: Relation,
        resolved: ResolvedRelation,
    },
    Label {
        table: usize,
        labels: Vec<String>,
    },
}

fn plan(index: &SchemaIndex<'_>, item: &Override) -> Result<Planned, SchemaError> {
    let operation = item.operation();
    let reference = |e: SchemaError| e.into_config_reference(operation);

    match item {
        Override::Comment(c) => {
            let table = index.table(&c.table).map_err(reference)?;
            let column = c
                .column
                .as_deref()
                .map(|column| index.column(&c.table, column))
                .transpose()
                .map_err(reference)?;
            Ok(Planned::Comment {
                table,
                column,
                value: c.value.clone(),
            })
        }
        Override::Relation(r) => {
            let relation = r.to_relation();
            let resolved = ResolvedRelation::resolve(index, &relation).map_err(reference)?;
            if let Some(reason) = shape_problem(&relation) {
                return Err(SchemaError::RelationIntegrity {
                    relation: relation.to_string(),
                    reason,
                });
            }
            Ok(Planned::Relation { relation, resolved })
        }
        Override::Label(l) => Ok(Planned::Label {
            table: index.table(&l.table).map_err(reference)?,
            labels: l.labels.clone(),
        }),
    }
}

impl Schema {
    /// Apply an override document in order
    ///
    /// Comments are last-write-wins; relations are appended after the existing
    /// ones without deduplication; labels already present on a table are
    /// skipped. Fails with [`SchemaError::ConfigReference`] on the first
    /// unknown table or column, leaving the schema untouched.
    pub fn load_additional_data(&mut self, data: &AdditionalData) -> Result<(), SchemaError> {
        if data.is_empty() {
            return Ok(());
        }

        let planned = {
            let index = SchemaIndex::build(self);
            data.overrides
                .iter()
                .map(|item| plan(&index, item))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| {
                    warn!(schema = %self.name, error = %e, "rejected additional data");
                    e
                })?
        };

        let mut relations_added = 0;
        for step in planned {
            match step {
                Planned::Comment { table, column, value } => {
                    let table = &mut self.tables[table];
                    match column {
                        Some(column) => table.columns[column].comment = value,
                        None => table.comment = value,
                    }
                }
                Planned::Relation { relation, resolved } => {
                    let id = RelationId(self.relations.len());
                    self.relations.push(relation);
                    link_relation(&mut self.tables, id, &resolved);
                    relations_added += 1;
                }
                Planned::Label { table, labels } => {
                    let table = &mut self.tables[table];
                    for label in labels {
                        if !table.labels.contains(&label) {
                            table.labels.push(label);
                        }
                    }
                }
            }
        }

        debug!(
            schema = %self.name,
            overrides = data.overrides.len(),
            relations_added,
            "merged additional data"
        );

        Ok(())
    }
}
