//! Schema model: tables, columns and the relations between them
//!
//! Relations reference tables and columns by name, which is what survives a
//! serialization round-trip. The per-column back-reference lists are derived
//! state: they hold [`RelationId`] handles into [`Schema::relations`] and are
//! rebuilt by [`Schema::repair`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EntityKind, SchemaError};

/// Position of a relation in [`Schema::relations`]
///
/// Relations are never reordered or removed once a schema is loaded, so a
/// handle stays valid for the lifetime of the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationId(pub usize);

impl RelationId {
    /// Index into `Schema::relations`
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Column default value
///
/// Serialized as `null` (no default), `{"null": true}` (explicit NULL
/// default), or the literal default expression as a string. A literal that
/// happens to read `NULL` stays a literal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<DefaultRepr>", into = "Option<DefaultRepr>")]
pub enum ColumnDefault {
    /// The column has no default
    #[default]
    Absent,

    /// `DEFAULT NULL`
    Null,

    /// A literal default expression, e.g. `CURRENT_TIMESTAMP`
    Value(String),
}

/// Wire form of a present default
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum DefaultRepr {
    Literal(String),
    Marker { null: bool },
}

impl ColumnDefault {
    /// Whether the column carries any default, NULL included
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    /// The default as it appears in DDL, if any
    pub fn as_sql(&self) -> Option<&str> {
        match self {
            Self::Absent => None,
            Self::Null => Some("NULL"),
            Self::Value(value) => Some(value),
        }
    }
}

/// A reported default expression is always a literal; use
/// [`ColumnDefault::Null`] for an explicit NULL default
impl From<Option<String>> for ColumnDefault {
    fn from(value: Option<String>) -> Self {
        match value {
            None => Self::Absent,
            Some(v) => Self::Value(v),
        }
    }
}

impl From<Option<DefaultRepr>> for ColumnDefault {
    fn from(value: Option<DefaultRepr>) -> Self {
        match value {
            None | Some(DefaultRepr::Marker { null: false }) => Self::Absent,
            Some(DefaultRepr::Marker { null: true }) => Self::Null,
            Some(DefaultRepr::Literal(v)) => Self::Value(v),
        }
    }
}

impl From<ColumnDefault> for Option<DefaultRepr> {
    fn from(value: ColumnDefault) -> Self {
        match value {
            ColumnDefault::Absent => None,
            ColumnDefault::Null => Some(DefaultRepr::Marker { null: true }),
            ColumnDefault::Value(v) => Some(DefaultRepr::Literal(v)),
        }
    }
}

impl fmt::Display for ColumnDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sql().unwrap_or(""))
    }
}

/// A column in a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name, unique within its table
    pub name: String,

    /// Engine-reported type, e.g. `bigint(20)`
    #[serde(rename = "type", default)]
    pub column_type: String,

    /// Whether NULL is allowed
    #[serde(default)]
    pub nullable: bool,

    /// Default value
    #[serde(default)]
    pub default: ColumnDefault,

    /// Column comment
    #[serde(default)]
    pub comment: String,

    /// Relations in which this column is on the child (foreign key) side
    #[serde(skip)]
    pub parent_relations: Vec<RelationId>,

    /// Relations in which this column is on the parent (referenced) side
    #[serde(skip)]
    pub child_relations: Vec<RelationId>,
}

impl Column {
    /// Create a NOT NULL column without default or comment
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            nullable: false,
            default: ColumnDefault::Absent,
            comment: String::new(),
            parent_relations: Vec::new(),
            child_relations: Vec::new(),
        }
    }

    /// Set nullability
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set the default value
    pub fn with_default(mut self, default: ColumnDefault) -> Self {
        self.default = default;
        self
    }

    /// Set the comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// An index on a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Index name
    pub name: String,

    /// Index definition as reported by the engine
    #[serde(default)]
    pub def: String,

    /// Indexed columns, in key order
    #[serde(default)]
    pub columns: Vec<String>,
}

/// A table constraint (primary key, unique, foreign key, check, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    /// Constraint name
    pub name: String,

    /// Constraint kind, e.g. `PRIMARY KEY`
    #[serde(rename = "type", default)]
    pub constraint_type: String,

    /// Constraint definition as reported by the engine
    #[serde(default)]
    pub def: String,

    /// Referenced table for foreign keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_table: Option<String>,
}

/// A table or view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Table name, unique within its schema
    pub name: String,

    /// Table kind, e.g. `BASE TABLE` or `VIEW`
    #[serde(rename = "type", default)]
    pub table_type: String,

    /// Table comment
    #[serde(default)]
    pub comment: String,

    /// Ordered columns
    #[serde(default)]
    pub columns: Vec<Column>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<Index>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,

    /// Free-form labels attached by additional data
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,

    /// View or table definition
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub def: String,
}

impl Table {
    /// Create an empty base table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_type: "BASE TABLE".to_string(),
            comment: String::new(),
            columns: Vec::new(),
            indexes: Vec::new(),
            constraints: Vec::new(),
            labels: Vec::new(),
            def: String::new(),
        }
    }

    /// Set the table kind
    pub fn with_type(mut self, table_type: impl Into<String>) -> Self {
        self.table_type = table_type.into();
        self
    }

    /// Set the comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Replace the columns
    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// A foreign-key-style edge from child columns to parent columns
///
/// `columns[i]` references `parent_columns[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Child table
    pub table: String,

    /// Child columns
    pub columns: Vec<String>,

    /// Referenced table
    pub parent_table: String,

    /// Referenced columns
    pub parent_columns: Vec<String>,

    /// Constraint definition
    #[serde(default)]
    pub def: String,

    /// Set for relations that come from additional data rather than the engine
    #[serde(rename = "virtual", default)]
    pub is_additional: bool,
}

impl Relation {
    pub fn new<C, P>(
        table: impl Into<String>,
        columns: C,
        parent_table: impl Into<String>,
        parent_columns: P,
    ) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            parent_table: parent_table.into(),
            parent_columns: parent_columns.into_iter().map(Into::into).collect(),
            def: String::new(),
            is_additional: false,
        }
    }

    /// Set the constraint definition
    pub fn with_def(mut self, def: impl Into<String>) -> Self {
        self.def = def.into();
        self
    }

    /// Whether both column lists are non-empty and of equal length
    pub fn is_well_formed(&self) -> bool {
        !self.columns.is_empty() && self.columns.len() == self.parent_columns.len()
    }

    /// Look up the child table in `schema`
    pub fn resolve_table<'a>(&self, schema: &'a Schema) -> Result<&'a Table, SchemaError> {
        schema.find_table_by_name(&self.table)
    }

    /// Look up the parent table in `schema`
    pub fn resolve_parent_table<'a>(&self, schema: &'a Schema) -> Result<&'a Table, SchemaError> {
        schema.find_table_by_name(&self.parent_table)
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}) -> {}({})",
            self.table,
            self.columns.join(", "),
            self.parent_table,
            self.parent_columns.join(", ")
        )
    }
}

/// Source engine descriptor, informational only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    /// Engine name, e.g. `postgres`
    pub name: String,

    /// Server version string
    #[serde(default)]
    pub database_version: String,
}

impl Driver {
    pub fn new(name: impl Into<String>, database_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            database_version: database_version.into(),
        }
    }
}

/// Root of one database's introspected structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Schema (database) name
    pub name: String,

    /// Ordered tables
    #[serde(default)]
    pub tables: Vec<Table>,

    /// Ordered relations; order encodes provenance
    #[serde(default)]
    pub relations: Vec<Relation>,

    /// Source engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<Driver>,
}

impl Schema {
    /// Create an empty schema
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
            relations: Vec::new(),
            driver: None,
        }
    }

    /// Replace the tables
    pub fn with_tables(mut self, tables: Vec<Table>) -> Self {
        self.tables = tables;
        self
    }

    /// Replace the relations
    ///
    /// Back-reference lists are not touched; call [`Schema::repair`] afterwards.
    pub fn with_relations(mut self, relations: Vec<Relation>) -> Self {
        self.relations = relations;
        self
    }

    /// Set the driver descriptor
    pub fn with_driver(mut self, driver: Driver) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Get a relation by handle
    pub fn relation(&self, id: RelationId) -> Option<&Relation> {
        self.relations.get(id.index())
    }

    /// Relations in which `column` is on the child side
    pub fn parent_relations_of<'a>(&'a self, column: &'a Column) -> impl Iterator<Item = &'a Relation> + 'a {
        column.parent_relations.iter().filter_map(move |id| self.relation(*id))
    }

    /// Relations in which `column` is on the parent side
    pub fn child_relations_of<'a>(&'a self, column: &'a Column) -> impl Iterator<Item = &'a Relation> + 'a {
        column.child_relations.iter().filter_map(move |id| self.relation(*id))
    }

    /// Get table names
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Check that table names are unique in the schema and column names are
    /// unique in each table
    pub fn validate_names(&self) -> Result<(), SchemaError> {
        let mut tables = std::collections::HashSet::new();
        for table in &self.tables {
            if !tables.insert(table.name.as_str()) {
                return Err(SchemaError::DuplicateName {
                    kind: EntityKind::Table,
                    name: table.name.clone(),
                });
            }

            let mut columns = std::collections::HashSet::new();
            for column in &table.columns {
                if !columns.insert(column.name.as_str()) {
                    return Err(SchemaError::DuplicateName {
                        kind: EntityKind::Column,
                        name: format!("{}.{}", table.name, column.name),
                    });
                }
            }
        }
        Ok(())
    }
}
