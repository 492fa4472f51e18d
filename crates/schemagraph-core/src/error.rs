//! Error types for schema graph operations

use std::fmt;

/// Kind of entity an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Table,
    Column,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Column => write!(f, "column"),
        }
    }
}

/// Errors raised by lookup, repair and additional-data merge
///
/// Column names are reported qualified as `table.column`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A lookup by name found no match
    #[error("{kind} not found: {name}")]
    NotFound { kind: EntityKind, name: String },

    /// A relation references a table or column absent from the schema, or
    /// its column lists are malformed
    #[error("relation {relation} cannot be resolved: {reason}")]
    RelationIntegrity { relation: String, reason: String },

    /// An additional-data override references an unknown table or column
    #[error("additional data `{operation}` references unknown {kind}: {name}")]
    ConfigReference {
        operation: &'static str,
        kind: EntityKind,
        name: String,
    },

    /// Two tables (or two columns of one table) share a name
    #[error("duplicate {kind} name: {name}")]
    DuplicateName { kind: EntityKind, name: String },
}

impl SchemaError {
    pub(crate) fn table_not_found(name: &str) -> Self {
        Self::NotFound {
            kind: EntityKind::Table,
            name: name.to_string(),
        }
    }

    pub(crate) fn column_not_found(table: &str, column: &str) -> Self {
        Self::NotFound {
            kind: EntityKind::Column,
            name: format!("{}.{}", table, column),
        }
    }

    /// Re-raise a lookup failure as a reference error of an override
    pub(crate) fn into_config_reference(self, operation: &'static str) -> Self {
        match self {
            Self::NotFound { kind, name } => Self::ConfigReference { operation, kind, name },
            other => other,
        }
    }

    /// The offending entity name, when the error carries one
    pub fn entity_name(&self) -> Option<&str> {
        match self {
            Self::NotFound { name, .. }
            | Self::ConfigReference { name, .. }
            | Self::DuplicateName { name, .. } => Some(name),
            Self::RelationIntegrity { .. } => None,
        }
    }
}
