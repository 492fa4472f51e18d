//! Schema source trait shared by every data source

use schemagraph_core::{Schema, SchemaError, SnapshotError};
use tracing::debug;

/// Errors that can occur when analyzing a data source
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("Connection failed: {0}")]
    ConnectionError(String),

    #[error("Query failed: {0}")]
    QueryError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unsupported data source: {0}")]
    UnsupportedDsn(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl From<SnapshotError> for FetchError {
    fn from(e: SnapshotError) -> Self {
        match e {
            SnapshotError::Io { .. } => FetchError::Io(e.to_string()),
            SnapshotError::Json(_) => FetchError::InvalidResponse(e.to_string()),
            SnapshotError::Schema(inner) => FetchError::Schema(inner),
        }
    }
}

/// Trait for data sources that produce a schema
///
/// Implementations hand back a schema whose relations are already repaired:
/// every source funnels its raw result through [`finish`].
#[async_trait::async_trait]
pub trait SchemaSource: Send + Sync {
    /// Get the source name (e.g., "PostgreSQL", "JSON")
    fn name(&self) -> &'static str;

    /// Introspect the source and return a repaired schema
    async fn analyze(&self) -> Result<Schema, FetchError>;

    /// Check the source is reachable before analyzing it
    async fn test_connection(&self) -> Result<(), FetchError>;
}

/// Validate names and repair relations of a freshly built schema
pub fn finish(mut schema: Schema) -> Result<Schema, FetchError> {
    schema.validate_names()?;
    schema.repair()?;
    debug!(
        schema = %schema.name,
        tables = schema.tables.len(),
        relations = schema.relations.len(),
        "analyzed schema"
    );
    Ok(schema)
}
