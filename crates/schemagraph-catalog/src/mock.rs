//! Mock data source for testing
//!
//! This source returns a predefined raw schema without connecting to any
//! database. It's useful for:
//! - Unit testing the analyze pipeline
//! - Exercising repair on hand-built schemas
//! - Simulating various error conditions
//!
//! ## Usage
//!
//! ```rust,ignore
//! use schemagraph_catalog::{MockSource, SchemaSource};
//! use schemagraph_core::{Column, Schema, Table};
//!
//! let source = MockSource::new(Schema::new("db").with_tables(vec![
//!     Table::new("users").with_columns(vec![Column::new("id", "int")]),
//! ]));
//!
//! // Analyze returns the schema with relations repaired
//! let schema = source.analyze().await?;
//! ```
//!
//! ## Simulating Failures
//!
//! ```rust,ignore
//! // Simulate connection failure
//! let source = MockSource::default().with_connection_failure();
//! assert!(source.test_connection().await.is_err());
//!
//! // Simulate network latency
//! let source = MockSource::default().with_latency(100); // 100ms delay
//! ```

use crate::adapter::{finish, FetchError, SchemaSource};
use schemagraph_core::Schema;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock data source for testing
///
/// Holds a raw schema in memory and runs it through the same finishing step
/// as real sources. Clones share the stored schema and error.
pub struct MockSource {
    /// Raw schema handed to `analyze`
    schema: Arc<RwLock<Schema>>,

    /// Error to return instead of the schema
    error: Arc<RwLock<Option<FetchError>>>,

    /// Simulate connection failure
    fail_connection: bool,

    /// Simulate query latency (milliseconds)
    latency_ms: u64,

    /// Name to return from name() method
    source_name: &'static str,
}

impl MockSource {
    /// Create a mock source serving `schema`
    pub fn new(schema: Schema) -> Self {
        Self {
            schema: Arc::new(RwLock::new(schema)),
            error: Arc::new(RwLock::new(None)),
            fail_connection: false,
            latency_ms: 0,
            source_name: "Mock",
        }
    }

    /// Replace the served schema
    pub async fn set_schema(&self, schema: Schema) {
        *self.schema.write().await = schema;
    }

    /// Make `analyze` fail with `error` until cleared
    pub async fn set_error(&self, error: FetchError) {
        *self.error.write().await = Some(error);
    }

    /// Clear a configured error
    pub async fn clear_error(&self) {
        *self.error.write().await = None;
    }

    /// Configure to fail all connection tests
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Configure simulated latency for all operations
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Set a custom source name
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.source_name = name;
        self
    }

    async fn simulate_latency(&self) {
        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new(Schema::new("mock"))
    }
}

impl Clone for MockSource {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            error: Arc::clone(&self.error),
            fail_connection: self.fail_connection,
            latency_ms: self.latency_ms,
            source_name: self.source_name,
        }
    }
}

#[async_trait::async_trait]
impl SchemaSource for MockSource {
    fn name(&self) -> &'static str {
        self.source_name
    }

    async fn analyze(&self) -> Result<Schema, FetchError> {
        self.simulate_latency().await;

        if let Some(error) = self.error.read().await.as_ref() {
            return Err(error.clone());
        }

        let schema = self.schema.read().await.clone();
        finish(schema)
    }

    async fn test_connection(&self) -> Result<(), FetchError> {
        self.simulate_latency().await;

        if self.fail_connection {
            Err(FetchError::ConnectionError(
                "Simulated connection failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemagraph_core::{Column, Relation, RelationId, Table};

    #[tokio::test]
    async fn test_analyze_repairs_raw_schema() {
        let source = MockSource::new(
            Schema::new("db")
                .with_tables(vec![
                    Table::new("posts").with_columns(vec![Column::new("user_id", "int")]),
                    Table::new("users").with_columns(vec![Column::new("id", "int")]),
                ])
                .with_relations(vec![Relation::new("posts", ["user_id"], "users", ["id"])]),
        );

        let schema = source.analyze().await.unwrap();
        assert_eq!(schema.tables[0].columns[0].parent_relations, vec![RelationId(0)]);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let source = MockSource::default();
        let clone = source.clone();
        clone.set_error(FetchError::QueryError("boom".to_string())).await;

        assert!(matches!(source.analyze().await, Err(FetchError::QueryError(_))));
        source.clear_error().await;
        assert!(clone.analyze().await.is_ok());
    }

    #[tokio::test]
    async fn test_custom_name() {
        let source = MockSource::default().with_name("PostgreSQL");
        assert_eq!(source.name(), "PostgreSQL");
    }
}
