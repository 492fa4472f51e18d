//! JSON snapshot source (`json://path/to/schema.json`)
//!
//! Reads a snapshot written by a previous run. Object links do not survive
//! the file, so the decoded schema goes through repair like any other source.

use crate::adapter::{FetchError, SchemaSource};
use schemagraph_core::Schema;
use std::path::{Path, PathBuf};

/// Data source backed by a JSON snapshot file
#[derive(Debug, Clone)]
pub struct JsonSource {
    path: PathBuf,
}

impl JsonSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl SchemaSource for JsonSource {
    fn name(&self) -> &'static str {
        "JSON"
    }

    async fn analyze(&self) -> Result<Schema, FetchError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FetchError::Io(format!("{}: {}", self.path.display(), e)))?;

        let schema = Schema::from_json(&contents)?;
        schema.validate_names()?;
        Ok(schema)
    }

    async fn test_connection(&self) -> Result<(), FetchError> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| FetchError::Io(format!("{}: {}", self.path.display(), e)))?;

        if metadata.is_file() {
            Ok(())
        } else {
            Err(FetchError::ConfigError(format!(
                "{} is not a file",
                self.path.display()
            )))
        }
    }
}
