//! JSON snapshots and content fingerprints
//!
//! A snapshot keeps names only; object links are restored by
//! [`Schema::repair`], which [`Schema::from_json`] runs before returning.

use sha2::{Digest, Sha256};
use std::path::Path;

use crate::error::SchemaError;
use crate::schema::Schema;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl Schema {
    /// Decode a snapshot and repair its relations
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let mut schema: Schema = serde_json::from_str(json)?;
        schema.repair()?;
        Ok(schema)
    }

    /// Read and decode a snapshot file
    pub fn from_file(path: &Path) -> Result<Self, SnapshotError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Pretty-printed snapshot in current order
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write a pretty-printed snapshot
    pub fn save_to_file(&self, path: &Path) -> Result<(), SnapshotError> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| SnapshotError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Compact snapshot of a sorted copy
    ///
    /// Content-equal schemas produce identical bytes regardless of the order
    /// their tables and columns were introspected in.
    pub fn canonical_json(&self) -> Result<String, SnapshotError> {
        let mut sorted = self.clone();
        sorted.sort();
        Ok(serde_json::to_string(&sorted)?)
    }

    /// Hex SHA-256 of [`Schema::canonical_json`]
    pub fn fingerprint(&self) -> Result<String, SnapshotError> {
        let json = self.canonical_json()?;
        Ok(hex::encode(Sha256::digest(json.as_bytes())))
    }
}
