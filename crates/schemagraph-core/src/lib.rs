//! SchemaGraph Core
//!
//! Canonical, cross-referenced model of a database schema.
//!
//! A schema flows through independent stages, each callable on its own:
//! [`Schema::repair`] re-links relations by name and rebuilds back-references,
//! [`Schema::load_additional_data`] merges overrides, and [`Schema::sort`]
//! imposes canonical order for reproducible snapshots.
//! Never rename diagnostic codes - they are part of the public API.

pub mod additional;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod lookup;
pub mod repair;
pub mod report;
pub mod schema;
pub mod snapshot;
pub mod sort;

pub use additional::{AdditionalData, CommentOverride, LabelOverride, Override, RelationOverride};
pub use config::{Config, ConfigError};
pub use diagnostic::{Diagnostic, DiagnosticCode, Location, Severity};
pub use error::{EntityKind, SchemaError};
pub use lookup::SchemaIndex;
pub use report::{Report, ReportSummary, ReportVersion};
pub use schema::{Column, ColumnDefault, Constraint, Driver, Index, Relation, RelationId, Schema, Table};
pub use snapshot::SnapshotError;
