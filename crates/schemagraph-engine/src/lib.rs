//! schemagraph engine - comparisons over repaired schemas
//!
//! This crate implements the logic that runs on top of the schema model:
//! - Snapshot diff between an expected and an actual schema
//! - Report generation from the resulting diagnostics

pub mod snapshot_diff;

pub use snapshot_diff::SnapshotDiff;
