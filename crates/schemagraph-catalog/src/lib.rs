//! Data sources that produce repaired schemas
//!
//! Each source introspects something (a database catalog, a snapshot file)
//! and returns a [`schemagraph_core::Schema`] whose relations are linked.
//!
//! ## Features
//!
//! Enable database support via Cargo features:
//! - `postgres` - PostgreSQL support
//!
//! ## Example
//!
//! ```rust,ignore
//! use schemagraph_catalog::analyze;
//!
//! let schema = analyze("json://testdata/schema.json").await?;
//! let schema = analyze("pg://user:pass@localhost:5432/db?sslmode=disable").await?;
//! ```

pub mod adapter;
pub mod dsn;
pub mod json;
pub mod mock;
pub mod postgres;

pub use adapter::{finish, FetchError, SchemaSource};
pub use dsn::{analyze, connect, Dsn};
pub use json::JsonSource;
pub use mock::MockSource;
pub use postgres::{CatalogRows, ColumnRow, ConstraintRow, IndexRow, PostgresSource, TableRow};
