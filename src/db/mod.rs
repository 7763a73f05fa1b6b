//! Database layer
//!
//! Provides database abstraction for the Hearth API:
//! - SQLite (default, for single-binary/dev deployment)
//! - PostgreSQL (for real deployments)
//!
//! The driver is selected from configuration. A `DatabasePool` trait hides
//! the backend from the rest of the application; repositories dispatch on
//! the driver when they need backend-specific SQL.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, DatabasePool, DynDatabasePool, PostgresDatabase, SqliteDatabase};
