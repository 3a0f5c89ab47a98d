//! Storage layer - SQLite catalogue store
//!
//! Provides database management and migrations for the catalogue.
//!
//! # Architecture
//!
//! - `database`: Connection pool management and initialization
//! - `migrations`: Schema versioning and automatic migration
//!
//! # Usage
//!
//! ```ignore
//! use atlas_core::storage::{Database, DatabaseConfig};
//!
//! // Create an in-memory database for testing
//! let db = Database::in_memory().await?;
//!
//! // Or open the configured file-backed store
//! let db = Database::new(DatabaseConfig::with_path("atlas.db")).await?;
//! ```

pub mod database;
pub mod migrations;

pub use database::{Database, DatabaseConfig, default_database_path, ping};
pub use migrations::{CURRENT_VERSION, MigrationStatus, migration_status, run_migrations};
