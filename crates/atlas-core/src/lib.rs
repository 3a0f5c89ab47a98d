//! Atlas Core Library
//!
//! This crate provides the core functionality for Atlas, including:
//! - Catalogue domain model (applications, actors, measurables, logical flows, flow diagrams)
//! - Storage (SQLite pool + versioned migrations with FTS5 indexes)
//! - Cross-dialect full-text entity search
//! - Role checks for write operations
//! - HTTP endpoints (Axum)

pub mod config;
pub mod domain;
pub mod error;
pub mod search;
pub mod storage;
pub mod web;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::domain::{EntityKind, EntityReference};
    pub use crate::error::{Error, Result};
    pub use crate::search::{SearchDialect, SearchHit, SearchOptions, SearchServices};
    pub use crate::storage::{Database, DatabaseConfig};
}
