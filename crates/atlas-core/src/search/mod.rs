//! Cross-dialect full-text entity search
//!
//! # Architecture
//!
//! - **Searchable**: entity kinds that expose an FTS index (`Application`, `Measurable`)
//! - **FullTextSearch**: one implementation per dialect, chosen once from configuration
//! - **EntitySearchService**: tokenizes queries, enforces limits, delegates to the backend
//! - **SearchServices**: per-kind services plus concurrent multi-kind search
//!
//! # Example
//!
//! ```ignore
//! use atlas_core::search::{SearchOptions, SearchServices};
//!
//! let services = SearchServices::from_config(&config, db.pool()).await?;
//! let apps = services.applications.search("payments gateway", &SearchOptions::default()).await?;
//! ```

pub mod merge;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod query;
pub mod searchable;
pub mod service;
pub mod sqlite;
pub mod strategy;

pub use merge::union_by_identity;
#[cfg(feature = "postgres")]
pub use postgres::PostgresSearch;
pub use query::{DEFAULT_LIMIT, MAX_LIMIT, SearchDialect, SearchOptions, mk_terms};
pub use searchable::{Searchable, Weight, WeightedColumn};
pub use service::{EntitySearchService, SearchHit, SearchServices};
pub use sqlite::{AliasUnionSearch, RankedSearch};
pub use strategy::FullTextSearch;
