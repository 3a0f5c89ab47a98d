//! Pluggable full-text backends

use async_trait::async_trait;

use super::query::SearchDialect;
use super::searchable::Searchable;
use crate::error::Result;

/// A dialect-specific full-text search over one entity kind.
///
/// Implementations receive a non-empty term list and a positive limit and
/// must bind every term as a statement parameter.
#[async_trait]
pub trait FullTextSearch<T: Searchable>: Send + Sync {
    async fn search(&self, terms: &[String], limit: usize) -> Result<Vec<T>>;

    fn dialect(&self) -> SearchDialect;
}
