//! SQLite full-text backends
//!
//! Both backends read the FTS5 external-content index kept in sync with the
//! entity table by triggers. User terms are always bound as parameters.

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::marker::PhantomData;

use super::merge::union_by_identity;
use super::query::SearchDialect;
use super::searchable::{Searchable, qualified_columns};
use super::strategy::FullTextSearch;
use crate::error::{Error, Result};

/// FTS5 expression requiring every term as a prefix token
fn prefix_match_expression(terms: &[String]) -> String {
    terms
        .iter()
        .map(|t| format!("\"{}\"*", t))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// FTS5 expression requiring every term as a whole token
fn token_match_expression(terms: &[String]) -> String {
    terms
        .iter()
        .map(|t| format!("\"{}\"", t))
        .collect::<Vec<_>>()
        .join(" AND ")
}

async fn fetch<T: Searchable>(
    mut builder: QueryBuilder<'_, Sqlite>,
    pool: &SqlitePool,
) -> Result<Vec<T>> {
    let rows: Vec<T::Row> = builder
        .build_query_as()
        .fetch_all(pool)
        .await
        .map_err(Error::from_query_failure)?;

    rows.into_iter().map(T::from_row).collect()
}

/// Alias LIKE matches unioned with FTS5 boolean "contains" matches.
///
/// Alias hits come first, each path ordered by case-insensitive name then id.
pub struct AliasUnionSearch<T> {
    pool: SqlitePool,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Searchable> AliasUnionSearch<T> {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    /// Entities with one alias containing every term, ignoring case
    async fn search_aliases(&self, terms: &[String], limit: usize) -> Result<Vec<T>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT DISTINCT {} FROM {} t JOIN entity_alias ea ON ea.id = t.id WHERE ea.kind = ",
            qualified_columns::<T>("t"),
            T::TABLE
        ));
        builder.push_bind(T::KIND.as_str());
        // LIKE folds ASCII only; alias_folded holds the Unicode-lowercased alias
        for term in terms {
            builder.push(" AND ea.alias_folded LIKE ");
            builder.push_bind(format!("%{}%", term.to_lowercase()));
        }
        builder.push(" ORDER BY t.name COLLATE NOCASE, t.id LIMIT ");
        builder.push_bind(limit as i64);

        fetch::<T>(builder, &self.pool).await
    }

    /// Entities whose indexed text contains every term
    async fn search_contains(&self, terms: &[String], limit: usize) -> Result<Vec<T>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {cols} FROM {fts} JOIN {table} t ON t.id = {fts}.rowid WHERE {fts} MATCH ",
            cols = qualified_columns::<T>("t"),
            fts = T::FTS_TABLE,
            table = T::TABLE
        ));
        builder.push_bind(prefix_match_expression(terms));
        builder.push(" ORDER BY t.name COLLATE NOCASE, t.id LIMIT ");
        builder.push_bind(limit as i64);

        fetch::<T>(builder, &self.pool).await
    }
}

#[async_trait]
impl<T: Searchable> FullTextSearch<T> for AliasUnionSearch<T> {
    async fn search(&self, terms: &[String], limit: usize) -> Result<Vec<T>> {
        let (aliased, contained) = tokio::try_join!(
            self.search_aliases(terms, limit),
            self.search_contains(terms, limit)
        )?;

        Ok(union_by_identity(aliased, contained, limit))
    }

    fn dialect(&self) -> SearchDialect {
        SearchDialect::AliasUnion
    }
}

/// FTS5 matches ordered by weighted `bm25()`, then case-insensitive name and id
pub struct RankedSearch<T> {
    pool: SqlitePool,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Searchable> RankedSearch<T> {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    fn bm25_weights() -> String {
        T::TEXT_COLUMNS
            .iter()
            .map(|c| format!("{:.1}", c.weight.bm25()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[async_trait]
impl<T: Searchable> FullTextSearch<T> for RankedSearch<T> {
    async fn search(&self, terms: &[String], limit: usize) -> Result<Vec<T>> {
        // bm25() is lower-is-better
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {cols}, bm25({fts}, {weights}) AS score \
             FROM {fts} JOIN {table} t ON t.id = {fts}.rowid \
             WHERE {fts} MATCH ",
            cols = qualified_columns::<T>("t"),
            fts = T::FTS_TABLE,
            weights = Self::bm25_weights(),
            table = T::TABLE
        ));
        builder.push_bind(token_match_expression(terms));
        builder.push(" ORDER BY score, t.name COLLATE NOCASE, t.id LIMIT ");
        builder.push_bind(limit as i64);

        fetch::<T>(builder, &self.pool).await
    }

    fn dialect(&self) -> SearchDialect {
        SearchDialect::Ranked
    }
}
