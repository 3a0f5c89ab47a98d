//! Postgres full-text backend
//!
//! Ranks with `ts_rank_cd` over a tsvector assembled from the entity's
//! weighted text columns. Expects the catalogue tables under the same names
//! with BIGINT ids.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{FromRow, Postgres, QueryBuilder};
use std::marker::PhantomData;

use super::query::SearchDialect;
use super::searchable::{Searchable, qualified_columns};
use super::strategy::FullTextSearch;
use crate::error::{Error, Result};

pub struct PostgresSearch<T> {
    pool: PgPool,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Searchable> PostgresSearch<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    fn weighted_vector() -> String {
        T::TEXT_COLUMNS
            .iter()
            .map(|c| {
                format!(
                    "setweight(to_tsvector(coalesce(t.{}, '')), '{}')",
                    c.column,
                    c.weight.pg_label()
                )
            })
            .collect::<Vec<_>>()
            .join(" || ")
    }
}

#[async_trait]
impl<T> FullTextSearch<T> for PostgresSearch<T>
where
    T: Searchable,
    T::Row: for<'r> FromRow<'r, PgRow>,
{
    async fn search(&self, terms: &[String], limit: usize) -> Result<Vec<T>> {
        let vector = Self::weighted_vector();

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT ");
        builder.push(qualified_columns::<T>("t"));
        builder.push(format!(", ts_rank_cd({}, q) AS score FROM {} t, plainto_tsquery(", vector, T::TABLE));
        builder.push_bind(terms.join(" "));
        builder.push(format!(") q WHERE {} @@ q ORDER BY score DESC, lower(t.name), t.id LIMIT ", vector));
        builder.push_bind(limit as i64);

        let rows: Vec<T::Row> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::from_query_failure)?;

        rows.into_iter().map(T::from_row).collect()
    }

    fn dialect(&self) -> SearchDialect {
        SearchDialect::Postgres
    }
}
