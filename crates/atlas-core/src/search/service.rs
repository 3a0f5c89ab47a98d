//! Search services: tokenization, limits and dialect wiring

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;

use super::query::{SearchDialect, SearchOptions, mk_terms};
use super::searchable::Searchable;
use super::sqlite::{AliasUnionSearch, RankedSearch};
use super::strategy::FullTextSearch;
use crate::config::Config;
use crate::domain::{Application, EntityKind, Measurable};
use crate::error::{Error, Result};

/// Full-text search over one entity kind, backed by a single dialect
pub struct EntitySearchService<T: Searchable> {
    backend: Arc<dyn FullTextSearch<T>>,
    max_limit: usize,
}

impl<T: Searchable> Clone for EntitySearchService<T> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            max_limit: self.max_limit,
        }
    }
}

impl<T: Searchable> EntitySearchService<T> {
    pub fn new(backend: Arc<dyn FullTextSearch<T>>, max_limit: usize) -> Self {
        Self { backend, max_limit }
    }

    pub fn dialect(&self) -> SearchDialect {
        self.backend.dialect()
    }

    /// Search for entities matching `query`.
    ///
    /// Queries without terms and zero limits return an empty list without
    /// touching storage. The result never exceeds the effective limit.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<T>> {
        let terms = mk_terms(query);
        let limit = options.effective_limit(self.max_limit);

        if terms.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut results = self.backend.search(&terms, limit).await?;
        results.truncate(limit);

        tracing::debug!(
            kind = %T::KIND,
            terms = terms.len(),
            dialect = %self.backend.dialect(),
            results = results.len(),
            "Entity search completed"
        );

        Ok(results)
    }
}

/// A search result tagged with its entity kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchHit {
    Application(Application),
    Measurable(Measurable),
}

impl SearchHit {
    pub fn identity(&self) -> (EntityKind, i64) {
        match self {
            Self::Application(app) => app.identity(),
            Self::Measurable(measurable) => measurable.identity(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Application(app) => &app.name,
            Self::Measurable(measurable) => &measurable.name,
        }
    }
}

impl From<Application> for SearchHit {
    fn from(app: Application) -> Self {
        Self::Application(app)
    }
}

impl From<Measurable> for SearchHit {
    fn from(measurable: Measurable) -> Self {
        Self::Measurable(measurable)
    }
}

/// Search services for every searchable kind, sharing one dialect
#[derive(Clone)]
pub struct SearchServices {
    pub applications: EntitySearchService<Application>,
    pub measurables: EntitySearchService<Measurable>,
}

impl SearchServices {
    pub fn new(
        applications: EntitySearchService<Application>,
        measurables: EntitySearchService<Measurable>,
    ) -> Self {
        Self {
            applications,
            measurables,
        }
    }

    /// SQLite-backed services for the given dialect
    pub fn sqlite(dialect: SearchDialect, pool: &SqlitePool, max_limit: usize) -> Result<Self> {
        Ok(Self::new(
            EntitySearchService::new(sqlite_backend(dialect, pool)?, max_limit),
            EntitySearchService::new(sqlite_backend(dialect, pool)?, max_limit),
        ))
    }

    /// Build the services for the dialect selected in configuration
    pub async fn from_config(config: &Config, pool: &SqlitePool) -> Result<Self> {
        let dialect = config.search.dialect;
        let max_limit = config.search.max_limit;

        let services = match dialect {
            SearchDialect::AliasUnion | SearchDialect::Ranked => {
                Self::sqlite(dialect, pool, max_limit)?
            }
            SearchDialect::Postgres => Self::postgres(config).await?,
        };

        tracing::info!(dialect = %dialect, max_limit = max_limit, "Search services ready");
        Ok(services)
    }

    #[cfg(feature = "postgres")]
    async fn postgres(config: &Config) -> Result<Self> {
        use super::postgres::PostgresSearch;
        use sqlx::postgres::PgPoolOptions;
        use std::time::Duration;

        let url = config.database.postgres_url.as_deref().ok_or_else(|| {
            Error::ConfigError("search.dialect = postgres requires database.postgres_url".to_string())
        })?;

        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
            .connect(url)
            .await?;

        let max_limit = config.search.max_limit;
        Ok(Self::new(
            EntitySearchService::new(Arc::new(PostgresSearch::new(pool.clone())), max_limit),
            EntitySearchService::new(Arc::new(PostgresSearch::new(pool)), max_limit),
        ))
    }

    #[cfg(not(feature = "postgres"))]
    async fn postgres(_config: &Config) -> Result<Self> {
        Err(Error::ConfigError(
            "search.dialect = postgres requires building with the `postgres` feature".to_string(),
        ))
    }

    pub fn dialect(&self) -> SearchDialect {
        self.applications.dialect()
    }

    /// Search applications and measurables concurrently.
    ///
    /// Applications come first. Each kind is limited independently.
    pub async fn search_all(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchHit>> {
        let (applications, measurables) = tokio::try_join!(
            self.applications.search(query, options),
            self.measurables.search(query, options)
        )?;

        Ok(applications
            .into_iter()
            .map(SearchHit::from)
            .chain(measurables.into_iter().map(SearchHit::from))
            .collect())
    }
}

fn sqlite_backend<T: Searchable>(
    dialect: SearchDialect,
    pool: &SqlitePool,
) -> Result<Arc<dyn FullTextSearch<T>>> {
    match dialect {
        SearchDialect::AliasUnion => Ok(Arc::new(AliasUnionSearch::<T>::new(pool.clone()))),
        SearchDialect::Ranked => Ok(Arc::new(RankedSearch::<T>::new(pool.clone()))),
        SearchDialect::Postgres => Err(Error::ConfigError(
            "postgres is not a SQLite search dialect".to_string(),
        )),
    }
}
