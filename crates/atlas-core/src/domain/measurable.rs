//! Measurables: organisational taxonomy entries and application ratings against them

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use super::entity::EntityKind;
use crate::error::Result;
use crate::search::searchable::{Searchable, Weight, WeightedColumn};

/// A node in an organisational taxonomy (capability, process, product, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Measurable {
    pub id: i64,
    #[serde(default)]
    pub parent_id: Option<i64>,
    pub category: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
}

impl Measurable {
    pub fn new(id: i64, category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            parent_id: None,
            category: category.into(),
            name: name.into(),
            description: None,
            external_id: None,
        }
    }

    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }
}

impl Searchable for Measurable {
    type Row = Measurable;

    const KIND: EntityKind = EntityKind::Measurable;
    const TABLE: &'static str = "measurable";
    const FTS_TABLE: &'static str = "measurable_fts";
    const COLUMNS: &'static [&'static str] =
        &["id", "parent_id", "category", "name", "description", "external_id"];
    const TEXT_COLUMNS: &'static [WeightedColumn] = &[
        WeightedColumn::new("name", Weight::A),
        WeightedColumn::new("description", Weight::D),
        WeightedColumn::new("external_id", Weight::A),
    ];

    fn from_row(row: Measurable) -> Result<Self> {
        Ok(row)
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Repository for measurables and measurable ratings
#[derive(Debug, Clone)]
pub struct MeasurableRepository {
    pool: SqlitePool,
}

impl MeasurableRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a measurable
    pub async fn create(&self, measurable: &Measurable) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO measurable (id, parent_id, category, name, description, external_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(measurable.id)
        .bind(measurable.parent_id)
        .bind(&measurable.category)
        .bind(&measurable.name)
        .bind(&measurable.description)
        .bind(&measurable.external_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a measurable by id
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Measurable>> {
        let row: Option<Measurable> = sqlx::query_as(
            "SELECT id, parent_id, category, name, description, external_id FROM measurable WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// List every measurable ordered by category then name
    pub async fn find_all(&self) -> Result<Vec<Measurable>> {
        let rows: Vec<Measurable> = sqlx::query_as(
            r#"
            SELECT id, parent_id, category, name, description, external_id
            FROM measurable
            ORDER BY category, name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Rate an application against a measurable, replacing any previous rating
    pub async fn rate(&self, application_id: i64, measurable_id: i64, rating: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO measurable_rating (application_id, measurable_id, rating)
            VALUES (?, ?, ?)
            ON CONFLICT(application_id, measurable_id) DO UPDATE SET rating = excluded.rating
            "#,
        )
        .bind(application_id)
        .bind(measurable_id)
        .bind(rating)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    #[tokio::test]
    async fn test_create_and_get_measurable() {
        let db = Database::in_memory().await.unwrap();
        let repo = MeasurableRepository::new(db.pool().clone());

        let parent = Measurable::new(1, "CAPABILITY", "Finance");
        let child = Measurable::new(2, "CAPABILITY", "Billing")
            .with_parent(1)
            .with_external_id("CAP-002");
        repo.create(&parent).await.unwrap();
        repo.create(&child).await.unwrap();

        assert_eq!(repo.get_by_id(2).await.unwrap(), Some(child));
        assert_eq!(repo.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rate_replaces_previous_rating() {
        let db = Database::in_memory().await.unwrap();
        let repo = MeasurableRepository::new(db.pool().clone());

        sqlx::query("INSERT INTO application (id, name) VALUES (1, 'Orion')")
            .execute(db.pool())
            .await
            .unwrap();
        repo.create(&Measurable::new(5, "CAPABILITY", "Billing"))
            .await
            .unwrap();

        repo.rate(1, 5, "R").await.unwrap();
        repo.rate(1, 5, "G").await.unwrap();

        let (rating,): (String,) = sqlx::query_as(
            "SELECT rating FROM measurable_rating WHERE application_id = 1 AND measurable_id = 5",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(rating, "G");
    }
}
