//! Applications and their repository

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::fmt;

use super::entity::EntityKind;
use crate::error::{Error, Result};
use crate::search::searchable::{Searchable, Weight, WeightedColumn};

/// Where an application is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecyclePhase {
    Conceptual,
    Development,
    #[default]
    Production,
    Retired,
}

impl LifecyclePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conceptual => "CONCEPTUAL",
            Self::Development => "DEVELOPMENT",
            Self::Production => "PRODUCTION",
            Self::Retired => "RETIRED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "CONCEPTUAL" => Some(Self::Conceptual),
            "DEVELOPMENT" => Some(Self::Development),
            "PRODUCTION" => Some(Self::Production),
            "RETIRED" => Some(Self::Retired),
            _ => None,
        }
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A software application recorded in the catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// External identifier assigned by the owning organisation
    #[serde(default)]
    pub asset_code: Option<String>,
    #[serde(default)]
    pub lifecycle_phase: LifecyclePhase,
}

impl Application {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            asset_code: None,
            lifecycle_phase: LifecyclePhase::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_asset_code(mut self, asset_code: impl Into<String>) -> Self {
        self.asset_code = Some(asset_code.into());
        self
    }

    pub fn with_lifecycle_phase(mut self, phase: LifecyclePhase) -> Self {
        self.lifecycle_phase = phase;
        self
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct ApplicationRow {
    id: i64,
    name: String,
    description: Option<String>,
    asset_code: Option<String>,
    lifecycle_phase: String,
}

impl ApplicationRow {
    fn into_application(self) -> Result<Application> {
        let lifecycle_phase = LifecyclePhase::parse(&self.lifecycle_phase).ok_or_else(|| {
            Error::Parse(format!("Invalid lifecycle phase: {}", self.lifecycle_phase))
        })?;

        Ok(Application {
            id: self.id,
            name: self.name,
            description: self.description,
            asset_code: self.asset_code,
            lifecycle_phase,
        })
    }
}

impl Searchable for Application {
    type Row = ApplicationRow;

    const KIND: EntityKind = EntityKind::Application;
    const TABLE: &'static str = "application";
    const FTS_TABLE: &'static str = "application_fts";
    const COLUMNS: &'static [&'static str] =
        &["id", "name", "description", "asset_code", "lifecycle_phase"];
    const TEXT_COLUMNS: &'static [WeightedColumn] = &[
        WeightedColumn::new("name", Weight::A),
        WeightedColumn::new("description", Weight::D),
        WeightedColumn::new("asset_code", Weight::A),
    ];

    fn from_row(row: ApplicationRow) -> Result<Self> {
        row.into_application()
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Repository for application records
#[derive(Debug, Clone)]
pub struct ApplicationRepository {
    pool: SqlitePool,
}

impl ApplicationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert an application
    pub async fn create(&self, app: &Application) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO application (id, name, description, asset_code, lifecycle_phase)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(app.id)
        .bind(&app.name)
        .bind(&app.description)
        .bind(&app.asset_code)
        .bind(app.lifecycle_phase.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get an application by id
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Application>> {
        let row: Option<ApplicationRow> = sqlx::query_as(
            "SELECT id, name, description, asset_code, lifecycle_phase FROM application WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ApplicationRow::into_application).transpose()
    }

    /// List every application ordered by name
    pub async fn find_all(&self) -> Result<Vec<Application>> {
        let rows: Vec<ApplicationRow> = sqlx::query_as(
            "SELECT id, name, description, asset_code, lifecycle_phase FROM application ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ApplicationRow::into_application).collect()
    }
}
