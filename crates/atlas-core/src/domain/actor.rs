//! Actors: non-application parties that take part in data flows

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Actor {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_external: bool,
}

impl Actor {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            is_external: false,
        }
    }

    pub fn external(mut self) -> Self {
        self.is_external = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ActorRepository {
    pool: SqlitePool,
}

impl ActorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, actor: &Actor) -> Result<()> {
        sqlx::query("INSERT INTO actor (id, name, description, is_external) VALUES (?, ?, ?, ?)")
            .bind(actor.id)
            .bind(&actor.name)
            .bind(&actor.description)
            .bind(actor.is_external)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Actor>> {
        let row: Option<Actor> =
            sqlx::query_as("SELECT id, name, description, is_external FROM actor WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row)
    }
}
