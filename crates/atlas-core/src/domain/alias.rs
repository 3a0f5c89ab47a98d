//! Entity aliases: secondary names used as extra search keys

use sqlx::SqlitePool;
use std::collections::BTreeSet;

use super::entity::EntityReference;
use crate::error::Result;

/// Repository for the `entity_alias` table
#[derive(Debug, Clone)]
pub struct EntityAliasRepository {
    pool: SqlitePool,
}

impl EntityAliasRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Aliases recorded for an entity, sorted alphabetically
    pub async fn find_aliases(&self, entity: &EntityReference) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT alias FROM entity_alias WHERE id = ? AND kind = ? ORDER BY alias")
                .bind(entity.id)
                .bind(entity.kind.as_str())
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(alias,)| alias).collect())
    }

    /// Replace the full alias set of an entity.
    ///
    /// Aliases are trimmed; blanks and duplicates are dropped. Each alias is
    /// stored alongside its lowercase form for search. Returns the stored set.
    pub async fn update_aliases(
        &self,
        entity: &EntityReference,
        aliases: &[String],
    ) -> Result<Vec<String>> {
        let cleaned: BTreeSet<String> = aliases
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect();

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM entity_alias WHERE id = ? AND kind = ?")
            .bind(entity.id)
            .bind(entity.kind.as_str())
            .execute(&mut *tx)
            .await?;

        for alias in &cleaned {
            sqlx::query(
                "INSERT INTO entity_alias (id, kind, alias, alias_folded) VALUES (?, ?, ?, ?)",
            )
            .bind(entity.id)
            .bind(entity.kind.as_str())
            .bind(alias)
            .bind(alias.to_lowercase())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            kind = %entity.kind,
            id = entity.id,
            count = cleaned.len(),
            "Updated entity aliases"
        );

        Ok(cleaned.into_iter().collect())
    }
}
