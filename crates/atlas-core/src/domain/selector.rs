//! Application ID selectors
//!
//! Turns an entity reference plus a hierarchy scope into the set of
//! application ids it stands for.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use super::entity::{EntityKind, EntityReference};
use crate::error::{Error, Result};

/// How far down a hierarchy a selection reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HierarchyScope {
    #[default]
    Exact,
    Children,
}

/// Selection of applications, anchored on an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdSelectionOptions {
    pub entity_reference: EntityReference,
    #[serde(default)]
    pub scope: HierarchyScope,
}

impl IdSelectionOptions {
    pub fn new(entity_reference: EntityReference, scope: HierarchyScope) -> Self {
        Self {
            entity_reference,
            scope,
        }
    }
}

/// Resolves [`IdSelectionOptions`] against the catalogue
#[derive(Debug, Clone)]
pub struct ApplicationIdSelector {
    pool: SqlitePool,
}

impl ApplicationIdSelector {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Selected application ids, ascending and distinct
    pub async fn select(&self, options: &IdSelectionOptions) -> Result<Vec<i64>> {
        let anchor = &options.entity_reference;

        let rows: Vec<(i64,)> = match (anchor.kind, options.scope) {
            (EntityKind::Application, _) => {
                sqlx::query_as("SELECT id FROM application WHERE id = ?")
                    .bind(anchor.id)
                    .fetch_all(&self.pool)
                    .await?
            }
            (EntityKind::Measurable, HierarchyScope::Exact) => {
                sqlx::query_as(
                    r#"
                    SELECT DISTINCT application_id
                    FROM measurable_rating
                    WHERE measurable_id = ?
                    ORDER BY application_id
                    "#,
                )
                .bind(anchor.id)
                .fetch_all(&self.pool)
                .await?
            }
            (EntityKind::Measurable, HierarchyScope::Children) => {
                sqlx::query_as(
                    r#"
                    WITH RECURSIVE subtree(id) AS (
                        SELECT id FROM measurable WHERE id = ?
                        UNION
                        SELECT m.id FROM measurable m JOIN subtree s ON m.parent_id = s.id
                    )
                    SELECT DISTINCT mr.application_id
                    FROM measurable_rating mr
                    JOIN subtree s ON mr.measurable_id = s.id
                    ORDER BY mr.application_id
                    "#,
                )
                .bind(anchor.id)
                .fetch_all(&self.pool)
                .await?
            }
            (kind, _) => {
                return Err(Error::InvalidInput(format!(
                    "Cannot select applications from a {} reference",
                    kind
                )));
            }
        };

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
