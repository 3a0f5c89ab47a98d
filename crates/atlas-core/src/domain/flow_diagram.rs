//! Flow diagram entities: which catalogue entities appear on which diagram

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use super::entity::{EntityReference, entity_name_sql};
use crate::error::{Error, Result};

fn select_with_entity_name() -> String {
    format!(
        "SELECT fde.diagram_id, fde.entity_kind, fde.entity_id, fde.is_notable, {} AS entity_name \
         FROM flow_diagram_entity fde",
        entity_name_sql("fde.entity_kind", "fde.entity_id")
    )
}

/// An entity placed on a flow diagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDiagramEntity {
    #[serde(default)]
    pub diagram_id: Option<i64>,
    pub entity_reference: EntityReference,
    #[serde(default)]
    pub is_notable: bool,
}

impl FlowDiagramEntity {
    pub fn new(diagram_id: i64, entity_reference: EntityReference) -> Self {
        Self {
            diagram_id: Some(diagram_id),
            entity_reference,
            is_notable: false,
        }
    }

    pub fn notable(mut self) -> Self {
        self.is_notable = true;
        self
    }
}

#[derive(sqlx::FromRow)]
struct FlowDiagramEntityRow {
    diagram_id: i64,
    entity_kind: String,
    entity_id: i64,
    is_notable: bool,
    entity_name: Option<String>,
}

impl FlowDiagramEntityRow {
    fn into_entity(self) -> Result<FlowDiagramEntity> {
        Ok(FlowDiagramEntity {
            diagram_id: Some(self.diagram_id),
            entity_reference: EntityReference::from_columns(
                &self.entity_kind,
                self.entity_id,
                self.entity_name,
            )?,
            is_notable: self.is_notable,
        })
    }
}

/// Repository for the `flow_diagram_entity` table
#[derive(Debug, Clone)]
pub struct FlowDiagramEntityRepository {
    pool: SqlitePool,
}

impl FlowDiagramEntityRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Entities placed on a diagram
    pub async fn find_for_diagram(&self, diagram_id: i64) -> Result<Vec<FlowDiagramEntity>> {
        let sql = format!(
            "{} WHERE fde.diagram_id = ? ORDER BY fde.entity_kind, fde.entity_id",
            select_with_entity_name()
        );

        let rows: Vec<FlowDiagramEntityRow> = sqlx::query_as(&sql)
            .bind(diagram_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(FlowDiagramEntityRow::into_entity).collect()
    }

    /// Every diagram placement of the given entity
    pub async fn find_for_entity(&self, entity: &EntityReference) -> Result<Vec<FlowDiagramEntity>> {
        let sql = format!(
            "{} WHERE fde.entity_kind = ? AND fde.entity_id = ? ORDER BY fde.diagram_id",
            select_with_entity_name()
        );

        let rows: Vec<FlowDiagramEntityRow> = sqlx::query_as(&sql)
            .bind(entity.kind.as_str())
            .bind(entity.id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(FlowDiagramEntityRow::into_entity).collect()
    }

    /// Insert placements in a single transaction.
    ///
    /// Returns the number of rows written for each entity, in input order.
    pub async fn create_entities(&self, entities: &[FlowDiagramEntity]) -> Result<Vec<u64>> {
        let mut tx = self.pool.begin().await?;
        let mut counts = Vec::with_capacity(entities.len());

        for entity in entities {
            let diagram_id = entity.diagram_id.ok_or_else(|| {
                Error::InvalidInput("Flow diagram entity is missing its diagram id".to_string())
            })?;

            let result = sqlx::query(
                r#"
                INSERT INTO flow_diagram_entity (diagram_id, entity_kind, entity_id, is_notable)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(diagram_id)
            .bind(entity.entity_reference.kind.as_str())
            .bind(entity.entity_reference.id)
            .bind(entity.is_notable)
            .execute(&mut *tx)
            .await?;

            counts.push(result.rows_affected());
        }

        tx.commit().await?;
        Ok(counts)
    }

    /// Remove every placement on a diagram
    pub async fn delete_for_diagram(&self, diagram_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM flow_diagram_entity WHERE diagram_id = ?")
            .bind(diagram_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::{Actor, ActorRepository};
    use crate::domain::application::{Application, ApplicationRepository};
    use crate::domain::entity::EntityKind;
    use crate::storage::Database;

    async fn seeded() -> (Database, FlowDiagramEntityRepository) {
        let db = Database::in_memory().await.unwrap();
        ApplicationRepository::new(db.pool().clone())
            .create(&Application::new(1, "Orion"))
            .await
            .unwrap();
        ActorRepository::new(db.pool().clone())
            .create(&Actor::new(2, "Regulator"))
            .await
            .unwrap();
        let repo = FlowDiagramEntityRepository::new(db.pool().clone());
        (db, repo)
    }

    #[tokio::test]
    async fn test_names_resolved_per_kind() {
        let (_db, repo) = seeded().await;

        let counts = repo
            .create_entities(&[
                FlowDiagramEntity::new(9, EntityReference::new(EntityKind::Application, 1)).notable(),
                FlowDiagramEntity::new(9, EntityReference::new(EntityKind::Actor, 2)),
                FlowDiagramEntity::new(9, EntityReference::new(EntityKind::Measurable, 3)),
            ])
            .await
            .unwrap();
        assert_eq!(counts, vec![1, 1, 1]);

        let entities = repo.find_for_diagram(9).await.unwrap();
        assert_eq!(entities.len(), 3);

        let names: Vec<(EntityKind, Option<String>)> = entities
            .iter()
            .map(|e| (e.entity_reference.kind, e.entity_reference.name.clone()))
            .collect();
        assert_eq!(
            names,
            vec![
                (EntityKind::Actor, Some("Regulator".to_string())),
                (EntityKind::Application, Some("Orion".to_string())),
                (EntityKind::Measurable, None),
            ]
        );
        assert!(entities[1].is_notable);
    }

    #[tokio::test]
    async fn test_find_for_entity_and_delete() {
        let (_db, repo) = seeded().await;
        let orion = EntityReference::new(EntityKind::Application, 1);

        repo.create_entities(&[
            FlowDiagramEntity::new(1, orion.clone()),
            FlowDiagramEntity::new(2, orion.clone()),
        ])
        .await
        .unwrap();

        let placements = repo.find_for_entity(&orion).await.unwrap();
        let diagrams: Vec<Option<i64>> = placements.iter().map(|p| p.diagram_id).collect();
        assert_eq!(diagrams, vec![Some(1), Some(2)]);

        assert_eq!(repo.delete_for_diagram(1).await.unwrap(), 1);
        assert_eq!(repo.find_for_entity(&orion).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_without_diagram_id_writes_nothing() {
        let (_db, repo) = seeded().await;

        let mut orphan = FlowDiagramEntity::new(1, EntityReference::new(EntityKind::Application, 1));
        orphan.diagram_id = None;
        let valid = FlowDiagramEntity::new(1, EntityReference::new(EntityKind::Actor, 2));

        let result = repo.create_entities(&[valid, orphan]).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(repo.find_for_diagram(1).await.unwrap().is_empty());
    }
}
