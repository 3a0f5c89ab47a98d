//! Logical data flows between catalogue entities
//!
//! A flow links a source and a target entity (usually applications, sometimes
//! actors). Flows are unique per source/target pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashSet;

use super::entity::{EntityKind, EntityReference, entity_name_sql};
use super::selector::{ApplicationIdSelector, IdSelectionOptions};
use crate::error::{Error, Result};

/// A directed data flow between two entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalFlow {
    #[serde(default)]
    pub id: Option<i64>,
    pub source: EntityReference,
    pub target: EntityReference,
    #[serde(default)]
    pub last_updated_by: Option<String>,
    #[serde(default)]
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl LogicalFlow {
    pub fn new(source: EntityReference, target: EntityReference) -> Self {
        Self {
            id: None,
            source,
            target,
            last_updated_by: None,
            last_updated_at: None,
        }
    }
}

/// Inbound/outbound/intra tallies relative to a selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionCounts {
    pub inbound: u64,
    pub outbound: u64,
    pub intra: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalFlowStatistics {
    pub flow_counts: DirectionCounts,
    pub app_counts: DirectionCounts,
}

#[derive(sqlx::FromRow)]
struct LogicalFlowRow {
    id: i64,
    source_entity_kind: String,
    source_entity_id: i64,
    source_name: Option<String>,
    target_entity_kind: String,
    target_entity_id: i64,
    target_name: Option<String>,
    last_updated_by: String,
    last_updated_at: DateTime<Utc>,
}

impl LogicalFlowRow {
    fn into_flow(self) -> Result<LogicalFlow> {
        Ok(LogicalFlow {
            id: Some(self.id),
            source: EntityReference::from_columns(
                &self.source_entity_kind,
                self.source_entity_id,
                self.source_name,
            )?,
            target: EntityReference::from_columns(
                &self.target_entity_kind,
                self.target_entity_id,
                self.target_name,
            )?,
            last_updated_by: Some(self.last_updated_by),
            last_updated_at: Some(self.last_updated_at),
        })
    }
}

fn select_flows() -> String {
    format!(
        "SELECT lf.id, \
         lf.source_entity_kind, lf.source_entity_id, {} AS source_name, \
         lf.target_entity_kind, lf.target_entity_id, {} AS target_name, \
         lf.last_updated_by, lf.last_updated_at \
         FROM logical_flow lf ",
        entity_name_sql("lf.source_entity_kind", "lf.source_entity_id"),
        entity_name_sql("lf.target_entity_kind", "lf.target_entity_id"),
    )
}

/// Repository for the `logical_flow` table
#[derive(Debug, Clone)]
pub struct LogicalFlowRepository {
    pool: SqlitePool,
    selector: ApplicationIdSelector,
}

impl LogicalFlowRepository {
    pub fn new(pool: SqlitePool) -> Self {
        let selector = ApplicationIdSelector::new(pool.clone());
        Self { pool, selector }
    }

    /// Flows where the entity is either the source or the target
    pub async fn find_by_entity_reference(&self, entity: &EntityReference) -> Result<Vec<LogicalFlow>> {
        let sql = format!(
            "{} WHERE (lf.source_entity_kind = ? AND lf.source_entity_id = ?) \
             OR (lf.target_entity_kind = ? AND lf.target_entity_id = ?) \
             ORDER BY lf.id",
            select_flows()
        );

        let rows: Vec<LogicalFlowRow> = sqlx::query_as(&sql)
            .bind(entity.kind.as_str())
            .bind(entity.id)
            .bind(entity.kind.as_str())
            .bind(entity.id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(LogicalFlowRow::into_flow).collect()
    }

    /// Flows touching any application in the selection
    pub async fn find_by_selector(&self, options: &IdSelectionOptions) -> Result<Vec<LogicalFlow>> {
        let app_ids = self.selector.select(options).await?;
        self.find_by_application_ids(&app_ids).await
    }

    async fn find_by_application_ids(&self, app_ids: &[i64]) -> Result<Vec<LogicalFlow>> {
        if app_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(select_flows());
        builder.push("WHERE (lf.source_entity_kind = 'APPLICATION' AND lf.source_entity_id IN (");
        push_id_list(&mut builder, app_ids);
        builder.push(")) OR (lf.target_entity_kind = 'APPLICATION' AND lf.target_entity_id IN (");
        push_id_list(&mut builder, app_ids);
        builder.push(")) ORDER BY lf.id");

        let rows: Vec<LogicalFlowRow> = builder.build_query_as().fetch_all(&self.pool).await?;

        rows.into_iter().map(LogicalFlowRow::into_flow).collect()
    }

    /// Insert a new flow, returning its generated id
    pub async fn insert(&self, flow: &LogicalFlow) -> Result<i64> {
        if flow.source.identity() == flow.target.identity() {
            return Err(Error::InvalidInput(
                "A logical flow cannot have the same source and target".to_string(),
            ));
        }

        let last_updated_by = flow.last_updated_by.as_deref().unwrap_or("anonymous");
        let last_updated_at = flow.last_updated_at.unwrap_or_else(Utc::now);

        let result = sqlx::query(
            r#"
            INSERT INTO logical_flow (
                source_entity_kind, source_entity_id,
                target_entity_kind, target_entity_id,
                last_updated_by, last_updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(flow.source.kind.as_str())
        .bind(flow.source.id)
        .bind(flow.target.kind.as_str())
        .bind(flow.target.id)
        .bind(last_updated_by)
        .bind(last_updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Error::InvalidInput(
                format!(
                    "A flow from {} {} to {} {} already exists",
                    flow.source.kind, flow.source.id, flow.target.kind, flow.target.id
                ),
            ),
            other => Error::from(other),
        })?;

        Ok(result.last_insert_rowid())
    }

    /// Delete flows by id, returning the number removed
    pub async fn remove_flows(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("DELETE FROM logical_flow WHERE id IN (");
        push_id_list(&mut builder, ids);
        builder.push(")");

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

fn push_id_list(builder: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
}

/// Flow operations layered over the repository
#[derive(Debug, Clone)]
pub struct LogicalFlowService {
    repository: LogicalFlowRepository,
    selector: ApplicationIdSelector,
}

impl LogicalFlowService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            repository: LogicalFlowRepository::new(pool.clone()),
            selector: ApplicationIdSelector::new(pool),
        }
    }

    pub async fn find_by_entity_reference(&self, entity: &EntityReference) -> Result<Vec<LogicalFlow>> {
        self.repository.find_by_entity_reference(entity).await
    }

    pub async fn find_by_selector(&self, options: &IdSelectionOptions) -> Result<Vec<LogicalFlow>> {
        self.repository.find_by_selector(options).await
    }

    /// Classify the flows touching a selection.
    ///
    /// Inbound flows end inside the selection, outbound flows start inside it,
    /// intra flows do both. App counts tally distinct counterpart applications
    /// for inbound/outbound and distinct in-scope applications for intra.
    pub async fn calculate_stats(&self, options: &IdSelectionOptions) -> Result<LogicalFlowStatistics> {
        let app_ids: HashSet<i64> = self.selector.select(options).await?.into_iter().collect();
        let ids: Vec<i64> = app_ids.iter().copied().collect();
        let flows = self.repository.find_by_application_ids(&ids).await?;

        Ok(tally_flows(&app_ids, &flows))
    }

    /// Record a new flow on behalf of `user`.
    ///
    /// A flow that already carries an id is returned as-is.
    pub async fn add_flow(&self, flow: LogicalFlow, user: &str) -> Result<LogicalFlow> {
        if let Some(id) = flow.id {
            tracing::warn!(flow_id = id, "Ignoring add request for an existing logical flow");
            return Ok(flow);
        }

        let mut flow = LogicalFlow {
            last_updated_by: Some(user.to_string()),
            last_updated_at: Some(Utc::now()),
            ..flow
        };
        let id = self.repository.insert(&flow).await?;
        flow.id = Some(id);

        tracing::info!(
            flow_id = id,
            source = %flow.source.kind,
            target = %flow.target.kind,
            user = user,
            "Added logical flow"
        );

        Ok(flow)
    }

    pub async fn remove_flows(&self, ids: &[i64], user: &str) -> Result<u64> {
        let removed = self.repository.remove_flows(ids).await?;
        tracing::info!(requested = ids.len(), removed = removed, user = user, "Removed logical flows");
        Ok(removed)
    }
}

fn tally_flows(app_ids: &HashSet<i64>, flows: &[LogicalFlow]) -> LogicalFlowStatistics {
    let in_scope =
        |r: &EntityReference| r.kind == EntityKind::Application && app_ids.contains(&r.id);
    let app_id = |r: &EntityReference| (r.kind == EntityKind::Application).then_some(r.id);

    let mut flow_counts = DirectionCounts::default();
    let mut inbound_apps = HashSet::new();
    let mut outbound_apps = HashSet::new();
    let mut intra_apps = HashSet::new();

    for flow in flows {
        match (in_scope(&flow.source), in_scope(&flow.target)) {
            (true, true) => {
                flow_counts.intra += 1;
                intra_apps.insert(flow.source.id);
                intra_apps.insert(flow.target.id);
            }
            (false, true) => {
                flow_counts.inbound += 1;
                inbound_apps.extend(app_id(&flow.source));
            }
            (true, false) => {
                flow_counts.outbound += 1;
                outbound_apps.extend(app_id(&flow.target));
            }
            (false, false) => {}
        }
    }

    LogicalFlowStatistics {
        flow_counts,
        app_counts: DirectionCounts {
            inbound: inbound_apps.len() as u64,
            outbound: outbound_apps.len() as u64,
            intra: intra_apps.len() as u64,
        },
    }
}
