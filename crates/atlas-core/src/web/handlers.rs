//! HTTP request handlers

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::extract::{JsonBody, PathParams, QueryParams};
use super::state::AppState;
use crate::domain::{
    EntityKind, EntityReference, FlowDiagramEntity, IdSelectionOptions, LogicalFlow,
    LogicalFlowStatistics, Role,
};
use crate::error::{Error, Result};
use crate::search::{SearchHit, SearchOptions};
use crate::storage;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct EntitySearchRequest {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemovedResponse {
    pub removed: u64,
}

fn search_options(state: &AppState, limit: Option<usize>) -> SearchOptions {
    SearchOptions::with_limit(limit.unwrap_or(state.config.search.default_limit))
}

fn entity_reference(kind: &str, id: i64) -> Result<EntityReference> {
    let kind = EntityKind::parse(kind)
        .ok_or_else(|| Error::InvalidInput(format!("Unknown entity kind: {}", kind)))?;
    Ok(EntityReference::new(kind, id))
}

/// Liveness plus a round trip to the catalogue store; 503 when it is unreachable
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>> {
    storage::ping(&state.pool).await?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: "ok".to_string(),
    }))
}

pub async fn search_applications(
    State(state): State<Arc<AppState>>,
    PathParams(query): PathParams<String>,
    QueryParams(params): QueryParams<LimitParams>,
) -> Result<Json<Vec<SearchHit>>> {
    let options = search_options(&state, params.limit);
    let apps = state.search.applications.search(&query, &options).await?;
    Ok(Json(apps.into_iter().map(SearchHit::from).collect()))
}

pub async fn search_measurables(
    State(state): State<Arc<AppState>>,
    PathParams(query): PathParams<String>,
    QueryParams(params): QueryParams<LimitParams>,
) -> Result<Json<Vec<SearchHit>>> {
    let options = search_options(&state, params.limit);
    let measurables = state.search.measurables.search(&query, &options).await?;
    Ok(Json(measurables.into_iter().map(SearchHit::from).collect()))
}

/// Search every searchable kind at once
pub async fn search_entities(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<EntitySearchRequest>,
) -> Result<Json<Vec<SearchHit>>> {
    let options = search_options(&state, req.limit);
    Ok(Json(state.search.search_all(&req.query, &options).await?))
}

pub async fn find_flows_by_entity(
    State(state): State<Arc<AppState>>,
    PathParams((kind, id)): PathParams<(String, i64)>,
) -> Result<Json<Vec<LogicalFlow>>> {
    let entity = entity_reference(&kind, id)?;
    Ok(Json(state.logical_flows.find_by_entity_reference(&entity).await?))
}

pub async fn find_flows_by_selector(
    State(state): State<Arc<AppState>>,
    JsonBody(options): JsonBody<IdSelectionOptions>,
) -> Result<Json<Vec<LogicalFlow>>> {
    Ok(Json(state.logical_flows.find_by_selector(&options).await?))
}

pub async fn flow_stats(
    State(state): State<Arc<AppState>>,
    JsonBody(options): JsonBody<IdSelectionOptions>,
) -> Result<Json<LogicalFlowStatistics>> {
    Ok(Json(state.logical_flows.calculate_stats(&options).await?))
}

/// Add a flow; requires `LOGICAL_DATA_FLOW_EDITOR`
pub async fn add_flow(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    JsonBody(flow): JsonBody<LogicalFlow>,
) -> Result<Json<LogicalFlow>> {
    state
        .roles
        .require_role(user.name(), Role::LogicalDataFlowEditor)
        .await?;
    Ok(Json(state.logical_flows.add_flow(flow, user.name()).await?))
}

/// Remove a flow; requires `LOGICAL_DATA_FLOW_EDITOR`
pub async fn remove_flow(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    PathParams(id): PathParams<i64>,
) -> Result<Json<RemovedResponse>> {
    state
        .roles
        .require_role(user.name(), Role::LogicalDataFlowEditor)
        .await?;

    let removed = state.logical_flows.remove_flows(&[id], user.name()).await?;
    if removed == 0 {
        return Err(Error::EntityNotFound(EntityKind::LogicalDataFlow, id));
    }
    Ok(Json(RemovedResponse { removed }))
}

pub async fn find_diagram_entities(
    State(state): State<Arc<AppState>>,
    PathParams(diagram_id): PathParams<i64>,
) -> Result<Json<Vec<FlowDiagramEntity>>> {
    Ok(Json(state.flow_diagram_entities.find_for_diagram(diagram_id).await?))
}

pub async fn find_diagrams_for_entity(
    State(state): State<Arc<AppState>>,
    PathParams((kind, id)): PathParams<(String, i64)>,
) -> Result<Json<Vec<FlowDiagramEntity>>> {
    let entity = entity_reference(&kind, id)?;
    Ok(Json(state.flow_diagram_entities.find_for_entity(&entity).await?))
}
