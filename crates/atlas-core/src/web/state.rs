//! Shared state for the HTTP handlers

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::config::Config;
use crate::domain::{FlowDiagramEntityRepository, LogicalFlowService, UserRoleService};
use crate::search::SearchServices;

/// Services shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pool: SqlitePool,
    pub search: SearchServices,
    pub logical_flows: LogicalFlowService,
    pub flow_diagram_entities: FlowDiagramEntityRepository,
    pub roles: UserRoleService,
}

impl AppState {
    /// Wire the catalogue services over `pool`.
    ///
    /// Search services are passed in because their dialect is chosen at startup.
    pub fn new(config: Config, pool: SqlitePool, search: SearchServices) -> Self {
        Self {
            config: Arc::new(config),
            search,
            logical_flows: LogicalFlowService::new(pool.clone()),
            flow_diagram_entities: FlowDiagramEntityRepository::new(pool.clone()),
            roles: UserRoleService::new(pool.clone()),
            pool,
        }
    }
}
