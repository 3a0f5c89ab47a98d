//! Catalogue domain model and repositories

pub mod actor;
pub mod alias;
pub mod application;
pub mod entity;
pub mod flow_diagram;
pub mod logical_flow;
pub mod measurable;
pub mod selector;
pub mod user_role;

pub use actor::{Actor, ActorRepository};
pub use alias::EntityAliasRepository;
pub use application::{Application, ApplicationRepository, LifecyclePhase};
pub use entity::{EntityKind, EntityReference};
pub use flow_diagram::{FlowDiagramEntity, FlowDiagramEntityRepository};
pub use logical_flow::{
    DirectionCounts, LogicalFlow, LogicalFlowRepository, LogicalFlowService, LogicalFlowStatistics,
};
pub use measurable::{Measurable, MeasurableRepository};
pub use selector::{ApplicationIdSelector, HierarchyScope, IdSelectionOptions};
pub use user_role::{Role, UserRoleService};
