//! HTTP API integration tests
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use atlas_core::config::Config;
use atlas_core::domain::{
    Actor, ActorRepository, Application, ApplicationRepository, EntityKind, EntityReference,
    FlowDiagramEntity, FlowDiagramEntityRepository, Measurable, MeasurableRepository, Role,
    UserRoleService,
};
use atlas_core::search::{SearchDialect, SearchServices};
use atlas_core::storage::Database;
use atlas_core::web::{self, AppState, USER_HEADER};
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    db: Database,
    router: Router,
}

impl TestApp {
    async fn new() -> Self {
        let db = Database::in_memory().await.unwrap();

        let apps = ApplicationRepository::new(db.pool().clone());
        for app in [
            Application::new(1, "Orion").with_description("Order routing"),
            Application::new(2, "Sky Tracker"),
            Application::new(3, "Payments Gateway"),
        ] {
            apps.create(&app).await.unwrap();
        }
        ActorRepository::new(db.pool().clone())
            .create(&Actor::new(7, "Regulator").external())
            .await
            .unwrap();
        let measurables = MeasurableRepository::new(db.pool().clone());
        measurables
            .create(&Measurable::new(10, "CAPABILITY", "Payments"))
            .await
            .unwrap();
        measurables.rate(1, 10, "G").await.unwrap();

        let search = SearchServices::sqlite(SearchDialect::AliasUnion, db.pool(), 1000).unwrap();
        let state = AppState::new(Config::default(), db.pool().clone(), search);
        let router = web::router(Arc::new(state));

        Self { db, router }
    }

    async fn grant(&self, user: &str, role: Role) {
        UserRoleService::new(self.db.pool().clone())
            .grant(user, role)
            .await
            .unwrap();
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn send_json(
        &self,
        method: Method,
        uri: &str,
        user: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(user) = user {
            builder = builder.header(USER_HEADER, user);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn delete(&self, uri: &str, user: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(Method::DELETE).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_HEADER, user);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }
}

fn flow_body(source: i64, target: i64) -> Value {
    json!({
        "source": { "kind": "APPLICATION", "id": source },
        "target": { "kind": "APPLICATION", "id": target },
    })
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_health_reports_unreachable_store() {
    let app = TestApp::new().await;
    app.db.close().await;

    let (status, body) = app.get("/api/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "E400");
}

#[tokio::test]
async fn test_application_search_tags_kind_and_limits() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/application/search/sky%20tracker").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["kind"], "APPLICATION");
    assert_eq!(body[0]["name"], "Sky Tracker");

    let (status, body) = app.get("/api/application/search/o?limit=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_measurable_search() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/measurable/search/payment").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["kind"], "MEASURABLE");
    assert_eq!(body[0]["category"], "CAPABILITY");
}

#[tokio::test]
async fn test_entity_search_spans_kinds() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send_json(
            Method::POST,
            "/api/entity-search",
            None,
            json!({ "query": "payment" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|hit| hit["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["APPLICATION", "MEASURABLE"]);
}

#[tokio::test]
async fn test_add_flow_requires_role() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send_json(Method::POST, "/api/logical-flow", None, flow_body(1, 2))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "E700");
    assert_eq!(body["status"], 403);

    let (status, _) = app
        .send_json(Method::POST, "/api/logical-flow", Some("jdoe"), flow_body(1, 2))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_flow_lifecycle() {
    let app = TestApp::new().await;
    app.grant("jdoe", Role::LogicalDataFlowEditor).await;

    let (status, added) = app
        .send_json(Method::POST, "/api/logical-flow", Some("jdoe"), flow_body(1, 2))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(added["last_updated_by"], "jdoe");
    let id = added["id"].as_i64().unwrap();

    let (status, flows) = app.get("/api/logical-flow/entity/APPLICATION/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flows[0]["id"], id);
    assert_eq!(flows[0]["source"]["name"], "Orion");

    let (status, stats) = app
        .send_json(
            Method::POST,
            "/api/logical-flow/stats",
            None,
            json!({ "entity_reference": { "kind": "MEASURABLE", "id": 10 }, "scope": "EXACT" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["flow_counts"]["outbound"], 1);
    assert_eq!(stats["app_counts"]["outbound"], 1);

    let (status, selected) = app
        .send_json(
            Method::POST,
            "/api/logical-flow/selector",
            None,
            json!({ "entity_reference": { "kind": "APPLICATION", "id": 1 } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(selected.as_array().unwrap().len(), 1);

    let uri = format!("/api/logical-flow/{}", id);
    let (status, _) = app.delete(&uri, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.delete(&uri, Some("jdoe")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], 1);

    let (status, body) = app.delete(&uri, Some("jdoe")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "E001");
}

#[tokio::test]
async fn test_duplicate_flow_is_bad_request() {
    let app = TestApp::new().await;
    app.grant("jdoe", Role::LogicalDataFlowEditor).await;

    app.send_json(Method::POST, "/api/logical-flow", Some("jdoe"), flow_body(1, 2))
        .await;
    let (status, body) = app
        .send_json(Method::POST, "/api/logical-flow", Some("jdoe"), flow_body(1, 2))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E800");
}

#[tokio::test]
async fn test_unknown_entity_kind_is_bad_request() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/logical-flow/entity/WIDGET/1").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E800");
}

#[tokio::test]
async fn test_malformed_body_is_json_bad_request() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send_json(
            Method::POST,
            "/api/logical-flow/stats",
            None,
            json!({ "entity_reference": { "kind": "BOGUS", "id": 1 } }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E802");
    assert_eq!(body["status"], 400);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_malformed_path_is_json_bad_request() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/logical-flow/entity/APPLICATION/abc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E802");
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn test_malformed_limit_is_json_bad_request() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/application/search/orion?limit=many").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E802");
}

#[tokio::test]
async fn test_flow_diagram_entities() {
    let app = TestApp::new().await;
    FlowDiagramEntityRepository::new(app.db.pool().clone())
        .create_entities(&[
            FlowDiagramEntity::new(5, EntityReference::new(EntityKind::Application, 1)),
            FlowDiagramEntity::new(5, EntityReference::new(EntityKind::Actor, 7)).notable(),
        ])
        .await
        .unwrap();

    let (status, body) = app.get("/api/flow-diagram-entity/id/5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["entity_reference"]["name"], "Regulator");
    assert_eq!(body[0]["is_notable"], true);
    assert_eq!(body[1]["entity_reference"]["name"], "Orion");

    let (status, body) = app.get("/api/flow-diagram-entity/entity/ACTOR/7").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["diagram_id"], 5);
}
