//! Atlas search integration tests
//!
//! Runs the search services end to end over an in-memory catalogue.

use atlas_core::config::Config;
use atlas_core::domain::{
    Application, ApplicationRepository, EntityAliasRepository, EntityKind, EntityReference,
    Measurable, MeasurableRepository,
};
use atlas_core::search::{SearchDialect, SearchHit, SearchOptions, SearchServices};
use atlas_core::storage::Database;
use std::collections::BTreeSet;

async fn catalogue() -> Database {
    let db = Database::in_memory().await.unwrap();
    let apps = ApplicationRepository::new(db.pool().clone());
    let measurables = MeasurableRepository::new(db.pool().clone());

    for app in [
        Application::new(1, "Orion").with_description("Order routing engine"),
        Application::new(2, "Sky Tracker").with_description("Satellite tracking"),
        Application::new(3, "Payments Gateway").with_asset_code("PAY-001"),
        Application::new(4, "Ledger").with_description("General ledger for payments"),
        Application::new(5, "Trade Capture"),
    ] {
        apps.create(&app).await.unwrap();
    }

    for measurable in [
        Measurable::new(10, "CAPABILITY", "Payments"),
        Measurable::new(11, "CAPABILITY", "Payments Clearing").with_parent(10),
        Measurable::new(12, "PROCESS", "Trade Settlement").with_external_id("TS-9"),
    ] {
        measurables.create(&measurable).await.unwrap();
    }

    db
}

async fn services(db: &Database, dialect: SearchDialect) -> SearchServices {
    let mut config = Config::default();
    config.search.dialect = dialect;
    SearchServices::from_config(&config, db.pool()).await.unwrap()
}

fn app_names(results: &[Application]) -> Vec<&str> {
    results.iter().map(|a| a.name.as_str()).collect()
}

#[tokio::test]
async fn test_union_example_from_alias_and_name() {
    let db = catalogue().await;
    EntityAliasRepository::new(db.pool().clone())
        .update_aliases(
            &EntityReference::new(EntityKind::Application, 1),
            &["Sky".to_string()],
        )
        .await
        .unwrap();

    let search = services(&db, SearchDialect::AliasUnion).await;
    let results = search
        .applications
        .search("sky", &SearchOptions::with_limit(10))
        .await
        .unwrap();

    assert_eq!(app_names(&results), vec!["Orion", "Sky Tracker"]);
}

#[tokio::test]
async fn test_cross_dialect_equivalence_without_aliases() {
    let db = catalogue().await;
    let alias_union = services(&db, SearchDialect::AliasUnion).await;
    let ranked = services(&db, SearchDialect::Ranked).await;
    let options = SearchOptions::with_limit(50);

    for query in ["payment", "trade", "ledger payment", "orion", "nothing matches"] {
        let a: BTreeSet<i64> = alias_union
            .applications
            .search(query, &options)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        let b: BTreeSet<i64> = ranked
            .applications
            .search(query, &options)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(a, b, "dialects disagree for query {:?}", query);
    }
}

#[tokio::test]
async fn test_search_is_deterministic() {
    let db = catalogue().await;

    for dialect in [SearchDialect::AliasUnion, SearchDialect::Ranked] {
        let search = services(&db, dialect).await;
        let first = search
            .search_all("payment", &SearchOptions::default())
            .await
            .unwrap();
        let second = search
            .search_all("payment", &SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}

#[tokio::test]
async fn test_limit_respected_by_every_dialect() {
    let db = catalogue().await;

    for dialect in [SearchDialect::AliasUnion, SearchDialect::Ranked] {
        let search = services(&db, dialect).await;
        let results = search
            .measurables
            .search("payment", &SearchOptions::with_limit(1))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }
}

#[tokio::test]
async fn test_search_all_orders_kinds_and_tags_them() {
    let db = catalogue().await;
    let search = services(&db, SearchDialect::AliasUnion).await;

    let hits = search
        .search_all("payment", &SearchOptions::default())
        .await
        .unwrap();

    let identities: Vec<(EntityKind, i64)> = hits.iter().map(SearchHit::identity).collect();
    assert_eq!(
        identities,
        vec![
            (EntityKind::Application, 4),
            (EntityKind::Application, 3),
            (EntityKind::Measurable, 10),
            (EntityKind::Measurable, 11),
        ]
    );

    let json = serde_json::to_value(&hits).unwrap();
    assert_eq!(json[0]["kind"], "APPLICATION");
    assert_eq!(json[2]["kind"], "MEASURABLE");
}

#[tokio::test]
async fn test_empty_query_returns_nothing() {
    let db = catalogue().await;
    let search = services(&db, SearchDialect::Ranked).await;

    assert!(
        search
            .search_all("  ", &SearchOptions::default())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_fts_syntax_is_neutralised() {
    let db = catalogue().await;

    for dialect in [SearchDialect::AliasUnion, SearchDialect::Ranked] {
        let search = services(&db, dialect).await;
        let results = search
            .applications
            .search("\"trade\" AND (capture* OR NOT", &SearchOptions::default())
            .await
            .unwrap();
        assert!(results.is_empty(), "{} treated operator-like terms as syntax", dialect);
    }
}

#[tokio::test]
async fn test_postgres_dialect_without_feature_or_url_is_config_error() {
    let db = catalogue().await;
    let mut config = Config::default();
    config.search.dialect = SearchDialect::Postgres;

    let result = SearchServices::from_config(&config, db.pool()).await;
    assert!(matches!(result, Err(atlas_core::Error::ConfigError(_))));
}
