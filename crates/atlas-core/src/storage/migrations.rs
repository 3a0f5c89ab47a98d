//! Database migrations
//!
//! This module manages SQLite schema migrations for the catalogue.
//! Migrations are versioned and applied automatically on database connection.

use sqlx::SqlitePool;

/// Current schema version
pub const CURRENT_VERSION: i32 = 4;

/// SQL for creating the migrations tracking table
const CREATE_MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        version INTEGER PRIMARY KEY NOT NULL,
        applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
"#;

/// Migration 1: Catalogue schema
const MIGRATION_V1: &str = r#"
    CREATE TABLE IF NOT EXISTS application (
        id INTEGER PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        asset_code TEXT,
        lifecycle_phase TEXT NOT NULL DEFAULT 'PRODUCTION'
            CHECK (lifecycle_phase IN ('CONCEPTUAL', 'DEVELOPMENT', 'PRODUCTION', 'RETIRED'))
    );

    CREATE INDEX IF NOT EXISTS idx_application_name ON application(name);
    CREATE INDEX IF NOT EXISTS idx_application_asset_code ON application(asset_code);

    CREATE TABLE IF NOT EXISTS actor (
        id INTEGER PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        is_external INTEGER NOT NULL DEFAULT 0
    );

    -- Organizational taxonomy; parent_id forms a tree per category
    CREATE TABLE IF NOT EXISTS measurable (
        id INTEGER PRIMARY KEY NOT NULL,
        parent_id INTEGER REFERENCES measurable(id) ON DELETE SET NULL,
        category TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        external_id TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_measurable_parent_id ON measurable(parent_id);
    CREATE INDEX IF NOT EXISTS idx_measurable_name ON measurable(name);

    CREATE TABLE IF NOT EXISTS measurable_rating (
        application_id INTEGER NOT NULL REFERENCES application(id) ON DELETE CASCADE,
        measurable_id INTEGER NOT NULL REFERENCES measurable(id) ON DELETE CASCADE,
        rating TEXT NOT NULL,
        PRIMARY KEY (application_id, measurable_id)
    );

    CREATE INDEX IF NOT EXISTS idx_measurable_rating_measurable_id ON measurable_rating(measurable_id);

    -- Secondary names; id + kind point at any catalogue entity
    CREATE TABLE IF NOT EXISTS entity_alias (
        id INTEGER NOT NULL,
        kind TEXT NOT NULL,
        alias TEXT NOT NULL,
        PRIMARY KEY (id, kind, alias)
    );

    CREATE INDEX IF NOT EXISTS idx_entity_alias_kind ON entity_alias(kind, alias);

    CREATE TABLE IF NOT EXISTS logical_flow (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        source_entity_kind TEXT NOT NULL,
        source_entity_id INTEGER NOT NULL,
        target_entity_kind TEXT NOT NULL,
        target_entity_id INTEGER NOT NULL,
        last_updated_by TEXT NOT NULL,
        last_updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (source_entity_kind, source_entity_id, target_entity_kind, target_entity_id)
    );

    CREATE INDEX IF NOT EXISTS idx_logical_flow_source ON logical_flow(source_entity_kind, source_entity_id);
    CREATE INDEX IF NOT EXISTS idx_logical_flow_target ON logical_flow(target_entity_kind, target_entity_id);

    CREATE TABLE IF NOT EXISTS flow_diagram_entity (
        diagram_id INTEGER NOT NULL,
        entity_kind TEXT NOT NULL,
        entity_id INTEGER NOT NULL,
        is_notable INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (diagram_id, entity_kind, entity_id)
    );

    CREATE INDEX IF NOT EXISTS idx_flow_diagram_entity_entity
        ON flow_diagram_entity(entity_kind, entity_id);
"#;

/// Migration 2: Full-text indexes for entity search
///
/// Column order matters: it must match the weighted text columns declared
/// by each searchable entity, since bm25() weights are positional.
const MIGRATION_V2: &str = r#"
    CREATE VIRTUAL TABLE IF NOT EXISTS application_fts USING fts5(
        name, description, asset_code,
        content='application',
        content_rowid='id',
        tokenize='porter unicode61'
    );

    CREATE TRIGGER IF NOT EXISTS application_ai AFTER INSERT ON application BEGIN
        INSERT INTO application_fts(rowid, name, description, asset_code)
        VALUES (NEW.id, NEW.name, NEW.description, NEW.asset_code);
    END;

    CREATE TRIGGER IF NOT EXISTS application_ad AFTER DELETE ON application BEGIN
        INSERT INTO application_fts(application_fts, rowid, name, description, asset_code)
        VALUES ('delete', OLD.id, OLD.name, OLD.description, OLD.asset_code);
    END;

    CREATE TRIGGER IF NOT EXISTS application_au AFTER UPDATE ON application BEGIN
        INSERT INTO application_fts(application_fts, rowid, name, description, asset_code)
        VALUES ('delete', OLD.id, OLD.name, OLD.description, OLD.asset_code);
        INSERT INTO application_fts(rowid, name, description, asset_code)
        VALUES (NEW.id, NEW.name, NEW.description, NEW.asset_code);
    END;

    CREATE VIRTUAL TABLE IF NOT EXISTS measurable_fts USING fts5(
        name, description, external_id,
        content='measurable',
        content_rowid='id',
        tokenize='porter unicode61'
    );

    CREATE TRIGGER IF NOT EXISTS measurable_ai AFTER INSERT ON measurable BEGIN
        INSERT INTO measurable_fts(rowid, name, description, external_id)
        VALUES (NEW.id, NEW.name, NEW.description, NEW.external_id);
    END;

    CREATE TRIGGER IF NOT EXISTS measurable_ad AFTER DELETE ON measurable BEGIN
        INSERT INTO measurable_fts(measurable_fts, rowid, name, description, external_id)
        VALUES ('delete', OLD.id, OLD.name, OLD.description, OLD.external_id);
    END;

    CREATE TRIGGER IF NOT EXISTS measurable_au AFTER UPDATE ON measurable BEGIN
        INSERT INTO measurable_fts(measurable_fts, rowid, name, description, external_id)
        VALUES ('delete', OLD.id, OLD.name, OLD.description, OLD.external_id);
        INSERT INTO measurable_fts(rowid, name, description, external_id)
        VALUES (NEW.id, NEW.name, NEW.description, NEW.external_id);
    END;
"#;

/// Migration 3: User roles for endpoint authorization
const MIGRATION_V3: &str = r#"
    CREATE TABLE IF NOT EXISTS user_role (
        user_name TEXT NOT NULL,
        role TEXT NOT NULL,
        granted_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (user_name, role)
    );
"#;

/// Migration 4: Case-folded aliases for Unicode case-insensitive matching
///
/// Backfilled rows are folded by SQLite's ASCII-only `lower()`; the alias
/// repository rewrites the column with full Unicode folding on every update.
const MIGRATION_V4: &str = r#"
    ALTER TABLE entity_alias ADD COLUMN alias_folded TEXT NOT NULL DEFAULT '';

    UPDATE entity_alias SET alias_folded = lower(alias);

    CREATE INDEX IF NOT EXISTS idx_entity_alias_folded ON entity_alias(kind, alias_folded);
"#;

/// Get the current schema version from the database
async fn get_current_version(pool: &SqlitePool) -> anyhow::Result<i32> {
    sqlx::raw_sql(CREATE_MIGRATIONS_TABLE).execute(pool).await?;

    let row: Option<(Option<i32>,)> = sqlx::query_as("SELECT MAX(version) FROM _migrations")
        .fetch_optional(pool)
        .await?;

    Ok(row.and_then(|(v,)| v).unwrap_or(0))
}

/// Record that a migration has been applied
async fn record_migration(pool: &SqlitePool, version: i32) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    let current_version = get_current_version(pool).await?;

    tracing::info!(
        current_version = current_version,
        target_version = CURRENT_VERSION,
        "Checking database migrations"
    );

    if current_version >= CURRENT_VERSION {
        tracing::debug!("Database is up to date");
        return Ok(());
    }

    if current_version < 1 {
        tracing::info!("Applying migration v1: Catalogue schema");
        sqlx::raw_sql(MIGRATION_V1).execute(pool).await?;
        record_migration(pool, 1).await?;
    }

    if current_version < 2 {
        tracing::info!("Applying migration v2: Full-text search indexes");
        sqlx::raw_sql(MIGRATION_V2).execute(pool).await?;
        record_migration(pool, 2).await?;
    }

    if current_version < 3 {
        tracing::info!("Applying migration v3: User roles");
        sqlx::raw_sql(MIGRATION_V3).execute(pool).await?;
        record_migration(pool, 3).await?;
    }

    if current_version < 4 {
        tracing::info!("Applying migration v4: Case-folded aliases");
        sqlx::raw_sql(MIGRATION_V4).execute(pool).await?;
        record_migration(pool, 4).await?;
    }

    tracing::info!("Database migrations completed");
    Ok(())
}

/// Get migration status information
pub async fn migration_status(pool: &SqlitePool) -> anyhow::Result<MigrationStatus> {
    let current_version = get_current_version(pool).await?;
    Ok(MigrationStatus {
        current_version,
        target_version: CURRENT_VERSION,
        needs_migration: current_version < CURRENT_VERSION,
    })
}

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Current schema version in the database
    pub current_version: i32,
    /// Target schema version (latest)
    pub target_version: i32,
    /// Whether migrations need to be run
    pub needs_migration: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test pool")
    }

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await;

        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, 0);
        assert!(status.needs_migration);

        run_migrations(&pool).await.unwrap();

        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, CURRENT_VERSION);
        assert!(!status.needs_migration);
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let pool = create_test_pool().await;

        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, CURRENT_VERSION);
    }

    #[tokio::test]
    async fn test_tables_created() {
        let pool = create_test_pool().await;
        run_migrations(&pool).await.unwrap();

        let tables = vec![
            "application",
            "actor",
            "measurable",
            "measurable_rating",
            "entity_alias",
            "logical_flow",
            "flow_diagram_entity",
            "application_fts",
            "measurable_fts",
            "user_role",
        ];

        for table in tables {
            let result: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&pool)
                .await
                .unwrap_or_else(|_| panic!("Table {} should exist", table));
            assert_eq!(result.0, 0, "Table {} should be empty", table);
        }
    }

    #[tokio::test]
    async fn test_fts_index_follows_updates() {
        let pool = create_test_pool().await;
        run_migrations(&pool).await.unwrap();

        sqlx::query("INSERT INTO application (id, name) VALUES (1, 'Payments Gateway')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("UPDATE application SET name = 'Ledger' WHERE id = 1")
            .execute(&pool)
            .await
            .unwrap();

        let old: Vec<(i64,)> =
            sqlx::query_as("SELECT rowid FROM application_fts WHERE application_fts MATCH 'payments'")
                .fetch_all(&pool)
                .await
                .unwrap();
        let new: Vec<(i64,)> =
            sqlx::query_as("SELECT rowid FROM application_fts WHERE application_fts MATCH 'ledger'")
                .fetch_all(&pool)
                .await
                .unwrap();

        assert!(old.is_empty());
        assert_eq!(new, vec![(1,)]);
    }
}
