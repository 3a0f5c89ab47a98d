//! Error types for Atlas

use sqlx::error::DatabaseError;
use thiserror::Error;

use crate::domain::entity::EntityKind;

/// Result type alias using Atlas's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Atlas error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Entity errors (E001-E099)
    #[error("{0} with id {1} not found.")]
    EntityNotFound(EntityKind, i64),

    // Storage errors (E400-E499)
    #[error("Storage unavailable: {0}. Check the database path and that the store is reachable.")]
    StorageUnavailable(String),

    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Authorization errors (E700-E799)
    #[error("User '{user}' does not have the required role: {role}")]
    Unauthorized { user: String, role: String },

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Parse error: {0}")]
    Parse(String),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::EntityNotFound(..) => "E001",
            Self::StorageUnavailable(_) => "E400",
            Self::DatabaseError(_) => "E401",
            Self::ConfigError(_) => "E600",
            Self::Unauthorized { .. } => "E700",
            Self::InvalidInput(_) => "E800",
            Self::InvalidQuery(_) => "E801",
            Self::Parse(_) => "E802",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::StorageUnavailable(_) => Some("atlas config get database.path".to_string()),
            Self::ConfigError(_) => Some("atlas config list".to_string()),
            Self::Unauthorized { user, role } => Some(format!("atlas roles grant {} {}", user, role)),
            _ => None,
        }
    }

    /// Classify a failure raised while running a search statement.
    ///
    /// A statement the store rejects is an `InvalidQuery`; busy, locked and
    /// connectivity failures are `StorageUnavailable`.
    pub fn from_query_failure(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) if !is_unavailable(&*db_err) => {
                Self::InvalidQuery(db_err.message().to_string())
            }
            other => Self::from(other),
        }
    }
}

/// SQLite primary codes for a busy, locked or failing store
const SQLITE_UNAVAILABLE_CODES: &[i32] = &[5, 6, 10];

/// Postgres SQLSTATE classes: connection exception, insufficient resources,
/// operator intervention (includes statement timeout)
const POSTGRES_UNAVAILABLE_CLASSES: &[&str] = &["08", "53", "57"];

/// Whether a database-reported error means the store cannot serve the request
fn is_unavailable(db_err: &dyn DatabaseError) -> bool {
    let Some(code) = db_err.code() else {
        return false;
    };

    if db_err.try_downcast_ref::<sqlx::sqlite::SqliteError>().is_some() {
        // Extended codes carry the primary code in the low byte
        return code
            .parse::<i32>()
            .map(|c| SQLITE_UNAVAILABLE_CODES.contains(&(c & 0xff)))
            .unwrap_or(false);
    }

    code.get(..2)
        .is_some_and(|class| POSTGRES_UNAVAILABLE_CLASSES.contains(&class))
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => {
                Self::StorageUnavailable("timed out waiting for a connection".to_string())
            }
            sqlx::Error::PoolClosed => {
                Self::StorageUnavailable("connection pool is closed".to_string())
            }
            sqlx::Error::Io(e) => Self::StorageUnavailable(e.to_string()),
            sqlx::Error::Tls(e) => Self::StorageUnavailable(e.to_string()),
            sqlx::Error::WorkerCrashed => {
                Self::StorageUnavailable("database worker crashed".to_string())
            }
            sqlx::Error::Database(db_err) if is_unavailable(&*db_err) => {
                Self::StorageUnavailable(db_err.message().to_string())
            }
            other => Self::DatabaseError(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_not_found_error() {
        let error = Error::EntityNotFound(EntityKind::Application, 42);
        assert_eq!(error.code(), "E001");
        assert_eq!(error.suggestion(), None);
        assert!(error.to_string().contains("42"));
    }

    #[test]
    fn test_pool_timeout_is_storage_unavailable() {
        let error = Error::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(error, Error::StorageUnavailable(_)));
        assert_eq!(error.code(), "E400");
    }

    #[test]
    fn test_row_not_found_stays_database_error() {
        let error = Error::from(sqlx::Error::RowNotFound);
        assert!(matches!(error, Error::DatabaseError(_)));
    }

    #[test]
    fn test_query_failure_keeps_connectivity_class() {
        let error = Error::from_query_failure(sqlx::Error::PoolClosed);
        assert!(matches!(error, Error::StorageUnavailable(_)));
    }

    #[test]
    fn test_unauthorized_suggestion() {
        let error = Error::Unauthorized {
            user: "jdoe".to_string(),
            role: "LOGICAL_DATA_FLOW_EDITOR".to_string(),
        };
        assert_eq!(error.code(), "E700");
        assert_eq!(
            error.suggestion(),
            Some("atlas roles grant jdoe LOGICAL_DATA_FLOW_EDITOR".to_string())
        );
    }
}
