//! User roles gating write endpoints

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::fmt;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    AppEditor,
    LogicalDataFlowEditor,
    Anonymous,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::AppEditor => "APP_EDITOR",
            Self::LogicalDataFlowEditor => "LOGICAL_DATA_FLOW_EDITOR",
            Self::Anonymous => "ANONYMOUS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Self::Admin),
            "APP_EDITOR" => Some(Self::AppEditor),
            "LOGICAL_DATA_FLOW_EDITOR" => Some(Self::LogicalDataFlowEditor),
            "ANONYMOUS" => Some(Self::Anonymous),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role lookups and grants backed by the `user_role` table
#[derive(Debug, Clone)]
pub struct UserRoleService {
    pool: SqlitePool,
}

impl UserRoleService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn has_role(&self, user: &str, role: Role) -> Result<bool> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM user_role WHERE user_name = ? AND role = ?")
                .bind(user)
                .bind(role.as_str())
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.is_some())
    }

    /// Roles held by a user, sorted
    pub async fn get_roles(&self, user: &str) -> Result<Vec<Role>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT role FROM user_role WHERE user_name = ?")
            .bind(user)
            .fetch_all(&self.pool)
            .await?;

        let mut roles = rows
            .into_iter()
            .map(|(role,)| {
                Role::parse(&role).ok_or_else(|| Error::Parse(format!("Unknown role: {}", role)))
            })
            .collect::<Result<Vec<_>>>()?;
        roles.sort();
        Ok(roles)
    }

    /// Grant a role. Granting a held role is a no-op.
    pub async fn grant(&self, user: &str, role: Role) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO user_role (user_name, role) VALUES (?, ?)")
            .bind(user)
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;

        tracing::info!(user = user, role = %role, "Granted role");
        Ok(())
    }

    /// Fail with [`Error::Unauthorized`] unless the user holds `role`
    pub async fn require_role(&self, user: &str, role: Role) -> Result<()> {
        if self.has_role(user, role).await? {
            return Ok(());
        }

        tracing::warn!(user = user, role = %role, "Rejected request lacking role");
        Err(Error::Unauthorized {
            user: user.to_string(),
            role: role.to_string(),
        })
    }
}
