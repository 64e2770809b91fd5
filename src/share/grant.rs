//! Grant types and repository for Coffer sharing.
//!
//! A grant gives a non-owner a role on a node. The owner role is
//! implicit from `nodes.owner_id` and never stored as a grant row, so
//! stored roles are always `viewer` or `editor`.

use std::fmt;
use std::str::FromStr;

use sqlx::SqlitePool;

use crate::{CofferError, Result};

/// Role a user holds on a node.
///
/// Ordering follows capability: `Viewer < Editor < Owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
pub enum ShareRole {
    /// Read-only access: list and download.
    Viewer,
    /// Read and write access: upload, create folders, delete, move.
    Editor,
    /// Full control. Implicit for the node owner, never granted.
    Owner,
}

impl ShareRole {
    /// Convert role to its database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareRole::Viewer => "viewer",
            ShareRole::Editor => "editor",
            ShareRole::Owner => "owner",
        }
    }

    /// Check if this role permits mutating operations.
    pub fn can_write(&self) -> bool {
        *self >= ShareRole::Editor
    }
}

impl fmt::Display for ShareRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ShareRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "viewer" => Ok(ShareRole::Viewer),
            "editor" => Ok(ShareRole::Editor),
            "owner" => Ok(ShareRole::Owner),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// A stored grant row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Grant {
    /// Unique grant ID.
    pub id: i64,
    /// Node the grant applies to.
    pub node_id: i64,
    /// User receiving the role.
    pub user_id: i64,
    /// Granted role.
    pub role: ShareRole,
    /// Grant timestamp.
    pub created_at: String,
}

/// A grant joined with the grantee's username, for share listings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GrantDetail {
    /// Unique grant ID.
    pub id: i64,
    /// Node the grant applies to.
    pub node_id: i64,
    /// User receiving the role.
    pub user_id: i64,
    /// Grantee's username.
    pub username: String,
    /// Granted role.
    pub role: ShareRole,
}

/// Repository for grant persistence operations.
pub struct GrantRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> GrantRepository<'a> {
    /// Create a new GrantRepository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or update the grant for a `(node, user)` pair.
    ///
    /// At most one grant row exists per pair; re-sharing replaces the
    /// stored role.
    pub async fn upsert(&self, node_id: i64, user_id: i64, role: ShareRole) -> Result<Grant> {
        sqlx::query(
            "INSERT INTO grants (node_id, user_id, role) VALUES (?, ?, ?)
             ON CONFLICT(node_id, user_id) DO UPDATE SET role = excluded.role",
        )
        .bind(node_id)
        .bind(user_id)
        .bind(role)
        .execute(self.pool)
        .await?;

        let grant = self
            .get_by_pair(node_id, user_id)
            .await?
            .ok_or_else(|| CofferError::NotFound("grant".to_string()))?;

        Ok(grant)
    }

    /// Get the grant for a `(node, user)` pair.
    pub async fn get_by_pair(&self, node_id: i64, user_id: i64) -> Result<Option<Grant>> {
        let grant = sqlx::query_as::<_, Grant>(
            "SELECT * FROM grants WHERE node_id = ? AND user_id = ?",
        )
        .bind(node_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(grant)
    }

    /// List grants on a node together with grantee usernames.
    pub async fn list_for_node(&self, node_id: i64) -> Result<Vec<GrantDetail>> {
        let grants = sqlx::query_as::<_, GrantDetail>(
            "SELECT g.id, g.node_id, g.user_id, u.username, g.role
             FROM grants g
             JOIN users u ON u.id = g.user_id
             WHERE g.node_id = ?
             ORDER BY u.username COLLATE NOCASE ASC",
        )
        .bind(node_id)
        .fetch_all(self.pool)
        .await?;

        Ok(grants)
    }

    /// Remove the grant for a `(node, user)` pair.
    ///
    /// Returns `true` if a grant existed.
    pub async fn delete(&self, node_id: i64, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM grants WHERE node_id = ? AND user_id = ?")
            .bind(node_id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count all grant rows.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM grants")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}
