//! Administration module for Coffer.
//!
//! This module provides administrative functionality including:
//! - Per-user storage reporting (usage, quota, percent used)
//! - Global storage overview and largest-files analytics
//! - Quota administration
//! - Account deletion with full cascade
//!
//! Every operation takes the acting principal and requires the admin
//! flag; there is no finer-grained admin role hierarchy.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::auth::Principal;
use crate::db::{Database, User, UserRepository, UserUpdate};
use crate::file::{BlobStore, LargestFile, NodeRepository};
use crate::quota::{GlobalUsage, QuotaService, UserUsage};
use crate::{CofferError, Result};

/// Require the admin capability on the acting principal.
pub fn require_admin(principal: &Principal) -> Result<()> {
    if !principal.is_admin {
        return Err(CofferError::Permission(
            "admin access required".to_string(),
        ));
    }
    Ok(())
}

/// Admin service for account and quota administration.
pub struct AdminService<'a> {
    db: &'a Database,
    store: &'a BlobStore,
}

impl<'a> AdminService<'a> {
    /// Create a new AdminService.
    pub fn new(db: &'a Database, store: &'a BlobStore) -> Self {
        Self { db, store }
    }

    /// Usage report for every account, ordered by username.
    pub async fn list_users(&self, acting: &Principal) -> Result<Vec<UserUsage>> {
        require_admin(acting)?;
        QuotaService::new(self.db).usage_for_all().await
    }

    /// Storage totals across all accounts.
    pub async fn overview(&self, acting: &Principal) -> Result<GlobalUsage> {
        require_admin(acting)?;
        QuotaService::new(self.db).global_usage().await
    }

    /// The `limit` largest files across all accounts.
    pub async fn largest_files(&self, acting: &Principal, limit: i64) -> Result<Vec<LargestFile>> {
        require_admin(acting)?;
        QuotaService::new(self.db).largest_files(limit).await
    }

    /// Set a user's storage quota from a raw form value.
    ///
    /// # Validation
    /// The value must parse as a non-negative whole number of megabytes.
    pub async fn update_quota(
        &self,
        acting: &Principal,
        target_id: i64,
        new_limit_mb: &str,
    ) -> Result<User> {
        require_admin(acting)?;

        let limit_mb: i64 = new_limit_mb.trim().parse().map_err(|_| {
            CofferError::Validation(
                "storage limit must be a whole number of megabytes".to_string(),
            )
        })?;
        if limit_mb < 0 {
            return Err(CofferError::Validation(
                "storage limit cannot be negative".to_string(),
            ));
        }

        let users = UserRepository::new(self.db.pool());
        let updated = users
            .update(target_id, &UserUpdate::new().storage_limit_mb(limit_mb))
            .await?
            .ok_or_else(|| CofferError::NotFound("user".to_string()))?;

        info!(
            admin_id = acting.id,
            user_id = target_id,
            limit_mb,
            "storage quota updated"
        );

        Ok(updated)
    }

    /// Delete an account and everything it owns.
    ///
    /// # Validation
    /// Admins cannot delete their own account.
    ///
    /// Blobs under the target's nodes are removed best-effort with a
    /// warning per failure. The rows themselves go in one transaction:
    /// the target's nodes (the parent link fans out to nested rows and
    /// their grants), the target's received grants, their messages in
    /// both directions, and finally the user row. A crash mid-way
    /// leaves every row in place.
    pub async fn delete_user(&self, acting: &Principal, target_id: i64) -> Result<()> {
        require_admin(acting)?;

        if target_id == acting.id {
            return Err(CofferError::Validation(
                "cannot delete your own account".to_string(),
            ));
        }

        let users = UserRepository::new(self.db.pool());
        let target = users
            .get_by_id(target_id)
            .await?
            .ok_or_else(|| CofferError::NotFound("user".to_string()))?;

        // Everything reachable from the target's nodes loses its blob,
        // nested uploads by other users included
        let nodes = NodeRepository::new(self.db.pool());
        let mut seen = HashSet::new();
        let mut removed_nodes = 0u64;
        for owned in nodes.list_by_owner(target.id).await? {
            for entry in nodes.collect_subtree(owned.id).await? {
                if !seen.insert(entry.id) {
                    continue;
                }
                removed_nodes += 1;
                if let Some(locator) = entry.blob.as_deref() {
                    if let Err(e) = self.store.delete(locator) {
                        warn!(node_id = entry.id, error = %e, "failed to remove blob");
                    }
                }
            }
        }

        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM nodes WHERE owner_id = ?")
            .bind(target.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM grants WHERE user_id = ?")
            .bind(target.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM messages WHERE sender_id = ? OR recipient_id = ?")
            .bind(target.id)
            .bind(target.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(target.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(
            admin_id = acting.id,
            user_id = target.id,
            username = %target.username,
            removed_nodes,
            "user deleted"
        );

        Ok(())
    }
}
