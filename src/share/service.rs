//! Sharing service for Coffer.
//!
//! This module manages per-user grants on nodes:
//! - Sharing a node with another user at a given role
//! - Revoking a grant
//! - Listing who a node is shared with

use tracing::info;

use crate::auth::Principal;
use crate::db::{Database, UserRepository};
use crate::file::NodeRepository;
use crate::{CofferError, Result};

use super::grant::{Grant, GrantDetail, GrantRepository, ShareRole};

/// Sharing service for managing grants.
pub struct ShareService<'a> {
    db: &'a Database,
}

impl<'a> ShareService<'a> {
    /// Create a new ShareService.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Share a node with another user.
    ///
    /// # Permission Check
    /// Only the node's owner may share it. Editors cannot re-share,
    /// and admin rights grant no exception.
    ///
    /// # Validation
    /// - The `owner` role cannot be granted
    /// - A node cannot be shared with its owner
    ///
    /// Sharing the same node with the same user again replaces the
    /// stored role.
    pub async fn share_node(
        &self,
        principal: &Principal,
        node_id: i64,
        target_username: &str,
        role: ShareRole,
    ) -> Result<Grant> {
        let nodes = NodeRepository::new(self.db.pool());
        let node = nodes
            .get_by_id(node_id)
            .await?
            .ok_or_else(|| CofferError::NotFound("node".to_string()))?;

        if node.owner_id != principal.id {
            return Err(CofferError::Permission(
                "only the owner can share this item".to_string(),
            ));
        }

        if role == ShareRole::Owner {
            return Err(CofferError::Validation(
                "the owner role cannot be granted".to_string(),
            ));
        }

        let users = UserRepository::new(self.db.pool());
        let target = users
            .get_by_username(target_username.trim())
            .await?
            .ok_or_else(|| CofferError::NotFound("user".to_string()))?;

        if target.id == principal.id {
            return Err(CofferError::Validation(
                "cannot share an item with yourself".to_string(),
            ));
        }

        let grants = GrantRepository::new(self.db.pool());
        let grant = grants.upsert(node.id, target.id, role).await?;

        info!(
            node_id = node.id,
            granter_id = principal.id,
            target_id = target.id,
            role = %role,
            "node shared"
        );

        Ok(grant)
    }

    /// Revoke a user's grant on a node.
    ///
    /// # Permission Check
    /// Only the node's owner may revoke grants.
    ///
    /// Returns `true` if a grant existed.
    pub async fn unshare(
        &self,
        principal: &Principal,
        node_id: i64,
        target_user_id: i64,
    ) -> Result<bool> {
        let nodes = NodeRepository::new(self.db.pool());
        let node = nodes
            .get_by_id(node_id)
            .await?
            .ok_or_else(|| CofferError::NotFound("node".to_string()))?;

        if node.owner_id != principal.id {
            return Err(CofferError::Permission(
                "only the owner can manage sharing for this item".to_string(),
            ));
        }

        let grants = GrantRepository::new(self.db.pool());
        let removed = grants.delete(node.id, target_user_id).await?;

        if removed {
            info!(
                node_id = node.id,
                target_id = target_user_id,
                "grant revoked"
            );
        }

        Ok(removed)
    }

    /// List the grants on a node for the share dialog.
    ///
    /// # Permission Check
    /// Only the node's owner may see who it is shared with.
    pub async fn grants_for_node(
        &self,
        principal: &Principal,
        node_id: i64,
    ) -> Result<Vec<GrantDetail>> {
        let nodes = NodeRepository::new(self.db.pool());
        let node = nodes
            .get_by_id(node_id)
            .await?
            .ok_or_else(|| CofferError::NotFound("node".to_string()))?;

        if node.owner_id != principal.id {
            return Err(CofferError::Permission(
                "only the owner can manage sharing for this item".to_string(),
            ));
        }

        let grants = GrantRepository::new(self.db.pool());
        grants.list_for_node(node.id).await
    }
}
