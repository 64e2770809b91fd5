//! Effective role resolution for Coffer.
//!
//! A grant on a folder applies to everything beneath it without
//! materializing rows on each descendant. The resolver answers "what
//! role does this user hold on this node" by checking the node itself
//! and then walking up the parent chain, returning the first match.

use std::collections::HashSet;

use sqlx::SqlitePool;

use crate::file::{Node, NodeRepository};
use crate::Result;

use super::grant::{GrantRepository, ShareRole};

/// Resolves a user's effective role on a node.
pub struct RoleResolver<'a> {
    pool: &'a SqlitePool,
}

impl<'a> RoleResolver<'a> {
    /// Create a new RoleResolver.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Resolve the effective role of a user on a node.
    ///
    /// Checks, in order: ownership of the node, a direct grant on the
    /// node, then each ancestor (ownership first, grant second). The
    /// first match wins, so a grant on the node itself shadows any
    /// ancestor grant. Returns `None` when no owner or grant path
    /// exists; callers must treat that as a denial, not an error.
    ///
    /// The ancestor walk is iterative with a visited set, so a broken
    /// or looping parent chain terminates at `None` instead of
    /// recursing forever. An ancestor reference to a missing node ends
    /// the walk the same way.
    pub async fn resolve(&self, node: &Node, user_id: i64) -> Result<Option<ShareRole>> {
        if node.owner_id == user_id {
            return Ok(Some(ShareRole::Owner));
        }

        let grants = GrantRepository::new(self.pool);
        if let Some(grant) = grants.get_by_pair(node.id, user_id).await? {
            return Ok(Some(grant.role));
        }

        let nodes = NodeRepository::new(self.pool);
        let mut visited = HashSet::from([node.id]);
        let mut current = node.parent_id;

        while let Some(parent_id) = current {
            if !visited.insert(parent_id) {
                break;
            }

            let Some(parent) = nodes.get_by_id(parent_id).await? else {
                break;
            };

            if parent.owner_id == user_id {
                return Ok(Some(ShareRole::Owner));
            }

            if let Some(grant) = grants.get_by_pair(parent.id, user_id).await? {
                return Ok(Some(grant.role));
            }

            current = parent.parent_id;
        }

        Ok(None)
    }

    /// Whether the user holds any role on the node.
    pub async fn has_access(&self, node: &Node, user_id: i64) -> Result<bool> {
        Ok(self.resolve(node, user_id).await?.is_some())
    }

    /// Whether the user holds a writing role on the node.
    pub async fn can_write(&self, node: &Node, user_id: i64) -> Result<bool> {
        Ok(self
            .resolve(node, user_id)
            .await?
            .is_some_and(|role| role.can_write()))
    }
}
