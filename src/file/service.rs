//! File service for Coffer.
//!
//! This module provides high-level tree operations including:
//! - Upload with scanning, size and quota checks
//! - Download with access control
//! - Folder creation, listing, move and cascading delete
//!
//! Every operation takes the acting principal explicitly; nothing is
//! read from ambient session state.

use std::collections::HashSet;

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::auth::Principal;
use crate::db::{Database, UserRepository};
use crate::share::RoleResolver;
use crate::{CofferError, Result};

use super::node::{NewNode, Node};
use super::repository::NodeRepository;
use super::scanner::UploadScanner;
use super::storage::BlobStore;
use super::{DEFAULT_MAX_UPLOAD_SIZE, MAX_NODE_NAME_LENGTH};

/// Request data for a file upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Destination folder, `None` for the uploader's root.
    pub parent_id: Option<i64>,
    /// Original filename.
    pub filename: String,
    /// File content.
    pub content: Vec<u8>,
}

impl UploadRequest {
    /// Create a new upload request targeting the root.
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            parent_id: None,
            filename: filename.into(),
            content,
        }
    }

    /// Set the destination folder.
    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Result of a file download.
#[derive(Debug)]
pub struct DownloadResult {
    /// The file node.
    pub node: Node,
    /// File content.
    pub content: Vec<u8>,
}

/// File service for managing the file/folder tree.
pub struct FileService<'a> {
    db: &'a Database,
    store: &'a BlobStore,
    scanner: UploadScanner,
    max_upload_size: u64,
    enforce_quota: bool,
}

impl<'a> FileService<'a> {
    /// Create a new FileService.
    pub fn new(db: &'a Database, store: &'a BlobStore) -> Self {
        Self {
            db,
            store,
            scanner: UploadScanner::default(),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            enforce_quota: false,
        }
    }

    /// Replace the upload scanner.
    pub fn with_scanner(mut self, scanner: UploadScanner) -> Self {
        self.scanner = scanner;
        self
    }

    /// Set a custom maximum upload size in bytes.
    pub fn with_max_upload_size(mut self, max_size: u64) -> Self {
        self.max_upload_size = max_size;
        self
    }

    /// Enable or disable quota enforcement on upload.
    ///
    /// Off by default: usage beyond quota is then only reported, never
    /// blocked.
    pub fn with_quota_enforcement(mut self, enforce: bool) -> Self {
        self.enforce_quota = enforce;
        self
    }

    /// Create a folder.
    ///
    /// # Permission Check
    /// With a parent given, the principal needs a writing role on it.
    /// Root folders need no check; everyone owns their root.
    pub async fn create_folder(
        &self,
        principal: &Principal,
        name: &str,
        parent_id: Option<i64>,
    ) -> Result<Node> {
        let name = validate_name(name)?;

        if let Some(pid) = parent_id {
            self.require_parent_write(pid, principal).await?;
        }

        let mut new_node = NewNode::folder(name, principal.id);
        new_node.parent_id = parent_id;

        let nodes = NodeRepository::new(self.db.pool());
        let node = nodes.create(&new_node).await?;

        info!(
            user_id = principal.id,
            node_id = node.id,
            name = %node.name,
            "folder created"
        );

        Ok(node)
    }

    /// Upload a file.
    ///
    /// # Permission Check
    /// With a parent given, the principal needs a writing role on it.
    ///
    /// # Validation
    /// - Non-empty filename, at most 255 characters
    /// - Content passes the upload scanner
    /// - Content within the configured maximum size
    /// - With quota enforcement on, the upload must fit the owner's
    ///   remaining quota
    ///
    /// The content goes to the blob store first; the node row records
    /// the locator, size and SHA-256 checksum.
    pub async fn upload(&self, principal: &Principal, request: &UploadRequest) -> Result<Node> {
        let filename = validate_name(&request.filename)?;

        self.scanner.scan(filename, &request.content)?;

        if request.content.len() as u64 > self.max_upload_size {
            let max_mb = self.max_upload_size / 1024 / 1024;
            return Err(CofferError::Validation(format!(
                "file is too large (max {max_mb} MB)"
            )));
        }

        if let Some(pid) = request.parent_id {
            self.require_parent_write(pid, principal).await?;
        }

        if self.enforce_quota {
            self.check_quota(principal.id, request.content.len() as i64)
                .await?;
        }

        let locator = self.store.put(&request.content, filename)?;
        let checksum = sha256_hex(&request.content);

        let mut new_node = NewNode::file(
            filename,
            principal.id,
            locator,
            request.content.len() as i64,
        )
        .with_checksum(checksum);
        new_node.parent_id = request.parent_id;

        let nodes = NodeRepository::new(self.db.pool());
        let node = nodes.create(&new_node).await?;

        info!(
            user_id = principal.id,
            node_id = node.id,
            name = %node.name,
            size = node.size,
            "file uploaded"
        );

        Ok(node)
    }

    /// Download a file.
    ///
    /// # Permission Check
    /// Any role on the node suffices, inherited grants included.
    pub async fn download(&self, principal: &Principal, node_id: i64) -> Result<DownloadResult> {
        let nodes = NodeRepository::new(self.db.pool());
        let node = nodes
            .get_by_id(node_id)
            .await?
            .ok_or_else(|| CofferError::NotFound("file".to_string()))?;

        let resolver = RoleResolver::new(self.db.pool());
        if !resolver.has_access(&node, principal.id).await? {
            return Err(CofferError::Permission(
                "no access to this file".to_string(),
            ));
        }

        if node.is_folder {
            return Err(CofferError::Validation(
                "folders cannot be downloaded".to_string(),
            ));
        }

        let locator = node
            .blob
            .as_deref()
            .ok_or_else(|| CofferError::Storage(format!("file {} has no stored content", node.id)))?;
        let content = self.store.get(locator)?;

        debug!(user_id = principal.id, node_id = node.id, "file downloaded");

        Ok(DownloadResult { node, content })
    }

    /// List direct children.
    ///
    /// With `None`, lists the principal's own root nodes. With a folder
    /// ID, any role on the folder suffices.
    pub async fn list_children(
        &self,
        principal: &Principal,
        parent_id: Option<i64>,
    ) -> Result<Vec<Node>> {
        let nodes = NodeRepository::new(self.db.pool());

        let Some(pid) = parent_id else {
            return nodes.list_roots(principal.id).await;
        };

        let parent = nodes
            .get_by_id(pid)
            .await?
            .ok_or_else(|| CofferError::NotFound("folder".to_string()))?;

        if !parent.is_folder {
            return Err(CofferError::Validation(
                "only folders have children".to_string(),
            ));
        }

        let resolver = RoleResolver::new(self.db.pool());
        if !resolver.has_access(&parent, principal.id).await? {
            return Err(CofferError::Permission(
                "no access to this folder".to_string(),
            ));
        }

        nodes.list_by_parent(parent.id).await
    }

    /// Delete a node, cascading through its subtree.
    ///
    /// # Permission Check
    /// The principal needs a writing role on the node.
    ///
    /// Blobs are removed best-effort: a failed blob removal is logged
    /// and never aborts the metadata deletion, so no dangling rows
    /// survive. Returns the number of nodes removed.
    pub async fn delete_node(&self, principal: &Principal, node_id: i64) -> Result<u64> {
        let nodes = NodeRepository::new(self.db.pool());
        let node = nodes
            .get_by_id(node_id)
            .await?
            .ok_or_else(|| CofferError::NotFound("node".to_string()))?;

        let resolver = RoleResolver::new(self.db.pool());
        if !resolver.can_write(&node, principal.id).await? {
            return Err(CofferError::Permission(
                "no write access to this item".to_string(),
            ));
        }

        let subtree = nodes.collect_subtree(node.id).await?;

        for entry in &subtree {
            if let Some(locator) = entry.blob.as_deref() {
                if let Err(e) = self.store.delete(locator) {
                    warn!(node_id = entry.id, error = %e, "failed to remove blob");
                }
            }
        }

        // One statement; the parent_id and grant foreign keys cascade
        // the rest of the subtree atomically
        nodes.delete(node.id).await?;

        let removed = subtree.len() as u64;
        info!(
            user_id = principal.id,
            node_id = node.id,
            removed,
            "node deleted"
        );

        Ok(removed)
    }

    /// Move a node under a new parent, or to the root with `None`.
    ///
    /// # Permission Check
    /// The principal needs a writing role on the node and on the
    /// destination folder.
    ///
    /// # Validation
    /// The destination must be a folder and must not be the node itself
    /// or anything in its subtree.
    pub async fn move_node(
        &self,
        principal: &Principal,
        node_id: i64,
        new_parent_id: Option<i64>,
    ) -> Result<Node> {
        let nodes = NodeRepository::new(self.db.pool());
        let node = nodes
            .get_by_id(node_id)
            .await?
            .ok_or_else(|| CofferError::NotFound("node".to_string()))?;

        let resolver = RoleResolver::new(self.db.pool());
        if !resolver.can_write(&node, principal.id).await? {
            return Err(CofferError::Permission(
                "no write access to this item".to_string(),
            ));
        }

        if let Some(pid) = new_parent_id {
            let target = nodes
                .get_by_id(pid)
                .await?
                .ok_or_else(|| CofferError::NotFound("folder".to_string()))?;

            if !target.is_folder {
                return Err(CofferError::Validation(
                    "destination is not a folder".to_string(),
                ));
            }

            if !resolver.can_write(&target, principal.id).await? {
                return Err(CofferError::Permission(
                    "no write access to the destination folder".to_string(),
                ));
            }

            self.ensure_no_cycle(&node, &target).await?;
        }

        nodes.set_parent(node.id, new_parent_id).await?;

        let moved = nodes
            .get_by_id(node.id)
            .await?
            .ok_or_else(|| CofferError::NotFound("node".to_string()))?;

        info!(
            user_id = principal.id,
            node_id = node.id,
            new_parent = ?new_parent_id,
            "node moved"
        );

        Ok(moved)
    }

    /// The ancestor chain of a node, root first, ending at the node.
    ///
    /// # Permission Check
    /// Any role on the node suffices.
    pub async fn breadcrumbs(&self, principal: &Principal, node_id: i64) -> Result<Vec<Node>> {
        let nodes = NodeRepository::new(self.db.pool());
        let node = nodes
            .get_by_id(node_id)
            .await?
            .ok_or_else(|| CofferError::NotFound("node".to_string()))?;

        let resolver = RoleResolver::new(self.db.pool());
        if !resolver.has_access(&node, principal.id).await? {
            return Err(CofferError::Permission(
                "no access to this item".to_string(),
            ));
        }

        let mut visited = HashSet::from([node.id]);
        let mut current = node.parent_id;
        let mut chain = vec![node];

        while let Some(parent_id) = current {
            if !visited.insert(parent_id) {
                break;
            }
            let Some(parent) = nodes.get_by_id(parent_id).await? else {
                break;
            };
            current = parent.parent_id;
            chain.push(parent);
        }

        chain.reverse();
        Ok(chain)
    }

    /// Nodes other users have shared with the principal.
    pub async fn shared_with_me(&self, principal: &Principal) -> Result<Vec<Node>> {
        let nodes = NodeRepository::new(self.db.pool());
        nodes.shared_with_user(principal.id).await
    }

    /// Get the blob store used by this service.
    pub fn store(&self) -> &BlobStore {
        self.store
    }

    /// Get the configured maximum upload size.
    pub fn max_upload_size(&self) -> u64 {
        self.max_upload_size
    }

    /// Fetch the parent folder and require a writing role on it.
    async fn require_parent_write(&self, parent_id: i64, principal: &Principal) -> Result<Node> {
        let nodes = NodeRepository::new(self.db.pool());
        let parent = nodes
            .get_by_id(parent_id)
            .await?
            .ok_or_else(|| CofferError::NotFound("folder".to_string()))?;

        if !parent.is_folder {
            return Err(CofferError::Validation(
                "parent is not a folder".to_string(),
            ));
        }

        let resolver = RoleResolver::new(self.db.pool());
        if !resolver.can_write(&parent, principal.id).await? {
            return Err(CofferError::Permission(
                "no write access to this folder".to_string(),
            ));
        }

        Ok(parent)
    }

    /// Reject the upload when it would push the owner past their quota.
    async fn check_quota(&self, user_id: i64, incoming: i64) -> Result<()> {
        let users = UserRepository::new(self.db.pool());
        let user = users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| CofferError::NotFound("user".to_string()))?;

        let nodes = NodeRepository::new(self.db.pool());
        let used = nodes.used_bytes(user_id).await?;

        if used.saturating_add(incoming) > user.quota_bytes() {
            return Err(CofferError::QuotaExceeded(format!(
                "adding {incoming} bytes would exceed the {} MB quota",
                user.storage_limit_mb
            )));
        }

        Ok(())
    }

    /// Reject a move whose destination is the node or inside its subtree.
    ///
    /// Walks up from the destination with a visited set, so an already
    /// corrupted parent chain cannot loop the check forever.
    async fn ensure_no_cycle(&self, node: &Node, target: &Node) -> Result<()> {
        if target.id == node.id {
            return Err(CofferError::Validation(
                "cannot move an item into itself".to_string(),
            ));
        }

        let nodes = NodeRepository::new(self.db.pool());
        let mut visited = HashSet::from([target.id]);
        let mut current = target.parent_id;

        while let Some(ancestor_id) = current {
            if ancestor_id == node.id {
                return Err(CofferError::Validation(
                    "cannot move a folder into its own subtree".to_string(),
                ));
            }
            if !visited.insert(ancestor_id) {
                break;
            }
            let Some(ancestor) = nodes.get_by_id(ancestor_id).await? else {
                break;
            };
            current = ancestor.parent_id;
        }

        Ok(())
    }
}

/// Trim and validate a file or folder name.
fn validate_name(name: &str) -> Result<&str> {
    let name = name.trim();

    if name.is_empty() {
        return Err(CofferError::Validation("name cannot be empty".to_string()));
    }

    if name.chars().count() > MAX_NODE_NAME_LENGTH {
        return Err(CofferError::Validation(format!(
            "name is too long (max {MAX_NODE_NAME_LENGTH} characters)"
        )));
    }

    Ok(name)
}

/// Hex encoded SHA-256 of the content.
fn sha256_hex(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}
