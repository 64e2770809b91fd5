//! Node repository for the Coffer file tree.

use std::collections::{HashSet, VecDeque};

use sqlx::SqlitePool;

use crate::{CofferError, Result};

use super::node::{NewNode, Node};

/// A file row joined with its owner's username, for usage reports.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LargestFile {
    pub id: i64,
    pub name: String,
    pub owner: String,
    pub size: i64,
}

/// Repository for node persistence operations.
pub struct NodeRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> NodeRepository<'a> {
    /// Create a new NodeRepository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new node.
    pub async fn create(&self, node: &NewNode) -> Result<Node> {
        let result = sqlx::query(
            "INSERT INTO nodes (name, is_folder, parent_id, owner_id, blob, size, checksum)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&node.name)
        .bind(node.is_folder)
        .bind(node.parent_id)
        .bind(node.owner_id)
        .bind(&node.blob)
        .bind(node.size)
        .bind(&node.checksum)
        .execute(self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| CofferError::NotFound("node".to_string()))
    }

    /// Get a node by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Node>> {
        let node = sqlx::query_as::<_, Node>("SELECT * FROM nodes WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(node)
    }

    /// List a user's root nodes, folders first then by name.
    pub async fn list_roots(&self, owner_id: i64) -> Result<Vec<Node>> {
        let nodes = sqlx::query_as::<_, Node>(
            "SELECT * FROM nodes
             WHERE parent_id IS NULL AND owner_id = ?
             ORDER BY is_folder DESC, name COLLATE NOCASE ASC",
        )
        .bind(owner_id)
        .fetch_all(self.pool)
        .await?;

        Ok(nodes)
    }

    /// List the direct children of a folder, folders first then by name.
    pub async fn list_by_parent(&self, parent_id: i64) -> Result<Vec<Node>> {
        let nodes = sqlx::query_as::<_, Node>(
            "SELECT * FROM nodes
             WHERE parent_id = ?
             ORDER BY is_folder DESC, name COLLATE NOCASE ASC",
        )
        .bind(parent_id)
        .fetch_all(self.pool)
        .await?;

        Ok(nodes)
    }

    /// List every node a user owns.
    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Node>> {
        let nodes = sqlx::query_as::<_, Node>("SELECT * FROM nodes WHERE owner_id = ? ORDER BY id")
            .bind(owner_id)
            .fetch_all(self.pool)
            .await?;

        Ok(nodes)
    }

    /// Collect a node and every descendant, breadth first.
    ///
    /// The walk is iterative with a visited set, so a corrupted parent
    /// chain cannot loop forever. Returns an empty list when the root
    /// does not exist.
    pub async fn collect_subtree(&self, root_id: i64) -> Result<Vec<Node>> {
        let Some(root) = self.get_by_id(root_id).await? else {
            return Ok(Vec::new());
        };

        let mut visited = HashSet::new();
        visited.insert(root.id);

        let mut queue = VecDeque::new();
        queue.push_back(root.id);

        let mut nodes = vec![root];

        while let Some(parent_id) = queue.pop_front() {
            let children = self.list_by_parent(parent_id).await?;
            for child in children {
                if visited.insert(child.id) {
                    queue.push_back(child.id);
                    nodes.push(child);
                }
            }
        }

        Ok(nodes)
    }

    /// Sum of file sizes owned by a user.
    ///
    /// Folders always count as zero; only file nodes are summed.
    pub async fn used_bytes(&self, owner_id: i64) -> Result<i64> {
        let bytes: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(size), 0) FROM nodes WHERE owner_id = ? AND is_folder = 0",
        )
        .bind(owner_id)
        .fetch_one(self.pool)
        .await?;

        Ok(bytes)
    }

    /// Sum of file sizes across all users.
    pub async fn total_used_bytes(&self) -> Result<i64> {
        let bytes: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(size), 0) FROM nodes WHERE is_folder = 0")
                .fetch_one(self.pool)
                .await?;

        Ok(bytes)
    }

    /// Count a user's file nodes.
    pub async fn count_files(&self, owner_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM nodes WHERE owner_id = ? AND is_folder = 0",
        )
        .bind(owner_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Count file nodes across all users.
    pub async fn count_files_all(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM nodes WHERE is_folder = 0")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// The largest files across all users, with owner usernames.
    pub async fn largest_files(&self, limit: i64) -> Result<Vec<LargestFile>> {
        let rows = sqlx::query_as::<_, LargestFile>(
            "SELECT n.id, n.name, u.username AS owner, n.size
             FROM nodes n
             JOIN users u ON u.id = n.owner_id
             WHERE n.is_folder = 0
             ORDER BY n.size DESC, n.id ASC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// List nodes with a direct grant for a user.
    pub async fn shared_with_user(&self, user_id: i64) -> Result<Vec<Node>> {
        let nodes = sqlx::query_as::<_, Node>(
            "SELECT n.* FROM nodes n
             JOIN grants g ON g.node_id = n.id
             WHERE g.user_id = ?
             ORDER BY n.is_folder DESC, n.name COLLATE NOCASE ASC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(nodes)
    }

    /// Move a node under a new parent (`None` makes it a root).
    pub async fn set_parent(&self, id: i64, parent_id: Option<i64>) -> Result<bool> {
        let result = sqlx::query("UPDATE nodes SET parent_id = ? WHERE id = ?")
            .bind(parent_id)
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a node by ID.
    ///
    /// Descendants and grants go with it through the schema's cascading
    /// foreign keys, all within this single statement.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM nodes WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count how many nodes exist.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM nodes")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}
