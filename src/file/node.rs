//! Node types for the Coffer file tree.
//!
//! A node is either a folder or a file. Files carry a blob locator and
//! a size; folders carry neither. `parent_id` links a node to its
//! containing folder, with `NULL` marking a root node.

use chrono::{DateTime, NaiveDateTime, Utc};

/// A file or folder in the tree.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Node {
    /// Unique node ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Whether this node is a folder.
    pub is_folder: bool,
    /// Containing folder, `None` for root nodes.
    pub parent_id: Option<i64>,
    /// User who owns this node.
    pub owner_id: i64,
    /// Blob store locator, `None` for folders.
    pub blob: Option<String>,
    /// Content size in bytes, 0 for folders.
    ///
    /// Folder sizes never aggregate children; accounting sums file
    /// nodes only.
    pub size: i64,
    /// SHA-256 of the content, `None` for folders.
    pub checksum: Option<String>,
    /// Creation timestamp (SQLite format: YYYY-MM-DD HH:MM:SS).
    pub created_at: String,
}

impl Node {
    /// Whether this node sits at the root of its owner's tree.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Parse created_at as a DateTime.
    pub fn created_at_datetime(&self) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&self.created_at, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|dt| dt.and_utc())
    }
}

/// Data for creating a new node.
#[derive(Debug, Clone)]
pub struct NewNode {
    /// Display name.
    pub name: String,
    /// Whether this node is a folder.
    pub is_folder: bool,
    /// Containing folder, `None` for root nodes.
    pub parent_id: Option<i64>,
    /// User who owns this node.
    pub owner_id: i64,
    /// Blob store locator, `None` for folders.
    pub blob: Option<String>,
    /// Content size in bytes.
    pub size: i64,
    /// SHA-256 of the content.
    pub checksum: Option<String>,
}

impl NewNode {
    /// Create a new folder node.
    pub fn folder(name: impl Into<String>, owner_id: i64) -> Self {
        Self {
            name: name.into(),
            is_folder: true,
            parent_id: None,
            owner_id,
            blob: None,
            size: 0,
            checksum: None,
        }
    }

    /// Create a new file node.
    pub fn file(name: impl Into<String>, owner_id: i64, blob: impl Into<String>, size: i64) -> Self {
        Self {
            name: name.into(),
            is_folder: false,
            parent_id: None,
            owner_id,
            blob: Some(blob.into()),
            size,
            checksum: None,
        }
    }

    /// Set the containing folder.
    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Set the content checksum.
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_builder() {
        let node = NewNode::folder("Documents", 1);

        assert_eq!(node.name, "Documents");
        assert!(node.is_folder);
        assert_eq!(node.parent_id, None);
        assert_eq!(node.owner_id, 1);
        assert_eq!(node.blob, None);
        assert_eq!(node.size, 0);
    }

    #[test]
    fn test_file_builder() {
        let node = NewNode::file("report.txt", 2, "ab12_report.txt", 1024)
            .with_parent(7)
            .with_checksum("deadbeef");

        assert_eq!(node.name, "report.txt");
        assert!(!node.is_folder);
        assert_eq!(node.parent_id, Some(7));
        assert_eq!(node.owner_id, 2);
        assert_eq!(node.blob, Some("ab12_report.txt".to_string()));
        assert_eq!(node.size, 1024);
        assert_eq!(node.checksum, Some("deadbeef".to_string()));
    }

    #[test]
    fn test_is_root() {
        let root = NewNode::folder("Top", 1);
        assert_eq!(root.parent_id, None);

        let node = Node {
            id: 1,
            name: "Top".to_string(),
            is_folder: true,
            parent_id: None,
            owner_id: 1,
            blob: None,
            size: 0,
            checksum: None,
            created_at: "2026-01-15 10:30:00".to_string(),
        };
        assert!(node.is_root());

        let child = Node {
            parent_id: Some(1),
            ..node
        };
        assert!(!child.is_root());
    }

    #[test]
    fn test_created_at_datetime() {
        let node = Node {
            id: 1,
            name: "x".to_string(),
            is_folder: false,
            parent_id: None,
            owner_id: 1,
            blob: Some("ab_x".to_string()),
            size: 1,
            checksum: None,
            created_at: "2026-01-15 10:30:00".to_string(),
        };

        let dt = node.created_at_datetime().unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2026-01-15 10:30:00");

        let bad = Node {
            created_at: "not a date".to_string(),
            ..node
        };
        assert!(bad.created_at_datetime().is_none());
    }
}
