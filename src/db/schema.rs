//! Database schema and migrations for Coffer.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Initial schema - users table
    r#"
-- Users table for accounts and quota administration
CREATE TABLE users (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    username          TEXT NOT NULL COLLATE NOCASE UNIQUE,
    password          TEXT NOT NULL,           -- Argon2 hash
    is_admin          INTEGER NOT NULL DEFAULT 0,
    storage_limit_mb  INTEGER NOT NULL DEFAULT 5120,
    created_at        TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
    // v2: Nodes table - the file/folder tree
    r#"
-- Nodes table holding both files and folders (is_folder discriminates).
-- parent_id is self-referential; NULL means a root node. Deleting a
-- folder row cascades to its whole subtree and, through grants, to every
-- grant on the removed rows.
CREATE TABLE nodes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    is_folder   INTEGER NOT NULL DEFAULT 0,
    parent_id   INTEGER REFERENCES nodes(id) ON DELETE CASCADE,
    owner_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    blob        TEXT,                           -- blob-store locator, NULL for folders
    size        INTEGER NOT NULL DEFAULT 0,     -- bytes, 0 for folders
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_nodes_parent_id ON nodes(parent_id);
CREATE INDEX idx_nodes_owner_id ON nodes(owner_id);
"#,
    // v3: Grants table - per-user roles on shared nodes
    r#"
-- Grants give a non-owner a role on a node. The owner role is implicit
-- from nodes.owner_id and is never stored here.
CREATE TABLE grants (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    node_id     INTEGER NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    role        TEXT NOT NULL DEFAULT 'viewer',  -- 'viewer' or 'editor'
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(node_id, user_id)
);

CREATE INDEX idx_grants_node_id ON grants(node_id);
CREATE INDEX idx_grants_user_id ON grants(user_id);
"#,
    // v4: Messages table - direct messages between users
    r#"
-- Direct messages; a conversation is both directions merged by time
CREATE TABLE messages (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    sender_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    recipient_id  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    body          TEXT NOT NULL,
    is_read       INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_messages_sender_id ON messages(sender_id);
CREATE INDEX idx_messages_recipient_id ON messages(recipient_id);
CREATE INDEX idx_messages_created_at ON messages(created_at);
"#,
    // v5: Add content checksum for uploaded files
    r#"
ALTER TABLE nodes ADD COLUMN checksum TEXT;
"#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_not_empty() {
        assert!(!MIGRATIONS.is_empty());
    }

    #[test]
    fn test_first_migration_contains_users_table() {
        let first = MIGRATIONS[0];
        assert!(first.contains("CREATE TABLE users"));
        assert!(first.contains("username"));
        assert!(first.contains("password"));
        assert!(first.contains("is_admin"));
        assert!(first.contains("storage_limit_mb"));
    }

    #[test]
    fn test_migrations_are_valid_sql() {
        // Each migration should be non-empty and contain SQL keywords
        for migration in MIGRATIONS {
            assert!(!migration.trim().is_empty());
            assert!(
                migration.contains("CREATE TABLE")
                    || migration.contains("ALTER TABLE")
                    || migration.contains("CREATE INDEX")
            );
        }
    }

    #[test]
    fn test_nodes_migration_contains_nodes_table() {
        let nodes_migration = MIGRATIONS[1];
        assert!(nodes_migration.contains("CREATE TABLE nodes"));
        assert!(nodes_migration.contains("is_folder"));
        assert!(nodes_migration.contains("parent_id"));
        assert!(nodes_migration.contains("owner_id"));
        assert!(nodes_migration.contains("blob"));
        assert!(nodes_migration.contains("size"));
    }

    #[test]
    fn test_nodes_parent_cascades() {
        let nodes_migration = MIGRATIONS[1];
        assert!(nodes_migration.contains("parent_id   INTEGER REFERENCES nodes(id) ON DELETE CASCADE"));
    }

    #[test]
    fn test_grants_migration_contains_grants_table() {
        let grants_migration = MIGRATIONS[2];
        assert!(grants_migration.contains("CREATE TABLE grants"));
        assert!(grants_migration.contains("node_id"));
        assert!(grants_migration.contains("user_id"));
        assert!(grants_migration.contains("role"));
        assert!(grants_migration.contains("UNIQUE(node_id, user_id)"));
    }

    #[test]
    fn test_messages_migration_contains_messages_table() {
        let messages_migration = MIGRATIONS[3];
        assert!(messages_migration.contains("CREATE TABLE messages"));
        assert!(messages_migration.contains("sender_id"));
        assert!(messages_migration.contains("recipient_id"));
        assert!(messages_migration.contains("body"));
        assert!(messages_migration.contains("is_read"));
    }

    #[test]
    fn test_checksum_migration_alters_nodes() {
        let checksum_migration = MIGRATIONS[4];
        assert!(checksum_migration.contains("ALTER TABLE nodes"));
        assert!(checksum_migration.contains("checksum"));
    }
}
