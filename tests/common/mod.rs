//! Shared helpers for integration tests.
//!
//! Provides an in-memory database paired with a temporary blob
//! directory, plus shortcuts for seeding users and uploaded files.

use tempfile::TempDir;

use coffer::db::NewUser;
use coffer::{
    AdminService, BlobStore, ChatService, Database, FileService, Node, Principal, QuotaService,
    ShareService, UploadRequest, UserRepository,
};

/// In-memory database plus a temporary blob directory.
///
/// The `TempDir` guard removes the blob directory when the store is
/// dropped; the database vanishes with its connection.
pub struct TestStore {
    pub db: Database,
    pub blobs: BlobStore,
    _dir: TempDir,
}

impl TestStore {
    /// Open a fresh store with migrated tables and no blobs.
    pub async fn new() -> Self {
        let db = Database::open_in_memory().await.unwrap();
        let dir = TempDir::new().unwrap();
        let blobs = BlobStore::new(dir.path()).unwrap();
        Self {
            db,
            blobs,
            _dir: dir,
        }
    }

    /// File service over this store.
    pub fn files(&self) -> FileService<'_> {
        FileService::new(&self.db, &self.blobs)
    }

    /// Share service over this store.
    pub fn shares(&self) -> ShareService<'_> {
        ShareService::new(&self.db)
    }

    /// Quota service over this store.
    pub fn quotas(&self) -> QuotaService<'_> {
        QuotaService::new(&self.db)
    }

    /// Admin service over this store.
    pub fn admin(&self) -> AdminService<'_> {
        AdminService::new(&self.db, &self.blobs)
    }

    /// Chat service over this store.
    pub fn chat(&self) -> ChatService<'_> {
        ChatService::new(&self.db)
    }

    /// Insert a regular user and return an acting principal.
    pub async fn create_user(&self, username: &str) -> Principal {
        let users = UserRepository::new(self.db.pool());
        let user = users.create(&NewUser::new(username, "hash")).await.unwrap();
        Principal::from(&user)
    }

    /// Insert an admin user and return an acting principal.
    pub async fn create_admin(&self, username: &str) -> Principal {
        let users = UserRepository::new(self.db.pool());
        let user = users
            .create(&NewUser::new(username, "hash").with_admin(true))
            .await
            .unwrap();
        Principal::from(&user)
    }

    /// Insert a user with a specific quota and return an acting principal.
    pub async fn create_user_with_quota(&self, username: &str, limit_mb: i64) -> Principal {
        let users = UserRepository::new(self.db.pool());
        let user = users
            .create(&NewUser::new(username, "hash").with_storage_limit_mb(limit_mb))
            .await
            .unwrap();
        Principal::from(&user)
    }

    /// Upload a file for `principal`, optionally under a parent folder.
    pub async fn upload(
        &self,
        principal: &Principal,
        filename: &str,
        content: &[u8],
        parent_id: Option<i64>,
    ) -> Node {
        let mut request = UploadRequest::new(filename, content.to_vec());
        if let Some(parent_id) = parent_id {
            request = request.with_parent(parent_id);
        }
        self.files().upload(principal, &request).await.unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_starts_empty() {
        let store = TestStore::new().await;
        let users = UserRepository::new(store.db.pool());
        assert_eq!(users.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_store_seeds_users() {
        let store = TestStore::new().await;
        let alice = store.create_user("alice").await;
        let root = store.create_admin("root").await;

        assert!(!alice.is_admin);
        assert!(root.is_admin);
        assert_ne!(alice.id, root.id);
    }
}
