//! Storage accounting for Coffer.
//!
//! Usage is derived from metadata rows alone: the sum of file node
//! sizes per owner. Folder rows never contribute to usage. Quotas are
//! informational here; rejecting over-quota uploads is an opt-in
//! `FileService` setting.

use crate::db::{Database, User, UserRepository};
use crate::file::{LargestFile, NodeRepository};
use crate::Result;

/// Storage usage snapshot for one user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserUsage {
    pub user_id: i64,
    pub username: String,
    pub is_admin: bool,
    pub used_bytes: i64,
    /// Used megabytes, rounded to two decimals.
    pub used_mb: f64,
    pub quota_mb: i64,
    /// Share of the quota used, rounded to one decimal.
    pub percent_used: f64,
    pub file_count: i64,
}

/// Storage usage aggregated across all users.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalUsage {
    pub user_count: i64,
    pub file_count: i64,
    /// Sum of the per-user rounded megabytes.
    pub used_mb: f64,
    /// Sum of the per-user quotas.
    pub quota_mb: i64,
}

/// Service computing storage usage and quota figures.
pub struct QuotaService<'a> {
    db: &'a Database,
}

impl<'a> QuotaService<'a> {
    /// Create a new QuotaService.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Total bytes of file content owned by a user.
    pub async fn used_bytes(&self, user_id: i64) -> Result<i64> {
        NodeRepository::new(self.db.pool())
            .used_bytes(user_id)
            .await
    }

    /// Used megabytes for a user, rounded to two decimals.
    pub async fn used_mb(&self, user_id: i64) -> Result<f64> {
        Ok(bytes_to_mb(self.used_bytes(user_id).await?))
    }

    /// Usage snapshot for one user.
    pub async fn usage_for(&self, user: &User) -> Result<UserUsage> {
        let nodes = NodeRepository::new(self.db.pool());
        let used_bytes = nodes.used_bytes(user.id).await?;
        let file_count = nodes.count_files(user.id).await?;
        let used_mb = bytes_to_mb(used_bytes);

        Ok(UserUsage {
            user_id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
            used_bytes,
            used_mb,
            quota_mb: user.storage_limit_mb,
            percent_used: percent_of_quota(used_mb, user.storage_limit_mb),
            file_count,
        })
    }

    /// Usage snapshots for every user, ordered by username.
    pub async fn usage_for_all(&self) -> Result<Vec<UserUsage>> {
        let users = UserRepository::new(self.db.pool()).list_all().await?;

        let mut report = Vec::with_capacity(users.len());
        for user in &users {
            report.push(self.usage_for(user).await?);
        }

        Ok(report)
    }

    /// Aggregate usage across all users.
    pub async fn global_usage(&self) -> Result<GlobalUsage> {
        let per_user = self.usage_for_all().await?;
        let nodes = NodeRepository::new(self.db.pool());

        let used_mb: f64 = per_user.iter().map(|u| u.used_mb).sum();
        let quota_mb: i64 = per_user.iter().map(|u| u.quota_mb).sum();

        Ok(GlobalUsage {
            user_count: per_user.len() as i64,
            file_count: nodes.count_files_all().await?,
            used_mb,
            quota_mb,
        })
    }

    /// The `limit` largest files across all users, with owner usernames.
    pub async fn largest_files(&self, limit: i64) -> Result<Vec<LargestFile>> {
        NodeRepository::new(self.db.pool())
            .largest_files(limit)
            .await
    }
}

/// Bytes to megabytes, rounded to two decimals.
pub fn bytes_to_mb(bytes: i64) -> f64 {
    let mb = bytes as f64 / (1024.0 * 1024.0);
    (mb * 100.0).round() / 100.0
}

/// Share of the quota used as a percentage, rounded to one decimal.
///
/// A quota of zero or less reads as fully used, never a division error.
pub fn percent_of_quota(used_mb: f64, quota_mb: i64) -> f64 {
    if quota_mb <= 0 {
        return 100.0;
    }
    let percent = used_mb / quota_mb as f64 * 100.0;
    (percent * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewUser;
    use crate::file::NewNode;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    async fn create_user(db: &Database, username: &str, quota_mb: i64) -> User {
        UserRepository::new(db.pool())
            .create(&NewUser::new(username, "hash").with_storage_limit_mb(quota_mb))
            .await
            .unwrap()
    }

    async fn add_file(db: &Database, owner: i64, name: &str, size: i64) {
        NodeRepository::new(db.pool())
            .create(&NewNode::file(name, owner, format!("loc-{name}"), size))
            .await
            .unwrap();
    }

    #[test]
    fn test_bytes_to_mb() {
        assert_eq!(bytes_to_mb(0), 0.0);
        assert_eq!(bytes_to_mb(1024 * 1024), 1.0);
        assert_eq!(bytes_to_mb(1024 * 1024 + 512 * 1024), 1.5);
        // Rounds to two decimals
        assert_eq!(bytes_to_mb(1_234_567), 1.18);
        // Small files round down to zero
        assert_eq!(bytes_to_mb(10), 0.0);
    }

    #[test]
    fn test_percent_of_quota() {
        assert_eq!(percent_of_quota(512.0, 1024), 50.0);
        assert_eq!(percent_of_quota(0.0, 1024), 0.0);
        // Rounds to one decimal
        assert_eq!(percent_of_quota(1.0, 3), 33.3);
        // Over-quota usage reads over 100
        assert_eq!(percent_of_quota(2048.0, 1024), 200.0);
    }

    #[test]
    fn test_percent_of_quota_zero_limit() {
        assert_eq!(percent_of_quota(0.0, 0), 100.0);
        assert_eq!(percent_of_quota(5.0, 0), 100.0);
        assert_eq!(percent_of_quota(5.0, -10), 100.0);
    }

    #[tokio::test]
    async fn test_used_bytes_sums_files_only() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice", 100).await;
        let service = QuotaService::new(&db);

        assert_eq!(service.used_bytes(alice.id).await.unwrap(), 0);

        add_file(&db, alice.id, "a.txt", 100).await;
        add_file(&db, alice.id, "b.txt", 250).await;
        NodeRepository::new(db.pool())
            .create(&NewNode::folder("Docs", alice.id))
            .await
            .unwrap();

        assert_eq!(service.used_bytes(alice.id).await.unwrap(), 350);
    }

    #[tokio::test]
    async fn test_usage_for() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice", 100).await;
        let service = QuotaService::new(&db);

        add_file(&db, alice.id, "a.bin", 1024 * 1024).await;
        add_file(&db, alice.id, "b.bin", 512 * 1024).await;

        let usage = service.usage_for(&alice).await.unwrap();

        assert_eq!(usage.user_id, alice.id);
        assert_eq!(usage.username, "alice");
        assert_eq!(usage.used_bytes, 1536 * 1024);
        assert_eq!(usage.used_mb, 1.5);
        assert_eq!(usage.quota_mb, 100);
        assert_eq!(usage.percent_used, 1.5);
        assert_eq!(usage.file_count, 2);
    }

    #[tokio::test]
    async fn test_usage_for_zero_quota_user() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice", 0).await;
        let service = QuotaService::new(&db);

        let usage = service.usage_for(&alice).await.unwrap();

        assert_eq!(usage.used_mb, 0.0);
        assert_eq!(usage.percent_used, 100.0);
    }

    #[tokio::test]
    async fn test_usage_for_all_ordered_by_username() {
        let db = setup_db().await;
        let bob = create_user(&db, "bob", 100).await;
        let alice = create_user(&db, "alice", 200).await;
        let service = QuotaService::new(&db);

        add_file(&db, bob.id, "b.bin", 2 * 1024 * 1024).await;
        add_file(&db, alice.id, "a.bin", 1024 * 1024).await;

        let report = service.usage_for_all().await.unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report[0].username, "alice");
        assert_eq!(report[0].used_mb, 1.0);
        assert_eq!(report[1].username, "bob");
        assert_eq!(report[1].used_mb, 2.0);
    }

    #[tokio::test]
    async fn test_global_usage() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice", 100).await;
        let bob = create_user(&db, "bob", 200).await;
        let service = QuotaService::new(&db);

        add_file(&db, alice.id, "a.bin", 1024 * 1024).await;
        add_file(&db, bob.id, "b.bin", 512 * 1024).await;
        add_file(&db, bob.id, "c.bin", 512 * 1024).await;

        let global = service.global_usage().await.unwrap();

        assert_eq!(global.user_count, 2);
        assert_eq!(global.file_count, 3);
        assert_eq!(global.used_mb, 2.0);
        assert_eq!(global.quota_mb, 300);
    }

    #[tokio::test]
    async fn test_largest_files() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice", 100).await;
        let bob = create_user(&db, "bob", 100).await;
        let service = QuotaService::new(&db);

        add_file(&db, alice.id, "small.txt", 10).await;
        add_file(&db, bob.id, "huge.bin", 9000).await;
        add_file(&db, alice.id, "mid.bin", 500).await;

        let top = service.largest_files(2).await.unwrap();

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "huge.bin");
        assert_eq!(top[0].owner, "bob");
        assert_eq!(top[1].name, "mid.bin");
        assert_eq!(top[1].owner, "alice");
    }
}
