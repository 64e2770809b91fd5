//! User repository for Coffer.
//!
//! This module provides CRUD operations for users in the database.

use sqlx::{QueryBuilder, SqlitePool};

use super::user::{NewUser, User, UserUpdate};
use crate::{CofferError, Result};

/// Repository for user CRUD operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user in the database.
    ///
    /// Returns the created user with the assigned ID.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let result = sqlx::query(
            "INSERT INTO users (username, password, is_admin, storage_limit_mb)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&new_user.username)
        .bind(&new_user.password)
        .bind(new_user.is_admin)
        .bind(new_user.storage_limit_mb)
        .execute(self.pool)
        .await
        .map_err(|e| CofferError::Database(e.to_string()))?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| CofferError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let result = sqlx::query_as::<_, User>(
            "SELECT id, username, password, is_admin, storage_limit_mb, created_at
             FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| CofferError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Get a user by username (case-insensitive).
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let result = sqlx::query_as::<_, User>(
            "SELECT id, username, password, is_admin, storage_limit_mb, created_at
             FROM users WHERE username = ? COLLATE NOCASE",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| CofferError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Update a user by ID.
    ///
    /// Only fields that are set in the update will be modified.
    /// Returns the updated user, or None if not found.
    pub async fn update(&self, id: i64, update: &UserUpdate) -> Result<Option<User>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE users SET ");
        let mut separated = query.separated(", ");

        if let Some(ref password) = update.password {
            separated.push("password = ");
            separated.push_bind_unseparated(password);
        }
        if let Some(is_admin) = update.is_admin {
            separated.push("is_admin = ");
            separated.push_bind_unseparated(is_admin);
        }
        if let Some(limit_mb) = update.storage_limit_mb {
            separated.push("storage_limit_mb = ");
            separated.push_bind_unseparated(limit_mb);
        }

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| CofferError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Delete a user by ID.
    ///
    /// Returns true if a user was deleted, false if not found.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| CofferError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// List all users ordered by username.
    pub async fn list_all(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, username, password, is_admin, storage_limit_mb, created_at
             FROM users ORDER BY username",
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| CofferError::Database(e.to_string()))?;

        Ok(users)
    }

    /// Count all users.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await
            .map_err(|e| CofferError::Database(e.to_string()))?;
        Ok(count.0)
    }

    /// Check if a username is already taken (case-insensitive).
    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE username = ? COLLATE NOCASE)")
                .bind(username)
                .fetch_one(self.pool)
                .await
                .map_err(|e| CofferError::Database(e.to_string()))?;
        Ok(exists.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DEFAULT_STORAGE_LIMIT_MB;
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_create_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let new_user = NewUser::new("testuser", "hashedpw");
        let user = repo.create(&new_user).await.unwrap();

        assert_eq!(user.id, 1);
        assert_eq!(user.username, "testuser");
        assert!(!user.is_admin);
        assert_eq!(user.storage_limit_mb, DEFAULT_STORAGE_LIMIT_MB);
    }

    #[tokio::test]
    async fn test_create_user_with_options() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let new_user = NewUser::new("admin", "hashedpw")
            .with_admin(true)
            .with_storage_limit_mb(10240);

        let user = repo.create(&new_user).await.unwrap();

        assert_eq!(user.username, "admin");
        assert!(user.is_admin);
        assert_eq!(user.storage_limit_mb, 10240);
    }

    #[tokio::test]
    async fn test_create_duplicate_username() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let new_user = NewUser::new("testuser", "hashedpw");
        repo.create(&new_user).await.unwrap();

        let duplicate = NewUser::new("testuser", "otherpw");
        let result = repo.create(&duplicate).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_create_duplicate_username_different_case() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("TestUser", "hashedpw"))
            .await
            .unwrap();

        // Same name in a different case must also collide
        let result = repo.create(&NewUser::new("testuser", "otherpw")).await;
        assert!(result.is_err());

        let result = repo.create(&NewUser::new("TESTUSER", "otherpw")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let created = repo.create(&NewUser::new("testuser", "hashedpw")).await.unwrap();

        let found = repo.get_by_id(created.id).await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().username, "testuser");

        let not_found = repo.get_by_id(999).await.unwrap();
        assert!(not_found.is_none());
    }

    #[tokio::test]
    async fn test_get_by_username_case_insensitive() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("TestUser", "hashedpw"))
            .await
            .unwrap();

        let found = repo.get_by_username("TestUser").await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().username, "TestUser");

        let found_lower = repo.get_by_username("testuser").await.unwrap();
        assert!(found_lower.is_some());

        let found_upper = repo.get_by_username("TESTUSER").await.unwrap();
        assert!(found_upper.is_some());

        let not_found = repo.get_by_username("nonexistent").await.unwrap();
        assert!(not_found.is_none());
    }

    #[tokio::test]
    async fn test_update_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let user = repo.create(&NewUser::new("testuser", "hashedpw")).await.unwrap();

        let update = UserUpdate::new().storage_limit_mb(2048).is_admin(true);
        let updated = repo.update(user.id, &update).await.unwrap().unwrap();

        assert_eq!(updated.storage_limit_mb, 2048);
        assert!(updated.is_admin);
        // Unchanged fields
        assert_eq!(updated.username, "testuser");
        assert_eq!(updated.password, "hashedpw");
    }

    #[tokio::test]
    async fn test_update_nonexistent_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let update = UserUpdate::new().storage_limit_mb(100);
        let result = repo.update(999, &update).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_update_empty() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let user = repo.create(&NewUser::new("testuser", "hashedpw")).await.unwrap();

        let update = UserUpdate::new();
        let result = repo.update(user.id, &update).await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().username, "testuser");
    }

    #[tokio::test]
    async fn test_delete_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let user = repo.create(&NewUser::new("testuser", "hashedpw")).await.unwrap();

        let deleted = repo.delete(user.id).await.unwrap();
        assert!(deleted);

        let found = repo.get_by_id(user.id).await.unwrap();
        assert!(found.is_none());

        // Deleting again should return false
        let deleted_again = repo.delete(user.id).await.unwrap();
        assert!(!deleted_again);
    }

    #[tokio::test]
    async fn test_list_all_ordered() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("carol", "pw")).await.unwrap();
        repo.create(&NewUser::new("alice", "pw")).await.unwrap();
        repo.create(&NewUser::new("bob", "pw")).await.unwrap();

        let all = repo.list_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].username, "alice");
        assert_eq!(all[1].username, "bob");
        assert_eq!(all[2].username, "carol");
    }

    #[tokio::test]
    async fn test_count() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        assert_eq!(repo.count().await.unwrap(), 0);

        repo.create(&NewUser::new("user1", "pw")).await.unwrap();
        repo.create(&NewUser::new("user2", "pw")).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_username_exists() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        assert!(!repo.username_exists("testuser").await.unwrap());

        repo.create(&NewUser::new("testuser", "pw")).await.unwrap();

        assert!(repo.username_exists("testuser").await.unwrap());
        assert!(repo.username_exists("TESTUSER").await.unwrap());
        assert!(!repo.username_exists("other").await.unwrap());
    }
}
