//! Account registration and login for Coffer.

use tracing::info;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::Principal;
use crate::db::{Database, NewUser, User, UserRepository, DEFAULT_STORAGE_LIMIT_MB};
use crate::{CofferError, Result};

/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 32;

/// Validate a username.
fn validate_username(username: &str) -> Result<()> {
    if username.len() < MIN_USERNAME_LENGTH {
        return Err(CofferError::Validation(format!(
            "username must be at least {MIN_USERNAME_LENGTH} characters"
        )));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(CofferError::Validation(format!(
            "username must be at most {MAX_USERNAME_LENGTH} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(CofferError::Validation(
            "username can only contain alphanumeric characters and underscores".to_string(),
        ));
    }
    Ok(())
}

/// Service for account registration and login.
pub struct AuthService<'a> {
    db: &'a Database,
    default_quota_mb: i64,
    first_user_admin: bool,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService.
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            default_quota_mb: DEFAULT_STORAGE_LIMIT_MB,
            first_user_admin: true,
        }
    }

    /// Set the storage quota assigned to new accounts.
    pub fn with_default_quota_mb(mut self, limit_mb: i64) -> Self {
        self.default_quota_mb = limit_mb;
        self
    }

    /// Control whether the first registered account becomes an admin.
    pub fn with_first_user_admin(mut self, enabled: bool) -> Self {
        self.first_user_admin = enabled;
        self
    }

    /// Register a new account.
    ///
    /// Validates the username and password, rejects duplicates, hashes the
    /// password and creates the user. The first account ever registered is
    /// granted admin rights when `first_user_admin` is enabled.
    pub async fn register(&self, username: &str, password: &str) -> Result<User> {
        let username = username.trim();
        validate_username(username)?;

        let repo = UserRepository::new(self.db.pool());
        if repo.username_exists(username).await? {
            return Err(CofferError::Validation(
                "username already taken".to_string(),
            ));
        }

        let password_hash = hash_password(password)?;

        let is_admin = self.first_user_admin && repo.count().await? == 0;
        let new_user = NewUser::new(username, &password_hash)
            .with_admin(is_admin)
            .with_storage_limit_mb(self.default_quota_mb);

        let user = repo.create(&new_user).await?;

        info!(
            username = %user.username,
            user_id = user.id,
            is_admin = user.is_admin,
            "New user registered"
        );

        Ok(user)
    }

    /// Authenticate a user and return the principal for the session.
    ///
    /// Unknown usernames and wrong passwords produce the same error message.
    pub async fn login(&self, username: &str, password: &str) -> Result<Principal> {
        let repo = UserRepository::new(self.db.pool());
        let user = repo
            .get_by_username(username.trim())
            .await?
            .ok_or_else(|| CofferError::Auth("invalid username or password".to_string()))?;

        verify_password(password, &user.password)
            .map_err(|_| CofferError::Auth("invalid username or password".to_string()))?;

        Ok(Principal::from(&user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_register_first_user_is_admin() {
        let db = setup_db().await;
        let service = AuthService::new(&db);

        let first = service.register("alice", "password123").await.unwrap();
        assert!(first.is_admin);

        let second = service.register("bob", "password123").await.unwrap();
        assert!(!second.is_admin);
    }

    #[tokio::test]
    async fn test_register_first_user_admin_disabled() {
        let db = setup_db().await;
        let service = AuthService::new(&db).with_first_user_admin(false);

        let first = service.register("alice", "password123").await.unwrap();
        assert!(!first.is_admin);
    }

    #[tokio::test]
    async fn test_register_applies_default_quota() {
        let db = setup_db().await;
        let service = AuthService::new(&db).with_default_quota_mb(100);

        let user = service.register("alice", "password123").await.unwrap();
        assert_eq!(user.storage_limit_mb, 100);
    }

    #[tokio::test]
    async fn test_register_password_is_hashed() {
        let db = setup_db().await;
        let service = AuthService::new(&db);

        let user = service.register("alice", "password123").await.unwrap();

        assert_ne!(user.password, "password123");
        assert!(user.password.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let db = setup_db().await;
        let service = AuthService::new(&db);

        service.register("alice", "password123").await.unwrap();
        let result = service.register("Alice", "otherpassword").await;

        assert!(matches!(result, Err(CofferError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_invalid_username() {
        let db = setup_db().await;
        let service = AuthService::new(&db);

        // Too short
        let result = service.register("ab", "password123").await;
        assert!(matches!(result, Err(CofferError::Validation(_))));

        // Invalid characters
        let result = service.register("bad name!", "password123").await;
        assert!(matches!(result, Err(CofferError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_short_password() {
        let db = setup_db().await;
        let service = AuthService::new(&db);

        let result = service.register("alice", "short").await;
        assert!(matches!(result, Err(CofferError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_trims_username() {
        let db = setup_db().await;
        let service = AuthService::new(&db);

        let user = service.register("  alice  ", "password123").await.unwrap();
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_login_success() {
        let db = setup_db().await;
        let service = AuthService::new(&db);

        let user = service.register("alice", "password123").await.unwrap();

        let principal = service.login("alice", "password123").await.unwrap();
        assert_eq!(principal.id, user.id);
        assert_eq!(principal.username, "alice");
        assert!(principal.is_admin);
    }

    #[tokio::test]
    async fn test_login_case_insensitive_username() {
        let db = setup_db().await;
        let service = AuthService::new(&db);

        service.register("Alice", "password123").await.unwrap();

        let principal = service.login("alice", "password123").await.unwrap();
        assert_eq!(principal.username, "Alice");
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let db = setup_db().await;
        let service = AuthService::new(&db);

        service.register("alice", "password123").await.unwrap();

        let result = service.login("alice", "wrongpassword").await;
        assert!(matches!(result, Err(CofferError::Auth(_))));
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let db = setup_db().await;
        let service = AuthService::new(&db);

        let result = service.login("ghost", "password123").await;
        assert!(matches!(result, Err(CofferError::Auth(_))));
    }
}
