//! User model for Coffer.

use chrono::{DateTime, Utc};

/// Storage quota in megabytes assigned when nothing else is configured.
pub const DEFAULT_STORAGE_LIMIT_MB: i64 = 5120;

/// User entity representing a registered account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Login username (unique, case-insensitive).
    pub username: String,
    /// Password hash (Argon2).
    pub password: String,
    /// Whether the account has admin rights.
    pub is_admin: bool,
    /// Storage quota in megabytes.
    pub storage_limit_mb: i64,
    /// Account creation timestamp.
    pub created_at: String,
}

impl User {
    /// Storage quota in bytes.
    pub fn quota_bytes(&self) -> i64 {
        self.storage_limit_mb.saturating_mul(1024 * 1024)
    }

    /// Parse the creation timestamp.
    pub fn created_at_datetime(&self) -> Option<DateTime<Utc>> {
        chrono::NaiveDateTime::parse_from_str(&self.created_at, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|dt| dt.and_utc())
    }
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login username.
    pub username: String,
    /// Password hash (should be pre-hashed with Argon2).
    pub password: String,
    /// Whether the account has admin rights.
    pub is_admin: bool,
    /// Storage quota in megabytes.
    pub storage_limit_mb: i64,
}

impl NewUser {
    /// Create a new user with minimal required fields.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            is_admin: false,
            storage_limit_mb: DEFAULT_STORAGE_LIMIT_MB,
        }
    }

    /// Grant admin rights.
    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    /// Set the storage quota in megabytes.
    pub fn with_storage_limit_mb(mut self, limit_mb: i64) -> Self {
        self.storage_limit_mb = limit_mb;
        self
    }
}

/// Data for updating an existing user.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// New password hash (if changing password).
    pub password: Option<String>,
    /// New admin flag.
    pub is_admin: Option<bool>,
    /// New storage quota in megabytes.
    pub storage_limit_mb: Option<i64>,
}

impl UserUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set new password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set admin flag.
    pub fn is_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = Some(is_admin);
        self
    }

    /// Set new storage quota in megabytes.
    pub fn storage_limit_mb(mut self, limit_mb: i64) -> Self {
        self.storage_limit_mb = Some(limit_mb);
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.password.is_none() && self.is_admin.is_none() && self.storage_limit_mb.is_none()
    }
}
