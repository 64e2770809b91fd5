//! Authentication module for Coffer.
//!
//! This module provides password hashing, account registration, login and
//! the principal value carried through every core operation.

mod password;
mod service;

pub use password::{hash_password, validate_password, verify_password, PasswordError};
pub use service::{AuthService, MAX_USERNAME_LENGTH, MIN_USERNAME_LENGTH};

use crate::db::User;

/// The authenticated identity behind a request.
///
/// Constructed once per request from the session layer and passed explicitly
/// into every operation; no ambient current-user state exists anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// User ID.
    pub id: i64,
    /// Login username.
    pub username: String,
    /// Whether the account has admin rights.
    pub is_admin: bool,
}

impl Principal {
    /// Create a principal from its parts.
    pub fn new(id: i64, username: impl Into<String>, is_admin: bool) -> Self {
        Self {
            id,
            username: username.into(),
            is_admin,
        }
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_from_user() {
        let user = User {
            id: 7,
            username: "alice".to_string(),
            password: "hash".to_string(),
            is_admin: true,
            storage_limit_mb: 5120,
            created_at: "2024-01-01 00:00:00".to_string(),
        };

        let principal = Principal::from(&user);
        assert_eq!(principal.id, 7);
        assert_eq!(principal.username, "alice");
        assert!(principal.is_admin);
    }
}
