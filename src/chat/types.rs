//! Message types for Coffer.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Maximum length for a message body (in characters).
pub const MAX_BODY_LENGTH: usize = 2000;

/// A direct message between two users.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Message {
    /// Message ID.
    pub id: i64,
    /// Sending user.
    pub sender_id: i64,
    /// Receiving user.
    pub recipient_id: i64,
    /// Message text.
    pub body: String,
    /// Whether the recipient has read the message.
    pub is_read: bool,
    /// Creation timestamp (SQLite format: YYYY-MM-DD HH:MM:SS).
    pub created_at: String,
}

impl Message {
    /// Parse created_at as a DateTime.
    pub fn created_at_datetime(&self) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&self.created_at, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|dt| dt.and_utc())
    }
}

/// Data for creating a new message.
#[derive(Debug, Clone)]
pub struct NewMessage {
    /// Sending user.
    pub sender_id: i64,
    /// Receiving user.
    pub recipient_id: i64,
    /// Message text.
    pub body: String,
}

impl NewMessage {
    /// Create a new message.
    pub fn new(sender_id: i64, recipient_id: i64, body: impl Into<String>) -> Self {
        Self {
            sender_id,
            recipient_id,
            body: body.into(),
        }
    }
}

/// A possible conversation partner with the count of their unread
/// messages to the viewer.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Contact {
    /// The other user's ID.
    pub user_id: i64,
    /// The other user's name.
    pub username: String,
    /// Messages from them the viewer has not read yet.
    pub unread: i64,
}
