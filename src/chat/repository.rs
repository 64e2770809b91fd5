//! Message repository for Coffer.

use sqlx::SqlitePool;

use crate::{CofferError, Result};

use super::types::{Contact, Message, NewMessage};

/// Repository for message persistence operations.
pub struct MessageRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MessageRepository<'a> {
    /// Create a new MessageRepository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new message.
    pub async fn create(&self, message: &NewMessage) -> Result<Message> {
        let result = sqlx::query(
            "INSERT INTO messages (sender_id, recipient_id, body) VALUES (?, ?, ?)",
        )
        .bind(message.sender_id)
        .bind(message.recipient_id)
        .bind(&message.body)
        .execute(self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| CofferError::NotFound("message".to_string()))
    }

    /// Get a message by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Message>> {
        let message = sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(message)
    }

    /// Messages between two users in both directions, oldest first.
    pub async fn conversation(&self, user_a: i64, user_b: i64) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT * FROM messages
             WHERE (sender_id = ? AND recipient_id = ?)
                OR (sender_id = ? AND recipient_id = ?)
             ORDER BY created_at ASC, id ASC",
        )
        .bind(user_a)
        .bind(user_b)
        .bind(user_b)
        .bind(user_a)
        .fetch_all(self.pool)
        .await?;

        Ok(messages)
    }

    /// Mark everything a sender wrote to a recipient as read.
    ///
    /// Returns the number of messages that changed state.
    pub async fn mark_read(&self, recipient_id: i64, sender_id: i64) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = 1
             WHERE recipient_id = ? AND sender_id = ? AND is_read = 0",
        )
        .bind(recipient_id)
        .bind(sender_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Unread messages addressed to a user, across all senders.
    pub async fn count_unread(&self, user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages WHERE recipient_id = ? AND is_read = 0",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Every other user with their unread count toward the viewer,
    /// ordered by username.
    pub async fn contacts(&self, user_id: i64) -> Result<Vec<Contact>> {
        let contacts = sqlx::query_as::<_, Contact>(
            "SELECT u.id AS user_id, u.username,
                    (SELECT COUNT(*) FROM messages m
                     WHERE m.sender_id = u.id AND m.recipient_id = ? AND m.is_read = 0) AS unread
             FROM users u
             WHERE u.id != ?
             ORDER BY u.username COLLATE NOCASE ASC",
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(contacts)
    }

    /// Count all messages.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}
