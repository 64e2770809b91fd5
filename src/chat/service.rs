//! Chat service for Coffer.
//!
//! Direct messages between users: send, conversation history, contact
//! list with unread counts. A conversation is the union of both
//! directions ordered by time; opening it marks the incoming side read.

use tracing::info;

use crate::auth::Principal;
use crate::db::{Database, UserRepository};
use crate::{CofferError, Result};

use super::repository::MessageRepository;
use super::types::{Contact, Message, NewMessage, MAX_BODY_LENGTH};

/// Service for direct messaging.
pub struct ChatService<'a> {
    db: &'a Database,
}

impl<'a> ChatService<'a> {
    /// Create a new ChatService.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Send a message to another user by name.
    ///
    /// # Validation
    /// - Non-empty body after trimming, at most 2000 characters
    /// - The recipient must exist and must not be the sender
    pub async fn send(
        &self,
        principal: &Principal,
        recipient_username: &str,
        body: &str,
    ) -> Result<Message> {
        let body = body.trim();
        if body.is_empty() {
            return Err(CofferError::Validation(
                "message cannot be empty".to_string(),
            ));
        }
        if body.chars().count() > MAX_BODY_LENGTH {
            return Err(CofferError::Validation(format!(
                "message is too long (max {MAX_BODY_LENGTH} characters)"
            )));
        }

        let users = UserRepository::new(self.db.pool());
        let recipient = users
            .get_by_username(recipient_username.trim())
            .await?
            .ok_or_else(|| CofferError::NotFound("user".to_string()))?;

        if recipient.id == principal.id {
            return Err(CofferError::Validation(
                "cannot send a message to yourself".to_string(),
            ));
        }

        let messages = MessageRepository::new(self.db.pool());
        let message = messages
            .create(&NewMessage::new(principal.id, recipient.id, body))
            .await?;

        info!(
            sender_id = principal.id,
            recipient_id = recipient.id,
            message_id = message.id,
            "message sent"
        );

        Ok(message)
    }

    /// The full conversation with another user, oldest first.
    ///
    /// Messages the other user sent the principal are marked read.
    pub async fn conversation(
        &self,
        principal: &Principal,
        other_user_id: i64,
    ) -> Result<Vec<Message>> {
        let users = UserRepository::new(self.db.pool());
        users
            .get_by_id(other_user_id)
            .await?
            .ok_or_else(|| CofferError::NotFound("user".to_string()))?;

        let messages = MessageRepository::new(self.db.pool());
        messages.mark_read(principal.id, other_user_id).await?;
        messages.conversation(principal.id, other_user_id).await
    }

    /// Every other user with their unread count toward the principal.
    pub async fn contacts(&self, principal: &Principal) -> Result<Vec<Contact>> {
        MessageRepository::new(self.db.pool())
            .contacts(principal.id)
            .await
    }

    /// Unread messages addressed to the principal, across all senders.
    pub async fn unread_total(&self, principal: &Principal) -> Result<i64> {
        MessageRepository::new(self.db.pool())
            .count_unread(principal.id)
            .await
    }
}
