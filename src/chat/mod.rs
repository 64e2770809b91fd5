//! Chat module for Coffer.
//!
//! This module provides direct messaging including:
//! - Timestamped messages between two users
//! - Conversation history merging both directions
//! - Contact list with per-sender unread counts

mod repository;
mod service;
mod types;

pub use repository::MessageRepository;
pub use service::ChatService;
pub use types::{Contact, Message, NewMessage, MAX_BODY_LENGTH};
