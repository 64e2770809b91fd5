//! Sharing module for Coffer.
//!
//! This module provides role-based sharing including:
//! - Per-node grants with viewer/editor roles
//! - Role resolution walking the folder tree upward
//! - Owner-gated grant management

mod grant;
mod resolver;
mod service;

pub use grant::{Grant, GrantDetail, GrantRepository, ShareRole};
pub use resolver::RoleResolver;
pub use service::ShareService;
