//! Coffer - multi-user file storage
//!
//! A self-hosted file locker: users organize uploads in folders, share
//! them with collaborators at viewer/editor level, message each other,
//! and an administrator watches storage usage against per-user quotas.

pub mod admin;
pub mod auth;
pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod quota;
pub mod share;

pub use admin::AdminService;
pub use auth::{AuthService, Principal};
pub use chat::ChatService;
pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository, UserUpdate};
pub use error::{CofferError, Result};
pub use file::{BlobStore, DownloadResult, FileService, Node, UploadRequest, UploadScanner};
pub use quota::QuotaService;
pub use share::{RoleResolver, ShareRole, ShareService};
