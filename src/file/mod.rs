//! File management module for Coffer.
//!
//! This module provides the file/folder tree including:
//! - Hierarchical folder structure with move and cascading delete
//! - Role-gated upload, download and listing
//! - Blob storage with unique locators and sharded directories
//! - Upload scanning by extension and filename keyword

mod node;
mod repository;
mod scanner;
mod service;
mod storage;

pub use node::{NewNode, Node};
pub use repository::{LargestFile, NodeRepository};
pub use scanner::UploadScanner;
pub use service::{DownloadResult, FileService, UploadRequest};
pub use storage::BlobStore;

/// Maximum length for a file or folder name (in characters).
pub const MAX_NODE_NAME_LENGTH: usize = 255;

/// Default maximum upload size (50MB).
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 50 * 1024 * 1024;
