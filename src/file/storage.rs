//! Blob storage for Coffer.
//!
//! This module stores the physical bytes of uploaded files outside the
//! database:
//! - Locators combine a UUID with the sanitized original filename
//! - Directory sharding by the first 2 characters of the locator
//! - Put, get, and delete operations

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::{CofferError, Result};

/// Blob store keeping file content on the local filesystem.
///
/// Blobs are stored in a sharded directory structure:
/// ```text
/// {base_path}/
/// ├── 3f/
/// │   └── 3f2a9c4d1e8b4f6a9c0d2e4f6a8b0c2d_report.txt
/// ├── 7b/
/// │   └── 7b1c3e5a7d9f1b3c5e7a9d1f3b5c7e9a_photo.jpg
/// └── ...
/// ```
#[derive(Debug, Clone)]
pub struct BlobStore {
    /// Base directory for blob storage.
    base_path: PathBuf,
}

impl BlobStore {
    /// Create a new BlobStore with the given base path.
    ///
    /// The base directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).map_err(|e| {
            CofferError::Storage(format!(
                "failed to create blob directory {}: {e}",
                base_path.display()
            ))
        })?;

        Ok(Self { base_path })
    }

    /// Get the base path of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Store content under a fresh locator.
    ///
    /// The locator is a UUID joined with the sanitized original filename,
    /// so identically named uploads from different users never collide.
    ///
    /// Returns the locator to record in the metadata database.
    pub fn put(&self, content: &[u8], original_name: &str) -> Result<String> {
        let locator = Self::generate_locator(original_name);
        let blob_path = self.blob_path(&locator);

        // Create the shard directory if it doesn't exist
        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CofferError::Storage(format!("failed to create shard dir: {e}")))?;
        }

        fs::write(&blob_path, content)
            .map_err(|e| CofferError::Storage(format!("failed to write blob {locator}: {e}")))?;

        Ok(locator)
    }

    /// Load the content behind a locator.
    pub fn get(&self, locator: &str) -> Result<Vec<u8>> {
        let blob_path = self.blob_path(locator);

        match fs::read(&blob_path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(CofferError::NotFound(format!("blob {locator}")))
            }
            Err(e) => Err(CofferError::Storage(format!(
                "failed to read blob {locator}: {e}"
            ))),
        }
    }

    /// Delete the blob behind a locator.
    ///
    /// Returns `true` if the blob was deleted, `false` if it didn't exist.
    pub fn delete(&self, locator: &str) -> Result<bool> {
        let blob_path = self.blob_path(locator);

        match fs::remove_file(&blob_path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CofferError::Storage(format!(
                "failed to delete blob {locator}: {e}"
            ))),
        }
    }

    /// Check if a blob exists.
    pub fn exists(&self, locator: &str) -> bool {
        self.blob_path(locator).exists()
    }

    /// Get the size in bytes of a stored blob.
    pub fn size(&self, locator: &str) -> Result<u64> {
        let blob_path = self.blob_path(locator);

        match fs::metadata(&blob_path) {
            Ok(m) => Ok(m.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(CofferError::NotFound(format!("blob {locator}")))
            }
            Err(e) => Err(CofferError::Storage(format!(
                "failed to stat blob {locator}: {e}"
            ))),
        }
    }

    /// Get the full filesystem path for a locator.
    ///
    /// The path is constructed as: {base_path}/{shard}/{locator}
    /// where shard is the first 2 characters of the locator (UUID prefix).
    pub fn blob_path(&self, locator: &str) -> PathBuf {
        let shard = Self::shard(locator);
        self.base_path.join(shard).join(locator)
    }

    /// Get the shard directory name for a locator.
    fn shard(locator: &str) -> &str {
        if locator.len() >= 2 {
            &locator[..2]
        } else {
            locator
        }
    }

    /// Generate a fresh locator for an original filename.
    pub fn generate_locator(original_name: &str) -> String {
        let uuid = Uuid::new_v4().simple();
        let name = Self::sanitize_filename(original_name);
        format!("{uuid}_{name}")
    }

    /// Reduce a filename to a safe form for filesystem storage.
    ///
    /// Path components are stripped, anything outside alphanumerics,
    /// dots, dashes and underscores is replaced, and leading dots are
    /// removed. An empty result falls back to "file".
    pub fn sanitize_filename(original_name: &str) -> String {
        let base = original_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(original_name);

        let cleaned: String = base
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        let cleaned = cleaned.trim_start_matches('.').to_string();
        if cleaned.is_empty() {
            "file".to_string()
        } else {
            cleaned
        }
    }

    /// Clean up empty shard directories.
    ///
    /// This removes any empty subdirectories in the store.
    pub fn cleanup_empty_dirs(&self) -> Result<usize> {
        let mut removed = 0;

        if let Ok(entries) = fs::read_dir(&self.base_path) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    if let Ok(dir_entries) = fs::read_dir(&path) {
                        if dir_entries.count() == 0 && fs::remove_dir(&path).is_ok() {
                            removed += 1;
                        }
                    }
                }
            }
        }

        Ok(removed)
    }
}
