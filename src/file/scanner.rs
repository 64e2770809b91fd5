//! Upload scanning for Coffer.
//!
//! Every upload passes through a filename scan before any bytes reach
//! the blob store. The scan is configuration driven: a list of blocked
//! extensions and a list of blocked keywords, both matched
//! case-insensitively.

use crate::config::ScannerConfig;
use crate::{CofferError, Result};

/// Filename scanner applied to uploads.
///
/// Rejects a file when its extension is on the blocked list or its
/// name contains a blocked keyword. Keyword matching is substring
/// based, so "virus" also catches "antivirus.txt".
#[derive(Debug, Clone)]
pub struct UploadScanner {
    blocked_extensions: Vec<String>,
    blocked_keywords: Vec<String>,
}

impl UploadScanner {
    /// Create a scanner with explicit block lists.
    pub fn new(blocked_extensions: Vec<String>, blocked_keywords: Vec<String>) -> Self {
        Self {
            blocked_extensions: blocked_extensions
                .into_iter()
                .map(|e| e.to_lowercase())
                .collect(),
            blocked_keywords: blocked_keywords
                .into_iter()
                .map(|k| k.to_lowercase())
                .collect(),
        }
    }

    /// Create a scanner from the scanner section of the configuration.
    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(
            config.blocked_extensions.clone(),
            config.blocked_keywords.clone(),
        )
    }

    /// Scan an upload before it is accepted.
    ///
    /// The default policy only inspects the filename; the content is
    /// part of the signature so stricter policies can look inside.
    ///
    /// Returns `ScanRejected` naming the matched rule, `Ok(())` when
    /// the file passes.
    pub fn scan(&self, filename: &str, _content: &[u8]) -> Result<()> {
        let lowered = filename.to_lowercase();

        if let Some(ext) = Self::extension(&lowered) {
            if self.blocked_extensions.iter().any(|b| b == ext) {
                return Err(CofferError::ScanRejected(format!(
                    "file type .{ext} is not allowed"
                )));
            }
        }

        for keyword in &self.blocked_keywords {
            if lowered.contains(keyword.as_str()) {
                return Err(CofferError::ScanRejected(format!(
                    "filename contains blocked keyword \"{keyword}\""
                )));
            }
        }

        Ok(())
    }

    /// Extract the extension from an already lowercased filename.
    fn extension(filename: &str) -> Option<&str> {
        let (_, ext) = filename.rsplit_once('.')?;
        if ext.is_empty() {
            None
        } else {
            Some(ext)
        }
    }
}

impl Default for UploadScanner {
    fn default() -> Self {
        Self::from_config(&ScannerConfig::default())
    }
}
