//! Upload size and content-type policy.

use serde::{Deserialize, Serialize};

use super::error::{PhotoError, PhotoResult};

/// Default maximum upload size (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Content types accepted when no allow-list is configured.
pub const DEFAULT_ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// What a caller declares about a blob it wants to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadMetadata {
    /// Original file name as chosen by the user. Only a sanitized form of
    /// it ends up in the storage key.
    pub file_name: String,
    pub content_type: String,
    /// Declared size in bytes.
    pub size: u64,
}

/// Size and type limits applied to every upload before any I/O.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPolicy {
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    #[serde(default = "default_allowed_content_types")]
    pub allowed_content_types: Vec<String>,
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_allowed_content_types() -> Vec<String> {
    DEFAULT_ALLOWED_CONTENT_TYPES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
            allowed_content_types: default_allowed_content_types(),
        }
    }
}

impl UploadPolicy {
    /// Check an upload against the policy.
    ///
    /// Size is checked first so an oversized file of the wrong type reports
    /// the size problem.
    pub fn check(&self, meta: &UploadMetadata) -> PhotoResult<()> {
        if meta.size > self.max_upload_bytes {
            return Err(PhotoError::validation(format!(
                "File is too large. Maximum {}.",
                human_size(self.max_upload_bytes)
            )));
        }

        let content_type = meta.content_type.trim().to_ascii_lowercase();
        if !self
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&content_type))
        {
            return Err(PhotoError::validation(format!(
                "File type not allowed. Use {}.",
                allowed_labels(&self.allowed_content_types)
            )));
        }

        Ok(())
    }
}

fn human_size(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    const KB: u64 = 1024;
    if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{}KB", bytes / KB)
    } else {
        format!("{bytes} bytes")
    }
}

/// "image/jpeg, image/png" -> "JPG, PNG or WebP" style label list.
fn allowed_labels(types: &[String]) -> String {
    let labels: Vec<String> = types
        .iter()
        .map(|t| match t.to_ascii_lowercase().as_str() {
            "image/jpeg" => "JPG".to_string(),
            "image/png" => "PNG".to_string(),
            "image/webp" => "WebP".to_string(),
            "image/gif" => "GIF".to_string(),
            other => other.to_string(),
        })
        .collect();

    match labels.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
    }
}
