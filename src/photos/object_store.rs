//! Object store boundary and its filesystem implementation.
//!
//! The photo manager only ever needs three capabilities from blob storage:
//! a non-overwriting put, a public URL for a key, and delete.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncWriteExt;

/// Options for [`ObjectStore::put`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOptions {
    pub content_type: String,
    /// Replace an existing object at the same key instead of failing.
    pub overwrite: bool,
}

/// Blob storage addressed by `(bucket, key)`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `key` in `bucket`.
    async fn put(&self, bucket: &str, key: &str, data: Bytes, options: PutOptions) -> Result<()>;

    /// Public URL for an object, or `None` if the store cannot produce one.
    ///
    /// Must not perform I/O or mutate anything.
    fn public_url(&self, bucket: &str, key: &str) -> Option<String>;

    /// Remove an object. Removing a missing object succeeds.
    async fn delete(&self, bucket: &str, key: &str) -> Result<()>;
}

/// Object store backed by a local directory.
///
/// Objects live at `{root}/{bucket}/{key}` and are published as
/// `{public_base_url}/{bucket}/{key}`; the HTTP server mounts `root` at the
/// matching path.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsObjectStore {
    pub fn new(root: PathBuf, public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self {
            root,
            public_base_url,
        }
    }

    /// Directory holding all buckets.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `(bucket, key)` to a path below `root`, rejecting anything
    /// that could escape it.
    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        if !is_safe_segment(bucket) {
            bail!("Invalid bucket name: {bucket:?}");
        }
        if key.is_empty() || key.contains('\\') || !key.split('/').all(is_safe_segment) {
            bail!("Invalid object key: {key:?}");
        }

        let mut path = self.root.join(bucket);
        for segment in key.split('/') {
            path.push(segment);
        }
        Ok(path)
    }
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains('/')
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, bucket: &str, key: &str, data: Bytes, options: PutOptions) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut open = tokio::fs::OpenOptions::new();
        open.write(true);
        if options.overwrite {
            open.create(true).truncate(true);
        } else {
            open.create_new(true);
        }

        let mut file = match open.open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                bail!("Object already exists: {bucket}/{key}")
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to create {}", path.display()))
            }
        };

        file.write_all(&data)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        file.flush().await?;

        tracing::debug!(
            bucket,
            key,
            bytes = data.len(),
            content_type = %options.content_type,
            "Stored object"
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> Option<String> {
        self.object_path(bucket, key).ok()?;
        Some(format!("{}/{}/{}", self.public_base_url, bucket, key))
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(bucket, key, "Deleted object");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
        }
    }
}
