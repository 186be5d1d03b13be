//! Error vocabulary of the photo subsystem.
//!
//! Every variant carries a human-readable message that callers are
//! expected to show verbatim. Nothing in the subsystem retries.

/// Failure of a photo collection operation.
#[derive(Debug, thiserror::Error)]
pub enum PhotoError {
    /// Input rejected before any I/O happened.
    #[error("{0}")]
    Validation(String),

    /// Writing the blob to the object store failed.
    #[error("Failed to store photo: {0}")]
    StorageWrite(String),

    /// Deleting the blob from the object store failed.
    #[error("Failed to delete stored photo: {0}")]
    StorageDelete(String),

    /// A relational store read or write failed (including authorization).
    #[error("Failed to save photo changes: {0}")]
    Persistence(String),

    /// Some, but not all, of a batch of order updates were applied.
    ///
    /// Already-applied updates are not rolled back; re-read the listing's
    /// photos to see what state it is in.
    #[error("Photo order partially saved ({applied} applied, {failed} failed): {message}")]
    PartialReorder {
        applied: usize,
        failed: usize,
        message: String,
    },
}

impl PhotoError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    pub fn persistence<S: ToString>(err: S) -> Self {
        Self::Persistence(err.to_string())
    }
}

pub type PhotoResult<T> = std::result::Result<T, PhotoError>;
