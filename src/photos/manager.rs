//! The photo collection manager.
//!
//! [`PhotoManager`] owns the ordered photo set of a listing on behalf of one
//! agent. It keeps `display_order` contiguous from 1 after every mutation and
//! keeps the listing's `cover_url` equal to the resolved URL of the photo at
//! order 1. Object store writes are undone when the matching row cannot be
//! inserted; nothing else is rolled back and nothing is retried.
//!
//! Callers must serialize operations on one listing. The manager holds no
//! lock and does not queue overlapping calls.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;
use rentpv_common::paths::sanitize_file_name;
use rentpv_common::{AgentId, ListingId, PhotoId, DEFAULT_PHOTO_BUCKET};
use rentpv_db::models::{NewPhoto, Photo};
use tracing::{debug, warn};
use uuid::Uuid;

use super::catalog::PhotoCatalog;
use super::error::{PhotoError, PhotoResult};
use super::object_store::{ObjectStore, PutOptions};
use super::ordering::{self, OrderChange};
use super::policy::{UploadMetadata, UploadPolicy};

/// Ordered photo collection manager for the listings of one agent.
#[derive(Clone)]
pub struct PhotoManager {
    store: Arc<dyn ObjectStore>,
    catalog: Arc<dyn PhotoCatalog>,
    policy: UploadPolicy,
    default_bucket: String,
    owner: AgentId,
}

impl PhotoManager {
    /// Create a manager acting as `owner`, with the default upload policy
    /// and bucket.
    pub fn new(store: Arc<dyn ObjectStore>, catalog: Arc<dyn PhotoCatalog>, owner: AgentId) -> Self {
        Self {
            store,
            catalog,
            policy: UploadPolicy::default(),
            default_bucket: DEFAULT_PHOTO_BUCKET.to_string(),
            owner,
        }
    }

    pub fn with_policy(mut self, policy: UploadPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Bucket used for new uploads and for rows that carry no bucket.
    pub fn with_default_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.default_bucket = bucket.into();
        self
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub fn default_bucket(&self) -> &str {
        &self.default_bucket
    }

    pub fn owner(&self) -> AgentId {
        self.owner
    }

    /// Displayable URL for a photo, or an empty string when it cannot be
    /// resolved (render a placeholder).
    ///
    /// A legacy direct URL always wins so already published links stay
    /// stable.
    pub fn resolve_url(&self, photo: &Photo) -> String {
        if let Some(url) = photo.direct_url.as_deref().filter(|u| !u.is_empty()) {
            return url.to_string();
        }

        match photo.storage_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => {
                let bucket = photo.bucket.as_deref().unwrap_or(&self.default_bucket);
                self.store.public_url(bucket, key).unwrap_or_default()
            }
            None => String::new(),
        }
    }

    /// Current photos of a listing, cover first.
    pub async fn photos(&self, listing_id: ListingId) -> PhotoResult<Vec<Photo>> {
        let mut photos = self
            .catalog
            .list_photos(listing_id)
            .await
            .map_err(PhotoError::persistence)?;
        ordering::sort_by_order(&mut photos);
        Ok(photos)
    }

    /// Upload a blob and append it to the listing.
    ///
    /// The first photo of a listing becomes its cover.
    pub async fn add(
        &self,
        listing_id: ListingId,
        data: Bytes,
        meta: UploadMetadata,
    ) -> PhotoResult<Photo> {
        // A declared size smaller than the payload does not get past the limit.
        let size = meta.size.max(data.len() as u64);
        self.policy.check(&UploadMetadata {
            size,
            ..meta.clone()
        })?;

        let bucket = self.default_bucket.clone();
        let key = storage_key(self.owner, listing_id, &meta);
        debug!(%listing_id, bucket = %bucket, key = %key, size = data.len(), "Uploading photo");

        self.store
            .put(
                &bucket,
                &key,
                data,
                PutOptions {
                    content_type: meta.content_type.clone(),
                    overwrite: false,
                },
            )
            .await
            .map_err(|e| PhotoError::StorageWrite(format!("{e:#}")))?;

        let photo = match self.insert_row(listing_id, &bucket, &key).await {
            Ok(photo) => photo,
            Err(err) => {
                self.discard_blob(&bucket, &key).await;
                return Err(PhotoError::persistence(err));
            }
        };

        if photo.is_cover() {
            self.refresh_cover(listing_id, Some(&photo)).await?;
        }

        debug!(%listing_id, photo_id = %photo.id, order = photo.display_order, "Photo added");
        Ok(photo)
    }

    /// Look up a single photo.
    pub async fn photo(&self, photo_id: PhotoId) -> PhotoResult<Option<Photo>> {
        self.catalog
            .get_photo(photo_id)
            .await
            .map_err(PhotoError::persistence)
    }

    /// Delete a photo's blob and row, then close the gap it leaves.
    ///
    /// The acting agent must be allowed to delete the row before the blob
    /// is touched. A blob delete failure leaves the row in place.
    pub async fn remove(&self, photo: &Photo) -> PhotoResult<()> {
        let listing_id = photo.listing_id;
        debug!(%listing_id, photo_id = %photo.id, "Removing photo");

        self.catalog
            .authorize_photo(photo.id)
            .await
            .map_err(PhotoError::persistence)?;

        if let Some(key) = photo.storage_key.as_deref().filter(|k| !k.is_empty()) {
            let bucket = photo.bucket.as_deref().unwrap_or(&self.default_bucket);
            self.store
                .delete(bucket, key)
                .await
                .map_err(|e| PhotoError::StorageDelete(format!("{e:#}")))?;
        }

        self.catalog
            .delete_photo(photo.id)
            .await
            .map_err(PhotoError::persistence)?;

        let remaining = self.photos(listing_id).await?;
        self.apply_order(listing_id, remaining).await
    }

    /// Move `moved` so it sits immediately before `target`.
    ///
    /// Moving a photo onto itself, or naming a photo that is not in the
    /// listing, changes nothing and issues no writes.
    pub async fn reorder(
        &self,
        listing_id: ListingId,
        moved: PhotoId,
        target: PhotoId,
    ) -> PhotoResult<()> {
        if moved == target {
            return Ok(());
        }

        let mut photos = self.photos(listing_id).await?;
        if !ordering::move_before(&mut photos, moved, target) {
            debug!(%listing_id, %moved, %target, "Reorder is a no-op");
            return Ok(());
        }

        debug!(%listing_id, %moved, %target, "Reordering photos");
        self.apply_order(listing_id, photos).await
    }

    /// Move a photo to the front of the listing, making it the cover.
    ///
    /// No-op when the photo already leads or is not in the listing.
    pub async fn make_cover(&self, listing_id: ListingId, photo_id: PhotoId) -> PhotoResult<()> {
        let mut photos = self.photos(listing_id).await?;
        if !ordering::move_to_front(&mut photos, photo_id) {
            debug!(%listing_id, %photo_id, "Photo is already the cover or absent");
            return Ok(());
        }

        debug!(%listing_id, %photo_id, "Setting cover photo");
        self.apply_order(listing_id, photos).await
    }

    async fn insert_row(
        &self,
        listing_id: ListingId,
        bucket: &str,
        key: &str,
    ) -> rentpv_common::Result<Photo> {
        let existing = self.catalog.list_photos(listing_id).await?;
        let new = NewPhoto {
            listing_id,
            storage_key: Some(key.to_string()),
            bucket: Some(bucket.to_string()),
            direct_url: None,
            display_order: ordering::next_display_order(&existing),
        };
        self.catalog.insert_photo(new).await
    }

    /// Best-effort removal of a blob whose row never made it in.
    async fn discard_blob(&self, bucket: &str, key: &str) {
        warn!(bucket, key, "Photo row insert failed, deleting uploaded blob");
        if let Err(e) = self.store.delete(bucket, key).await {
            warn!(bucket, key, error = %format!("{e:#}"), "Failed to delete orphaned blob");
        }
    }

    /// Renumber `photos` (already in their new sequence) to 1..=N, write the
    /// changed rows, and recompute the cover.
    async fn apply_order(&self, listing_id: ListingId, mut photos: Vec<Photo>) -> PhotoResult<()> {
        let changes = ordering::renumber(&mut photos);
        self.persist_changes(listing_id, &changes).await?;
        self.refresh_cover(listing_id, photos.first()).await
    }

    /// Issue all order updates concurrently and fold the outcomes.
    async fn persist_changes(&self, listing_id: ListingId, changes: &[OrderChange]) -> PhotoResult<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let results = join_all(
            changes
                .iter()
                .map(|c| self.catalog.update_display_order(c.photo_id, c.to)),
        )
        .await;

        let errors: Vec<_> = results.into_iter().filter_map(Result::err).collect();
        let Some(first) = errors.first() else {
            debug!(%listing_id, updated = changes.len(), "Photo order saved");
            return Ok(());
        };

        let failed = errors.len();
        let applied = changes.len() - failed;
        if applied == 0 {
            return Err(PhotoError::persistence(first));
        }

        warn!(%listing_id, applied, failed, error = %first, "Photo order partially saved");
        Err(PhotoError::PartialReorder {
            applied,
            failed,
            message: first.to_string(),
        })
    }

    async fn refresh_cover(&self, listing_id: ListingId, cover: Option<&Photo>) -> PhotoResult<()> {
        let url = cover
            .map(|photo| self.resolve_url(photo))
            .filter(|url| !url.is_empty());
        debug!(%listing_id, cover_url = ?url, "Updating listing cover");
        self.catalog
            .set_cover_url(listing_id, url)
            .await
            .map_err(PhotoError::persistence)
    }
}

/// `{owner}/{listing}/{uuid}-{file name}`. Keys never collide across
/// listings or owners.
fn storage_key(owner: AgentId, listing_id: ListingId, meta: &UploadMetadata) -> String {
    let mut name = sanitize_file_name(&meta.file_name);
    if Path::new(&name).extension().is_none() {
        if let Some(ext) = extension_for(&meta.content_type) {
            name.push('.');
            name.push_str(ext);
        }
    }
    format!("{owner}/{listing_id}/{}-{name}", Uuid::new_v4())
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}
