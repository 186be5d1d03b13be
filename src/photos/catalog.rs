//! Relational store boundary for photos and the listing cover.
//!
//! [`PhotoCatalog`] is everything the photo manager needs from the
//! relational side. [`SqliteCatalog`] implements it on the local database
//! and enforces row ownership itself: every mutation is checked against
//! the acting agent and refused with [`Error::Forbidden`] otherwise.

use async_trait::async_trait;
use rentpv_common::{AgentId, Error, ListingId, PhotoId, Result};
use rentpv_db::models::{NewPhoto, Photo};
use rentpv_db::pool::{get_conn, DbPool, PooledConnection};
use rentpv_db::queries::{listings, photos};

/// Row-level access to a `photos` table and a listing's cover field.
#[async_trait]
pub trait PhotoCatalog: Send + Sync {
    /// A listing's photos sorted by `display_order`.
    async fn list_photos(&self, listing_id: ListingId) -> Result<Vec<Photo>>;

    async fn get_photo(&self, photo_id: PhotoId) -> Result<Option<Photo>>;

    /// Fail unless the acting agent may mutate `photo_id`. Checked before
    /// any side effect outside the catalog, such as deleting the blob.
    async fn authorize_photo(&self, photo_id: PhotoId) -> Result<()>;

    /// Insert a row; the catalog assigns the id.
    async fn insert_photo(&self, photo: NewPhoto) -> Result<Photo>;

    async fn update_display_order(&self, photo_id: PhotoId, display_order: i32) -> Result<()>;

    async fn delete_photo(&self, photo_id: PhotoId) -> Result<()>;

    async fn set_cover_url(&self, listing_id: ListingId, cover_url: Option<String>) -> Result<()>;
}

/// [`PhotoCatalog`] over the SQLite pool, acting on behalf of one agent.
///
/// Queries run directly on the calling task. Each is a single short
/// statement, and keeping them on one thread means a batch of concurrent
/// order updates never contends for the SQLite write lock.
#[derive(Clone)]
pub struct SqliteCatalog {
    pool: DbPool,
    agent_id: AgentId,
}

impl SqliteCatalog {
    pub fn new(pool: DbPool, agent_id: AgentId) -> Self {
        Self { pool, agent_id }
    }

    pub fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    fn ensure_listing_owner(&self, conn: &PooledConnection, listing_id: ListingId) -> Result<()> {
        match listings::listing_owner(conn, listing_id)? {
            None => Err(Error::not_found(format!("listing {listing_id}"))),
            Some(owner) if owner == self.agent_id => Ok(()),
            Some(_) => Err(Error::forbidden(format!(
                "agent {} does not own listing {listing_id}",
                self.agent_id
            ))),
        }
    }

    fn ensure_photo_owner(&self, conn: &PooledConnection, photo_id: PhotoId) -> Result<()> {
        match photos::photo_owner(conn, photo_id)? {
            None => Err(Error::not_found(format!("photo {photo_id}"))),
            Some(owner) if owner == self.agent_id => Ok(()),
            Some(_) => Err(Error::forbidden(format!(
                "agent {} does not own photo {photo_id}",
                self.agent_id
            ))),
        }
    }
}

#[async_trait]
impl PhotoCatalog for SqliteCatalog {
    async fn list_photos(&self, listing_id: ListingId) -> Result<Vec<Photo>> {
        let conn = get_conn(&self.pool)?;
        photos::list_photos_for_listing(&conn, listing_id)
    }

    async fn get_photo(&self, photo_id: PhotoId) -> Result<Option<Photo>> {
        let conn = get_conn(&self.pool)?;
        photos::get_photo(&conn, photo_id)
    }

    async fn authorize_photo(&self, photo_id: PhotoId) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        self.ensure_photo_owner(&conn, photo_id)
    }

    async fn insert_photo(&self, photo: NewPhoto) -> Result<Photo> {
        let conn = get_conn(&self.pool)?;
        self.ensure_listing_owner(&conn, photo.listing_id)?;
        photos::insert_photo(&conn, &photo)
    }

    async fn update_display_order(&self, photo_id: PhotoId, display_order: i32) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        self.ensure_photo_owner(&conn, photo_id)?;
        if !photos::update_display_order(&conn, photo_id, display_order)? {
            return Err(Error::not_found(format!("photo {photo_id}")));
        }
        Ok(())
    }

    async fn delete_photo(&self, photo_id: PhotoId) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        self.ensure_photo_owner(&conn, photo_id)?;
        if !photos::delete_photo(&conn, photo_id)? {
            return Err(Error::not_found(format!("photo {photo_id}")));
        }
        Ok(())
    }

    async fn set_cover_url(&self, listing_id: ListingId, cover_url: Option<String>) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        self.ensure_listing_owner(&conn, listing_id)?;
        listings::set_cover_url(&conn, listing_id, cover_url.as_deref())?;
        Ok(())
    }
}
