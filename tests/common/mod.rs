//! Shared test harness for integration tests.
//!
//! [`TestHarness`] wires an in-memory database and a temporary object store
//! into a full [`AppContext`]. [`MemoryStore`] and [`FlakyCatalog`] stand in
//! for the photo manager's collaborators and can be told to fail.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use rentpv::config::Config;
use rentpv::photos::{ObjectStore, PhotoCatalog, PhotoManager, PutOptions, SqliteCatalog};
use rentpv::server::{create_router, AppContext};
use rentpv_common::{AgentId, Error, ListingId, PhotoId};
use rentpv_db::models::{NewPhoto, Photo};
use rentpv_db::pool::{init_memory_pool, DbPool, PooledConnection};
use rentpv_db::queries::{agents, listings, photos};

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database and a temporary object store directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    _data_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Harness with a custom configuration. `storage.data_dir` is replaced
    /// by a fresh temporary directory.
    pub fn with_config(mut config: Config) -> Self {
        let data_dir = tempfile::tempdir().expect("failed to create temp dir");
        config.storage.data_dir = data_dir.path().to_path_buf();
        std::fs::create_dir_all(config.storage.objects_dir()).expect("failed to create objects dir");

        let db = init_memory_pool().expect("failed to create in-memory pool");
        let ctx = AppContext::new(config, db.clone());
        Self {
            ctx,
            db,
            _data_dir: data_dir,
        }
    }

    pub fn router(&self) -> axum::Router {
        create_router(self.ctx.clone())
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> PooledConnection {
        rentpv_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    pub fn create_agent(&self, email: &str) -> AgentId {
        seed_agent(&self.db, email)
    }

    pub fn create_listing(&self, agent_id: AgentId) -> ListingId {
        seed_listing(&self.db, agent_id)
    }
}

pub fn seed_agent(db: &DbPool, email: &str) -> AgentId {
    let conn = rentpv_db::pool::get_conn(db).unwrap();
    agents::create_agent(&conn, email, "Test Agent", None, None)
        .unwrap()
        .id
}

pub fn seed_listing(db: &DbPool, agent_id: AgentId) -> ListingId {
    let conn = rentpv_db::pool::get_conn(db).unwrap();
    listings::create_listing(&conn, agent_id, "Casa de prueba")
        .unwrap()
        .id
}

/// Display orders of a listing's rows, sorted.
pub fn stored_orders(db: &DbPool, listing_id: ListingId) -> Vec<i32> {
    let conn = rentpv_db::pool::get_conn(db).unwrap();
    let mut orders: Vec<i32> = photos::list_photos_for_listing(&conn, listing_id)
        .unwrap()
        .iter()
        .map(|p| p.display_order)
        .collect();
    orders.sort_unstable();
    orders
}

/// Photo ids of a listing in display order.
pub fn stored_sequence(db: &DbPool, listing_id: ListingId) -> Vec<PhotoId> {
    let conn = rentpv_db::pool::get_conn(db).unwrap();
    photos::list_photos_for_listing(&conn, listing_id)
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect()
}

pub fn stored_cover(db: &DbPool, listing_id: ListingId) -> Option<String> {
    let conn = rentpv_db::pool::get_conn(db).unwrap();
    listings::get_listing(&conn, listing_id)
        .unwrap()
        .unwrap()
        .cover_url
}

// ============================================================================
// Object store double
// ============================================================================

/// In-memory [`ObjectStore`] that records every call.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<(String, String), Bytes>>,
    deleted: Mutex<Vec<(String, String)>>,
    puts: AtomicUsize,
    pub fail_put: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl MemoryStore {
    pub fn put_calls(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// `(bucket, key)` of every delete call, in call order.
    pub fn delete_calls(&self) -> Vec<(String, String)> {
        self.deleted.lock().clone()
    }

    pub fn keys(&self) -> Vec<(String, String)> {
        self.objects.lock().keys().cloned().collect()
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .lock()
            .contains_key(&(bucket.to_string(), key.to_string()))
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        options: PutOptions,
    ) -> anyhow::Result<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_put.load(Ordering::SeqCst) {
            anyhow::bail!("storage unavailable");
        }
        let mut objects = self.objects.lock();
        let id = (bucket.to_string(), key.to_string());
        if !options.overwrite && objects.contains_key(&id) {
            anyhow::bail!("Object already exists");
        }
        objects.insert(id, data);
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> Option<String> {
        Some(format!("https://cdn.test/{bucket}/{key}"))
    }

    async fn delete(&self, bucket: &str, key: &str) -> anyhow::Result<()> {
        self.deleted
            .lock()
            .push((bucket.to_string(), key.to_string()));
        if self.fail_delete.load(Ordering::SeqCst) {
            anyhow::bail!("storage unavailable");
        }
        self.objects
            .lock()
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}

// ============================================================================
// Catalog double
// ============================================================================

/// [`SqliteCatalog`] wrapper that counts writes and fails on demand.
pub struct FlakyCatalog {
    inner: SqliteCatalog,
    pub fail_insert: AtomicBool,
    pub fail_cover: AtomicBool,
    fail_updates_for: Mutex<HashSet<PhotoId>>,
    updates: AtomicUsize,
    covers: Mutex<Vec<Option<String>>>,
}

impl FlakyCatalog {
    pub fn new(inner: SqliteCatalog) -> Self {
        Self {
            inner,
            fail_insert: AtomicBool::new(false),
            fail_cover: AtomicBool::new(false),
            fail_updates_for: Mutex::new(HashSet::new()),
            updates: AtomicUsize::new(0),
            covers: Mutex::new(Vec::new()),
        }
    }

    /// Make order updates of `photo_id` fail.
    pub fn fail_update_of(&self, photo_id: PhotoId) {
        self.fail_updates_for.lock().insert(photo_id);
    }

    pub fn update_calls(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Every cover value written, in call order.
    pub fn cover_writes(&self) -> Vec<Option<String>> {
        self.covers.lock().clone()
    }

    /// Writes of any kind issued so far (inserts excluded).
    pub fn write_calls(&self) -> usize {
        self.update_calls() + self.covers.lock().len()
    }
}

#[async_trait]
impl PhotoCatalog for FlakyCatalog {
    async fn list_photos(&self, listing_id: ListingId) -> rentpv_common::Result<Vec<Photo>> {
        self.inner.list_photos(listing_id).await
    }

    async fn get_photo(&self, photo_id: PhotoId) -> rentpv_common::Result<Option<Photo>> {
        self.inner.get_photo(photo_id).await
    }

    async fn authorize_photo(&self, photo_id: PhotoId) -> rentpv_common::Result<()> {
        self.inner.authorize_photo(photo_id).await
    }

    async fn insert_photo(&self, photo: NewPhoto) -> rentpv_common::Result<Photo> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(Error::database("insert rejected"));
        }
        self.inner.insert_photo(photo).await
    }

    async fn update_display_order(
        &self,
        photo_id: PhotoId,
        display_order: i32,
    ) -> rentpv_common::Result<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates_for.lock().contains(&photo_id) {
            return Err(Error::database(format!("update of {photo_id} rejected")));
        }
        self.inner.update_display_order(photo_id, display_order).await
    }

    async fn delete_photo(&self, photo_id: PhotoId) -> rentpv_common::Result<()> {
        self.inner.delete_photo(photo_id).await
    }

    async fn set_cover_url(
        &self,
        listing_id: ListingId,
        cover_url: Option<String>,
    ) -> rentpv_common::Result<()> {
        self.covers.lock().push(cover_url.clone());
        if self.fail_cover.load(Ordering::SeqCst) {
            return Err(Error::database("cover update rejected"));
        }
        self.inner.set_cover_url(listing_id, cover_url).await
    }
}

// ============================================================================
// Manager fixture
// ============================================================================

/// A manager over [`MemoryStore`] and [`FlakyCatalog`] for one listing.
pub struct ManagerFixture {
    pub db: DbPool,
    pub store: Arc<MemoryStore>,
    pub catalog: Arc<FlakyCatalog>,
    pub manager: PhotoManager,
    pub agent_id: AgentId,
    pub listing_id: ListingId,
}

impl ManagerFixture {
    pub fn new() -> Self {
        let db = init_memory_pool().expect("failed to create in-memory pool");
        let agent_id = seed_agent(&db, "agent@example.com");
        let listing_id = seed_listing(&db, agent_id);
        Self::for_agent(db, agent_id, listing_id)
    }

    /// Fixture acting as `agent_id` on an existing listing.
    pub fn for_agent(db: DbPool, agent_id: AgentId, listing_id: ListingId) -> Self {
        let store = Arc::new(MemoryStore::default());
        let catalog = Arc::new(FlakyCatalog::new(SqliteCatalog::new(db.clone(), agent_id)));
        let manager = PhotoManager::new(store.clone(), catalog.clone(), agent_id);
        Self {
            db,
            store,
            catalog,
            manager,
            agent_id,
            listing_id,
        }
    }

    pub fn orders(&self) -> Vec<i32> {
        stored_orders(&self.db, self.listing_id)
    }

    pub fn sequence(&self) -> Vec<PhotoId> {
        stored_sequence(&self.db, self.listing_id)
    }

    pub fn cover(&self) -> Option<String> {
        stored_cover(&self.db, self.listing_id)
    }

    /// Orders are exactly 1..=N and the cover matches the photo at order 1.
    pub async fn assert_consistent(&self) {
        let list = self.manager.photos(self.listing_id).await.unwrap();
        let orders: Vec<i32> = list.iter().map(|p| p.display_order).collect();
        let expected: Vec<i32> = (1..=list.len() as i32).collect();
        assert_eq!(orders, expected, "display orders are not contiguous");

        let expected_cover = list
            .first()
            .map(|p| self.manager.resolve_url(p))
            .filter(|url| !url.is_empty());
        assert_eq!(self.cover(), expected_cover, "cover does not match order 1");
    }
}

pub fn jpeg(name: &str, size: u64) -> rentpv::photos::UploadMetadata {
    rentpv::photos::UploadMetadata {
        file_name: name.to_string(),
        content_type: "image/jpeg".to_string(),
        size,
    }
}

pub fn jpeg_bytes() -> Bytes {
    Bytes::from_static(b"\xFF\xD8\xFF fake jpeg data")
}
