//! Photo database queries.
//!
//! Plain row-level CRUD over the `photos` table. Keeping `display_order`
//! contiguous is the caller's job; nothing here renumbers rows.

use chrono::Utc;
use rusqlite::Connection;
use rentpv_common::{AgentId, Error, ListingId, PhotoId, Result};

use crate::models::{NewPhoto, Photo};

const PHOTO_COLUMNS: &str =
    "id, listing_id, storage_key, bucket, direct_url, display_order, created_at";

/// Insert a photo row and return it with its assigned ID.
///
/// # Returns
///
/// * `Ok(Photo)` - The inserted photo
/// * `Err(Error::NotFound)` - If the listing does not exist
/// * `Err(Error::InvalidInput)` - If `display_order` is not positive
pub fn insert_photo(conn: &Connection, new: &NewPhoto) -> Result<Photo> {
    if new.display_order < 1 {
        return Err(Error::invalid_input(format!(
            "display_order must be >= 1, got {}",
            new.display_order
        )));
    }

    let photo = Photo {
        id: PhotoId::new(),
        listing_id: new.listing_id,
        storage_key: new.storage_key.clone(),
        bucket: new.bucket.clone(),
        direct_url: new.direct_url.clone(),
        display_order: new.display_order,
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO photos (id, listing_id, storage_key, bucket, direct_url, display_order, created_at)
         VALUES (:id, :listing_id, :storage_key, :bucket, :direct_url, :display_order, :created_at)",
        rusqlite::named_params! {
            ":id": photo.id.to_string(),
            ":listing_id": photo.listing_id.to_string(),
            ":storage_key": &photo.storage_key,
            ":bucket": &photo.bucket,
            ":direct_url": &photo.direct_url,
            ":display_order": photo.display_order,
            ":created_at": photo.created_at.to_rfc3339(),
        },
    )
    .map_err(|e| {
        if e.to_string().contains("FOREIGN KEY constraint failed") {
            Error::not_found(format!("listing {}", new.listing_id))
        } else {
            Error::database(e.to_string())
        }
    })?;

    Ok(photo)
}

/// Get a photo by ID.
pub fn get_photo(conn: &Connection, id: PhotoId) -> Result<Option<Photo>> {
    let sql = format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE id = ?1");
    match conn.query_row(&sql, [id.to_string()], Photo::from_row) {
        Ok(photo) => Ok(Some(photo)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List a listing's photos ordered by `display_order`.
///
/// Ties (which only concurrent editors can produce) fall back to creation
/// time so the order is at least stable.
pub fn list_photos_for_listing(conn: &Connection, listing_id: ListingId) -> Result<Vec<Photo>> {
    let sql = format!(
        "SELECT {PHOTO_COLUMNS} FROM photos
         WHERE listing_id = ?1
         ORDER BY display_order ASC, created_at ASC, id ASC"
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| Error::database(e.to_string()))?;

    let photos = stmt
        .query_map([listing_id.to_string()], Photo::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(photos)
}

/// Set one photo's `display_order`.
///
/// # Returns
///
/// * `Ok(true)` - If the row was updated
/// * `Ok(false)` - If the photo does not exist
pub fn update_display_order(conn: &Connection, id: PhotoId, display_order: i32) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE photos SET display_order = ?1 WHERE id = ?2",
            rusqlite::params![display_order, id.to_string()],
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(n > 0)
}

/// Delete a photo row.
///
/// # Returns
///
/// * `Ok(true)` - If the photo was deleted
/// * `Ok(false)` - If the photo did not exist
pub fn delete_photo(conn: &Connection, id: PhotoId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM photos WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(n > 0)
}

/// Get the agent owning the listing a photo belongs to.
///
/// Returns `None` if the photo does not exist.
pub fn photo_owner(conn: &Connection, id: PhotoId) -> Result<Option<AgentId>> {
    let result = conn.query_row(
        "SELECT l.agent_id FROM photos p
         JOIN listings l ON l.id = p.listing_id
         WHERE p.id = ?1",
        [id.to_string()],
        |row| row.get::<_, String>(0),
    );

    match result {
        Ok(agent) => agent
            .parse()
            .map(Some)
            .map_err(|e: uuid::Error| Error::database(e.to_string())),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{init_memory_pool, PooledConnection};
    use crate::queries::{agents, listings};

    fn setup() -> (PooledConnection, AgentId, ListingId) {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let agent = agents::create_agent(&conn, "ana@example.com", "Ana", None, None).unwrap();
        let listing = listings::create_listing(&conn, agent.id, "Casa Azul").unwrap();
        (conn, agent.id, listing.id)
    }

    fn stored(listing_id: ListingId, key: &str, order: i32) -> NewPhoto {
        NewPhoto {
            listing_id,
            storage_key: Some(key.to_string()),
            bucket: Some("property-images".to_string()),
            direct_url: None,
            display_order: order,
        }
    }

    #[test]
    fn test_insert_and_get_photo() {
        let (conn, _, listing_id) = setup();

        let photo = insert_photo(&conn, &stored(listing_id, "a/b/1.jpg", 1)).unwrap();
        let found = get_photo(&conn, photo.id).unwrap().unwrap();

        assert_eq!(found.listing_id, listing_id);
        assert_eq!(found.storage_key.as_deref(), Some("a/b/1.jpg"));
        assert_eq!(found.bucket.as_deref(), Some("property-images"));
        assert!(found.direct_url.is_none());
        assert_eq!(found.display_order, 1);
    }

    #[test]
    fn test_insert_legacy_photo() {
        let (conn, _, listing_id) = setup();

        let photo = insert_photo(
            &conn,
            &NewPhoto {
                listing_id,
                storage_key: None,
                bucket: None,
                direct_url: Some("https://old.example.com/p.jpg".to_string()),
                display_order: 1,
            },
        )
        .unwrap();

        let found = get_photo(&conn, photo.id).unwrap().unwrap();
        assert!(found.storage_key.is_none());
        assert_eq!(found.direct_url.as_deref(), Some("https://old.example.com/p.jpg"));
    }

    #[test]
    fn test_insert_photo_unknown_listing() {
        let (conn, _, _) = setup();
        let err = insert_photo(&conn, &stored(ListingId::new(), "k", 1)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_insert_photo_rejects_zero_order() {
        let (conn, _, listing_id) = setup();
        let err = insert_photo(&conn, &stored(listing_id, "k", 0)).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_list_photos_sorted_by_order() {
        let (conn, _, listing_id) = setup();

        insert_photo(&conn, &stored(listing_id, "c", 3)).unwrap();
        insert_photo(&conn, &stored(listing_id, "a", 1)).unwrap();
        insert_photo(&conn, &stored(listing_id, "b", 2)).unwrap();

        let photos = list_photos_for_listing(&conn, listing_id).unwrap();
        let keys: Vec<_> = photos
            .iter()
            .map(|p| p.storage_key.clone().unwrap())
            .collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_list_photos_empty() {
        let (conn, _, listing_id) = setup();
        assert!(list_photos_for_listing(&conn, listing_id).unwrap().is_empty());
    }

    #[test]
    fn test_update_display_order() {
        let (conn, _, listing_id) = setup();
        let photo = insert_photo(&conn, &stored(listing_id, "a", 2)).unwrap();

        assert!(update_display_order(&conn, photo.id, 1).unwrap());
        assert_eq!(get_photo(&conn, photo.id).unwrap().unwrap().display_order, 1);

        assert!(!update_display_order(&conn, PhotoId::new(), 1).unwrap());
    }

    #[test]
    fn test_delete_photo() {
        let (conn, _, listing_id) = setup();
        let photo = insert_photo(&conn, &stored(listing_id, "a", 1)).unwrap();

        assert!(delete_photo(&conn, photo.id).unwrap());
        assert!(get_photo(&conn, photo.id).unwrap().is_none());
        assert!(!delete_photo(&conn, photo.id).unwrap());
    }

    #[test]
    fn test_photo_owner() {
        let (conn, agent_id, listing_id) = setup();
        let photo = insert_photo(&conn, &stored(listing_id, "a", 1)).unwrap();

        assert_eq!(photo_owner(&conn, photo.id).unwrap(), Some(agent_id));
        assert_eq!(photo_owner(&conn, PhotoId::new()).unwrap(), None);
    }

    #[test]
    fn test_photos_removed_with_listing() {
        let (conn, _, listing_id) = setup();
        let photo = insert_photo(&conn, &stored(listing_id, "a", 1)).unwrap();

        conn.execute("DELETE FROM listings WHERE id = ?1", [listing_id.to_string()])
            .unwrap();
        assert!(get_photo(&conn, photo.id).unwrap().is_none());
    }
}
