//! Listing database queries.
//!
//! Besides basic CRUD this module owns the single-field update of the
//! denormalized `cover_url`, which only the photo manager should call.

use chrono::Utc;
use rusqlite::Connection;
use rentpv_common::{AgentId, Error, ListingId, ListingStatus, Result};

use crate::models::Listing;

const LISTING_COLUMNS: &str = "id, agent_id, title, status, cover_url, created_at, updated_at";

/// Create a new draft listing owned by `agent_id`.
///
/// # Returns
///
/// * `Ok(Listing)` - The created listing
/// * `Err(Error::InvalidInput)` - If the title is blank
/// * `Err(Error::NotFound)` - If the agent does not exist
pub fn create_listing(conn: &Connection, agent_id: AgentId, title: &str) -> Result<Listing> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::invalid_input("Listing title is required"));
    }

    let now = Utc::now();
    let listing = Listing {
        id: ListingId::new(),
        agent_id,
        title: title.to_string(),
        status: ListingStatus::Draft,
        cover_url: None,
        created_at: now,
        updated_at: now,
    };

    conn.execute(
        "INSERT INTO listings (id, agent_id, title, status, cover_url, created_at, updated_at)
         VALUES (:id, :agent_id, :title, :status, NULL, :created_at, :updated_at)",
        rusqlite::named_params! {
            ":id": listing.id.to_string(),
            ":agent_id": agent_id.to_string(),
            ":title": &listing.title,
            ":status": listing.status.to_string(),
            ":created_at": now.to_rfc3339(),
            ":updated_at": now.to_rfc3339(),
        },
    )
    .map_err(|e| {
        if e.to_string().contains("FOREIGN KEY constraint failed") {
            Error::not_found(format!("agent {agent_id}"))
        } else {
            Error::database(e.to_string())
        }
    })?;

    Ok(listing)
}

/// Get a listing by ID.
pub fn get_listing(conn: &Connection, id: ListingId) -> Result<Option<Listing>> {
    let sql = format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = ?1");
    match conn.query_row(&sql, [id.to_string()], Listing::from_row) {
        Ok(listing) => Ok(Some(listing)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List an agent's listings, newest first.
pub fn list_listings_for_agent(conn: &Connection, agent_id: AgentId) -> Result<Vec<Listing>> {
    let sql = format!(
        "SELECT {LISTING_COLUMNS} FROM listings WHERE agent_id = ?1 ORDER BY created_at DESC"
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| Error::database(e.to_string()))?;

    let listings = stmt
        .query_map([agent_id.to_string()], Listing::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(listings)
}

/// Get the owning agent of a listing, or `None` if the listing does not exist.
pub fn listing_owner(conn: &Connection, id: ListingId) -> Result<Option<AgentId>> {
    let result = conn.query_row(
        "SELECT agent_id FROM listings WHERE id = ?1",
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

/// Overwrite the listing's cover URL (`None` clears it).
///
/// # Returns
///
/// * `Ok(true)` - If the listing was updated
/// * `Ok(false)` - If the listing does not exist
pub fn set_cover_url(conn: &Connection, id: ListingId, cover_url: Option<&str>) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE listings SET cover_url = :cover_url, updated_at = :updated_at WHERE id = :id",
            rusqlite::named_params! {
                ":id": id.to_string(),
                ":cover_url": cover_url,
                ":updated_at": Utc::now().to_rfc3339(),
            },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(n > 0)
}

/// Change a listing's publication status.
pub fn set_status(conn: &Connection, id: ListingId, status: ListingStatus) -> Result<()> {
    let n = conn
        .execute(
            "UPDATE listings SET status = :status, updated_at = :updated_at WHERE id = :id",
            rusqlite::named_params! {
                ":id": id.to_string(),
                ":status": status.to_string(),
                ":updated_at": Utc::now().to_rfc3339(),
            },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    if n == 0 {
        return Err(Error::not_found(format!("listing {id}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;
    use crate::queries::agents::create_agent;

    fn setup() -> (crate::pool::PooledConnection, AgentId) {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let agent = create_agent(&conn, "ana@example.com", "Ana", None, None).unwrap();
        (conn, agent.id)
    }

    #[test]
    fn test_create_and_get_listing() {
        let (conn, agent_id) = setup();

        let listing = create_listing(&conn, agent_id, "  Casa Azul ").unwrap();
        assert_eq!(listing.title, "Casa Azul");
        assert_eq!(listing.status, ListingStatus::Draft);

        let found = get_listing(&conn, listing.id).unwrap().unwrap();
        assert_eq!(found.agent_id, agent_id);
        assert!(found.cover_url.is_none());
    }

    #[test]
    fn test_create_listing_blank_title() {
        let (conn, agent_id) = setup();
        let err = create_listing(&conn, agent_id, "   ").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_create_listing_unknown_agent() {
        let (conn, _) = setup();
        let err = create_listing(&conn, AgentId::new(), "Casa").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_listing_owner() {
        let (conn, agent_id) = setup();
        let listing = create_listing(&conn, agent_id, "Casa").unwrap();

        assert_eq!(listing_owner(&conn, listing.id).unwrap(), Some(agent_id));
        assert_eq!(listing_owner(&conn, ListingId::new()).unwrap(), None);
    }

    #[test]
    fn test_set_and_clear_cover_url() {
        let (conn, agent_id) = setup();
        let listing = create_listing(&conn, agent_id, "Casa").unwrap();

        assert!(set_cover_url(&conn, listing.id, Some("http://cdn/x.jpg")).unwrap());
        let found = get_listing(&conn, listing.id).unwrap().unwrap();
        assert_eq!(found.cover_url.as_deref(), Some("http://cdn/x.jpg"));

        assert!(set_cover_url(&conn, listing.id, None).unwrap());
        let found = get_listing(&conn, listing.id).unwrap().unwrap();
        assert!(found.cover_url.is_none());

        assert!(!set_cover_url(&conn, ListingId::new(), None).unwrap());
    }

    #[test]
    fn test_list_listings_for_agent() {
        let (conn, agent_id) = setup();
        create_listing(&conn, agent_id, "One").unwrap();
        create_listing(&conn, agent_id, "Two").unwrap();

        let other = create_agent(&conn, "bo@example.com", "Bo", None, None).unwrap();
        create_listing(&conn, other.id, "Three").unwrap();

        assert_eq!(list_listings_for_agent(&conn, agent_id).unwrap().len(), 2);
        assert_eq!(list_listings_for_agent(&conn, other.id).unwrap().len(), 1);
    }

    #[test]
    fn test_set_status() {
        let (conn, agent_id) = setup();
        let listing = create_listing(&conn, agent_id, "Casa").unwrap();

        set_status(&conn, listing.id, ListingStatus::Active).unwrap();
        let found = get_listing(&conn, listing.id).unwrap().unwrap();
        assert_eq!(found.status, ListingStatus::Active);

        assert!(set_status(&conn, ListingId::new(), ListingStatus::Active)
            .unwrap_err()
            .is_not_found());
    }
}
