//! Internal Rust models matching the database schema.
//!
//! Rows are decoded with `from_row` constructors that expect the column
//! order of the matching `*_COLUMNS` constant in [`crate::queries`].

use chrono::{DateTime, Utc};
use rentpv_common::{AgentId, ListingId, ListingStatus, PhotoId, DEFAULT_PHOTO_BUCKET};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn parse_id<T: From<Uuid>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    let uuid = Uuid::parse_str(&s).map_err(|e| conversion_error(idx, e))?;
    Ok(T::from(uuid))
}

fn parse_timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

/// Listing agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    pub id: AgentId,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Agent {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            email: row.get(1)?,
            full_name: row.get(2)?,
            phone: row.get(3)?,
            company: row.get(4)?,
            created_at: parse_timestamp(row, 5)?,
        })
    }
}

/// Rentable property listing.
///
/// Only the fields the photo subsystem and the command line need are
/// modelled here; `cover_url` is owned by the photo manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub id: ListingId,
    pub agent_id: AgentId,
    pub title: String,
    pub status: ListingStatus,
    pub cover_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let status: String = row.get(3)?;
        Ok(Self {
            id: parse_id(row, 0)?,
            agent_id: parse_id(row, 1)?,
            title: row.get(2)?,
            status: status.parse().map_err(|e: String| {
                conversion_error(3, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            })?,
            cover_url: row.get(4)?,
            created_at: parse_timestamp(row, 5)?,
            updated_at: parse_timestamp(row, 6)?,
        })
    }
}

/// A photo attached to a listing.
///
/// Either `storage_key` points at a blob in the object store, or the row
/// predates the object store and only carries a `direct_url`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Photo {
    pub id: PhotoId,
    pub listing_id: ListingId,
    pub storage_key: Option<String>,
    pub bucket: Option<String>,
    pub direct_url: Option<String>,
    /// 1-based position; the photo at 1 is the listing cover.
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

impl Photo {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            listing_id: parse_id(row, 1)?,
            storage_key: row.get(2)?,
            bucket: row.get(3)?,
            direct_url: row.get(4)?,
            display_order: row.get(5)?,
            created_at: parse_timestamp(row, 6)?,
        })
    }

    /// Bucket holding this photo's blob, falling back to the default.
    pub fn bucket_or_default(&self) -> &str {
        self.bucket.as_deref().unwrap_or(DEFAULT_PHOTO_BUCKET)
    }

    pub fn is_cover(&self) -> bool {
        self.display_order == 1
    }
}

/// Values for a photo row that has not been inserted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPhoto {
    pub listing_id: ListingId,
    pub storage_key: Option<String>,
    pub bucket: Option<String>,
    pub direct_url: Option<String>,
    pub display_order: i32,
}
