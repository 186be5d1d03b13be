//! Core type definitions shared by the database and photo layers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bucket used for listing photos when a row does not name one.
pub const DEFAULT_PHOTO_BUCKET: &str = "property-images";

/// Publication status of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    /// Being prepared by the agent, not visible to renters.
    #[default]
    Draft,
    /// Published and accepting inquiries.
    Active,
    /// Withdrawn from publication.
    Inactive,
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}

impl std::str::FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(format!("Unknown listing status: {}", s)),
        }
    }
}
