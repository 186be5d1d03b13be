//! Database query modules.
//!
//! - agents: agent accounts that own listings
//! - listings: listing records and the denormalized cover URL
//! - photos: listing photos and their display order

pub mod agents;
pub mod listings;
pub mod photos;
