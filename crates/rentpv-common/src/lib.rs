//! Rentpv-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across rentpv:
//!
//! - **Typed IDs**: Type-safe UUID wrappers for agents, listings, and photos
//! - **Core Types**: Listing status and the default photo bucket
//! - **Path Utilities**: Image content-type detection and file name sanitizing
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use rentpv_common::{ListingId, ListingStatus, Error, Result};
//! use rentpv_common::paths::image_content_type;
//! use std::path::Path;
//!
//! let listing_id = ListingId::new();
//! let status = ListingStatus::Draft;
//!
//! assert_eq!(image_content_type(Path::new("facade.jpg")), Some("image/jpeg"));
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("listing"))
//! }
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
