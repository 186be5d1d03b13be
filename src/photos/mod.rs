//! Listing photos: upload, ordering, and cover selection.
//!
//! [`PhotoManager`] drives everything. It talks to blob storage through
//! [`ObjectStore`] and to the relational side through [`PhotoCatalog`].

pub mod catalog;
pub mod error;
pub mod manager;
pub mod object_store;
pub mod ordering;
pub mod policy;

pub use catalog::{PhotoCatalog, SqliteCatalog};
pub use error::{PhotoError, PhotoResult};
pub use manager::PhotoManager;
pub use object_store::{FsObjectStore, ObjectStore, PutOptions};
pub use policy::{UploadMetadata, UploadPolicy};
