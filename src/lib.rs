//! Rentpv - property listing backend
//!
//! The library crate holds the listing photo manager, configuration, and the
//! HTTP server so they can be driven from integration tests.

pub mod config;
pub mod photos;
pub mod server;
