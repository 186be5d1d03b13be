//! Rentpv-DB: Database schema, migrations, and query operations
//!
//! This crate stores agents, listings, and listing photos in SQLite using
//! rusqlite and r2d2 connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use rentpv_db::pool::{init_pool, get_conn};
//! use rentpv_db::queries::{agents, listings};
//!
//! let pool = init_pool("/var/lib/rentpv/rentpv.db").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let agent = agents::create_agent(&conn, "ana@example.com", "Ana Ruiz", None, None).unwrap();
//! let listing = listings::create_listing(&conn, agent.id, "Casa Azul").unwrap();
//! println!("Created listing: {}", listing.id);
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
