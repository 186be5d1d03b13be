//! Schema migrations for the listings database.
//!
//! Each step is a SQL file compiled into the binary. Applied steps are
//! recorded in `schema_migrations`, so opening an existing database only
//! runs the steps it has not seen yet.

use chrono::Utc;
use rusqlite::Connection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Schema bookkeeping failed: {0}")]
    Bookkeeping(#[from] rusqlite::Error),

    #[error("Schema step {version} ({name}) failed: {source}")]
    Step {
        version: i64,
        name: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}

/// `(version, name, sql)`, in ascending version order.
const SCHEMA_STEPS: &[(i64, &str, &str)] = &[(
    1,
    "agents_listings_photos",
    include_str!("001_initial.sql"),
)];

/// Bring the schema up to date and return how many steps were applied.
///
/// Every step runs in its own transaction together with its bookkeeping
/// row, so a failed step leaves the database at the previous version.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )?;

    let current: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    let mut applied = 0;
    for &(version, name, sql) in SCHEMA_STEPS.iter().filter(|(v, _, _)| *v > current) {
        let step_err = |source: rusqlite::Error| MigrationError::Step {
            version,
            name,
            source,
        };

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql).map_err(step_err)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![version, name, Utc::now().to_rfc3339()],
        )
        .map_err(step_err)?;
        tx.commit().map_err(step_err)?;

        tracing::info!(version, name, "Applied schema step");
        applied += 1;
    }

    if applied == 0 {
        tracing::debug!(version = current, "Schema is up to date");
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrated() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_steps_apply_once_and_are_recorded() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(run_migrations(&conn).unwrap(), SCHEMA_STEPS.len());
        assert_eq!(run_migrations(&conn).unwrap(), 0);

        let recorded: Vec<(i64, String)> = conn
            .prepare("SELECT version, name FROM schema_migrations ORDER BY version")
            .unwrap()
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(recorded, vec![(1, "agents_listings_photos".to_string())]);
    }

    #[test]
    fn test_listing_tables_exist() {
        let conn = migrated();
        for table in ["agents", "listings", "photos"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "missing table {table}");
        }
    }

    fn seed_listing(conn: &Connection) {
        conn.execute_batch(
            "INSERT INTO agents (id, email, full_name, created_at)
                 VALUES ('a1', 'a@example.com', 'A', '2024-01-01T00:00:00Z');
             INSERT INTO listings (id, agent_id, title, created_at, updated_at)
                 VALUES ('l1', 'a1', 'T', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z');",
        )
        .unwrap();
    }

    #[test]
    fn test_photo_order_must_be_positive() {
        let conn = migrated();
        seed_listing(&conn);

        let result = conn.execute(
            "INSERT INTO photos (id, listing_id, display_order, created_at)
             VALUES ('p1', 'l1', 0, '2024-01-01T00:00:00Z')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_deleting_listing_cascades_to_photos() {
        let conn = migrated();
        seed_listing(&conn);
        conn.execute(
            "INSERT INTO photos (id, listing_id, display_order, created_at)
             VALUES ('p1', 'l1', 1, '2024-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        conn.execute("DELETE FROM listings WHERE id = 'l1'", []).unwrap();

        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
