//! SQLite access shared by every service.
//!
//! Each request opens its own short-lived connection; SQLite's file locking is
//! the only coordination between concurrent requests.

pub mod defaults;
pub mod queries;
pub mod schema;
pub mod templates;

use log::info;
use rusqlite::Connection;
use std::path::Path;

/// Opens a connection to the analytics database.
pub fn open(path: &Path) -> rusqlite::Result<Connection> {
    Connection::open(path)
}

/// Creates any missing tables and, when `seed_defaults` is set, stores the
/// built-in queries and templates for slugs that are not present yet.
pub fn bootstrap(path: &Path, seed_defaults: bool) -> rusqlite::Result<()> {
    let conn = open(path)?;
    schema::ensure_tables(&conn)?;
    if seed_defaults {
        let (queries, templates) = defaults::seed(&conn)?;
        info!(
            "Seeded {} default report queries and {} default templates",
            queries, templates
        );
    }
    Ok(())
}
