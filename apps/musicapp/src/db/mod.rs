//! SQLite storage for users, albums and songs.
//!
//! Connections are opened here, tuned, and migrated before the server uses
//! them. Row mapping and SQL live in [`queries`].

use rusqlite::Connection;
use std::path::Path;

pub mod models;
pub mod queries;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("src/db/migrations");
}

/// Failures while opening or migrating the library database.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("failed to open library database: {0}")]
    Open(#[from] rusqlite::Error),

    #[error("failed to migrate library schema: {0}")]
    Migrate(#[from] refinery::Error),
}

/// Enables cascades and applies pending migrations.
///
/// `foreign_keys` is per connection in SQLite; album and song deletes depend
/// on it.
pub fn prepare(mut conn: Connection) -> Result<Connection, DbError> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;",
    )?;

    let report = embedded::migrations::runner().run(&mut conn)?;
    for migration in report.applied_migrations() {
        tracing::info!(version = migration.version(), name = %migration.name(), "Applied migration");
    }

    Ok(conn)
}

/// Opens the library file, creating it on first use.
pub fn init_db<P: AsRef<Path>>(db_path: P) -> Result<Connection, DbError> {
    prepare(Connection::open(db_path)?)
}

/// Fresh in-memory library, used by tests.
pub fn init_db_memory() -> Result<Connection, DbError> {
    prepare(Connection::open_in_memory()?)
}
