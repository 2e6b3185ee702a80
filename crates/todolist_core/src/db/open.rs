//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open the preference file (or a throwaway in-memory database).
//! - Migrate it before returning the connection.
//!
//! # Invariants
//! - Returned connections have migrations fully applied.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Creates the file when missing.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    open_with(path.display().to_string(), || Connection::open(path))
}

/// Opens an in-memory SQLite database and applies all pending migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with(":memory:".to_string(), Connection::open_in_memory)
}

fn open_with(
    target: String,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    let result = open()
        .and_then(|conn| {
            conn.busy_timeout(Duration::from_secs(5))?;
            Ok(conn)
        })
        .map_err(|source| DbError::Open {
            target: target.clone(),
            source,
        })
        .and_then(|mut conn| {
            apply_migrations(&mut conn)?;
            Ok(conn)
        });

    match &result {
        Ok(_) => info!(
            "event=db_open module=db status=ok target={} duration_ms={}",
            target,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error target={} duration_ms={} error={}",
            target,
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}
