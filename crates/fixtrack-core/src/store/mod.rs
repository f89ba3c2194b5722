//! SQLite-backed ticket store.
//!
//! Runtime defaults are intentionally conservative:
//! - `journal_mode = WAL` to allow concurrent readers while writers append
//! - `busy_timeout = 5s` to reduce transient lock failures under contention
//! - `foreign_keys = ON` to protect the customer reference and side tables
//!
//! Every mutation is guarded by the `version` column on `tickets`: writers
//! read, compute, then write conditionally on the version being unchanged,
//! retrying the whole cycle on conflict. Ticket row, ledger append, and
//! communication append commit in one transaction, so partial application
//! is never observable.

pub mod customers;
pub mod lookup;
pub mod migrations;
pub mod schema;
pub mod tickets;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::{path::Path, time::Duration};

/// Busy timeout used for store connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the ticket store, apply runtime pragmas, and migrate
/// schema to the latest version.
///
/// # Errors
///
/// Returns an error if opening/configuring/migrating the database fails.
pub fn open_store(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create store directory {}", parent.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("open ticket store {}", path.display()))?;

    configure_connection(&conn).context("configure sqlite pragmas")?;
    migrations::migrate(&mut conn).context("apply store migrations")?;

    Ok(conn)
}

/// In-memory store with the full schema; used by tests and by callers that
/// want a scratch instance.
///
/// # Errors
///
/// Returns an error if configuring or migrating the database fails.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("open in-memory store")?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("enable foreign keys")?;
    migrations::migrate(&mut conn).context("apply store migrations")?;
    Ok(conn)
}

/// Timestamps persist as microseconds since the Unix epoch.
pub(crate) fn to_us(at: chrono::DateTime<chrono::Utc>) -> i64 {
    at.timestamp_micros()
}

pub(crate) fn from_us(
    column: usize,
    us: i64,
) -> rusqlite::Result<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::from_timestamp_micros(us).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Integer,
            format!("timestamp out of range: {us}").into(),
        )
    })
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}
