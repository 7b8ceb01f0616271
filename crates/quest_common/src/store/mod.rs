//! Questline Store v0.1.0
//!
//! SQLite-backed persistence for the player, the task tree, the completion
//! ledger and blueprint state.
//!
//! The connection sits behind a mutex. All access goes through
//! [`Store::with_tx`], which runs a closure against a [`Repo`] inside one
//! IMMEDIATE transaction: commit on `Ok`, rollback on `Err`.

mod blueprints;
mod completions;
mod players;
mod schema;
mod tasks;

pub use schema::SCHEMA_VERSION;

use crate::error::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Store backed by a single SQLite connection
pub struct Store {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl Store {
    /// Open or create the store at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        debug!("opened store at {:?}", path);
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Throwaway in-memory store
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, db_path: Option<PathBuf>) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    /// Database file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Run `f` inside one transaction
    pub fn with_tx<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Repo<'_>) -> Result<T>,
    {
        // A poisoned lock only means another caller panicked mid-closure; its
        // transaction was rolled back on drop, so the connection is clean.
        let mut conn = self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&Repo::new(&tx))?;
        tx.commit()?;
        Ok(value)
    }
}

/// Typed queries over one open transaction
pub struct Repo<'c> {
    conn: &'c Connection,
}

impl<'c> Repo<'c> {
    fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Run `f` inside a named savepoint. On error only the savepoint's writes
    /// are undone; the enclosing transaction stays usable.
    pub fn savepoint<T, F>(&self, name: &str, f: F) -> Result<T>
    where
        F: FnOnce(&Repo<'c>) -> Result<T>,
    {
        self.conn.execute_batch(&format!("SAVEPOINT {}", name))?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch(&format!("RELEASE {}", name))?;
                Ok(value)
            }
            Err(e) => {
                self.conn
                    .execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name}", name = name))?;
                Err(e)
            }
        }
    }
}

// ============================================================================
// Column helpers
// ============================================================================

/// Fixed-width RFC 3339 so stored timestamps compare correctly as text
pub(crate) fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn parse_opt_ts(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    raw.map(|s| parse_ts(idx, &s)).transpose()
}

/// XP counters are unsigned in memory, INTEGER in SQLite
pub(crate) fn xp_to_sql(xp: u64) -> i64 {
    i64::try_from(xp).unwrap_or(i64::MAX)
}

pub(crate) fn xp_from_sql(raw: i64) -> u64 {
    raw.max(0) as u64
}
