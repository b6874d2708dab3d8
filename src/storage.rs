//! Durable store for the universe, backed by a single `SQLite` file.
//!
//! ```text
//! planets         # Planets and moons with their resource balances
//! planet_units    # Ships and defenses stationed on each planet
//! fleet_missions  # Every mission ever flown, outbound and return legs
//! messages        # System messages delivered to players
//! debris_fields   # Wreckage left by battles, keyed by coordinate
//! ```
//!
//! Reads go through [`Storage`] directly. Anything that mutates state runs
//! inside an IMMEDIATE transaction from [`Storage::begin`], using the free
//! functions in each submodule, so concurrent writers are serialized by
//! `SQLite` itself.

pub mod debris;
pub mod message;
pub mod mission;
pub mod planet;

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, io};

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::model::{InsufficientResources, InsufficientUnits, MissionId, PlanetId};

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("planet not found: {0}")]
    PlanetNotFound(PlanetId),

    #[error("mission not found: {0}")]
    MissionNotFound(MissionId),

    #[error("a body already occupies {0}")]
    SlotTaken(String),

    #[error(transparent)]
    InsufficientResources(#[from] InsufficientResources),

    #[error(transparent)]
    InsufficientUnits(#[from] InsufficientUnits),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS planets (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id   INTEGER NOT NULL,
    name        TEXT NOT NULL,
    galaxy      INTEGER NOT NULL,
    system      INTEGER NOT NULL,
    position    INTEGER NOT NULL,
    body_type   INTEGER NOT NULL,
    diameter    INTEGER NOT NULL,
    metal       INTEGER NOT NULL DEFAULT 0,
    crystal     INTEGER NOT NULL DEFAULT 0,
    deuterium   INTEGER NOT NULL DEFAULT 0,
    energy      INTEGER NOT NULL DEFAULT 0,
    UNIQUE (galaxy, system, position, body_type)
);
CREATE INDEX IF NOT EXISTS planets_by_player ON planets (player_id);

CREATE TABLE IF NOT EXISTS planet_units (
    planet_id   INTEGER NOT NULL REFERENCES planets (id) ON DELETE CASCADE,
    unit        TEXT NOT NULL,
    amount      INTEGER NOT NULL,
    PRIMARY KEY (planet_id, unit)
);

CREATE TABLE IF NOT EXISTS fleet_missions (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id         INTEGER NOT NULL,
    mission_type      INTEGER NOT NULL,
    parent_id         INTEGER REFERENCES fleet_missions (id),
    planet_id_from    INTEGER,
    galaxy_from       INTEGER NOT NULL,
    system_from       INTEGER NOT NULL,
    position_from     INTEGER NOT NULL,
    type_from         INTEGER NOT NULL,
    planet_id_to      INTEGER,
    galaxy_to         INTEGER NOT NULL,
    system_to         INTEGER NOT NULL,
    position_to       INTEGER NOT NULL,
    type_to           INTEGER NOT NULL,
    target_owner_id   INTEGER,
    units             TEXT NOT NULL,
    metal             INTEGER NOT NULL,
    crystal           INTEGER NOT NULL,
    deuterium         INTEGER NOT NULL,
    time_departure    INTEGER NOT NULL,
    time_arrival      INTEGER NOT NULL,
    processed         INTEGER NOT NULL DEFAULT 0,
    canceled          INTEGER NOT NULL DEFAULT 0,
    CHECK (time_arrival >= time_departure)
);
CREATE INDEX IF NOT EXISTS missions_due ON fleet_missions (processed, time_arrival);

CREATE TABLE IF NOT EXISTS messages (
    id          TEXT PRIMARY KEY,
    player_id   INTEGER NOT NULL,
    kind        TEXT NOT NULL,
    params      TEXT NOT NULL,
    created_at  INTEGER NOT NULL,
    viewed      INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS messages_by_player ON messages (player_id, created_at);

CREATE TABLE IF NOT EXISTS debris_fields (
    galaxy      INTEGER NOT NULL,
    system      INTEGER NOT NULL,
    position    INTEGER NOT NULL,
    metal       INTEGER NOT NULL,
    crystal     INTEGER NOT NULL,
    deuterium   INTEGER NOT NULL,
    PRIMARY KEY (galaxy, system, position)
);
";

/// The universe's durable store.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Opens (creating if needed) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::init(conn)
    }

    /// A private store that vanishes when dropped.
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Returns the default store path: `~/.armada/universe.sqlite`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".armada").join("universe.sqlite"))
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Starts a write transaction, taking the database write lock up front.
    ///
    /// Dropping the transaction without committing rolls it back.
    pub fn begin(&self) -> Result<Transaction<'_>> {
        Ok(Transaction::new_unchecked(
            &self.conn,
            TransactionBehavior::Immediate,
        )?)
    }

    /// Starts a read transaction. It sees one consistent snapshot and takes
    /// no write lock, so it never waits behind a writer.
    pub fn snapshot(&self) -> Result<Transaction<'_>> {
        Ok(Transaction::new_unchecked(
            &self.conn,
            TransactionBehavior::Deferred,
        )?)
    }
}

/// Reads a non-negative integer column stored as `i64`.
pub(crate) fn to_u64(value: i64, column: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| StorageError::Corrupt(format!("negative {column}: {value}")))
}

/// Converts a quantity for storage. Game quantities never approach `i64::MAX`.
pub(crate) fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

pub(crate) fn to_u32(value: i64, column: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| StorageError::Corrupt(format!("invalid {column}: {value}")))
}

pub(crate) fn timestamp(seconds: i64, column: &str) -> Result<jiff::Timestamp> {
    jiff::Timestamp::from_second(seconds)
        .map_err(|e| StorageError::Corrupt(format!("invalid {column}: {e}")))
}
