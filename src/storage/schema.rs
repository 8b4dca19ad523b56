//! Database schema and connection management

use crate::{error::SyncError, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Record store for teams, athletes, stats and games
pub struct SyncDatabase {
    pub(crate) conn: Connection,
}

/// Store handle shared by concurrent pipeline units.
///
/// Lock it only for synchronous work; never hold the guard across an await.
pub type SharedDatabase = Arc<Mutex<SyncDatabase>>;

impl SyncDatabase {
    /// Open (or create) the database file and ensure tables exist
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Private in-memory database, used by tests and dry runs
    pub fn new_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let mut db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    pub fn into_shared(self) -> SharedDatabase {
        Arc::new(Mutex::new(self))
    }

    /// Initialize the database schema
    pub(crate) fn initialize_schema(&mut self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS teams (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                api_id INTEGER NOT NULL,
                sport TEXT NOT NULL,
                name TEXT NOT NULL,
                key TEXT NOT NULL,
                location TEXT,
                primary_color TEXT NOT NULL,
                secondary_color TEXT NOT NULL,
                UNIQUE (sport, api_id)
            )",
            [],
        )?;

        // Both locators are NOT NULL: an athlete exists with its assets or not at all.
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS athletes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                api_id INTEGER NOT NULL UNIQUE,
                team_id INTEGER NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                position TEXT,
                salary REAL,
                jersey INTEGER,
                is_active INTEGER NOT NULL DEFAULT 0,
                is_injured INTEGER NOT NULL DEFAULT 0,
                nft_image TEXT NOT NULL,
                nft_animation TEXT NOT NULL,
                FOREIGN KEY (team_id) REFERENCES teams(id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS athlete_stats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                athlete_id INTEGER NOT NULL,
                season TEXT NOT NULL,
                position TEXT,
                fantasy_score REAL,
                completion REAL,
                carries REAL,
                passing_yards REAL,
                rushing_yards REAL,
                receiving_yards REAL,
                interceptions REAL,
                passing_touchdowns REAL,
                rushing_touchdowns REAL,
                receiving_touchdowns REAL,
                targets REAL,
                receptions REAL,
                UNIQUE (athlete_id, season),
                FOREIGN KEY (athlete_id) REFERENCES athletes(id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS games (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                game_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                sport TEXT NOT NULL,
                start_time INTEGER NOT NULL,
                end_time INTEGER NOT NULL,
                prize REAL,
                image TEXT
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS game_teams (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                game_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                fantasy_score REAL NOT NULL DEFAULT 0,
                FOREIGN KEY (game_id) REFERENCES games(id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS game_team_athletes (
                game_team_id INTEGER NOT NULL,
                athlete_id INTEGER NOT NULL,
                PRIMARY KEY (game_team_id, athlete_id),
                FOREIGN KEY (game_team_id) REFERENCES game_teams(id),
                FOREIGN KEY (athlete_id) REFERENCES athletes(id)
            )",
            [],
        )?;

        // Advisory locks closing the count-then-sync race between runs.
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS sync_locks (
                sport TEXT NOT NULL,
                phase TEXT NOT NULL,
                holder TEXT NOT NULL,
                acquired_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL,
                PRIMARY KEY (sport, phase)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_athletes_team ON athletes(team_id)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_games_window
             ON games(sport, start_time, end_time)",
            [],
        )?;

        Ok(())
    }
}

/// Lock the shared store, mapping poisoning to [`SyncError::LockPoisoned`].
pub fn lock_db(db: &SharedDatabase) -> Result<MutexGuard<'_, SyncDatabase>> {
    db.lock().map_err(|_| SyncError::LockPoisoned)
}
