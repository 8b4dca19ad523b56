//! Advisory per-(sport, phase) locks with an expiry

use super::schema::SyncDatabase;
use crate::cli::types::Sport;
use crate::Result;
use rusqlite::{params, OptionalExtension};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Locks older than this are considered abandoned by a crashed run.
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Current time as unix seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

impl SyncDatabase {
    /// Take the lock for (sport, phase) unless a live holder has it.
    ///
    /// An expired lock is replaced. Returns true when `holder` now owns it.
    pub fn try_acquire_phase_lock(
        &mut self,
        sport: Sport,
        phase: &str,
        holder: &str,
        ttl: Duration,
        now: i64,
    ) -> Result<bool> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM sync_locks WHERE sport = ? AND phase = ? AND expires_at < ?",
            params![sport, phase, now],
        )?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO sync_locks (sport, phase, holder, acquired_at, expires_at)
             VALUES (?, ?, ?, ?, ?)",
            params![sport, phase, holder, now, now + ttl.as_secs() as i64],
        )?;
        tx.commit()?;
        Ok(inserted > 0)
    }

    /// Release the lock if `holder` still owns it.
    pub fn release_phase_lock(&mut self, sport: Sport, phase: &str, holder: &str) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM sync_locks WHERE sport = ? AND phase = ? AND holder = ?",
            params![sport, phase, holder],
        )?;
        Ok(rows > 0)
    }

    pub fn phase_lock_holder(&self, sport: Sport, phase: &str) -> Result<Option<String>> {
        let holder = self
            .conn
            .query_row(
                "SELECT holder FROM sync_locks WHERE sport = ? AND phase = ?",
                params![sport, phase],
                |row| row.get(0),
            )
            .optional()?;
        Ok(holder)
    }
}
