//! External (provider) ID types.

use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Provider-assigned athlete id (`PlayerID`).
///
/// Kept distinct from local row ids so the two can never be mixed up in
/// store lookups.
///
/// # Examples
///
/// ```rust
/// use athlete_sync::AthleteApiId;
///
/// let id = AthleteApiId::new(18890);
/// assert_eq!(id.as_u64(), 18890);
/// assert_eq!(id.to_string(), "18890");
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AthleteApiId(pub u64);

impl AthleteApiId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AthleteApiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AthleteApiId {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse()
            .map(Self)
            .map_err(|e: std::num::ParseIntError| SyncError::InvalidConfig {
                env_var: "athlete id".to_string(),
                message: format!("{s:?}: {e}"),
            })
    }
}

/// Provider-assigned team id (`GlobalTeamID`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamApiId(pub u64);

impl TeamApiId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TeamApiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
