//! Supported sports and their provider naming.

use crate::error::{Result, SyncError};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A sport the pipeline knows how to sync.
///
/// Stored in the record store as its upper-case tag (`"NFL"`, `"MLB"`) and
/// used lower-case in provider URL paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sport {
    Nfl,
    Mlb,
}

impl Sport {
    pub const ALL: [Sport; 2] = [Sport::Nfl, Sport::Mlb];

    /// Upper-case tag used in the record store and logs.
    pub fn tag(&self) -> &'static str {
        match self {
            Sport::Nfl => "NFL",
            Sport::Mlb => "MLB",
        }
    }

    /// Lower-case segment used in provider URLs and object keys.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Sport::Nfl => "nfl",
            Sport::Mlb => "mlb",
        }
    }

    /// Provider teams endpoint, relative to the provider base URL.
    ///
    /// The provider is not consistent about casing between sports.
    pub fn teams_endpoint(&self) -> &'static str {
        match self {
            Sport::Nfl => "nfl/scores/json/Teams",
            Sport::Mlb => "mlb/scores/json/teams",
        }
    }

    /// Environment variable holding the provider key for this sport.
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            Sport::Nfl => "SPORTS_DATA_NFL_KEY",
            Sport::Mlb => "SPORTS_DATA_MLB_KEY",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Sport {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NFL" => Ok(Sport::Nfl),
            "MLB" => Ok(Sport::Mlb),
            _ => Err(SyncError::InvalidSport {
                sport: s.to_string(),
            }),
        }
    }
}

impl ToSql for Sport {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.tag()))
    }
}

impl FromSql for Sport {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: SyncError| FromSqlError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sport_from_str_is_case_insensitive() {
        assert_eq!("nfl".parse::<Sport>().unwrap(), Sport::Nfl);
        assert_eq!("MLB".parse::<Sport>().unwrap(), Sport::Mlb);
        assert_eq!(" Nfl ".parse::<Sport>().unwrap(), Sport::Nfl);
    }

    #[test]
    fn test_sport_from_str_rejects_unknown() {
        match "nba".parse::<Sport>() {
            Err(SyncError::InvalidSport { sport }) => assert_eq!(sport, "nba"),
            other => panic!("Expected InvalidSport, got {other:?}"),
        }
    }

    #[test]
    fn test_sport_naming() {
        assert_eq!(Sport::Nfl.to_string(), "NFL");
        assert_eq!(Sport::Mlb.path_segment(), "mlb");
        assert_eq!(Sport::Mlb.teams_endpoint(), "mlb/scores/json/teams");
        assert_eq!(Sport::Nfl.api_key_env_var(), "SPORTS_DATA_NFL_KEY");
    }
}
