//! CLI argument definitions and parsing.

pub mod types;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use types::{AthleteApiId, Sport};

use crate::storage::{AthleteQuery, AthleteSort};

/// Sport selection shared by every job.
#[derive(Debug, Args)]
pub struct SportArg {
    /// Sport to process: nfl | mlb
    #[clap(long, short)]
    pub sport: Sport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    /// Ascending athlete id
    Id,
    /// Descending fantasy score
    Score,
}

impl From<SortArg> for AthleteSort {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Id => AthleteSort::Id,
            SortArg::Score => AthleteSort::Score,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sync teams, then athletes with their generated assets.
    ///
    /// Each phase only runs when the store has no rows of that kind for the
    /// sport, so repeated runs are no-ops.
    Sync {
        #[clap(flatten)]
        sport: SportArg,

        /// Print the report as JSON.
        #[clap(long)]
        json: bool,
    },

    /// Merge the current season's stats into the store.
    UpdateStats {
        #[clap(flatten)]
        sport: SportArg,
    },

    /// Recompute fantasy scores of game teams in active games.
    UpdateScores {
        #[clap(flatten)]
        sport: SportArg,
    },

    /// Rebuild and re-upload assets for every stored athlete.
    RegenerateAssets {
        #[clap(flatten)]
        sport: SportArg,
    },

    /// Emit starter pack `execute_add_athletes` batches as JSON lines.
    StarterPack {
        #[clap(flatten)]
        sport: SportArg,

        /// Athlete provider ids (repeatable). Defaults to every athlete of the sport.
        #[clap(long = "id")]
        ids: Option<Vec<AthleteApiId>>,
    },

    /// List stored athletes with their season stats.
    Athletes {
        /// Filter by sport.
        #[clap(long, short)]
        sport: Option<Sport>,

        /// Filter by season (e.g. 2023REG).
        #[clap(long)]
        season: Option<String>,

        #[clap(long, value_enum, default_value_t = SortArg::Id)]
        sort: SortArg,

        #[clap(long)]
        limit: Option<u32>,

        #[clap(long)]
        offset: Option<u32>,

        /// Output results as JSON instead of text lines.
        #[clap(long)]
        json: bool,
    },
}

impl Commands {
    /// Listing query for the `athletes` subcommand.
    pub fn athlete_query(&self) -> Option<AthleteQuery> {
        match self {
            Commands::Athletes {
                sport,
                season,
                sort,
                limit,
                offset,
                ..
            } => Some(AthleteQuery {
                sport: *sport,
                season: season.clone(),
                sort: (*sort).into(),
                limit: *limit,
                offset: *offset,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Parser)]
#[clap(
    name = "athlete-sync",
    about = "Sports data sync and athlete asset pipeline"
)]
pub struct AthleteSync {
    /// Record store path (or set `ATHLETE_SYNC_DB`).
    #[clap(long, global = true)]
    pub db: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sync() {
        let cli = AthleteSync::try_parse_from(["athlete-sync", "sync", "--sport", "nfl"]).unwrap();
        match cli.command {
            Commands::Sync { sport, json } => {
                assert_eq!(sport.sport, Sport::Nfl);
                assert!(!json);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(cli.db.is_none());
    }

    #[test]
    fn test_global_db_flag_and_ids() {
        let cli = AthleteSync::try_parse_from([
            "athlete-sync",
            "starter-pack",
            "-s",
            "MLB",
            "--id",
            "10",
            "--id",
            "20",
            "--db",
            "/tmp/x.db",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        match cli.command {
            Commands::StarterPack { sport, ids } => {
                assert_eq!(sport.sport, Sport::Mlb);
                assert_eq!(ids, Some(vec![AthleteApiId::new(10), AthleteApiId::new(20)]));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_athlete_query_from_args() {
        let cli = AthleteSync::try_parse_from([
            "athlete-sync",
            "athletes",
            "--sort",
            "score",
            "--limit",
            "5",
            "--season",
            "2023REG",
        ])
        .unwrap();
        let query = cli.command.athlete_query().unwrap();
        assert_eq!(query.sort, AthleteSort::Score);
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.season.as_deref(), Some("2023REG"));
        assert_eq!(query.sport, None);
    }

    #[test]
    fn test_unknown_sport_rejected() {
        assert!(AthleteSync::try_parse_from(["athlete-sync", "sync", "--sport", "nba"]).is_err());
    }
}
