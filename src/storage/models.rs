//! Data models for the record store

use crate::cli::types::{AthleteApiId, Sport, TeamApiId};
use crate::provider::{SeasonStatRecord, TeamRecord};
use serde::{Deserialize, Serialize};

/// A stored team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub api_id: TeamApiId,
    pub sport: Sport,
    pub name: String,
    pub key: String,
    pub location: Option<String>,
    pub primary_color: String,
    pub secondary_color: String,
}

/// A team ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTeam {
    pub api_id: TeamApiId,
    pub sport: Sport,
    pub name: String,
    pub key: String,
    pub location: Option<String>,
    pub primary_color: String,
    pub secondary_color: String,
}

impl NewTeam {
    pub fn from_record(record: &TeamRecord, sport: Sport) -> Self {
        Self {
            api_id: record.global_team_id,
            sport,
            name: record.name.clone(),
            key: record.key.clone(),
            location: record.city.clone(),
            primary_color: record.primary_hex(),
            secondary_color: record.secondary_hex(),
        }
    }
}

/// A stored athlete. Both asset locators are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Athlete {
    pub id: i64,
    pub api_id: AthleteApiId,
    pub team_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub position: Option<String>,
    pub salary: Option<f64>,
    pub jersey: Option<u32>,
    pub is_active: bool,
    pub is_injured: bool,
    pub nft_image: String,
    pub nft_animation: String,
}

/// An athlete whose assets have both been uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAthlete {
    pub api_id: AthleteApiId,
    pub team_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub position: Option<String>,
    pub salary: Option<f64>,
    pub jersey: Option<u32>,
    pub is_active: bool,
    pub is_injured: bool,
    pub nft_image: String,
    pub nft_animation: String,
}

/// Numeric season fields. Absent provider values are stored as NULL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatLine {
    pub fantasy_score: Option<f64>,
    pub completion: Option<f64>,
    pub carries: Option<f64>,
    pub passing_yards: Option<f64>,
    pub rushing_yards: Option<f64>,
    pub receiving_yards: Option<f64>,
    pub interceptions: Option<f64>,
    pub passing_touchdowns: Option<f64>,
    pub rushing_touchdowns: Option<f64>,
    pub receiving_touchdowns: Option<f64>,
    pub targets: Option<f64>,
    pub receptions: Option<f64>,
}

impl From<&SeasonStatRecord> for StatLine {
    fn from(r: &SeasonStatRecord) -> Self {
        Self {
            fantasy_score: r.fantasy_points_draft_kings,
            completion: r.passing_completion_percentage,
            carries: r.rushing_attempts,
            passing_yards: r.passing_yards,
            rushing_yards: r.rushing_yards,
            receiving_yards: r.receiving_yards,
            interceptions: r.passing_interceptions,
            passing_touchdowns: r.passing_touchdowns,
            rushing_touchdowns: r.rushing_touchdowns,
            receiving_touchdowns: r.receiving_touchdowns,
            targets: r.receiving_targets,
            receptions: r.receptions,
        }
    }
}

/// Season stat row, unique per (athlete, season).
///
/// `id` is `None` for a staged row that has not been written yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteStat {
    pub id: Option<i64>,
    pub athlete_id: i64,
    pub season: String,
    pub position: Option<String>,
    pub line: StatLine,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewGame {
    pub game_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub sport: Sport,
    /// Unix seconds.
    pub start_time: i64,
    pub end_time: i64,
    pub prize: Option<f64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: i64,
    pub game_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub sport: Sport,
    pub start_time: i64,
    pub end_time: i64,
    pub prize: Option<f64>,
    pub image: Option<String>,
}

impl Game {
    pub fn is_active_at(&self, now: i64) -> bool {
        self.start_time <= now && now <= self.end_time
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameTeam {
    pub id: i64,
    pub game_id: i64,
    pub name: String,
    pub fantasy_score: f64,
}

/// A game team with the external ids of its current athletes.
#[derive(Debug, Clone, PartialEq)]
pub struct GameTeamRoster {
    pub team: GameTeam,
    pub athletes: Vec<AthleteApiId>,
}

/// An active game with its teams loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveGame {
    pub game: Game,
    pub teams: Vec<GameTeamRoster>,
}

/// Recomputed aggregate for one game team.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameTeamScore {
    pub game_team_id: i64,
    pub fantasy_score: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AthleteSort {
    #[default]
    Id,
    Score,
}

/// Filter and paging for the athlete listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AthleteQuery {
    pub sport: Option<Sport>,
    pub season: Option<String>,
    pub sort: AthleteSort,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// One listing row: athlete, team key and one season's stat line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteListing {
    pub athlete: Athlete,
    pub team_key: String,
    pub sport: Sport,
    pub season: String,
    pub stats: StatLine,
}
