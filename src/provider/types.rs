//! Typed provider payloads.
//!
//! Every shape is decoded once at the boundary; the rest of the pipeline
//! never indexes into raw JSON.

use crate::cli::types::{AthleteApiId, TeamApiId};
use serde::{Deserialize, Serialize};

#[cfg(test)]
mod tests;

/// One entry of the teams endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TeamRecord {
    #[serde(rename = "GlobalTeamID")]
    pub global_team_id: TeamApiId,
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub primary_color: Option<String>,
    #[serde(default)]
    pub secondary_color: Option<String>,
}

impl TeamRecord {
    /// Provider colours are bare hex; the store keeps them `#`-prefixed.
    pub fn primary_hex(&self) -> String {
        hex_color(self.primary_color.as_deref())
    }

    pub fn secondary_hex(&self) -> String {
        hex_color(self.secondary_color.as_deref())
    }
}

fn hex_color(raw: Option<&str>) -> String {
    format!("#{}", raw.unwrap_or_default())
}

/// One entry of the players endpoint.
///
/// MLB reports the jersey as `Jersey`, NFL as `Number`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayerRecord {
    #[serde(rename = "PlayerID")]
    pub player_id: AthleteApiId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub salary: Option<f64>,
    #[serde(default)]
    pub jersey: Option<u32>,
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(rename = "GlobalTeamID", default)]
    pub global_team_id: Option<TeamApiId>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub injury_status: Option<String>,
}

impl PlayerRecord {
    pub fn jersey_number(&self) -> Option<u32> {
        self.jersey.or(self.number)
    }

    pub fn is_active(&self) -> bool {
        self.status.as_deref() == Some("Active")
    }

    pub fn is_injured(&self) -> bool {
        self.injury_status.is_some()
    }

    pub fn position_or_empty(&self) -> &str {
        self.position.as_deref().unwrap_or_default()
    }
}

/// Season-to-date stat line (`PlayerSeasonStats/{season}`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SeasonStatRecord {
    #[serde(rename = "PlayerID")]
    pub player_id: AthleteApiId,
    pub position: Option<String>,
    pub fantasy_points_draft_kings: Option<f64>,
    pub passing_completion_percentage: Option<f64>,
    pub rushing_attempts: Option<f64>,
    pub passing_yards: Option<f64>,
    pub rushing_yards: Option<f64>,
    pub receiving_yards: Option<f64>,
    pub passing_interceptions: Option<f64>,
    pub passing_touchdowns: Option<f64>,
    pub rushing_touchdowns: Option<f64>,
    pub receiving_touchdowns: Option<f64>,
    pub receiving_targets: Option<f64>,
    pub receptions: Option<f64>,
}

/// Weekly per-game stat line (`PlayerGameStatsByWeek/{season}/{week}`).
///
/// Only the fields the score aggregator reads are decoded.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GameStatRecord {
    #[serde(rename = "PlayerID")]
    pub player_id: AthleteApiId,
    pub fantasy_points_draft_kings: Option<f64>,
}

/// Entry of `Timeframes/current`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Timeframe {
    pub api_season: String,
    #[serde(default)]
    pub api_week: Option<u32>,
}

impl Timeframe {
    /// Week to query; the provider omits it outside the regular season.
    pub fn week_or_first(&self) -> u32 {
        self.api_week.filter(|week| *week > 0).unwrap_or(1)
    }
}
