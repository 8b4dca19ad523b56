//! Unit tests for provider payload decoding

use super::*;
use serde_json::json;

#[test]
fn test_team_record_decodes_and_prefixes_colors() {
    let team: TeamRecord = serde_json::from_value(json!({
        "GlobalTeamID": 16,
        "Key": "KC",
        "Name": "Chiefs",
        "City": "Kansas City",
        "PrimaryColor": "E31837",
        "SecondaryColor": "FFB612",
        "Conference": "AFC"
    }))
    .unwrap();

    assert_eq!(team.global_team_id, TeamApiId::new(16));
    assert_eq!(team.key, "KC");
    assert_eq!(team.city.as_deref(), Some("Kansas City"));
    assert_eq!(team.primary_hex(), "#E31837");
    assert_eq!(team.secondary_hex(), "#FFB612");
}

#[test]
fn test_team_record_missing_colors() {
    let team: TeamRecord = serde_json::from_value(json!({
        "GlobalTeamID": 1,
        "Key": "FA",
        "Name": "Free Agents",
        "PrimaryColor": null
    }))
    .unwrap();
    assert_eq!(team.primary_hex(), "#");
    assert!(team.city.is_none());
}

#[test]
fn test_player_record_nfl_number_and_flags() {
    let player: PlayerRecord = serde_json::from_value(json!({
        "PlayerID": 18890,
        "FirstName": "Patrick",
        "LastName": "Mahomes",
        "Position": "QB",
        "Number": 15,
        "GlobalTeamID": 16,
        "Status": "Active",
        "InjuryStatus": null
    }))
    .unwrap();

    assert_eq!(player.player_id, AthleteApiId::new(18890));
    assert_eq!(player.jersey_number(), Some(15));
    assert!(player.is_active());
    assert!(!player.is_injured());
    assert_eq!(player.global_team_id, Some(TeamApiId::new(16)));
}

#[test]
fn test_player_record_mlb_jersey_and_injury() {
    let player: PlayerRecord = serde_json::from_value(json!({
        "PlayerID": 10000507,
        "FirstName": "Mike",
        "LastName": "Trout",
        "Position": "CF",
        "Jersey": 27,
        "Salary": 37116666.0,
        "GlobalTeamID": 10000015,
        "Status": "Disabled List",
        "InjuryStatus": "Out"
    }))
    .unwrap();

    assert_eq!(player.jersey_number(), Some(27));
    assert_eq!(player.salary, Some(37116666.0));
    assert!(!player.is_active());
    assert!(player.is_injured());
}

#[test]
fn test_player_record_without_team_or_jersey() {
    let player: PlayerRecord = serde_json::from_value(json!({
        "PlayerID": 1,
        "FirstName": "Free",
        "LastName": "Agent",
        "GlobalTeamID": null,
        "Jersey": null
    }))
    .unwrap();
    assert!(player.global_team_id.is_none());
    assert!(player.jersey_number().is_none());
    assert_eq!(player.position_or_empty(), "");
}

#[test]
fn test_player_record_shape_mismatch_fails_fast() {
    let result: std::result::Result<PlayerRecord, _> = serde_json::from_value(json!({
        "PlayerID": "not-a-number",
        "FirstName": "A",
        "LastName": "B"
    }));
    assert!(result.is_err());
}

#[test]
fn test_season_stat_record_defaults_missing_fields() {
    let stat: SeasonStatRecord = serde_json::from_value(json!({
        "PlayerID": 18890,
        "Position": "QB",
        "FantasyPointsDraftKings": 412.5,
        "PassingYards": 5250.0,
        "PassingTouchdowns": 41.0
    }))
    .unwrap();

    assert_eq!(stat.fantasy_points_draft_kings, Some(412.5));
    assert_eq!(stat.passing_yards, Some(5250.0));
    assert!(stat.receptions.is_none());
}

#[test]
fn test_timeframe_week_fallback() {
    let tf: Timeframe = serde_json::from_value(json!({
        "ApiSeason": "2023REG",
        "ApiWeek": 7
    }))
    .unwrap();
    assert_eq!(tf.week_or_first(), 7);

    let tf: Timeframe = serde_json::from_value(json!({
        "ApiSeason": "2023POST",
        "ApiWeek": null
    }))
    .unwrap();
    assert_eq!(tf.week_or_first(), 1);

    let tf: Timeframe = serde_json::from_value(json!({ "ApiSeason": "2024PRE", "ApiWeek": 0 })).unwrap();
    assert_eq!(tf.week_or_first(), 1);
}
