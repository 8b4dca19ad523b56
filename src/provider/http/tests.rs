//! Unit tests for the provider HTTP client

use super::*;
use serde_json::json;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn client_for(server: &MockServer) -> SportsDataClient {
    let mut keys = HashMap::new();
    keys.insert(Sport::Nfl, "nfl-key".to_string());
    keys.insert(Sport::Mlb, "mlb-key".to_string());
    SportsDataClient::new(Client::new(), server.uri(), keys)
}

#[test]
fn test_base_url_gets_trailing_slash() {
    let client = SportsDataClient::new(Client::new(), "https://api.example.com/v3", HashMap::new());
    assert_eq!(client.base_url(), "https://api.example.com/v3/");
}

#[tokio::test]
async fn test_teams_success_sends_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/nfl/scores/json/Teams"))
        .and(query_param("key", "nfl-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "GlobalTeamID": 16,
                "Key": "KC",
                "Name": "Chiefs",
                "City": "Kansas City",
                "PrimaryColor": "E31837",
                "SecondaryColor": "FFB612"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let teams = client_for(&server).teams(Sport::Nfl).await.unwrap();
    assert_eq!(teams.len(), 1);
    assert_eq!(teams[0].key, "KC");
}

#[tokio::test]
async fn test_mlb_teams_endpoint_casing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/mlb/scores/json/teams"))
        .and(query_param("key", "mlb-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let teams = client_for(&server).teams(Sport::Mlb).await.unwrap();
    assert!(teams.is_empty());
}

#[tokio::test]
async fn test_non_200_is_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/nfl/scores/json/Players"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    match client_for(&server).players(Sport::Nfl).await {
        Err(SyncError::Provider { endpoint, status }) => {
            assert_eq!(endpoint, "nfl/scores/json/Players");
            assert_eq!(status, 401);
        }
        other => panic!("Expected Provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_other_success_codes_are_still_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/nfl/scores/json/Players"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let result = client_for(&server).players(Sport::Nfl).await;
    assert!(matches!(result, Err(SyncError::Provider { status: 204, .. })));
}

#[tokio::test]
async fn test_missing_key_fails_before_request() {
    let server = MockServer::start().await;
    let client = SportsDataClient::new(Client::new(), server.uri(), HashMap::new());

    match client.teams(Sport::Mlb).await {
        Err(SyncError::MissingConfig { env_var }) => assert_eq!(env_var, "SPORTS_DATA_MLB_KEY"),
        other => panic!("Expected MissingConfig, got {other:?}"),
    }
}

#[tokio::test]
async fn test_shape_mismatch_is_json_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/nfl/scores/json/Players"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": true })))
        .mount(&server)
        .await;

    let result = client_for(&server).players(Sport::Nfl).await;
    assert!(matches!(result, Err(SyncError::Json(_))));
}

#[tokio::test]
async fn test_current_timeframe_takes_first_entry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/nfl/scores/json/Timeframes/current"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "ApiSeason": "2023REG", "ApiWeek": 5 },
            { "ApiSeason": "2023REG", "ApiWeek": 6 }
        ])))
        .mount(&server)
        .await;

    let tf = client_for(&server)
        .current_timeframe(Sport::Nfl)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tf.api_season, "2023REG");
    assert_eq!(tf.api_week, Some(5));
}

#[tokio::test]
async fn test_current_timeframe_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/nfl/scores/json/Timeframes/current"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let tf = client_for(&server).current_timeframe(Sport::Nfl).await.unwrap();
    assert!(tf.is_none());
}

#[tokio::test]
async fn test_stat_endpoints() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/nfl/stats/json/PlayerSeasonStats/2023REG"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "PlayerID": 1, "FantasyPointsDraftKings": 100.5 }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/nfl/stats/json/PlayerGameStatsByWeek/2023REG/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "PlayerID": 1, "FantasyPointsDraftKings": 20.0 },
            { "PlayerID": 2, "FantasyPointsDraftKings": 15.0 }
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let season = client.season_stats(Sport::Nfl, "2023REG").await.unwrap();
    assert_eq!(season[0].fantasy_points_draft_kings, Some(100.5));

    let weekly = client.weekly_stats(Sport::Nfl, "2023REG", 3).await.unwrap();
    assert_eq!(weekly.len(), 2);
    assert_eq!(weekly[1].fantasy_points_draft_kings, Some(15.0));
}
