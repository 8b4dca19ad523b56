//! HTTP client for the sports-data provider

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::debug;

use super::types::{GameStatRecord, PlayerRecord, SeasonStatRecord, TeamRecord, Timeframe};
use crate::{cli::types::Sport, error::SyncError, Result};

#[cfg(test)]
mod tests;

/// Thin typed wrapper over the provider's JSON endpoints.
///
/// Only a `200 OK` counts as success; any other status becomes
/// [`SyncError::Provider`] carrying the endpoint path (never the key).
#[derive(Debug, Clone)]
pub struct SportsDataClient {
    client: Client,
    base_url: String,
    api_keys: HashMap<Sport, String>,
}

impl SportsDataClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_keys: HashMap<Sport, String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            client,
            base_url,
            api_keys,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_key(&self, sport: Sport) -> Result<&str> {
        self.api_keys
            .get(&sport)
            .map(String::as_str)
            .ok_or_else(|| SyncError::MissingConfig {
                env_var: sport.api_key_env_var().to_string(),
            })
    }

    /// GET `{base}{endpoint}?key=...` and decode the body in one step.
    async fn get_json<T: DeserializeOwned>(&self, sport: Sport, endpoint: &str) -> Result<T> {
        let key = self.api_key(sport)?;
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%sport, endpoint, "provider request");

        let res = self.client.get(&url).query(&[("key", key)]).send().await?;

        let status = res.status();
        if status != StatusCode::OK {
            return Err(SyncError::Provider {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let body = res.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn teams(&self, sport: Sport) -> Result<Vec<TeamRecord>> {
        self.get_json(sport, sport.teams_endpoint()).await
    }

    pub async fn players(&self, sport: Sport) -> Result<Vec<PlayerRecord>> {
        let endpoint = format!("{}/scores/json/Players", sport.path_segment());
        self.get_json(sport, &endpoint).await
    }

    /// The provider's current timeframe, if it reports one.
    pub async fn current_timeframe(&self, sport: Sport) -> Result<Option<Timeframe>> {
        let endpoint = format!("{}/scores/json/Timeframes/current", sport.path_segment());
        let frames: Vec<Timeframe> = self.get_json(sport, &endpoint).await?;
        Ok(frames.into_iter().next())
    }

    pub async fn season_stats(&self, sport: Sport, season: &str) -> Result<Vec<SeasonStatRecord>> {
        let endpoint = format!("{}/stats/json/PlayerSeasonStats/{season}", sport.path_segment());
        self.get_json(sport, &endpoint).await
    }

    pub async fn weekly_stats(
        &self,
        sport: Sport,
        season: &str,
        week: u32,
    ) -> Result<Vec<GameStatRecord>> {
        let endpoint = format!(
            "{}/stats/json/PlayerGameStatsByWeek/{season}/{week}",
            sport.path_segment()
        );
        self.get_json(sport, &endpoint).await
    }
}
