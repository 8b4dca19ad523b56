//! Game-team score aggregation over active games.

use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, info_span, Instrument};

use super::common::SyncContext;
use crate::cli::types::{AthleteApiId, Sport};
use crate::provider::GameStatRecord;
use crate::storage::{lock_db, unix_now, ActiveGame, GameTeamScore};
use crate::{error::SyncError, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamScoreReport {
    pub season: String,
    pub week: u32,
    pub games: usize,
    pub teams_updated: usize,
}

/// Recompute every active game team's score from this week's feed.
pub async fn update_team_scores(ctx: &SyncContext, sport: Sport) -> Result<TeamScoreReport> {
    update_team_scores_at(ctx, sport, unix_now()).await
}

/// [`update_team_scores`] with an explicit "now" in unix seconds.
pub async fn update_team_scores_at(
    ctx: &SyncContext,
    sport: Sport,
    now: i64,
) -> Result<TeamScoreReport> {
    let span = info_span!("update_team_scores", %sport);
    async {
        ctx.check_cancelled()?;
        let timeframe = ctx
            .provider
            .current_timeframe(sport)
            .await?
            .ok_or(SyncError::MissingTimeframe { sport })?;
        let week = timeframe.week_or_first();
        let season = timeframe.api_season;

        // Nothing is written unless the feed arrives.
        let feed = ctx.provider.weekly_stats(sport, &season, week).await?;
        ctx.check_cancelled()?;

        let mut db = lock_db(&ctx.db)?;
        let games = db.active_games(sport, now)?;
        let scores = aggregate_team_scores(&games, &feed);
        let teams_updated = db.save_game_team_scores(&scores, ctx.settings.batch_size)?;

        info!(%season, week, games = games.len(), teams_updated, "team scores updated");
        Ok(TeamScoreReport {
            season,
            week,
            games: games.len(),
            teams_updated,
        })
    }
    .instrument(span)
    .await
}

/// Sum each roster athlete's feed score per game team.
///
/// When the feed lists an athlete more than once the first entry counts.
/// Athletes absent from the feed contribute nothing.
pub fn aggregate_team_scores(games: &[ActiveGame], feed: &[GameStatRecord]) -> Vec<GameTeamScore> {
    let mut points: HashMap<AthleteApiId, f64> = HashMap::with_capacity(feed.len());
    for entry in feed {
        points
            .entry(entry.player_id)
            .or_insert(entry.fantasy_points_draft_kings.unwrap_or(0.0));
    }

    games
        .iter()
        .flat_map(|game| &game.teams)
        .map(|roster| GameTeamScore {
            game_team_id: roster.team.id,
            fantasy_score: roster
                .athletes
                .iter()
                .filter_map(|id| points.get(id))
                .sum(),
        })
        .collect()
}
