//! Season stat merge.

use serde::Serialize;
use tracing::{debug, info, info_span, Instrument};

use super::common::SyncContext;
use crate::cli::types::Sport;
use crate::provider::SeasonStatRecord;
use crate::storage::{lock_db, AthleteStat, StatLine, SyncDatabase};
use crate::{error::SyncError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatSyncReport {
    pub season: String,
    pub updated: usize,
    pub created: usize,
    /// Feed rows for athletes that are not stored.
    pub unknown_athletes: usize,
    pub written: usize,
}

/// Fetch the current season's stats and merge them into the store.
pub async fn update_stats(ctx: &SyncContext, sport: Sport) -> Result<StatSyncReport> {
    let span = info_span!("update_stats", %sport);
    async {
        ctx.check_cancelled()?;
        let timeframe = ctx
            .provider
            .current_timeframe(sport)
            .await?
            .ok_or(SyncError::MissingTimeframe { sport })?;
        let season = timeframe.api_season;

        let rows = ctx.provider.season_stats(sport, &season).await?;
        info!(%season, rows = rows.len(), "fetched season stats");
        ctx.check_cancelled()?;

        let mut db = lock_db(&ctx.db)?;
        let (staged, mut report) = merge_stats(&db, &season, &rows)?;
        report.written = db.save_stats(&staged, ctx.settings.batch_size)?;

        info!(
            updated = report.updated,
            created = report.created,
            unknown = report.unknown_athletes,
            "stats merged"
        );
        Ok(report)
    }
    .instrument(span)
    .await
}

/// Stage an update for every (athlete, season) row that exists and a create
/// for every other row whose athlete is stored.
pub fn merge_stats(
    db: &SyncDatabase,
    season: &str,
    rows: &[SeasonStatRecord],
) -> Result<(Vec<AthleteStat>, StatSyncReport)> {
    let mut report = StatSyncReport {
        season: season.to_string(),
        ..StatSyncReport::default()
    };
    let mut staged = Vec::new();

    for row in rows {
        let line = StatLine::from(row);
        if let Some(mut existing) = db.stat_for(row.player_id, season)? {
            existing.line = line;
            if row.position.is_some() {
                existing.position = row.position.clone();
            }
            staged.push(existing);
            report.updated += 1;
            continue;
        }

        match db.athlete_by_api_id(row.player_id)? {
            Some(athlete) => {
                staged.push(AthleteStat {
                    id: None,
                    athlete_id: athlete.id,
                    season: season.to_string(),
                    position: row.position.clone(),
                    line,
                });
                report.created += 1;
            }
            None => {
                debug!(athlete_id = %row.player_id, "no stored athlete for stat row");
                report.unknown_athletes += 1;
            }
        }
    }

    Ok((staged, report))
}
