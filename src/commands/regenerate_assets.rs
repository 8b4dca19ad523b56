//! Rebuild and re-upload assets for stored athletes.

use serde::Serialize;
use tracing::{info, info_span, Instrument};

use super::athlete_pipeline::{run_units, UnitResult};
use super::common::{AssetPipeline, SyncContext};
use crate::assets::AthleteCard;
use crate::cli::types::Sport;
use crate::storage::{lock_db, Athlete, Team};
use crate::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegenerateReport {
    pub athletes: usize,
    pub updated: usize,
    pub failed: usize,
    pub not_started: usize,
    pub aborted: Option<String>,
}

/// Re-render both assets for every stored athlete of `sport` and replace
/// their locators together. An athlete whose image or animation fails keeps
/// its previous pair.
pub async fn regenerate_assets(ctx: &SyncContext, sport: Sport) -> Result<RegenerateReport> {
    let span = info_span!("regenerate_assets", %sport);
    async {
        let assets = ctx.assets()?;
        ctx.check_cancelled()?;
        let athletes = lock_db(&ctx.db)?.athletes_with_teams(sport)?;
        let total = athletes.len();
        info!(athletes = total, "regenerating assets");

        let tally = run_units(
            athletes,
            ctx.settings.concurrency,
            &ctx.cancel,
            |pair| format!("{} ({})", pair.0.api_id, pair.1.key),
            |(athlete, team)| refresh_athlete(ctx, assets, sport, athlete, team),
        )
        .await;

        let report = RegenerateReport {
            athletes: total,
            updated: tally.written,
            failed: tally.failed,
            not_started: tally.not_started,
            aborted: tally.phase_error,
        };
        info!(updated = report.updated, failed = report.failed, "assets regenerated");
        Ok(report)
    }
    .instrument(span)
    .await
}

async fn refresh_athlete(
    ctx: &SyncContext,
    assets: &AssetPipeline,
    sport: Sport,
    athlete: Athlete,
    team: Team,
) -> Result<UnitResult> {
    let card = AthleteCard::from_athlete(&athlete, &team);
    let published = assets
        .publish(sport, &team.key, &card, &athlete.first_name, &athlete.last_name)
        .await?;

    let changed = lock_db(&ctx.db)?.update_athlete_assets(
        athlete.id,
        &published.nft_image,
        &published.nft_animation,
    )?;
    Ok(if changed {
        UnitResult::Written
    } else {
        UnitResult::Unchanged
    })
}
