//! Entry point: parse CLI and dispatch to job handlers.

use anyhow::Context;
use clap::Parser;
use athlete_sync::{
    cli::{AthleteSync, Commands},
    commands::{
        athletes::handle_athletes, regenerate_assets, starter_pack, sync_sport,
        update_stats, update_team_scores, JsonLinesSink, PhaseOutcome, SyncContext,
    },
    config::SyncConfig,
    core::telemetry::init_tracing,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Run the CLI.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let app = AthleteSync::parse();

    let config = SyncConfig::from_env().context("loading configuration")?;
    let cancel = CancellationToken::new();
    let ctx = SyncContext::from_config(&config, app.db.as_deref())
        .context("initialising sync context")?
        .with_cancellation(cancel.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; finishing in-flight athletes");
            cancel.cancel();
        }
    });

    if let Some(query) = app.command.athlete_query() {
        let json = matches!(app.command, Commands::Athletes { json: true, .. });
        handle_athletes(&ctx.db, &query, json)?;
        return Ok(());
    }

    match app.command {
        Commands::Sync { sport, json } => {
            let report = sync_sport(&ctx, sport.sport).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}: teams {:?}, athletes {:?}", report.sport, report.teams, report.athletes);
            }
            if matches!(report.teams, PhaseOutcome::Aborted { .. })
                || matches!(report.athletes, PhaseOutcome::Aborted { .. })
            {
                anyhow::bail!("sync for {} finished with an aborted phase", report.sport);
            }
        }

        Commands::UpdateStats { sport } => {
            let report = update_stats(&ctx, sport.sport)
                .await
                .with_context(|| format!("updating {} stats", sport.sport))?;
            println!(
                "Season {}: {} updated, {} created, {} unknown athletes",
                report.season, report.updated, report.created, report.unknown_athletes
            );
        }

        Commands::UpdateScores { sport } => {
            let report = update_team_scores(&ctx, sport.sport)
                .await
                .with_context(|| format!("updating {} team scores", sport.sport))?;
            println!(
                "Season {} week {}: {} teams updated across {} active games",
                report.season, report.week, report.teams_updated, report.games
            );
        }

        Commands::RegenerateAssets { sport } => {
            let report = regenerate_assets(&ctx, sport.sport)
                .await
                .with_context(|| format!("regenerating {} assets", sport.sport))?;
            println!(
                "{} of {} athletes updated ({} failed, {} not started)",
                report.updated, report.athletes, report.failed, report.not_started
            );
        }

        Commands::StarterPack { sport, ids } => {
            let mut sink = JsonLinesSink::new(std::io::stdout());
            let submitted = starter_pack(&ctx.db, sport.sport, ids.as_deref(), &mut sink)
                .await
                .context("building starter pack")?;
            info!(submitted, "starter pack emitted");
        }

        Commands::Athletes { .. } => {}
    }

    Ok(())
}
