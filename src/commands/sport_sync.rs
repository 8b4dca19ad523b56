//! One-shot team and athlete sync for a sport.
//!
//! Runs `Idle -> TeamSyncing -> AthleteSyncing -> Done`. Each phase only
//! does work when the store holds no rows of that kind for the sport, and
//! the check runs under an advisory lock so two overlapping runs cannot both
//! pass it. A phase that aborts is reported and the next phase still runs.
//! When another run holds the team lock the athlete phase is not started.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::athlete_pipeline::{run_units, UnitResult, UnitTally};
use super::common::{AssetPipeline, SyncContext};
use crate::assets::AthleteCard;
use crate::cli::types::{Sport, TeamApiId};
use crate::provider::PlayerRecord;
use crate::storage::{lock_db, unix_now, NewAthlete, NewTeam, Team, DEFAULT_LOCK_TTL};
use crate::{error::SyncError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Teams,
    Athletes,
}

impl SyncPhase {
    pub fn label(&self) -> &'static str {
        match self {
            SyncPhase::Teams => "teams",
            SyncPhase::Athletes => "athletes",
        }
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    TeamSyncing,
    AthleteSyncing,
    Done,
}

/// What happened to one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PhaseOutcome {
    /// Rows already exist for the sport; nothing fetched.
    Skipped { existing: u64 },
    /// Another run holds the phase lock.
    Locked,
    Synced {
        created: usize,
        unchanged: usize,
        failed: usize,
    },
    /// The job token fired; `created` rows were written before it did.
    Cancelled { created: usize },
    Aborted { reason: String },
}

impl PhaseOutcome {
    fn from_tally(tally: UnitTally, cancelled: bool) -> Self {
        if let Some(reason) = tally.phase_error {
            return PhaseOutcome::Aborted { reason };
        }
        if cancelled && tally.not_started > 0 {
            return PhaseOutcome::Cancelled {
                created: tally.written,
            };
        }
        PhaseOutcome::Synced {
            created: tally.written,
            unchanged: tally.unchanged,
            failed: tally.failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SportSyncReport {
    pub sport: Sport,
    pub teams: PhaseOutcome,
    pub athletes: PhaseOutcome,
}

/// Sync teams, then athletes, for `sport`.
pub async fn sync_sport(ctx: &SyncContext, sport: Sport) -> SportSyncReport {
    let span = info_span!("sync_sport", %sport);
    async {
        let mut report = SportSyncReport {
            sport,
            teams: PhaseOutcome::Locked,
            athletes: PhaseOutcome::Locked,
        };

        let mut state = SyncState::Idle;
        while state != SyncState::Done {
            debug!(?state, "sync state");
            state = match state {
                SyncState::Idle => SyncState::TeamSyncing,
                SyncState::TeamSyncing => {
                    report.teams = run_phase(ctx, sport, SyncPhase::Teams).await;
                    if report.teams == PhaseOutcome::Locked {
                        // Athletes resolve against the team table, which the
                        // lock holder has not finished writing.
                        info!("team phase held elsewhere, athlete phase deferred");
                        report.athletes = PhaseOutcome::Locked;
                        SyncState::Done
                    } else {
                        SyncState::AthleteSyncing
                    }
                }
                SyncState::AthleteSyncing => {
                    report.athletes = run_phase(ctx, sport, SyncPhase::Athletes).await;
                    SyncState::Done
                }
                SyncState::Done => SyncState::Done,
            };
        }

        info!(teams = ?report.teams, athletes = ?report.athletes, "sport sync finished");
        report
    }
    .instrument(span)
    .await
}

async fn run_phase(ctx: &SyncContext, sport: Sport, phase: SyncPhase) -> PhaseOutcome {
    if ctx.cancel.is_cancelled() {
        return PhaseOutcome::Cancelled { created: 0 };
    }

    match claim_phase(ctx, sport, phase) {
        Ok(None) => {}
        Ok(Some(outcome)) => {
            info!(%phase, ?outcome, "phase not run");
            return outcome;
        }
        Err(e) => {
            error!(%phase, error = %e, "could not claim phase");
            return PhaseOutcome::Aborted {
                reason: e.to_string(),
            };
        }
    }

    let result = match phase {
        SyncPhase::Teams => sync_teams(ctx, sport).await,
        SyncPhase::Athletes => sync_athletes(ctx, sport).await,
    };

    if let Err(e) = lock_db(&ctx.db).and_then(|mut db| {
        db.release_phase_lock(sport, phase.label(), &ctx.run_id)
    }) {
        warn!(%phase, error = %e, "failed to release phase lock");
    }

    match result {
        Ok(outcome) => outcome,
        Err(SyncError::Cancelled) => PhaseOutcome::Cancelled { created: 0 },
        Err(e) => {
            error!(%phase, error = %e, "phase aborted");
            PhaseOutcome::Aborted {
                reason: e.to_string(),
            }
        }
    }
}

/// Take the phase lock and re-check the zero-count guard under it.
///
/// Returns `Some(outcome)` when the phase must not run. On `None` the
/// caller owns the lock.
fn claim_phase(ctx: &SyncContext, sport: Sport, phase: SyncPhase) -> Result<Option<PhaseOutcome>> {
    let mut db = lock_db(&ctx.db)?;
    let acquired = db.try_acquire_phase_lock(
        sport,
        phase.label(),
        &ctx.run_id,
        DEFAULT_LOCK_TTL,
        unix_now(),
    )?;
    if !acquired {
        return Ok(Some(PhaseOutcome::Locked));
    }

    let existing = match phase {
        SyncPhase::Teams => db.count_teams(sport),
        SyncPhase::Athletes => db.count_athletes(sport),
    };
    match existing {
        Ok(0) => Ok(None),
        Ok(existing) => {
            db.release_phase_lock(sport, phase.label(), &ctx.run_id)?;
            Ok(Some(PhaseOutcome::Skipped { existing }))
        }
        Err(e) => {
            db.release_phase_lock(sport, phase.label(), &ctx.run_id)?;
            Err(e)
        }
    }
}

async fn sync_teams(ctx: &SyncContext, sport: Sport) -> Result<PhaseOutcome> {
    let records = ctx.provider.teams(sport).await?;
    info!(count = records.len(), "fetched teams");

    let teams: Vec<NewTeam> = records
        .iter()
        .map(|record| NewTeam::from_record(record, sport))
        .collect();
    let outcomes = lock_db(&ctx.db)?.insert_teams_if_absent(&teams)?;

    let (mut created, mut unchanged, mut failed) = (0, 0, 0);
    for (team, outcome) in teams.iter().zip(outcomes) {
        match outcome {
            Ok(true) => created += 1,
            Ok(false) => {
                debug!(team_key = %team.key, "team already stored");
                unchanged += 1;
            }
            Err(e) => {
                warn!(team_key = %team.key, error = %e, "team skipped");
                failed += 1;
            }
        }
    }

    Ok(PhaseOutcome::Synced {
        created,
        unchanged,
        failed,
    })
}

/// A player whose team resolved, ready to be scheduled.
struct AthleteJob {
    player: PlayerRecord,
    team: Team,
}

async fn sync_athletes(ctx: &SyncContext, sport: Sport) -> Result<PhaseOutcome> {
    let assets = ctx.assets()?;
    let players = ctx.provider.players(sport).await?;
    info!(count = players.len(), "fetched athletes");

    let teams: HashMap<TeamApiId, Team> = lock_db(&ctx.db)?
        .teams_for_sport(sport)?
        .into_iter()
        .map(|team| (team.api_id, team))
        .collect();

    let mut jobs = Vec::with_capacity(players.len());
    let mut unresolved = 0;
    for player in players {
        let team = player
            .global_team_id
            .and_then(|id| teams.get(&id))
            .cloned()
            .ok_or_else(|| {
                SyncError::not_found(
                    "team",
                    player
                        .global_team_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "none".to_string()),
                )
            });
        match team {
            Ok(team) => jobs.push(AthleteJob { player, team }),
            Err(e) => {
                warn!(athlete_id = %player.player_id, error = %e, "athlete skipped");
                unresolved += 1;
            }
        }
    }

    let tally = run_units(
        jobs,
        ctx.settings.concurrency,
        &ctx.cancel,
        |job| format!("{} ({})", job.player.player_id, job.team.key),
        |job| create_athlete(ctx, assets, sport, job),
    )
    .await;

    let mut outcome = PhaseOutcome::from_tally(tally, ctx.cancel.is_cancelled());
    if let PhaseOutcome::Synced { failed, .. } = &mut outcome {
        *failed += unresolved;
    }
    Ok(outcome)
}

/// Compose and upload both assets, then store the athlete with both locators.
async fn create_athlete(
    ctx: &SyncContext,
    assets: &AssetPipeline,
    sport: Sport,
    job: AthleteJob,
) -> Result<UnitResult> {
    let AthleteJob { player, team } = job;
    let card = AthleteCard::from_player(&player, &team);
    let published = assets
        .publish(sport, &team.key, &card, &player.first_name, &player.last_name)
        .await?;

    let athlete = NewAthlete {
        api_id: player.player_id,
        team_id: team.id,
        first_name: player.first_name.clone(),
        last_name: player.last_name.clone(),
        position: player.position.clone(),
        salary: player.salary,
        jersey: player.jersey_number(),
        is_active: player.is_active(),
        is_injured: player.is_injured(),
        nft_image: published.nft_image,
        nft_animation: published.nft_animation,
    };

    let inserted = lock_db(&ctx.db)?.insert_athlete_if_absent(&athlete)?;
    debug!(athlete_id = %athlete.api_id, team_key = %team.key, inserted, "athlete stored");
    Ok(if inserted {
        UnitResult::Written
    } else {
        UnitResult::Unchanged
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineSettings;
    use crate::provider::SportsDataClient;
    use crate::storage::SyncDatabase;
    use serde_json::{json, Value};
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn team(id: u64, key: &str) -> Value {
        json!({
            "GlobalTeamID": id,
            "Key": key,
            "Name": format!("{key} Team"),
            "PrimaryColor": "E31837",
            "SecondaryColor": "FFB612"
        })
    }

    async fn context_with_teams(server: &MockServer, teams: Value, times: u64) -> SyncContext {
        Mock::given(method("GET"))
            .and(path("/nfl/scores/json/Teams"))
            .respond_with(ResponseTemplate::new(200).set_body_json(teams))
            .expect(times)
            .mount(server)
            .await;
        let keys = HashMap::from([(Sport::Nfl, "nfl-key".to_string())]);
        let provider = SportsDataClient::new(reqwest::Client::new(), server.uri(), keys);
        let db = SyncDatabase::new_in_memory().unwrap().into_shared();
        SyncContext::new(provider, db, None, PipelineSettings::default())
    }

    fn execute(ctx: &SyncContext, sql: &str) {
        lock_db(&ctx.db).unwrap().conn.execute_batch(sql).unwrap();
    }

    #[tokio::test]
    async fn test_rejected_team_row_is_counted_and_skipped() {
        let server = MockServer::start().await;
        let feed = json!([team(16, "KC"), team(20, "BAD"), team(21, "BUF")]);
        let ctx = context_with_teams(&server, feed, 1).await;
        execute(
            &ctx,
            "CREATE TRIGGER reject_bad BEFORE INSERT ON teams WHEN NEW.key = 'BAD'
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        );

        let outcome = run_phase(&ctx, Sport::Nfl, SyncPhase::Teams).await;
        assert_eq!(
            outcome,
            PhaseOutcome::Synced {
                created: 2,
                unchanged: 0,
                failed: 1
            }
        );
        assert_eq!(lock_db(&ctx.db).unwrap().count_teams(Sport::Nfl).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_team_store_failure_aborts_without_partial_rows() {
        let server = MockServer::start().await;
        let ctx = context_with_teams(&server, json!([team(16, "KC"), team(21, "BUF")]), 2).await;
        execute(
            &ctx,
            "CREATE TRIGGER overflow_team BEFORE INSERT ON teams WHEN NEW.key = 'BUF'
             BEGIN SELECT abs(-9223372036854775807 - 1); END;",
        );

        let outcome = run_phase(&ctx, Sport::Nfl, SyncPhase::Teams).await;
        assert!(matches!(outcome, PhaseOutcome::Aborted { .. }), "{outcome:?}");
        // Nothing was kept, so the zero-count guard lets the next run retry.
        assert_eq!(lock_db(&ctx.db).unwrap().count_teams(Sport::Nfl).unwrap(), 0);

        execute(&ctx, "DROP TRIGGER overflow_team;");
        let retry = run_phase(&ctx, Sport::Nfl, SyncPhase::Teams).await;
        assert_eq!(
            retry,
            PhaseOutcome::Synced {
                created: 2,
                unchanged: 0,
                failed: 0
            }
        );
    }

    #[tokio::test]
    async fn test_team_lock_held_elsewhere_defers_athletes() {
        let server = MockServer::start().await;
        let ctx = context_with_teams(&server, json!([]), 0).await;
        lock_db(&ctx.db)
            .unwrap()
            .try_acquire_phase_lock(Sport::Nfl, "teams", "other-run", DEFAULT_LOCK_TTL, unix_now())
            .unwrap();

        // No asset pipeline is configured, so a started athlete phase would abort.
        let report = sync_sport(&ctx, Sport::Nfl).await;
        assert_eq!(report.teams, PhaseOutcome::Locked);
        assert_eq!(report.athletes, PhaseOutcome::Locked);
    }
}
