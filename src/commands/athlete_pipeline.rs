//! Bounded worker pool for per-athlete units.
//!
//! A unit renders and uploads both assets for one athlete and then writes
//! the record. Units are checked against the cancellation token before they
//! start; a unit that has started always runs to completion, so an athlete
//! is stored with both locators or not at all.

use futures::{stream, StreamExt};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use super::common::AssetPipeline;
use crate::assets::{asset_key, store::SVG_CONTENT_TYPE, AssetKind, AthleteCard};
use crate::cli::types::Sport;
use crate::{error::SyncError, Result};

/// Locators of both uploaded assets for one athlete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedAssets {
    pub nft_image: String,
    pub nft_animation: String,
}

impl AssetPipeline {
    /// Render and upload the image, then the animation.
    ///
    /// The animation is not attempted unless the image upload succeeded.
    pub async fn publish(
        &self,
        sport: Sport,
        team_key: &str,
        card: &AthleteCard,
        first_name: &str,
        last_name: &str,
    ) -> Result<PublishedAssets> {
        let nft_image = self
            .publish_one(sport, AssetKind::Image, team_key, card, first_name, last_name)
            .await?;
        let nft_animation = self
            .publish_one(sport, AssetKind::Animation, team_key, card, first_name, last_name)
            .await?;
        Ok(PublishedAssets {
            nft_image,
            nft_animation,
        })
    }

    async fn publish_one(
        &self,
        sport: Sport,
        kind: AssetKind,
        team_key: &str,
        card: &AthleteCard,
        first_name: &str,
        last_name: &str,
    ) -> Result<String> {
        let bytes = self.compositor.render(sport, kind, team_key, card).await?;
        let key = asset_key(sport, kind, card.api_id, first_name, last_name);
        self.uploader.upload(&key, bytes, SVG_CONTENT_TYPE).await
    }
}

/// Result of a unit that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitResult {
    Written,
    /// The record already existed.
    Unchanged,
}

/// Counts collected over one pool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitTally {
    pub written: usize,
    pub unchanged: usize,
    /// Row-scoped failures, each logged by the pool.
    pub failed: usize,
    /// Units never started because the run was cancelled or aborted.
    pub not_started: usize,
    /// First phase-scoped error, which stops further units from starting.
    pub phase_error: Option<String>,
}

enum UnitOutcome {
    Done(UnitResult),
    Failed,
    PhaseFailed(String),
    NotStarted,
}

/// Run `unit` over `items` with at most `concurrency` units in flight and
/// wait for all of them.
///
/// `label` is called with each item to name it in failure logs.
pub async fn run_units<T, L, F, Fut>(
    items: Vec<T>,
    concurrency: usize,
    cancel: &CancellationToken,
    label: L,
    unit: F,
) -> UnitTally
where
    L: Fn(&T) -> String,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<UnitResult>>,
{
    // Child token: a phase-scoped failure stops this pool without cancelling
    // the caller's job.
    let stop = cancel.child_token();

    let outcomes: Vec<UnitOutcome> = stream::iter(items)
        .map(|item| {
            let stop = stop.clone();
            let name = label(&item);
            let fut = unit(item);
            async move {
                if stop.is_cancelled() {
                    return UnitOutcome::NotStarted;
                }
                match fut.await {
                    Ok(result) => UnitOutcome::Done(result),
                    Err(e) if e.is_row_scoped() => {
                        warn!(unit = %name, error = %e, "athlete unit failed; skipping");
                        UnitOutcome::Failed
                    }
                    Err(SyncError::Cancelled) => UnitOutcome::NotStarted,
                    Err(e) => {
                        error!(unit = %name, error = %e, "athlete unit hit a phase error; stopping pool");
                        stop.cancel();
                        UnitOutcome::PhaseFailed(e.to_string())
                    }
                }
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut tally = UnitTally::default();
    for outcome in outcomes {
        match outcome {
            UnitOutcome::Done(UnitResult::Written) => tally.written += 1,
            UnitOutcome::Done(UnitResult::Unchanged) => tally.unchanged += 1,
            UnitOutcome::Failed => tally.failed += 1,
            UnitOutcome::NotStarted => tally.not_started += 1,
            UnitOutcome::PhaseFailed(message) => {
                tally.failed += 1;
                tally.phase_error.get_or_insert(message);
            }
        }
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_pool_bounds_concurrency_and_waits_for_all() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let tally = run_units(
            (0..20).collect::<Vec<u32>>(),
            3,
            &cancel,
            |i| i.to_string(),
            |_| {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, SyncError>(UnitResult::Written)
                }
            },
        )
        .await;

        assert_eq!(tally.written, 20);
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_row_failures_are_isolated() {
        let cancel = CancellationToken::new();
        let tally = run_units(
            vec![1u32, 2, 3, 4],
            2,
            &cancel,
            |i| i.to_string(),
            |i| async move {
                if i == 2 {
                    Err(SyncError::template_shape("g[5]/text[3]", "missing"))
                } else if i == 4 {
                    Ok(UnitResult::Unchanged)
                } else {
                    Ok(UnitResult::Written)
                }
            },
        )
        .await;

        assert_eq!(tally.written, 2);
        assert_eq!(tally.unchanged, 1);
        assert_eq!(tally.failed, 1);
        assert!(tally.phase_error.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_token_starts_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let started = Arc::new(AtomicUsize::new(0));

        let tally = run_units(
            vec![1u32, 2, 3],
            2,
            &cancel,
            |i| i.to_string(),
            |_| {
                let started = started.clone();
                async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, SyncError>(UnitResult::Written)
                }
            },
        )
        .await;

        assert_eq!(tally.not_started, 3);
        assert_eq!(started.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_phase_error_stops_remaining_units() {
        let cancel = CancellationToken::new();
        let tally = run_units(
            (0..10).collect::<Vec<u32>>(),
            1,
            &cancel,
            |i| i.to_string(),
            |i| async move {
                if i == 0 {
                    Err(SyncError::LockPoisoned)
                } else {
                    Ok(UnitResult::Written)
                }
            },
        )
        .await;

        assert_eq!(tally.failed, 1);
        assert_eq!(tally.not_started, 9);
        assert!(tally.phase_error.is_some());
        // The caller's token is untouched.
        assert!(!cancel.is_cancelled());
    }
}
