//! Job implementations
//!
//! Each job takes a [`common::SyncContext`] (or just the store) and returns a
//! report. Row-scoped failures are logged inside the job; phase-scoped ones
//! end the job or phase that hit them.

pub mod athlete_pipeline;
pub mod athletes;
pub mod common;
pub mod regenerate_assets;
pub mod sport_sync;
pub mod starter_pack;
pub mod stat_sync;
pub mod team_scores;

pub use common::{AssetPipeline, SyncContext};
pub use regenerate_assets::regenerate_assets;
pub use sport_sync::{sync_sport, PhaseOutcome, SportSyncReport};
pub use starter_pack::{starter_pack, JsonLinesSink, PackSink};
pub use stat_sync::update_stats;
pub use team_scores::{aggregate_team_scores, update_team_scores};
