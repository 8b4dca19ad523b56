//! Athlete sync library
//!
//! Pulls teams, athletes and stats from a sports-data provider, renders a
//! static image and an animation per athlete from vector templates, uploads
//! both to object storage, and keeps a local record store in step.
//!
//! ## Jobs
//!
//! - **sync**: one-shot team then athlete ingestion per sport
//! - **update-stats**: season stat merge keyed on (athlete, season)
//! - **update-scores**: game-team fantasy score aggregation over active games
//! - **regenerate-assets**: rebuild both assets for stored athletes
//! - **starter-pack**: batched `execute_add_athletes` payloads
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use athlete_sync::{commands::{sync_sport, SyncContext}, config::SyncConfig, Sport};
//!
//! # async fn example() -> athlete_sync::Result<()> {
//! let config = SyncConfig::from_env()?;
//! let ctx = SyncContext::from_config(&config, None)?;
//! let report = sync_sport(&ctx, Sport::Nfl).await;
//! println!("{:?}", report.athletes);
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Configuration
//!
//! ```bash
//! export SPORTS_DATA_NFL_KEY=...
//! export ASSET_STORE_DIR=./assets   # or AWS_BUCKET_NAME + AWS_ACCESS_KEY_ID + AWS_SECRET_ACCESS_KEY
//! ```

pub mod assets;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod provider;
pub mod storage;

// Re-export commonly used types
pub use cli::types::{AthleteApiId, Sport, TeamApiId};
pub use error::{ErrorScope, Result, SyncError};
