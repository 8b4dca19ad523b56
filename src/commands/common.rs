//! Shared job context.
//!
//! Every job receives its collaborators through [`SyncContext`] rather than
//! reaching for globals.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::assets::{
    store::object_store_from_config, AssetUploader, Compositor, FsTemplateSource,
};
use crate::config::{PipelineSettings, SyncConfig};
use crate::core::build_http_client;
use crate::provider::SportsDataClient;
use crate::storage::{SharedDatabase, SyncDatabase};
use crate::{error::SyncError, Result};

/// Compositor and uploader, needed only by jobs that publish assets.
#[derive(Clone)]
pub struct AssetPipeline {
    pub compositor: Compositor,
    pub uploader: AssetUploader,
}

pub struct SyncContext {
    pub provider: SportsDataClient,
    pub db: SharedDatabase,
    pub assets: Option<AssetPipeline>,
    pub settings: PipelineSettings,
    pub cancel: CancellationToken,
    /// Identifies this process as a phase lock holder.
    pub run_id: String,
}

impl SyncContext {
    pub fn new(
        provider: SportsDataClient,
        db: SharedDatabase,
        assets: Option<AssetPipeline>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            provider,
            db,
            assets,
            settings,
            cancel: CancellationToken::new(),
            run_id: new_run_id(),
        }
    }

    /// Wire up the provider, store and (when configured) the asset pipeline.
    pub fn from_config(config: &SyncConfig, db_path_override: Option<&std::path::Path>) -> Result<Self> {
        let client = build_http_client(config.http_timeout)?;
        let provider = SportsDataClient::new(
            client,
            config.provider_url.clone(),
            config.api_keys.clone(),
        );

        let db_path = db_path_override.unwrap_or(config.db_path.as_path());
        info!(db = %db_path.display(), "opening record store");
        let db = SyncDatabase::new(db_path)?.into_shared();

        let assets = match &config.asset_store {
            Some(store_config) => Some(AssetPipeline {
                compositor: Compositor::new(Arc::new(FsTemplateSource::new(
                    config.template_dir.clone(),
                ))),
                uploader: AssetUploader::new(
                    object_store_from_config(store_config)?,
                    config.pipeline.upload_timeout,
                ),
            }),
            None => None,
        };

        Ok(Self::new(provider, db, assets, config.pipeline))
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The asset pipeline, or `MissingConfig` when no store is configured.
    pub fn assets(&self) -> Result<&AssetPipeline> {
        self.assets.as_ref().ok_or_else(|| SyncError::MissingConfig {
            env_var: format!(
                "{} or {}",
                crate::config::AWS_BUCKET_NAME_ENV_VAR,
                crate::config::ASSET_STORE_DIR_ENV_VAR
            ),
        })
    }

    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        Ok(())
    }
}

fn new_run_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    format!("{}-{nanos:09}", std::process::id())
}
