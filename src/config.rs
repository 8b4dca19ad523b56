//! Runtime configuration read from the environment
//!
//! A `.env` file in the working directory is loaded first (if present), so
//! scheduled invocations and local runs share the same variable names.

use crate::{cli::types::Sport, error::SyncError, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub const SPORTS_DATA_URL_ENV_VAR: &str = "SPORTS_DATA_URL";
pub const TEMPLATE_DIR_ENV_VAR: &str = "TEMPLATE_DIR";
pub const DB_PATH_ENV_VAR: &str = "ATHLETE_SYNC_DB";
pub const CONCURRENCY_ENV_VAR: &str = "SYNC_CONCURRENCY";
pub const HTTP_TIMEOUT_ENV_VAR: &str = "HTTP_TIMEOUT_SECS";
pub const UPLOAD_TIMEOUT_ENV_VAR: &str = "UPLOAD_TIMEOUT_SECS";
pub const AWS_BUCKET_NAME_ENV_VAR: &str = "AWS_BUCKET_NAME";
pub const AWS_REGION_ENV_VAR: &str = "AWS_REGION";
pub const AWS_ACCESS_KEY_ID_ENV_VAR: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY_ENV_VAR: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_ENDPOINT_ENV_VAR: &str = "AWS_ENDPOINT";
pub const ASSET_PUBLIC_URL_ENV_VAR: &str = "ASSET_PUBLIC_URL";
pub const ASSET_STORE_DIR_ENV_VAR: &str = "ASSET_STORE_DIR";

pub const DEFAULT_SPORTS_DATA_URL: &str = "https://api.sportsdata.io/v3/";
pub const DEFAULT_AWS_REGION: &str = "us-east-1";
pub const DEFAULT_CONCURRENCY: usize = 8;
pub const MAX_CONCURRENCY: usize = 64;
/// Rows per transaction for batched stat and score writes.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Where generated assets are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetStoreConfig {
    /// An S3 bucket, written with SigV4-signed requests.
    S3(S3Settings),
    /// Local directory, mostly for development runs.
    Local {
        root: PathBuf,
        public_url: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Access key id and secret. When unset, credentials come from the
    /// instance or task role.
    pub credentials: Option<(String, String)>,
    /// Custom endpoint for S3-compatible services (MinIO, R2, ...).
    pub endpoint: Option<String>,
    /// Base of the returned locators, e.g. a CDN in front of the bucket.
    pub public_url: Option<String>,
}

/// Knobs for the per-athlete worker pool and batched writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub concurrency: usize,
    pub batch_size: usize,
    pub upload_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            batch_size: DEFAULT_BATCH_SIZE,
            upload_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub provider_url: String,
    pub api_keys: HashMap<Sport, String>,
    pub template_dir: PathBuf,
    pub db_path: PathBuf,
    pub http_timeout: Duration,
    pub pipeline: PipelineSettings,
    pub asset_store: Option<AssetStoreConfig>,
}

impl SyncConfig {
    /// Load `.env` (if any) and build the configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut api_keys = HashMap::new();
        for sport in Sport::ALL {
            if let Some(key) = get(sport.api_key_env_var()) {
                api_keys.insert(sport, key);
            }
        }

        let db_path = match get(DB_PATH_ENV_VAR) {
            Some(path) => PathBuf::from(path),
            None => default_db_path(),
        };

        let concurrency = parse_or(get(CONCURRENCY_ENV_VAR), CONCURRENCY_ENV_VAR, DEFAULT_CONCURRENCY)?
            .clamp(1, MAX_CONCURRENCY);
        let http_timeout = parse_or(get(HTTP_TIMEOUT_ENV_VAR), HTTP_TIMEOUT_ENV_VAR, 30u64)?;
        let upload_timeout = parse_or(get(UPLOAD_TIMEOUT_ENV_VAR), UPLOAD_TIMEOUT_ENV_VAR, 60u64)?;

        let asset_store = match (get(AWS_BUCKET_NAME_ENV_VAR), get(ASSET_STORE_DIR_ENV_VAR)) {
            (Some(bucket), _) => {
                let credentials = match (
                    get(AWS_ACCESS_KEY_ID_ENV_VAR),
                    get(AWS_SECRET_ACCESS_KEY_ENV_VAR),
                ) {
                    (Some(id), Some(secret)) => Some((id, secret)),
                    (None, None) => None,
                    (Some(_), None) => {
                        return Err(SyncError::MissingConfig {
                            env_var: AWS_SECRET_ACCESS_KEY_ENV_VAR.to_string(),
                        })
                    }
                    (None, Some(_)) => {
                        return Err(SyncError::MissingConfig {
                            env_var: AWS_ACCESS_KEY_ID_ENV_VAR.to_string(),
                        })
                    }
                };
                Some(AssetStoreConfig::S3(S3Settings {
                    bucket,
                    region: get(AWS_REGION_ENV_VAR)
                        .unwrap_or_else(|| DEFAULT_AWS_REGION.to_string()),
                    credentials,
                    endpoint: get(AWS_ENDPOINT_ENV_VAR),
                    public_url: get(ASSET_PUBLIC_URL_ENV_VAR),
                }))
            }
            (None, Some(dir)) => Some(AssetStoreConfig::Local {
                root: PathBuf::from(dir),
                public_url: get(ASSET_PUBLIC_URL_ENV_VAR),
            }),
            (None, None) => None,
        };

        Ok(Self {
            provider_url: get(SPORTS_DATA_URL_ENV_VAR)
                .unwrap_or_else(|| DEFAULT_SPORTS_DATA_URL.to_string()),
            api_keys,
            template_dir: PathBuf::from(
                get(TEMPLATE_DIR_ENV_VAR).unwrap_or_else(|| "templates".to_string()),
            ),
            db_path,
            http_timeout: Duration::from_secs(http_timeout),
            pipeline: PipelineSettings {
                concurrency,
                batch_size: DEFAULT_BATCH_SIZE,
                upload_timeout: Duration::from_secs(upload_timeout),
            },
            asset_store,
        })
    }
}

/// Path: <data dir>/athlete-sync/store.db
pub fn default_db_path() -> PathBuf {
    let base = dirs::data_dir().unwrap_or_else(|| {
        let mut home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.push(".local");
        home.push("share");
        home
    });
    base.join("athlete-sync").join("store.db")
}

fn parse_or<T>(raw: Option<String>, env_var: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| SyncError::InvalidConfig {
                env_var: env_var.to_string(),
                message: e.to_string(),
            }),
        None => Ok(default),
    }
}
