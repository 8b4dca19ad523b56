//! Object storage for generated assets.

use async_trait::async_trait;
use object_store::{
    aws::{AmazonS3, AmazonS3Builder},
    path::Path as ObjectPath,
    Attribute, Attributes, ObjectStore as RemoteStore, PutOptions, PutPayload, RetryConfig,
};
use std::{
    path::{Component, Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tracing::{debug, warn};

use super::layout::{layout_for, AssetKind, KeyScheme};
use crate::cli::types::{AthleteApiId, Sport};
use crate::config::{AssetStoreConfig, S3Settings, AWS_BUCKET_NAME_ENV_VAR};
use crate::{error::SyncError, Result};

pub const SVG_CONTENT_TYPE: &str = "image/svg+xml";
pub const NO_CACHE: &str = "no-cache";


/// A durable key/value blob store that hands back a public locator.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        cache_control: &str,
    ) -> Result<String>;
}

/// Objects in an S3 bucket (or an S3-compatible service behind `endpoint`).
#[derive(Debug)]
pub struct S3ObjectStore {
    bucket: AmazonS3,
    locator_base: String,
}

impl S3ObjectStore {
    pub fn new(settings: &S3Settings) -> Result<Self> {
        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&settings.bucket)
            .with_region(&settings.region)
            // AssetUploader bounds each upload; a failed one is not retried.
            .with_retry(RetryConfig {
                max_retries: 0,
                ..RetryConfig::default()
            });
        if let Some((key_id, secret)) = &settings.credentials {
            builder = builder
                .with_access_key_id(key_id)
                .with_secret_access_key(secret);
        }
        if let Some(endpoint) = &settings.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }

        let bucket = builder.build().map_err(|e| SyncError::InvalidConfig {
            env_var: AWS_BUCKET_NAME_ENV_VAR.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            bucket,
            locator_base: locator_base(settings),
        })
    }
}

/// Public URL prefix for stored objects.
fn locator_base(settings: &S3Settings) -> String {
    match (&settings.public_url, &settings.endpoint) {
        (Some(url), _) => url.trim_end_matches('/').to_string(),
        (None, Some(endpoint)) => {
            format!("{}/{}", endpoint.trim_end_matches('/'), settings.bucket)
        }
        (None, None) => format!(
            "https://{}.s3.{}.amazonaws.com",
            settings.bucket, settings.region
        ),
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        cache_control: &str,
    ) -> Result<String> {
        if key.is_empty() {
            return Err(SyncError::upload(key, "key must not be empty"));
        }
        let location = ObjectPath::parse(key).map_err(|e| SyncError::upload(key, e))?;

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        attributes.insert(Attribute::CacheControl, cache_control.to_string().into());
        let options = PutOptions {
            attributes,
            ..PutOptions::default()
        };

        self.bucket
            .put_opts(&location, PutPayload::from(bytes), options)
            .await
            .map_err(|e| SyncError::upload(key, e))?;
        Ok(format!("{}/{}", self.locator_base, key))
    }
}

/// Filesystem-backed store for development runs.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    public_url: Option<String>,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_url: Option<String>) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.map(|u| u.trim_end_matches('/').to_string()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
        _cache_control: &str,
    ) -> Result<String> {
        let rel = Path::new(key);
        if key.is_empty() || rel.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(SyncError::upload(key, "key must be a relative path"));
        }

        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SyncError::upload(key, e))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| SyncError::upload(key, e))?;

        Ok(match &self.public_url {
            Some(base) => format!("{base}/{key}"),
            None => format!("file://{}", path.display()),
        })
    }
}

/// Build the configured store.
pub fn object_store_from_config(config: &AssetStoreConfig) -> Result<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match config {
        AssetStoreConfig::S3(settings) => Arc::new(S3ObjectStore::new(settings)?),
        AssetStoreConfig::Local { root, public_url } => {
            Arc::new(LocalObjectStore::new(root.clone(), public_url.clone()))
        }
    };
    Ok(store)
}

/// Uploads one asset with a timeout and `Cache-Control: no-cache`.
///
/// There is no retry: a failed upload is reported and the caller drops the
/// athlete for this run.
#[derive(Clone)]
pub struct AssetUploader {
    store: Arc<dyn ObjectStore>,
    timeout: Duration,
}

impl AssetUploader {
    pub fn new(store: Arc<dyn ObjectStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        debug!(key, bytes = bytes.len(), "uploading asset");
        match tokio::time::timeout(
            self.timeout,
            self.store.put(key, bytes, content_type, NO_CACHE),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(key, timeout = ?self.timeout, "upload timed out");
                Err(SyncError::upload(
                    key,
                    format!("timed out after {}s", self.timeout.as_secs_f32()),
                ))
            }
        }
    }
}

/// Deterministic object key for one athlete asset.
pub fn asset_key(
    sport: Sport,
    kind: AssetKind,
    api_id: AthleteApiId,
    first_name: &str,
    last_name: &str,
) -> String {
    let layout = layout_for(sport);
    let prefix = layout.template(kind).key_prefix;
    match layout.key_scheme {
        KeyScheme::IdOnly => format!("{prefix}{api_id}.svg"),
        KeyScheme::IdAndName => format!(
            "{prefix}{api_id}-{}-{}.svg",
            slugify(first_name),
            slugify(last_name)
        ),
    }
}

/// Lower-case, with every run of non-alphanumerics collapsed to one `-`.
pub fn slugify(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            out.push(ch);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}
