//! Template loading with an in-memory LRU layer.

use async_trait::async_trait;
use lru::LruCache;
use std::{
    io::ErrorKind,
    num::NonZeroUsize,
    path::{Component, Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::debug;

use crate::{error::SyncError, Result};

/// Enough for both MLB templates, the fragment and every NFL team pair.
pub const DEFAULT_TEMPLATE_CACHE_CAPACITY: usize = 128;

/// Supplies raw template markup by relative path.
#[async_trait]
pub trait TemplateSource: Send + Sync {
    async fn load(&self, relative: &str) -> Result<Arc<str>>;
}

/// Templates read from a directory tree, e.g. `templates/nfl/images/KC.svg`.
pub struct FsTemplateSource {
    root: PathBuf,
    cache: Mutex<LruCache<String, Arc<str>>>,
}

impl FsTemplateSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_capacity(root, DEFAULT_TEMPLATE_CACHE_CAPACITY)
    }

    pub fn with_capacity(root: impl Into<PathBuf>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            root: root.into(),
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of templates currently held in memory.
    pub fn cached(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let rel = Path::new(relative);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if relative.is_empty() || escapes {
            return Err(SyncError::TemplateMissing {
                path: relative.to_string(),
            });
        }
        Ok(self.root.join(rel))
    }

    fn cached_markup(&self, relative: &str) -> Result<Option<Arc<str>>> {
        let mut cache = self.cache.lock().map_err(|_| SyncError::LockPoisoned)?;
        Ok(cache.get(relative).map(Arc::clone))
    }

    fn remember(&self, relative: &str, markup: &Arc<str>) -> Result<()> {
        self.cache
            .lock()
            .map_err(|_| SyncError::LockPoisoned)?
            .put(relative.to_string(), Arc::clone(markup));
        Ok(())
    }
}

#[async_trait]
impl TemplateSource for FsTemplateSource {
    async fn load(&self, relative: &str) -> Result<Arc<str>> {
        if let Some(hit) = self.cached_markup(relative)? {
            return Ok(hit);
        }

        let path = self.resolve(relative)?;
        let markup: Arc<str> = match tokio::fs::read_to_string(&path).await {
            Ok(s) => Arc::from(s),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SyncError::TemplateMissing {
                    path: path.display().to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        debug!(template = relative, bytes = markup.len(), "template loaded");

        self.remember(relative, &markup)?;
        Ok(markup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn source_with(files: &[(&str, &str)]) -> (TempDir, FsTemplateSource) {
        let dir = TempDir::new().unwrap();
        for (rel, body) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        let source = FsTemplateSource::with_capacity(dir.path(), 2);
        (dir, source)
    }

    #[tokio::test]
    async fn test_load_and_cache() {
        let (dir, source) = source_with(&[("nfl/images/KC.svg", "<svg/>")]);
        assert_eq!(&*source.load("nfl/images/KC.svg").await.unwrap(), "<svg/>");
        assert_eq!(source.cached(), 1);

        // Served from memory once loaded.
        fs::remove_file(dir.path().join("nfl/images/KC.svg")).unwrap();
        assert_eq!(&*source.load("nfl/images/KC.svg").await.unwrap(), "<svg/>");
    }

    #[tokio::test]
    async fn test_missing_template() {
        let (_dir, source) = source_with(&[]);
        let err = source.load("nfl/images/XX.svg").await.unwrap_err();
        assert!(matches!(err, SyncError::TemplateMissing { .. }));
        assert!(err.is_row_scoped());
    }

    #[tokio::test]
    async fn test_rejects_paths_outside_root() {
        let (_dir, source) = source_with(&[]);
        for bad in ["../secret.svg", "/etc/passwd", ""] {
            assert!(
                matches!(source.load(bad).await, Err(SyncError::TemplateMissing { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_cache_is_bounded() {
        let (_dir, source) = source_with(&[("a.svg", "<a/>"), ("b.svg", "<b/>"), ("c.svg", "<c/>")]);
        for name in ["a.svg", "b.svg", "c.svg"] {
            source.load(name).await.unwrap();
        }
        assert_eq!(source.cached(), 2);
    }
}
