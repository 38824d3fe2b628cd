//! On-disk catalog cache
//!
//! Wraps another source and keeps the last good catalog on disk.
//! Includes caching with a 15-minute TTL to reduce network requests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::{Catalog, CatalogError, CatalogSource};

/// Default cache TTL (15 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// Cached catalog metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedCatalog {
    /// When the catalog was cached (Unix timestamp)
    pub cached_at: u64,

    /// Origin the catalog was fetched from
    pub origin: String,

    /// The cached catalog
    pub catalog: Catalog,
}

/// A `CatalogSource` decorator that serves fresh cache hits without a fetch
pub struct CachedCatalogSource<S> {
    inner: S,
    cache_dir: PathBuf,
    ttl: Duration,
    force_refresh: bool,
}

impl<S: CatalogSource> CachedCatalogSource<S> {
    pub fn new(inner: S, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            cache_dir: cache_dir.into(),
            ttl: DEFAULT_CACHE_TTL,
            force_refresh: false,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Skip the cache read (the fresh result is still written back)
    pub fn force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    /// Cache file path for this source's origin
    pub fn cache_path(&self) -> PathBuf {
        cache_path_for_origin(&self.cache_dir, self.inner.origin())
    }

    /// Load cached catalog if valid
    fn load_cached(&self) -> Result<Option<Catalog>> {
        let cache_path = self.cache_path();

        if !cache_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&cache_path)
            .with_context(|| format!("Failed to read cache: {}", cache_path.display()))?;

        let cached: CachedCatalog = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse cache: {}", cache_path.display()))?;

        let age = Duration::from_secs(unix_now().saturating_sub(cached.cached_at));

        if age > self.ttl {
            tracing::debug!("Cache expired for {} (age: {:?})", cached.origin, age);
            return Ok(None);
        }

        tracing::debug!("Using cached catalog for {} (age: {:?})", cached.origin, age);
        Ok(Some(cached.catalog))
    }

    /// Save catalog to cache
    fn save_to_cache(&self, catalog: &Catalog) -> Result<()> {
        std::fs::create_dir_all(&self.cache_dir).with_context(|| {
            format!(
                "Failed to create cache directory: {}",
                self.cache_dir.display()
            )
        })?;

        let cache_path = self.cache_path();
        let cached = CachedCatalog {
            cached_at: unix_now(),
            origin: self.inner.origin().to_string(),
            catalog: catalog.clone(),
        };

        let content = serde_json::to_string(&cached).context("Failed to serialize cache")?;

        std::fs::write(&cache_path, content)
            .with_context(|| format!("Failed to write cache: {}", cache_path.display()))?;

        tracing::debug!("Saved catalog to cache: {}", cache_path.display());
        Ok(())
    }
}

#[async_trait]
impl<S: CatalogSource> CatalogSource for CachedCatalogSource<S> {
    async fn fetch_catalog(&self) -> Result<Catalog, CatalogError> {
        // Check cache first (unless force refresh)
        if !self.force_refresh {
            match self.load_cached() {
                Ok(Some(cached)) => return Ok(cached),
                Ok(None) => {}
                Err(e) => tracing::debug!("Ignoring unreadable catalog cache: {:#}", e),
            }
        }

        let catalog = self.inner.fetch_catalog().await?;

        // Save to cache (ignore errors - caching is best effort)
        if let Err(e) = self.save_to_cache(&catalog) {
            tracing::warn!("Failed to save catalog to cache: {:#}", e);
        }

        Ok(catalog)
    }

    fn origin(&self) -> &str {
        self.inner.origin()
    }
}

/// Get cache file path for an origin
fn cache_path_for_origin(cache_dir: &Path, origin: &str) -> PathBuf {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    origin.hash(&mut hasher);
    let hash = hasher.finish();

    cache_dir.join(format!("catalog_{hash:016x}.json"))
}

/// Remove every cached catalog in `cache_dir`, returning how many were removed
pub fn clear_cache(cache_dir: &Path) -> Result<usize> {
    if !cache_dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in std::fs::read_dir(cache_dir)
        .with_context(|| format!("Failed to read cache directory: {}", cache_dir.display()))?
    {
        let path = entry?.path();
        let is_catalog = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with("catalog_") && name.ends_with(".json"))
            .unwrap_or(false);

        if path.is_file() && is_catalog {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove cache: {}", path.display()))?;
            removed += 1;
        }
    }

    Ok(removed)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
