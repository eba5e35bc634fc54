//! Tenant directory abstraction
//!
//! Read-only lookups from host material (slug or custom domain) to a
//! tenant snapshot. Writes belong to the CRUD layer and never happen
//! through this seam.

use crate::cache::Cache;
use crate::errors::Result;
use crate::metrics;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// The tenant fields the resolution and canonical-URL paths need.
///
/// `custom_domain_active` reflects the owning DNS zone status at lookup
/// time; the canonical builder trusts it instead of re-verifying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSnapshot {
    pub id: Uuid,
    pub slug: String,
    pub custom_domain: Option<String>,
    pub custom_domain_active: bool,
    pub prefer_custom_domain_for_canonical: bool,
    pub is_active: bool,
}

/// Read path into the tenant store
///
/// Absence is not an error: `Ok(None)` means "definitely no tenant",
/// while `Err(_)` means the directory could not be consulted.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Find an active tenant by subdomain slug
    async fn find_by_slug(&self, slug: &str) -> Result<Option<TenantSnapshot>>;

    /// Find an active tenant by custom domain; requires the owning
    /// DNS zone to be active
    async fn find_by_custom_domain(&self, domain: &str) -> Result<Option<TenantSnapshot>>;
}

/// Snapshot storage used by the directory cache decorator
///
/// The Redis `Cache` is the production implementation; tests use an
/// in-memory fake to exercise the degradation paths.
#[async_trait]
pub trait DirectoryCache: Send + Sync {
    async fn get_snapshot(&self, key: &str) -> Result<Option<TenantSnapshot>>;

    async fn put_snapshot(
        &self,
        key: &str,
        snapshot: &TenantSnapshot,
        ttl_secs: u64,
    ) -> Result<()>;
}

#[async_trait]
impl DirectoryCache for Cache {
    async fn get_snapshot(&self, key: &str) -> Result<Option<TenantSnapshot>> {
        self.get(key).await
    }

    async fn put_snapshot(
        &self,
        key: &str,
        snapshot: &TenantSnapshot,
        ttl_secs: u64,
    ) -> Result<()> {
        self.set_with_ttl(key, snapshot, ttl_secs).await
    }
}

/// Read-through cache decorator for the tenant directory
///
/// Owns no tenant state of its own; constructed once per process and
/// shared by reference. Cache failures degrade to a direct lookup.
pub struct CachedDirectory {
    inner: Arc<dyn TenantDirectory>,
    cache: Arc<dyn DirectoryCache>,
    ttl_secs: u64,
}

impl CachedDirectory {
    pub fn new(inner: Arc<dyn TenantDirectory>, cache: Arc<dyn DirectoryCache>, ttl_secs: u64) -> Self {
        Self { inner, cache, ttl_secs }
    }

    async fn lookup<F, Fut>(&self, key: &str, load: F) -> Result<Option<TenantSnapshot>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Option<TenantSnapshot>>>,
    {
        match self.cache.get_snapshot(key).await {
            Ok(Some(snapshot)) => {
                metrics::record_cache(true, "tenant_directory");
                return Ok(Some(snapshot));
            }
            Ok(None) => {
                metrics::record_cache(false, "tenant_directory");
            }
            Err(e) => {
                warn!(error = %e, key, "Directory cache read failed, falling through");
            }
        }

        let loaded = load().await?;

        // Only positive results are cached; a missing tenant stays a
        // direct lookup so newly created tenants appear immediately.
        if let Some(ref snapshot) = loaded {
            if let Err(e) = self.cache.put_snapshot(key, snapshot, self.ttl_secs).await {
                warn!(error = %e, key, "Directory cache write failed, continuing");
            }
        }

        Ok(loaded)
    }
}

#[async_trait]
impl TenantDirectory for CachedDirectory {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<TenantSnapshot>> {
        let key = keys::by_slug(slug);
        self.lookup(&key, || self.inner.find_by_slug(slug)).await
    }

    async fn find_by_custom_domain(&self, domain: &str) -> Result<Option<TenantSnapshot>> {
        let key = keys::by_domain(domain);
        self.lookup(&key, || self.inner.find_by_custom_domain(domain)).await
    }
}

/// Cache key builder helpers
pub mod keys {
    /// Key for a slug lookup
    pub fn by_slug(slug: &str) -> String {
        format!("tenant:slug:{}", slug)
    }

    /// Key for a custom-domain lookup
    pub fn by_domain(domain: &str) -> String {
        format!("tenant:domain:{}", domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeDirectory {
        by_slug: HashMap<String, TenantSnapshot>,
        calls: Mutex<u32>,
    }

    impl FakeDirectory {
        fn with(snapshot: Option<TenantSnapshot>) -> Arc<Self> {
            let mut by_slug = HashMap::new();
            if let Some(s) = snapshot {
                by_slug.insert(s.slug.clone(), s);
            }
            Arc::new(Self {
                by_slug,
                calls: Mutex::new(0),
            })
        }
    }

    #[async_trait]
    impl TenantDirectory for FakeDirectory {
        async fn find_by_slug(&self, slug: &str) -> Result<Option<TenantSnapshot>> {
            *self.calls.lock().unwrap() += 1;
            Ok(self.by_slug.get(slug).cloned())
        }

        async fn find_by_custom_domain(&self, _: &str) -> Result<Option<TenantSnapshot>> {
            *self.calls.lock().unwrap() += 1;
            Ok(None)
        }
    }

    #[derive(Default)]
    struct FakeCache {
        entries: Mutex<HashMap<String, TenantSnapshot>>,
        failing: bool,
    }

    #[async_trait]
    impl DirectoryCache for FakeCache {
        async fn get_snapshot(&self, key: &str) -> Result<Option<TenantSnapshot>> {
            if self.failing {
                return Err(AppError::CacheError {
                    message: "redis down".into(),
                });
            }
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn put_snapshot(
            &self,
            key: &str,
            snapshot: &TenantSnapshot,
            _ttl_secs: u64,
        ) -> Result<()> {
            if self.failing {
                return Err(AppError::CacheError {
                    message: "redis down".into(),
                });
            }
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), snapshot.clone());
            Ok(())
        }
    }

    fn acme() -> TenantSnapshot {
        TenantSnapshot {
            id: Uuid::new_v4(),
            slug: "acme".into(),
            custom_domain: None,
            custom_domain_active: false,
            prefer_custom_domain_for_canonical: false,
            is_active: true,
        }
    }

    #[test]
    fn test_cache_keys() {
        assert_eq!(keys::by_slug("acme"), "tenant:slug:acme");
        assert_eq!(keys::by_domain("acme.example"), "tenant:domain:acme.example");
    }

    #[tokio::test]
    async fn test_positive_lookup_is_cached() {
        let inner = FakeDirectory::with(Some(acme()));
        let cache = Arc::new(FakeCache::default());
        let cached = CachedDirectory::new(inner.clone(), cache.clone(), 60);

        let first = cached.find_by_slug("acme").await.unwrap();
        assert!(first.is_some());
        let second = cached.find_by_slug("acme").await.unwrap();
        assert_eq!(first, second);

        // Second lookup was served from the cache
        assert_eq!(*inner.calls.lock().unwrap(), 1);
        assert!(cache
            .entries
            .lock()
            .unwrap()
            .contains_key(&keys::by_slug("acme")));
    }

    #[tokio::test]
    async fn test_missing_tenant_is_not_cached() {
        // Negative results stay direct lookups so a freshly created
        // tenant appears without waiting out a TTL.
        let inner = FakeDirectory::with(None);
        let cache = Arc::new(FakeCache::default());
        let cached = CachedDirectory::new(inner.clone(), cache.clone(), 60);

        assert!(cached.find_by_slug("ghost").await.unwrap().is_none());
        assert!(cached.find_by_slug("ghost").await.unwrap().is_none());

        assert!(cache.entries.lock().unwrap().is_empty());
        assert_eq!(*inner.calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_cache_failure_degrades_to_direct_lookup() {
        // A broken cache must not take resolution down with it
        let inner = FakeDirectory::with(Some(acme()));
        let cache = Arc::new(FakeCache {
            failing: true,
            ..Default::default()
        });
        let cached = CachedDirectory::new(inner.clone(), cache, 60);

        let found = cached.find_by_slug("acme").await.unwrap();
        assert!(found.is_some());
        assert_eq!(*inner.calls.lock().unwrap(), 1);
    }
}
