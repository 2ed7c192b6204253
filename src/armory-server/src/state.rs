//! Shared application state
//!
//! The content client is constructed once at startup and shared by every
//! request. Each request still resolves against freshly fetched tables.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use armory::{
    CatalogError, CatalogResult, ContentClient, Manifest, Resolution, ResolverConfig, WeaponCatalog,
};
use tokio::sync::RwLock;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe view of a content client, so handlers need not be generic
pub trait CatalogSource: Send + Sync {
    fn manifest(&self, timeout: Duration) -> BoxFuture<'_, CatalogResult<Manifest>>;

    fn resolve<'a>(
        &'a self,
        config: &'a ResolverConfig,
    ) -> BoxFuture<'a, CatalogResult<Resolution>>;
}

impl<C: ContentClient> CatalogSource for C {
    fn manifest(&self, timeout: Duration) -> BoxFuture<'_, CatalogResult<Manifest>> {
        Box::pin(armory::fetch_manifest(self, timeout))
    }

    fn resolve<'a>(
        &'a self,
        config: &'a ResolverConfig,
    ) -> BoxFuture<'a, CatalogResult<Resolution>> {
        Box::pin(armory::resolve(self, config))
    }
}

/// Last background resolution
#[derive(Debug, Clone, Default)]
pub enum Snapshot {
    #[default]
    Pending,
    Ready(Arc<WeaponCatalog>),
    Failed(CatalogError),
}

pub struct AppState {
    pub source: Arc<dyn CatalogSource>,
    pub config: ResolverConfig,
    pub debug_dir: Option<PathBuf>,
    pub snapshot: RwLock<Snapshot>,
    /// Refreshes started so far
    started: AtomicU64,
    /// Start number of the refresh whose result the snapshot holds.
    /// Only written under the snapshot write lock.
    applied: AtomicU64,
}

impl AppState {
    pub fn new(source: Arc<dyn CatalogSource>, config: ResolverConfig) -> Self {
        Self {
            source,
            config,
            debug_dir: None,
            snapshot: RwLock::new(Snapshot::Pending),
            started: AtomicU64::new(0),
            applied: AtomicU64::new(0),
        }
    }

    pub fn with_debug_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.debug_dir = dir;
        self
    }

    /// Catalog from the last successful background resolution
    pub async fn snapshot(&self) -> CatalogResult<Arc<WeaponCatalog>> {
        match &*self.snapshot.read().await {
            Snapshot::Ready(catalog) => Ok(catalog.clone()),
            Snapshot::Pending => Err(CatalogError::NotReady(
                "weapon catalog is still resolving".into(),
            )),
            Snapshot::Failed(e) => Err(CatalogError::NotReady(format!(
                "last resolution failed: {e}"
            ))),
        }
    }

    /// Re-resolve the snapshot.
    ///
    /// A failure after an earlier success keeps serving the older catalog.
    /// When refreshes overlap, a result is only installed if no refresh
    /// started after it has been installed already.
    pub async fn refresh_snapshot(&self) -> CatalogResult<Arc<WeaponCatalog>> {
        let generation = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.source.resolve(&self.config).await;

        let mut snapshot = self.snapshot.write().await;
        if self.applied.load(Ordering::SeqCst) > generation {
            tracing::debug!(generation, "discarding superseded snapshot refresh");
            return result.map(|r| Arc::new(r.catalog));
        }
        self.applied.store(generation, Ordering::SeqCst);

        match result {
            Ok(resolution) => {
                let catalog = Arc::new(resolution.catalog);
                *snapshot = Snapshot::Ready(catalog.clone());
                Ok(catalog)
            }
            Err(e) => {
                tracing::warn!(error = %e, "snapshot resolution failed");
                if !matches!(*snapshot, Snapshot::Ready(_)) {
                    *snapshot = Snapshot::Failed(e.clone());
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use armory::mock::{ManifestFixture, StaticClient};
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    /// Serves the sample manifest until `down` is set
    struct Flaky {
        up: StaticClient,
        down_client: StaticClient,
        down: AtomicBool,
    }

    impl CatalogSource for Flaky {
        fn manifest(&self, timeout: Duration) -> BoxFuture<'_, CatalogResult<Manifest>> {
            if self.down.load(Ordering::SeqCst) {
                self.down_client.manifest(timeout)
            } else {
                self.up.manifest(timeout)
            }
        }

        fn resolve<'a>(
            &'a self,
            config: &'a ResolverConfig,
        ) -> BoxFuture<'a, CatalogResult<Resolution>> {
            if self.down.load(Ordering::SeqCst) {
                CatalogSource::resolve(&self.down_client, config)
            } else {
                CatalogSource::resolve(&self.up, config)
            }
        }
    }

    fn flaky() -> Arc<Flaky> {
        Arc::new(Flaky {
            up: ManifestFixture::sample("v1").into_client(),
            down_client: StaticClient::new(),
            down: AtomicBool::new(false),
        })
    }

    #[tokio::test]
    async fn test_snapshot_pending_is_not_ready() {
        let state = AppState::new(flaky(), ResolverConfig::default());
        let err = state.snapshot().await.unwrap_err();
        assert_eq!(err.kind(), "not_ready");
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_catalog() {
        let source = flaky();
        let state = AppState::new(source.clone(), ResolverConfig::default());

        let first = state.refresh_snapshot().await.unwrap();
        assert_eq!(first.len(), 4);

        source.down.store(true, Ordering::SeqCst);
        let err = state.refresh_snapshot().await.unwrap_err();
        assert_eq!(err.kind(), "remote_unavailable");

        let kept = state.snapshot().await.unwrap();
        assert_eq!(kept.version, "v1");
        assert_eq!(kept.len(), 4);
    }

    #[tokio::test]
    async fn test_failure_before_success_is_reported() {
        let source = flaky();
        source.down.store(true, Ordering::SeqCst);
        let state = AppState::new(source, ResolverConfig::default());

        assert!(state.refresh_snapshot().await.is_err());
        assert!(matches!(*state.snapshot.read().await, Snapshot::Failed(_)));
        assert_eq!(state.snapshot().await.unwrap_err().kind(), "not_ready");
    }

    /// Each resolve call takes the next stage: wait, then serve its manifest
    struct Staged {
        calls: AtomicUsize,
        stages: Vec<(Duration, StaticClient)>,
    }

    impl CatalogSource for Staged {
        fn manifest(&self, timeout: Duration) -> BoxFuture<'_, CatalogResult<Manifest>> {
            self.stages[0].1.manifest(timeout)
        }

        fn resolve<'a>(
            &'a self,
            config: &'a ResolverConfig,
        ) -> BoxFuture<'a, CatalogResult<Resolution>> {
            let (delay, client) = &self.stages[self.calls.fetch_add(1, Ordering::SeqCst)];
            Box::pin(async move {
                tokio::time::sleep(*delay).await;
                CatalogSource::resolve(client, config).await
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_older_refresh_does_not_replace_newer() {
        let source = Arc::new(Staged {
            calls: AtomicUsize::new(0),
            stages: vec![
                (
                    Duration::from_millis(500),
                    ManifestFixture::sample("old").into_client(),
                ),
                (
                    Duration::from_millis(10),
                    ManifestFixture::sample("new").into_client(),
                ),
            ],
        });
        let state = AppState::new(source, ResolverConfig::default());

        let (older, newer) = tokio::join!(state.refresh_snapshot(), state.refresh_snapshot());
        assert_eq!(older.unwrap().version, "old");
        assert_eq!(newer.unwrap().version, "new");

        assert_eq!(state.snapshot().await.unwrap().version, "new");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_older_failure_does_not_mark_failed() {
        let source = Arc::new(Staged {
            calls: AtomicUsize::new(0),
            stages: vec![
                (Duration::from_millis(500), StaticClient::new()),
                (
                    Duration::from_millis(10),
                    ManifestFixture::sample("new").into_client(),
                ),
            ],
        });
        let state = AppState::new(source, ResolverConfig::default());

        let (older, newer) = tokio::join!(state.refresh_snapshot(), state.refresh_snapshot());
        assert!(older.is_err());
        assert!(newer.is_ok());
        assert!(matches!(*state.snapshot.read().await, Snapshot::Ready(_)));
    }
}
