// Engine wiring.
// Builds the fetch stack, binds it to the page, and runs the watcher loop.

use std::sync::Arc;

use tracing::debug;

use crate::cache::ExpiringCache;
use crate::cache::store::KeyValueStore;
use crate::error::Result;
use crate::github::fetch::RetryingFetcher;
use crate::github::providers::{StatsProviders, StatsSource};
use crate::options::EngineOptions;
use crate::page::binder::PageBinder;
use crate::page::chart::ChartRenderer;
use crate::page::dom::HostPage;
use crate::watch::{NavigationHub, NavigationWatcher, Refresh};

/// The observation-and-refresh engine, wired over the embedder's
/// collaborators: the live page, a persistent key-value store, and a chart
/// renderer.
pub struct Engine {
    hub: NavigationHub,
    watcher: NavigationWatcher,
    binder: Arc<PageBinder>,
    page: Arc<dyn HostPage>,
}

impl Engine {
    /// Build the production stack: retrying fetcher, TTL cache over `store`,
    /// and the GitHub stats providers.
    pub fn new(
        options: EngineOptions,
        page: Arc<dyn HostPage>,
        store: Arc<dyn KeyValueStore>,
        charts: Arc<dyn ChartRenderer>,
    ) -> Result<Self> {
        let fetcher = RetryingFetcher::new(&options)?;
        let cache = ExpiringCache::new(store);
        let stats = Arc::new(StatsProviders::new(fetcher, cache, options.clone()));
        Ok(Self::with_source(options, page, stats, charts))
    }

    /// Wire the engine around a caller-supplied stats source.
    pub fn with_source(
        options: EngineOptions,
        page: Arc<dyn HostPage>,
        stats: Arc<dyn StatsSource>,
        charts: Arc<dyn ChartRenderer>,
    ) -> Self {
        let binder = Arc::new(PageBinder::new(Arc::clone(&page), stats, charts, options));
        let (hub, watcher) = NavigationWatcher::new(Arc::clone(&binder) as Arc<dyn Refresh>);
        Self {
            hub,
            watcher,
            binder,
            page,
        }
    }

    /// Publisher handle for the host's navigation adapters. Take clones
    /// before calling [`Engine::run`].
    pub fn hub(&self) -> NavigationHub {
        self.hub.clone()
    }

    /// Refresh once for the host's current location, then consume navigation
    /// events until every outstanding hub handle is dropped.
    pub async fn run(self) {
        let Engine {
            hub,
            mut watcher,
            binder,
            page,
        } = self;
        // The watcher loop ends on the last dropped handle; the engine's own
        // must not keep it alive.
        drop(hub);

        debug!("engine started");
        // The startup path counts as seen; mutation churn on it is not a
        // navigation.
        watcher.note_path(&page.current_path());
        binder.refresh().await;
        watcher.run().await;
        debug!("engine stopped");
    }
}
