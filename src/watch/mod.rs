// Navigation observation.
// Converts SPA route-change signals from host adapters into refreshes.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

/// Entry point driven on every observed navigation.
#[async_trait]
pub trait Refresh: Send + Sync {
    async fn refresh(&self);
}

/// What produced a navigation signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationTrigger {
    /// A wrapped history push completed.
    HistoryPush,
    /// A wrapped history replace completed.
    HistoryReplace,
    /// Back/forward traversal.
    PopState,
    /// Document-subtree child-list change.
    DomMutation,
}

/// One navigation signal from a host adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEvent {
    pub trigger: NavigationTrigger,
    pub path: String,
}

impl NavigationEvent {
    pub fn new(trigger: NavigationTrigger, path: &str) -> Self {
        Self {
            trigger,
            path: path.to_string(),
        }
    }
}

/// Cloneable publisher handle the host's navigation adapters push into.
///
/// The embedder wraps its history mutations, back/forward listener, and
/// document mutation observer to publish here; the watcher holds the sole
/// receiving end.
#[derive(Clone)]
pub struct NavigationHub {
    tx: mpsc::UnboundedSender<NavigationEvent>,
}

impl NavigationHub {
    /// Publish one navigation signal. Silently dropped once the watcher is gone.
    pub fn publish(&self, event: NavigationEvent) {
        let _ = self.tx.send(event);
    }
}

/// Sole subscriber of the navigation hub; drives the refresh entry point.
pub struct NavigationWatcher {
    rx: mpsc::UnboundedReceiver<NavigationEvent>,
    refresher: Arc<dyn Refresh>,
    last_path: Option<String>,
}

impl NavigationWatcher {
    /// Create a watcher together with the hub that feeds it.
    pub fn new(refresher: Arc<dyn Refresh>) -> (NavigationHub, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            NavigationHub { tx },
            Self {
                rx,
                refresher,
                last_path: None,
            },
        )
    }

    /// Record `path` as already seen without refreshing.
    ///
    /// The engine seeds this with the host's startup path, so mutation
    /// churn arriving right after the initial refresh is absorbed.
    pub fn note_path(&mut self, path: &str) {
        self.last_path = Some(path.to_string());
    }

    /// Consume navigation events until every hub handle is dropped.
    pub async fn run(mut self) {
        while let Some(event) = self.rx.recv().await {
            self.observe(event).await;
        }
    }

    /// History and traversal signals always refresh. DOM mutation is the
    /// fallback for navigations that bypass the wrapped history calls, and
    /// only refreshes when the path actually changed, debouncing the churn
    /// of pages that rewrite themselves without navigating.
    async fn observe(&mut self, event: NavigationEvent) {
        let changed = self.last_path.as_deref() != Some(event.path.as_str());
        let fire = match event.trigger {
            NavigationTrigger::DomMutation => changed,
            _ => true,
        };

        if fire {
            debug!(trigger = ?event.trigger, path = %event.path, "navigation observed");
            self.refresher.refresh().await;
        }
        self.last_path = Some(event.path);
    }
}
