//! Engine for annotating GitHub repository pages with download, star, and
//! traffic statistics.
//!
//! The embedder supplies the live page, a persistent key-value store, and a
//! chart renderer as trait objects, then feeds SPA navigation signals into
//! the engine's hub. The engine owns route classification, the retrying
//! cache-backed fetch layer, navigation watching, and idempotent content
//! injection.

pub mod cache;
pub mod engine;
pub mod error;
pub mod format;
pub mod github;
pub mod options;
pub mod page;
pub mod watch;

#[cfg(test)]
mod testkit;

pub use cache::{DiskStore, ExpiringCache, KeyValueStore, MemoryStore};
pub use engine::Engine;
pub use error::{GlossError, Result};
pub use format::{hot_level_color, human_readable_number};
pub use github::{Release, ReleaseAsset, StarHistory, StatsProviders, StatsSource, TrafficSample};
pub use options::EngineOptions;
pub use page::{ChartRenderer, ChartSeries, HostPage, LineChart, NodeHandle, PageBinder};
pub use watch::{NavigationEvent, NavigationHub, NavigationTrigger, NavigationWatcher, Refresh};
