// GitHub API module.
// Provides the fetch layer, response types, and statistics providers.

pub mod fetch;
pub mod providers;
pub mod types;

pub use fetch::{FetchOptions, RetryingFetcher};
pub use providers::{StatsProviders, StatsSource};
pub use types::*;
