// Engine configuration.
// Endpoint bases, credentials, and the retry/TTL/anchor-wait budgets.

use std::time::Duration;

/// Tunables for the engine. `Default` matches production GitHub.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// REST API base, no trailing slash.
    pub api_base: String,
    /// Web host base, used for the traffic-data endpoint.
    pub web_base: String,
    /// Mirror prefix for asset download links.
    pub mirror_base: String,
    /// Optional bearer token for API requests.
    pub api_token: Option<String>,
    /// Session cookie sent with credentialed requests (traffic data).
    pub session_cookie: Option<String>,
    /// How long cached provider responses stay fresh.
    pub cache_ttl: Duration,
    /// Attempt budget for each request, counting the first try.
    pub max_attempts: u32,
    /// How long to wait for a DOM anchor before giving up.
    pub anchor_timeout: Duration,
    /// Interval between anchor existence checks.
    pub poll_interval: Duration,
    /// Stargazer pagination size.
    pub stars_page_size: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            web_base: "https://github.com".to_string(),
            mirror_base: "https://mirror.ghproxy.com".to_string(),
            api_token: None,
            session_cookie: None,
            cache_ttl: Duration::from_secs(10 * 60),
            max_attempts: 6,
            anchor_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(100),
            stars_page_size: 100,
        }
    }
}
