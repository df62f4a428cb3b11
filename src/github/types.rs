// GitHub API response types.
// Defines structs for deserializing the release, stargazer, and traffic endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// GitHub release with its downloadable assets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// Downloadable asset attached to a release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub download_count: u64,
}

/// Stargazer entry from the star-timestamp media type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stargazer {
    pub starred_at: DateTime<Utc>,
}

/// Raw body of the traffic-data endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TrafficPayload {
    #[serde(default)]
    pub counts: Vec<TrafficSample>,
}

/// One day bucket of page views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficSample {
    pub bucket: i64,
    pub total: u64,
    pub unique: u64,
}

/// Star counts aggregated per calendar day, with a running total.
///
/// `labels`, `daily`, and `cumulative` are parallel: `daily[i]` stars were
/// given on `labels[i]`, and `cumulative[i]` is the sum of `daily[0..=i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarHistory {
    pub labels: Vec<String>,
    pub daily: Vec<u64>,
    pub cumulative: Vec<u64>,
}
