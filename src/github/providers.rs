// Data providers for repository statistics.
// Each provider composes the retrying fetcher with the TTL cache.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::iter::Peekable;
use std::str::Chars;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};

use crate::cache::ExpiringCache;
use crate::error::Result;
use crate::github::fetch::{FetchOptions, RetryingFetcher};
use crate::github::types::{Release, StarHistory, Stargazer, TrafficPayload, TrafficSample};
use crate::options::EngineOptions;

const STAR_MEDIA_TYPE: &str = "application/vnd.github.star+json";

/// Source of repository statistics consumed by the page binder.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// All releases with their assets, in upstream order.
    async fn release_downloads(&self, owner: &str, repo: &str) -> Result<Vec<Release>>;

    /// Sum of download counts across every asset of every release.
    async fn total_downloads(&self, owner: &str, repo: &str) -> Result<u64>;

    /// Per-day star counts with a running total.
    async fn star_history(&self, owner: &str, repo: &str) -> Result<StarHistory>;

    /// Daily page-view samples, ascending by bucket. Requires credentials.
    async fn traffic_data(&self, owner: &str, repo: &str) -> Result<Vec<TrafficSample>>;
}

/// Production `StatsSource` over the GitHub endpoints.
pub struct StatsProviders {
    fetcher: RetryingFetcher,
    cache: ExpiringCache,
    options: EngineOptions,
}

impl StatsProviders {
    pub fn new(fetcher: RetryingFetcher, cache: ExpiringCache, options: EngineOptions) -> Self {
        Self {
            fetcher,
            cache,
            options,
        }
    }

    async fn fetch_releases(&self, owner: &str, repo: &str) -> Result<Vec<Release>> {
        let url = format!(
            "{}/repos/{}/{}/releases",
            self.options.api_base, owner, repo
        );
        self.fetcher.get_json(&url, &FetchOptions::default()).await
    }

    async fn fetch_star_history(&self, owner: &str, repo: &str) -> Result<StarHistory> {
        let opts = FetchOptions {
            accept: Some(STAR_MEDIA_TYPE),
            ..Default::default()
        };

        let mut stargazers = Vec::new();
        for page in 1u32.. {
            let url = format!(
                "{}/repos/{}/{}/stargazers?per_page={}&page={}",
                self.options.api_base, owner, repo, self.options.stars_page_size, page
            );
            let batch: Vec<Stargazer> = self.fetcher.get_json(&url, &opts).await?;
            if batch.is_empty() {
                break;
            }
            stargazers.extend(batch);
        }

        Ok(build_star_history(&stargazers))
    }
}

#[async_trait]
impl StatsSource for StatsProviders {
    async fn release_downloads(&self, owner: &str, repo: &str) -> Result<Vec<Release>> {
        let key = format!("github_release_downloads_{}_{}", owner, repo);
        self.cache
            .get_or_fetch(&key, self.options.cache_ttl, || {
                self.fetch_releases(owner, repo)
            })
            .await
    }

    async fn total_downloads(&self, owner: &str, repo: &str) -> Result<u64> {
        // Rides on the releases cache entry, no cache key of its own.
        let releases = self.release_downloads(owner, repo).await?;
        Ok(sum_downloads(&releases))
    }

    async fn star_history(&self, owner: &str, repo: &str) -> Result<StarHistory> {
        let key = format!("github_star_history_{}_{}", owner, repo);
        self.cache
            .get_or_fetch(&key, self.options.cache_ttl, || {
                self.fetch_star_history(owner, repo)
            })
            .await
    }

    async fn traffic_data(&self, owner: &str, repo: &str) -> Result<Vec<TrafficSample>> {
        let url = format!(
            "{}/{}/{}/graphs/traffic-data",
            self.options.web_base, owner, repo
        );
        let opts = FetchOptions {
            accept: Some("application/json"),
            credentials: true,
        };

        let payload: TrafficPayload = self.fetcher.get_json(&url, &opts).await?;
        let mut counts = payload.counts;
        counts.sort_by_key(|sample| sample.bucket);
        Ok(counts)
    }
}

/// Sum download counts across every asset of every release.
pub fn sum_downloads(releases: &[Release]) -> u64 {
    releases
        .iter()
        .flat_map(|release| &release.assets)
        .map(|asset| asset.download_count)
        .sum()
}

/// Aggregate stargazer timestamps into per-UTC-day counts with a running sum.
pub fn build_star_history(stargazers: &[Stargazer]) -> StarHistory {
    let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for star in stargazers {
        *per_day.entry(star.starred_at.date_naive()).or_insert(0) += 1;
    }

    let mut labels = Vec::with_capacity(per_day.len());
    let mut daily = Vec::with_capacity(per_day.len());
    let mut cumulative = Vec::with_capacity(per_day.len());
    let mut running = 0;
    for (day, count) in per_day {
        running += count;
        labels.push(format!("{}/{}/{}", day.month(), day.day(), day.year()));
        daily.push(count);
        cumulative.push(running);
    }

    StarHistory {
        labels,
        daily,
        cumulative,
    }
}

/// Compare strings digit-run by digit-run, so "v2.0" sorts before "v10.0".
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut xs = a.chars().peekable();
    let mut ys = b.chars().peekable();
    loop {
        match (xs.peek().copied(), ys.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                match take_number(&mut xs).cmp(&take_number(&mut ys)) {
                    Ordering::Equal => {}
                    unequal => return unequal,
                }
            }
            (Some(x), Some(y)) => match x.cmp(&y) {
                Ordering::Equal => {
                    xs.next();
                    ys.next();
                }
                unequal => return unequal,
            },
        }
    }
}

fn take_number(chars: &mut Peekable<Chars<'_>>) -> u64 {
    let mut value = 0u64;
    while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
        value = value.saturating_mul(10).saturating_add(digit as u64);
        chars.next();
    }
    value
}
