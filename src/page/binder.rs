// Route-driven page augmentation.
// Waits for anchors, fetches stats, and injects labels and charts exactly once.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Datelike};
use tracing::{debug, warn};

use crate::error::{GlossError, Result};
use crate::format::{hot_level_color, human_readable_number};
use crate::github::providers::{StatsSource, natural_cmp};
use crate::github::types::{Release, ReleaseAsset, StarHistory, TrafficSample};
use crate::options::EngineOptions;
use crate::page::chart::{ChartRenderer, ChartSeries, LineChart};
use crate::page::dom::{HostPage, NodeHandle, wait_for_element};
use crate::page::route::{Route, classify};
use crate::watch::Refresh;

pub(crate) const RELEASES_SUMMARY_SELECTOR: &str = "#repo-content-pjax-container > div > div > div > div.Layout-sidebar > div > div:nth-child(2) > div > a";
pub(crate) const SIDEBAR_SELECTOR: &str = "div.Layout-sidebar";
pub(crate) const RELEASES_CONTAINER_SELECTOR: &str = "#repo-content-pjax-container";

// Every injected element carries one of these classes; finding the class
// under the target anchor means a previous refresh already ran there.
const DOWNLOADS_MARKER: &str = "gloss-downloads";
const CHART_MARKER: &str = "gloss-chart";
const ASSET_MARKER: &str = "gloss-asset-downloads";
const MIRROR_MARKER: &str = "gloss-mirror";

/// Generation token captured when a refresh begins.
///
/// A chain holds the ticket across its awaits and may only touch the DOM
/// while the ticket is still current, so completions raced out by a newer
/// navigation land nowhere.
#[derive(Clone)]
pub struct RefreshTicket {
    issued: u64,
    current: Arc<AtomicU64>,
}

impl RefreshTicket {
    /// Whether no newer refresh has started since this ticket was issued.
    pub fn is_current(&self) -> bool {
        self.issued == self.current.load(Ordering::SeqCst)
    }
}

/// Classifies the current route on each refresh and spawns the augmentation
/// chains that apply to it.
pub struct PageBinder {
    page: Arc<dyn HostPage>,
    stats: Arc<dyn StatsSource>,
    charts: Arc<dyn ChartRenderer>,
    options: EngineOptions,
    generation: Arc<AtomicU64>,
}

impl PageBinder {
    pub fn new(
        page: Arc<dyn HostPage>,
        stats: Arc<dyn StatsSource>,
        charts: Arc<dyn ChartRenderer>,
        options: EngineOptions,
    ) -> Self {
        Self {
            page,
            stats,
            charts,
            options,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    fn next_ticket(&self) -> RefreshTicket {
        let issued = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        RefreshTicket {
            issued,
            current: Arc::clone(&self.generation),
        }
    }

    fn chain(&self, ticket: &RefreshTicket, owner: &str, repo: &str) -> Chain {
        Chain {
            page: Arc::clone(&self.page),
            stats: Arc::clone(&self.stats),
            charts: Arc::clone(&self.charts),
            options: self.options.clone(),
            ticket: ticket.clone(),
            owner: owner.to_string(),
            repo: repo.to_string(),
        }
    }
}

#[async_trait]
impl Refresh for PageBinder {
    async fn refresh(&self) {
        let path = self.page.current_path();
        let route = classify(&path);
        let ticket = self.next_ticket();
        debug!(path = %path, ?route, "refreshing augmentations");

        match route {
            Route::RepoHome { owner, repo } => {
                let chain = self.chain(&ticket, &owner, &repo);
                spawn_chain("downloads label", chain.clone().inject_downloads_label());
                spawn_chain("repo chart", chain.inject_repo_chart());
            }
            Route::ReleasesList { owner, repo } => {
                let chain = self.chain(&ticket, &owner, &repo);
                spawn_chain("releases chart", chain.inject_releases_chart());
            }
            Route::ReleaseDetail { owner, repo, tag } => {
                let chain = self.chain(&ticket, &owner, &repo);
                spawn_chain("asset labels", chain.inject_asset_labels(tag));
            }
            Route::Other => {}
        }
    }
}

/// Spawn one augmentation chain; failures degrade to a log line.
fn spawn_chain(what: &'static str, chain: impl Future<Output = Result<()>> + Send + 'static) {
    tokio::spawn(async move {
        if let Err(err) = chain.await {
            warn!(what, error = %err, "augmentation abandoned");
        }
    });
}

/// Everything one spawned chain owns: collaborators, budgets, and the
/// refresh ticket that gates its DOM writes.
#[derive(Clone)]
struct Chain {
    page: Arc<dyn HostPage>,
    stats: Arc<dyn StatsSource>,
    charts: Arc<dyn ChartRenderer>,
    options: EngineOptions,
    ticket: RefreshTicket,
    owner: String,
    repo: String,
}

impl Chain {
    /// Append the total-downloads label next to the releases summary.
    async fn inject_downloads_label(self) -> Result<()> {
        let anchor = self.wait(RELEASES_SUMMARY_SELECTOR).await?;
        let total = self.stats.total_downloads(&self.owner, &self.repo).await?;

        if !self.ticket.is_current() {
            debug!(owner = %self.owner, repo = %self.repo, "stale downloads chain discarded");
            return Ok(());
        }
        if self.marked(anchor, DOWNLOADS_MARKER) {
            return Ok(());
        }

        let text = format!("{} downloads", human_readable_number(total));
        let label = self.count_label("div", DOWNLOADS_MARKER, &text, total);
        self.page.append_child(anchor, label);
        Ok(())
    }

    /// Chart traffic in the sidebar, falling back to star history when
    /// traffic data requires a session the embedder does not have.
    async fn inject_repo_chart(self) -> Result<()> {
        let sidebar = self.wait(SIDEBAR_SELECTOR).await?;

        let chart = match self.stats.traffic_data(&self.owner, &self.repo).await {
            Ok(samples) => traffic_chart(&samples),
            Err(GlossError::LoginRequired { .. }) => {
                debug!(owner = %self.owner, repo = %self.repo, "traffic needs a session, charting stars instead");
                star_chart(&self.stats.star_history(&self.owner, &self.repo).await?)
            }
            Err(err) => return Err(err),
        };

        self.render_chart(sidebar, chart)
    }

    /// Chart per-release download totals on the releases index, in
    /// numeric-aware tag order.
    async fn inject_releases_chart(self) -> Result<()> {
        let container = self.wait(RELEASES_CONTAINER_SELECTOR).await?;
        let mut releases = self.stats.release_downloads(&self.owner, &self.repo).await?;
        releases.sort_by(|a, b| natural_cmp(&a.tag_name, &b.tag_name));

        self.render_chart(container, releases_chart(&releases))
    }

    /// Label every asset of the release the current tag names. A tag with
    /// no matching release is a quiet no-op.
    async fn inject_asset_labels(self, tag: String) -> Result<()> {
        let releases = self.stats.release_downloads(&self.owner, &self.repo).await?;
        let Some(release) = releases.into_iter().find(|r| r.tag_name == tag) else {
            debug!(owner = %self.owner, repo = %self.repo, tag = %tag, "no release matches this tag");
            return Ok(());
        };

        for asset in release.assets {
            spawn_chain("asset label", self.clone().inject_asset_label(asset));
        }
        Ok(())
    }

    /// Append a download count and mirror link after one asset's link.
    async fn inject_asset_label(self, asset: ReleaseAsset) -> Result<()> {
        let selector = format!("a[href$=\"{}\"]", asset.name);
        let link = self.wait(&selector).await?;
        let Some(row) = self.page.parent(link) else {
            return Ok(());
        };

        if !self.ticket.is_current() {
            debug!(asset = %asset.name, "stale asset chain discarded");
            return Ok(());
        }
        if self.marked(row, ASSET_MARKER) {
            return Ok(());
        }

        let text = format!(" ({} downloads)", human_readable_number(asset.download_count));
        let label = self.count_label("span", ASSET_MARKER, &text, asset.download_count);
        self.page.append_child(row, label);

        if let Some(href) = self.page.attribute(link, "href") {
            let mirror = self.page.create_element("a");
            self.page.set_attribute(mirror, "class", MIRROR_MARKER);
            self.page.set_text(mirror, " (mirror)");
            self.page
                .set_attribute(mirror, "href", &mirror_href(&self.options, &href));
            self.page.append_child(row, mirror);
        }
        Ok(())
    }

    async fn wait(&self, selector: &str) -> Result<NodeHandle> {
        wait_for_element(
            self.page.as_ref(),
            selector,
            self.options.anchor_timeout,
            self.options.poll_interval,
        )
        .await
    }

    fn marked(&self, scope: NodeHandle, marker: &str) -> bool {
        self.page
            .query_within(scope, &format!(".{}", marker))
            .is_some()
    }

    /// Build a colored count element with the raw count in its tooltip.
    fn count_label(&self, tag: &str, marker: &str, text: &str, raw: u64) -> NodeHandle {
        let label = self.page.create_element(tag);
        self.page.set_attribute(label, "class", marker);
        self.page.set_text(label, text);
        self.page
            .set_attribute(label, "title", &format!("{} downloads", raw));
        let color = hot_level_color(raw);
        if !color.is_empty() {
            self.page
                .set_attribute(label, "style", &format!("color: {}", color));
        }
        label
    }

    /// Inject a canvas under `target` and render `chart` into it, unless a
    /// chart is already there or the refresh has been superseded.
    fn render_chart(&self, target: NodeHandle, chart: LineChart) -> Result<()> {
        if !self.ticket.is_current() {
            debug!(owner = %self.owner, repo = %self.repo, "stale chart chain discarded");
            return Ok(());
        }
        if self.marked(target, CHART_MARKER) {
            return Ok(());
        }

        let canvas = self.page.create_element("canvas");
        self.page.set_attribute(canvas, "class", CHART_MARKER);
        self.page.append_child(target, canvas);
        self.charts.render_line_chart(canvas, &chart);
        Ok(())
    }
}

fn traffic_chart(samples: &[TrafficSample]) -> LineChart {
    LineChart {
        labels: samples.iter().map(|s| bucket_label(s.bucket)).collect(),
        series: vec![
            ChartSeries {
                label: "Views".to_string(),
                data: samples.iter().map(|s| s.total).collect(),
            },
            ChartSeries {
                label: "Unique visitors".to_string(),
                data: samples.iter().map(|s| s.unique).collect(),
            },
        ],
    }
}

fn star_chart(history: &StarHistory) -> LineChart {
    LineChart {
        labels: history.labels.clone(),
        series: vec![
            ChartSeries {
                label: "Stars per day".to_string(),
                data: history.daily.clone(),
            },
            ChartSeries {
                label: "Total stars".to_string(),
                data: history.cumulative.clone(),
            },
        ],
    }
}

fn releases_chart(releases: &[Release]) -> LineChart {
    LineChart {
        labels: releases.iter().map(|r| r.tag_name.clone()).collect(),
        series: vec![ChartSeries {
            label: "Downloads".to_string(),
            data: releases
                .iter()
                .map(|r| r.assets.iter().map(|a| a.download_count).sum())
                .collect(),
        }],
    }
}

fn bucket_label(bucket: i64) -> String {
    match DateTime::from_timestamp(bucket, 0) {
        Some(when) => format!("{}/{}/{}", when.month(), when.day(), when.year()),
        None => bucket.to_string(),
    }
}

fn mirror_href(options: &EngineOptions, href: &str) -> String {
    let absolute = if href.starts_with('/') {
        format!("{}{}", options.web_base, href)
    } else {
        href.to_string()
    };
    format!("{}/{}", options.mirror_base, absolute)
}
