// Shared test doubles.
// Fakes standing in for the live page, chart library, stats source, and store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::cache::store::KeyValueStore;
use crate::error::{GlossError, Result};
use crate::github::providers::{StatsSource, sum_downloads};
use crate::github::types::{Release, ReleaseAsset, StarHistory, TrafficSample};
use crate::page::chart::{ChartRenderer, LineChart};
use crate::page::dom::{HostPage, NodeHandle};

/// Build a release fixture from `(asset name, download count)` pairs.
pub fn release(tag: &str, assets: &[(&str, u64)]) -> Release {
    Release {
        tag_name: tag.to_string(),
        assets: assets
            .iter()
            .map(|(name, count)| ReleaseAsset {
                name: (*name).to_string(),
                download_count: *count,
            })
            .collect(),
    }
}

fn key(owner: &str, repo: &str) -> String {
    format!("{}/{}", owner, repo)
}

/// In-memory document standing in for the live page.
///
/// Selectors resolve through an explicit mount table rather than a CSS
/// engine; class selectors additionally search subtrees, so marker checks
/// behave the way they do against the real document.
pub struct FakePage {
    state: Mutex<PageState>,
}

#[derive(Default)]
struct PageState {
    path: String,
    nodes: Vec<FakeNode>,
    mounts: HashMap<String, u64>,
    deferred: HashMap<String, Deferred>,
}

#[derive(Default)]
struct FakeNode {
    tag: String,
    text: String,
    attrs: HashMap<String, String>,
    children: Vec<u64>,
    parent: Option<u64>,
}

struct Deferred {
    node: u64,
    misses_left: u32,
}

impl FakePage {
    pub fn new(path: &str) -> Self {
        Self {
            state: Mutex::new(PageState {
                path: path.to_string(),
                ..Default::default()
            }),
        }
    }

    /// Create a detached element for fixture building.
    pub fn add_element(&self, tag: &str) -> NodeHandle {
        self.create_element(tag)
    }

    /// Resolve `selector` to `node` from now on.
    pub fn mount(&self, selector: &str, node: NodeHandle) {
        let mut state = self.state.lock().unwrap();
        state.deferred.remove(selector);
        state.mounts.insert(selector.to_string(), node.0);
    }

    /// Resolve `selector` to `node` only after `misses` unanswered queries.
    pub fn mount_after_queries(&self, selector: &str, node: NodeHandle, misses: u32) {
        let mut state = self.state.lock().unwrap();
        state.deferred.insert(
            selector.to_string(),
            Deferred {
                node: node.0,
                misses_left: misses,
            },
        );
    }

    pub fn set_path(&self, path: &str) {
        self.state.lock().unwrap().path = path.to_string();
    }

    pub fn element_count(&self) -> usize {
        self.state.lock().unwrap().nodes.len()
    }

    pub fn tag_of(&self, node: NodeHandle) -> String {
        self.state.lock().unwrap().nodes[node.0 as usize].tag.clone()
    }

    pub fn text_of(&self, node: NodeHandle) -> String {
        self.state.lock().unwrap().nodes[node.0 as usize].text.clone()
    }

    pub fn attr_of(&self, node: NodeHandle, name: &str) -> Option<String> {
        self.state.lock().unwrap().nodes[node.0 as usize]
            .attrs
            .get(name)
            .cloned()
    }

    /// Direct children of `parent` carrying `class`.
    pub fn children_with_class(&self, parent: NodeHandle, class: &str) -> Vec<NodeHandle> {
        let state = self.state.lock().unwrap();
        state.nodes[parent.0 as usize]
            .children
            .iter()
            .copied()
            .filter(|id| state.has_class(*id, class))
            .map(NodeHandle)
            .collect()
    }

    pub fn is_descendant_of(&self, node: NodeHandle, ancestor: NodeHandle) -> bool {
        self.state.lock().unwrap().within(node.0, ancestor.0)
    }
}

impl PageState {
    fn has_class(&self, id: u64, class: &str) -> bool {
        self.nodes[id as usize]
            .attrs
            .get("class")
            .is_some_and(|value| value.split_whitespace().any(|c| c == class))
    }

    fn descendants(&self, root: u64) -> Vec<u64> {
        let mut out = Vec::new();
        let mut stack = self.nodes[root as usize].children.clone();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id as usize].children.iter().copied());
        }
        out
    }

    fn within(&self, node: u64, ancestor: u64) -> bool {
        let mut cur = self.nodes[node as usize].parent;
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.nodes[id as usize].parent;
        }
        false
    }
}

impl HostPage for FakePage {
    fn current_path(&self) -> String {
        self.state.lock().unwrap().path.clone()
    }

    fn query(&self, selector: &str) -> Option<NodeHandle> {
        let mut state = self.state.lock().unwrap();
        if let Some(id) = state.mounts.get(selector).copied() {
            return Some(NodeHandle(id));
        }
        let promote = match state.deferred.get_mut(selector) {
            Some(deferred) if deferred.misses_left <= 1 => true,
            Some(deferred) => {
                deferred.misses_left -= 1;
                false
            }
            None => false,
        };
        if promote {
            if let Some(deferred) = state.deferred.remove(selector) {
                state.mounts.insert(selector.to_string(), deferred.node);
            }
        }
        None
    }

    fn query_within(&self, scope: NodeHandle, selector: &str) -> Option<NodeHandle> {
        let state = self.state.lock().unwrap();
        if let Some(class) = selector.strip_prefix('.') {
            return state
                .descendants(scope.0)
                .into_iter()
                .find(|id| state.has_class(*id, class))
                .map(NodeHandle);
        }
        let id = state.mounts.get(selector).copied()?;
        state.within(id, scope.0).then_some(NodeHandle(id))
    }

    fn attribute(&self, node: NodeHandle, name: &str) -> Option<String> {
        self.attr_of(node, name)
    }

    fn parent(&self, node: NodeHandle) -> Option<NodeHandle> {
        self.state.lock().unwrap().nodes[node.0 as usize]
            .parent
            .map(NodeHandle)
    }

    fn create_element(&self, tag: &str) -> NodeHandle {
        let mut state = self.state.lock().unwrap();
        let id = state.nodes.len() as u64;
        state.nodes.push(FakeNode {
            tag: tag.to_string(),
            ..Default::default()
        });
        NodeHandle(id)
    }

    fn set_text(&self, node: NodeHandle, text: &str) {
        self.state.lock().unwrap().nodes[node.0 as usize].text = text.to_string();
    }

    fn set_attribute(&self, node: NodeHandle, name: &str, value: &str) {
        self.state.lock().unwrap().nodes[node.0 as usize]
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    fn append_child(&self, parent: NodeHandle, child: NodeHandle) {
        let mut state = self.state.lock().unwrap();
        state.nodes[parent.0 as usize].children.push(child.0);
        state.nodes[child.0 as usize].parent = Some(parent.0);
    }
}

/// Canned stats source keyed by `owner/repo`.
#[derive(Default)]
pub struct FakeStats {
    releases: Mutex<HashMap<String, Vec<Release>>>,
    stars: Mutex<HashMap<String, StarHistory>>,
    traffic: Mutex<HashMap<String, Vec<TrafficSample>>>,
    login_required: AtomicBool,
    totals_gate: Mutex<Option<Arc<Notify>>>,
    release_calls: AtomicU32,
}

impl FakeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_releases(&self, owner_repo: &str, releases: Vec<Release>) {
        self.releases
            .lock()
            .unwrap()
            .insert(owner_repo.to_string(), releases);
    }

    pub fn set_star_history(&self, owner_repo: &str, history: StarHistory) {
        self.stars
            .lock()
            .unwrap()
            .insert(owner_repo.to_string(), history);
    }

    pub fn set_traffic(&self, owner_repo: &str, samples: Vec<TrafficSample>) {
        self.traffic
            .lock()
            .unwrap()
            .insert(owner_repo.to_string(), samples);
    }

    /// Make every traffic request fail the way an unauthenticated one does.
    pub fn require_login_for_traffic(&self) {
        self.login_required.store(true, Ordering::SeqCst);
    }

    /// Hold every `total_downloads` call until the returned gate is notified.
    pub fn gate_totals(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.totals_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// How many times `release_downloads` has been asked for data.
    pub fn release_calls(&self) -> u32 {
        self.release_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatsSource for FakeStats {
    async fn release_downloads(&self, owner: &str, repo: &str) -> Result<Vec<Release>> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .releases
            .lock()
            .unwrap()
            .get(&key(owner, repo))
            .cloned()
            .unwrap_or_default())
    }

    async fn total_downloads(&self, owner: &str, repo: &str) -> Result<u64> {
        let gate = self.totals_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(sum_downloads(&self.release_downloads(owner, repo).await?))
    }

    async fn star_history(&self, owner: &str, repo: &str) -> Result<StarHistory> {
        Ok(self
            .stars
            .lock()
            .unwrap()
            .get(&key(owner, repo))
            .cloned()
            .unwrap_or_default())
    }

    async fn traffic_data(&self, owner: &str, repo: &str) -> Result<Vec<TrafficSample>> {
        if self.login_required.load(Ordering::SeqCst) {
            return Err(GlossError::LoginRequired {
                url: format!("https://github.com/{}/{}/graphs/traffic-data", owner, repo),
            });
        }
        Ok(self
            .traffic
            .lock()
            .unwrap()
            .get(&key(owner, repo))
            .cloned()
            .unwrap_or_default())
    }
}

/// Records rendered charts instead of drawing them.
#[derive(Default)]
pub struct FakeCharts {
    rendered: Mutex<Vec<(NodeHandle, LineChart)>>,
}

impl FakeCharts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rendered(&self) -> Vec<(NodeHandle, LineChart)> {
        self.rendered.lock().unwrap().clone()
    }
}

impl ChartRenderer for FakeCharts {
    fn render_line_chart(&self, target: NodeHandle, chart: &LineChart) {
        self.rendered.lock().unwrap().push((target, chart.clone()));
    }
}

/// Store whose every operation fails, for error propagation tests.
pub struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(GlossError::Storage("store offline".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(GlossError::Storage("store offline".to_string()))
    }
}
