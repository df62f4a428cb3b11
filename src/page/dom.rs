// Host document collaborator surface.
// Selector-addressed reads plus append-only writes against the live page.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::error::{GlossError, Result};

/// Opaque id naming an element owned by the host page.
///
/// Handles are minted by the embedder and carry no liveness guarantee: a
/// handle taken on one route may dangle after the next navigation, and the
/// page is free to answer queries against it with nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(pub u64);

/// Live page access supplied by the embedder.
///
/// The engine only ever creates elements and appends them; it never mutates
/// or removes content it did not create.
pub trait HostPage: Send + Sync {
    /// Path portion of the current location, e.g. "/rust-lang/rust".
    fn current_path(&self) -> String;

    /// First element matching a CSS selector, document-wide.
    fn query(&self, selector: &str) -> Option<NodeHandle>;

    /// First element matching a CSS selector within `scope`'s subtree.
    fn query_within(&self, scope: NodeHandle, selector: &str) -> Option<NodeHandle>;

    /// Attribute value on an element, if present.
    fn attribute(&self, node: NodeHandle, name: &str) -> Option<String>;

    /// Parent element, if any.
    fn parent(&self, node: NodeHandle) -> Option<NodeHandle>;

    /// Create a detached element of the given tag.
    fn create_element(&self, tag: &str) -> NodeHandle;

    fn set_text(&self, node: NodeHandle, text: &str);

    fn set_attribute(&self, node: NodeHandle, name: &str, value: &str);

    fn append_child(&self, parent: NodeHandle, child: NodeHandle);
}

/// Poll for `selector` until it matches or `timeout` elapses.
///
/// The host page renders progressively, so anchors routinely appear well
/// after the navigation that will eventually contain them.
pub async fn wait_for_element(
    page: &dyn HostPage,
    selector: &str,
    timeout: Duration,
    poll: Duration,
) -> Result<NodeHandle> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(node) = page.query(selector) {
            return Ok(node);
        }
        if Instant::now() >= deadline {
            debug!(selector, ?timeout, "anchor never appeared");
            return Err(GlossError::AnchorTimeout {
                selector: selector.to_string(),
                waited: timeout,
            });
        }
        tokio::time::sleep(poll).await;
    }
}
