//! View discovery.
//!
//! Finds rendered thread views that are not bound yet, binds each one
//! exactly once, and spawns its watch on the local executor. A pass runs
//! once at start-up and again whenever the route-change detector reports a
//! new URL.

use crate::host::{HostPage, ThreadHandle};
use crate::model::{SyncError, ViewId};
use crate::store::PreferenceStore;
use crate::sync::{Reaction, ViewSynchronizer};
use futures::stream::{Stream, StreamExt};
use futures::task::{LocalSpawn, LocalSpawnExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::pin::pin;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Message from the route-change detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HostMessage {
    /// The page navigated; new thread views may have been rendered.
    UrlChanged {
        /// The new URL.
        url: String,
    },
}

impl HostMessage {
    /// Decode a message from its JSON payload.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

/// Ids of the views that are bound.
///
/// Holds ids, not element handles, so discarded views are not kept alive.
#[derive(Debug, Clone, Default)]
pub struct ViewRegistry {
    bound: HashSet<ViewId>,
}

impl ViewRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `view` as bound. Returns false if it already was.
    pub fn claim(&mut self, view: ViewId) -> bool {
        self.bound.insert(view)
    }

    /// Whether `view` is bound.
    pub fn contains(&self, view: &ViewId) -> bool {
        self.bound.contains(view)
    }

    /// Forget every view for which `is_attached` says its container is
    /// gone. Returns the forgotten ids, sorted.
    pub fn prune(&mut self, is_attached: impl Fn(&ViewId) -> bool) -> Vec<ViewId> {
        let mut gone: Vec<ViewId> = self
            .bound
            .iter()
            .filter(|view| !is_attached(view))
            .cloned()
            .collect();
        for view in &gone {
            self.bound.remove(view);
        }
        gone.sort();
        gone
    }

    /// Number of bound views.
    pub fn len(&self) -> usize {
        self.bound.len()
    }

    /// True when nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

/// Outcome of one discovery pass.
#[derive(Debug, Default)]
pub struct PassReport {
    /// Views bound in this pass, with the outcome of their first reorder.
    pub bound: Vec<(ViewId, Reaction)>,
    /// Views skipped because they were bound earlier.
    pub already_bound: Vec<ViewId>,
    /// Views that could not be bound, left for a later pass.
    pub unbound: Vec<(ViewId, SyncError)>,
    /// Views forgotten because their container is gone.
    pub pruned: Vec<ViewId>,
}

/// Binds thread views of one page.
pub struct Discovery<P, Sp> {
    page: P,
    store: Rc<dyn PreferenceStore>,
    key: String,
    registry: ViewRegistry,
    spawner: Sp,
}

impl<P, Sp> Discovery<P, Sp>
where
    P: HostPage,
    Sp: LocalSpawn + Clone + 'static,
{
    /// Discovery over `page`, storing the preference under `key` and
    /// running watches on `spawner`.
    pub fn new(page: P, store: Rc<dyn PreferenceStore>, key: impl Into<String>, spawner: Sp) -> Self {
        Self {
            page,
            store,
            key: key.into(),
            registry: ViewRegistry::new(),
            spawner,
        }
    }

    /// Bind every shown thread view not bound yet.
    ///
    /// Waits for the host to go idle first. Failures are per view: a view
    /// that cannot be bound is reported and left for the next pass, and the
    /// remaining views are still processed.
    pub async fn run_pass(&mut self) -> PassReport {
        self.page.idle().await;

        let mut report = PassReport {
            pruned: self.registry.prune(|view| self.page.is_attached(view)),
            ..PassReport::default()
        };
        for view in &report.pruned {
            debug!(view = %view, "Forgetting discarded thread view");
        }

        for thread in self.page.thread_views() {
            let view = thread.view_id();
            if self.registry.contains(&view) {
                report.already_bound.push(view);
                continue;
            }
            match ViewSynchronizer::bind_thread(&thread, Rc::clone(&self.store), self.key.clone()).await {
                Ok(sync) => {
                    let reaction = sync.last_reaction().clone();
                    let events = sync.subscribe();
                    let writes = self.spawner.clone();
                    if let Err(error) = self.spawner.spawn_local(async move {
                        sync.run(events, writes).await;
                    }) {
                        // Left unclaimed so the next pass tries again.
                        warn!(view = %view, error = %error, "Could not start watching thread view");
                        continue;
                    }
                    self.registry.claim(view.clone());
                    report.bound.push((view, reaction));
                }
                Err(error) if error.is_retryable() => {
                    info!(view = %view, error = %error, "Thread view not ready, retrying on next pass");
                    report.unbound.push((view, error));
                }
                Err(error) => {
                    warn!(view = %view, error = %error, "Thread view not bound");
                    report.unbound.push((view, error));
                }
            }
        }

        info!(
            bound = report.bound.len(),
            already_bound = report.already_bound.len(),
            unbound = report.unbound.len(),
            pruned = report.pruned.len(),
            "Discovery pass finished"
        );
        report
    }

    /// React to a message from the route-change detector.
    pub async fn handle_message(&mut self, message: HostMessage) -> PassReport {
        match message {
            HostMessage::UrlChanged { url } => {
                info!(url = %url, "URL changed, looking for new thread views");
                self.run_pass().await
            }
        }
    }

    /// Run a first pass, then one pass per message until `messages` ends.
    ///
    /// Returns the report of the last pass.
    pub async fn run(&mut self, messages: impl Stream<Item = HostMessage>) -> PassReport {
        let mut report = self.run_pass().await;
        let mut messages = pin!(messages);
        while let Some(message) = messages.next().await {
            report = self.handle_message(message).await;
        }
        debug!(bound = self.registry.len(), "Host message channel closed");
        report
    }

    /// Views bound so far.
    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
