//! Subscribe/unsubscribe and notification dispatch.

use crate::error::{Result, TreeError};
use crate::node::Node;
use crate::types::{format_path, Action, Key, Path, Value};
use crossbeam_channel::{bounded, TrySendError};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use super::propagate::{attach, detach, DetachScope};
use super::table::Entry;
use super::types::{ChangeEvent, SubscriptionConfig, SubscriptionHandle, SubscriptionId};

/// Counter for generating process-unique subscription IDs.
static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Notification dispatches currently on this thread's stack.
    static DISPATCH_DEPTH: Cell<usize> = const { Cell::new(0) };
}

struct DispatchDepth;

impl DispatchDepth {
    fn enter() -> Self {
        DISPATCH_DEPTH.with(|d| d.set(d.get() + 1));
        DispatchDepth
    }
}

impl Drop for DispatchDepth {
    fn drop(&mut self) {
        DISPATCH_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

/// Fail a mutation that would nest deeper than the node's config allows.
pub(crate) fn check_reentrancy(node: &Node) -> Result<()> {
    let limit = node.borrow().config.max_reentrancy_depth;
    let depth = DISPATCH_DEPTH.with(Cell::get);
    if depth >= limit {
        warn!(depth, limit, "re-entrant mutation chain exceeds limit");
        return Err(TreeError::ReentrancyLimitExceeded { depth, limit });
    }
    Ok(())
}

/// Tell every subscription reaching `node` that `key` changed.
///
/// Entries are re-read before each call, so a callback that unsubscribes
/// another id stops that id's delivery within the same mutation. The first
/// failing callback ends delivery; later subscribers are not called.
pub(crate) fn notify(node: &Node, key: &Key, value: &Value, action: Action) -> Result<()> {
    let ids = node.borrow().table.ids();
    if ids.is_empty() {
        return Ok(());
    }

    let _depth = DispatchDepth::enter();
    for id in ids {
        let Some(entry) = node.borrow().table.get(id).cloned() else {
            continue;
        };
        let Some(root) = Node::from_weak(&entry.root) else {
            continue;
        };

        let mut path = entry.path;
        path.push(key.clone());
        if let Err(err) = (entry.callback)(&root, &path, value, action) {
            debug!(
                subscription = %id,
                path = %format_path(&path),
                error = %err,
                "observer callback failed"
            );
            return Err(err);
        }
    }
    Ok(())
}

impl Node {
    /// Observe every mutation in the tree below this node.
    ///
    /// The callback receives this node, the path from it to the mutated key,
    /// the committed value (`Null` for deletions) and the action. Keep the
    /// returned id to unsubscribe.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Node, &[Key], &Value, Action) -> Result<()> + 'static,
    {
        let id = SubscriptionId(NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::SeqCst));
        let entry = Entry {
            root: self.downgrade(),
            path: Vec::new(),
            callback: Rc::new(callback),
        };

        let reached = attach(self, id, &entry);
        debug!(subscription = %id, nodes = reached, "subscribed");
        id
    }

    /// Subscribe through a bounded channel instead of a callback.
    ///
    /// If the buffer fills up, or the handle is dropped, the subscription
    /// removes itself from the tree.
    pub fn subscribe_channel(&self, config: SubscriptionConfig) -> SubscriptionHandle {
        let (sender, receiver) = bounded(config.buffer_size.max(1));
        let own_id: Rc<Cell<Option<SubscriptionId>>> = Rc::new(Cell::new(None));
        let slot = own_id.clone();

        let id = self.subscribe(move |root, path, value, action| {
            let event = ChangeEvent {
                path: path.to_vec(),
                value: value.clone(),
                action,
            };
            let reason = match sender.try_send(event) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Full(_)) => "buffer overflow",
                Err(TrySendError::Disconnected(_)) => "handle dropped",
            };
            if let Some(id) = slot.get() {
                warn!(subscription = %id, reason, "dropping channel subscription");
                root.unsubscribe(id);
            }
            Ok(())
        });
        own_id.set(Some(id));

        SubscriptionHandle { id, receiver }
    }

    /// Remove `id` from this node and everything reachable from it.
    /// Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let removed = detach(self, id, DetachScope::All);
        debug!(subscription = %id, nodes = removed, "unsubscribed");
    }

    /// Ids of the subscriptions currently reaching this node.
    pub fn subscription_ids(&self) -> Vec<SubscriptionId> {
        self.borrow().table.ids()
    }

    /// Path from the subscription's root to this node, if `id` reaches it.
    pub fn subscription_path(&self, id: SubscriptionId) -> Option<Path> {
        self.borrow().table.get(id).map(|e| e.path.clone())
    }

    pub fn subscription_count(&self) -> usize {
        self.borrow().table.len()
    }
}
