//! Per-node subscription table.

use super::types::{Callback, SubscriptionId};
use crate::node::WeakNode;
use crate::types::{Key, Path};
use std::collections::BTreeMap;
use std::fmt;

/// Where one subscription reaches a node from, and whom to tell.
#[derive(Clone)]
pub(crate) struct Entry {
    /// The node `subscribe` was called on.
    pub(crate) root: WeakNode,
    /// Keys from `root` to the node holding this entry.
    pub(crate) path: Path,
    pub(crate) callback: Callback,
}

impl Entry {
    /// The entry a child stored under `key` should carry.
    pub(crate) fn child(&self, key: Key) -> Entry {
        let mut path = self.path.clone();
        path.push(key);
        Entry {
            root: self.root.clone(),
            path,
            callback: self.callback.clone(),
        }
    }

    /// True when this entry was established through `prefix`.
    pub(crate) fn is_under(&self, root: &WeakNode, prefix: &[Key]) -> bool {
        self.root.ptr_eq(root) && self.path.starts_with(prefix)
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("root", &self.root.as_ptr())
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Subscription id to entry, at most one entry per id.
#[derive(Debug, Default)]
pub(crate) struct SubscriptionTable {
    entries: BTreeMap<SubscriptionId, Entry>,
}

impl SubscriptionTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Last write wins.
    pub(crate) fn insert(&mut self, id: SubscriptionId, entry: Entry) -> Option<Entry> {
        self.entries.insert(id, entry)
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> Option<Entry> {
        self.entries.remove(&id)
    }

    pub(crate) fn get(&self, id: SubscriptionId) -> Option<&Entry> {
        self.entries.get(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn ids(&self) -> Vec<SubscriptionId> {
        self.entries.keys().copied().collect()
    }

    /// Owned copy, so callers can run callbacks without holding a borrow.
    pub(crate) fn snapshot(&self) -> Vec<(SubscriptionId, Entry)> {
        self.entries
            .iter()
            .map(|(id, entry)| (*id, entry.clone()))
            .collect()
    }
}
